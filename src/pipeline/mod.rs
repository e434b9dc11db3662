//! Grounding pipeline: mentions → facts → ranked context.
//!
//! [`FactRetriever`] owns the cache discipline (consult before any network
//! call, record after every successful one); [`GroundingPipeline`] adds the
//! ranking stage and the fact budget, producing the [`GroundingContext`]
//! handed to the prompt layer.
//!
//! A question whose mentions all fail to resolve, or whose entities yield
//! no facts, grounds to an empty context, never an error.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::cache::ResultCache;
use crate::config::RetrieverConfig;
use crate::error::{CacheResult, SeshatResult};
use crate::rank::{Embedder, FastEmbedder, RelevanceRanker};
use crate::wikidata::client::{HttpWikidataApi, WikidataApi, WikidataClient, WikidataEndpoints};
use crate::wikidata::{Fact, verbalize};

/// An entity mention arriving from the caller's entity-linking stage:
/// either a free-text label still needing resolution, or an already-known
/// QID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mention {
    Label(String),
    Id(String),
}

impl std::fmt::Display for Mention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mention::Label(s) | Mention::Id(s) => f.write_str(s),
        }
    }
}

/// The ordered, budgeted grounding handed to the downstream prompt.
#[derive(Debug, Clone, Serialize)]
pub struct GroundingContext {
    /// The original question, unchanged.
    pub question: String,
    /// Verbalized facts, most relevant first, truncated to the budget.
    pub facts: Vec<String>,
}

// ---------------------------------------------------------------------------
// Cache-aware retrieval
// ---------------------------------------------------------------------------

/// Fact retrieval with a write-through cache in front of the client.
pub struct FactRetriever<A: WikidataApi> {
    client: WikidataClient<A>,
    cache: ResultCache,
}

impl<A: WikidataApi> FactRetriever<A> {
    /// Combine a client with a loaded cache.
    pub fn new(client: WikidataClient<A>, cache: ResultCache) -> Self {
        Self { client, cache }
    }

    /// All facts for one mention.
    ///
    /// Label mentions resolve through the cache first, then the search
    /// endpoint; fact lists likewise. Successful lookups are recorded in
    /// memory; failed ones are not, so the next run retries them. An
    /// unresolvable mention contributes no facts.
    pub fn facts_for(&mut self, mention: &Mention) -> Vec<Fact> {
        let qid = match mention {
            Mention::Id(qid) => qid.clone(),
            Mention::Label(label) => {
                if let Some(qid) = self.cache.qid_for(label) {
                    debug!(%label, qid, "label cache hit");
                    qid.to_string()
                } else if let Some(qid) = self.client.resolve_label(label) {
                    self.cache
                        .record_labels(HashMap::from([(label.clone(), qid.clone())]));
                    qid
                } else {
                    debug!(%label, "mention did not resolve, contributing no facts");
                    return Vec::new();
                }
            }
        };

        if let Some(cached) = self.cache.facts(&qid) {
            debug!(%qid, "fact cache hit");
            return cached.to_vec();
        }

        match self.client.extract_facts(&qid) {
            Some((facts, discovered)) => {
                self.cache.record_facts(qid, facts.clone());
                self.cache.record_labels(discovered);
                facts
            }
            None => Vec::new(),
        }
    }

    /// The underlying client, for description lookups and the like.
    pub fn client(&self) -> &WikidataClient<A> {
        &self.client
    }

    /// Read access to the cache.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Flush the cache to disk. This is the explicit checkpoint; nothing
    /// in the retriever saves automatically.
    pub fn save_cache(&self) -> CacheResult<()> {
        self.cache.persist()
    }
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

/// Retrieval plus ranking: the full question-grounding pipeline.
pub struct GroundingPipeline<A: WikidataApi, E: Embedder> {
    retriever: FactRetriever<A>,
    ranker: RelevanceRanker<E>,
    fact_budget: usize,
}

impl GroundingPipeline<HttpWikidataApi, FastEmbedder> {
    /// Build the production pipeline: live Wikidata endpoints, on-disk
    /// cache, and a local embedding model.
    pub fn from_config(config: &RetrieverConfig) -> SeshatResult<Self> {
        let endpoints = WikidataEndpoints {
            api_url: config.api_url.clone(),
            entity_data_url: config.entity_data_url.clone(),
            timeout_secs: config.timeout_secs,
        };
        let client = WikidataClient::new(HttpWikidataApi::new(endpoints));
        let cache = ResultCache::load(&config.cache_path)?;
        let ranker = RelevanceRanker::new(FastEmbedder::new(&config.embedding_model)?);

        Ok(Self::new(
            FactRetriever::new(client, cache),
            ranker,
            config.fact_budget,
        ))
    }
}

impl<A: WikidataApi, E: Embedder> GroundingPipeline<A, E> {
    /// Assemble a pipeline from parts.
    pub fn new(retriever: FactRetriever<A>, ranker: RelevanceRanker<E>, fact_budget: usize) -> Self {
        Self {
            retriever,
            ranker,
            fact_budget,
        }
    }

    /// Ground a question: gather facts for every mention, rank them
    /// against the question, and keep the top of the list.
    pub fn ground(&mut self, question: &str, mentions: &[Mention]) -> SeshatResult<GroundingContext> {
        let mut facts: Vec<Fact> = Vec::new();
        for mention in mentions {
            facts.extend(self.retriever.facts_for(mention));
        }
        debug!(
            mentions = mentions.len(),
            facts = facts.len(),
            "gathered facts"
        );

        let ranked = self.ranker.rank(question, &verbalize(&facts))?;
        let facts = ranked
            .into_iter()
            .take(self.fact_budget)
            .map(|r| r.text)
            .collect();

        Ok(GroundingContext {
            question: question.to_string(),
            facts,
        })
    }

    /// The retrieval half, for cache checkpoints and direct fact access.
    pub fn retriever(&self) -> &FactRetriever<A> {
        &self.retriever
    }

    /// Mutable retrieval access.
    pub fn retriever_mut(&mut self) -> &mut FactRetriever<A> {
        &mut self.retriever
    }

    /// The ranking half.
    pub fn ranker(&self) -> &RelevanceRanker<E> {
        &self.ranker
    }
}
