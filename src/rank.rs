//! Semantic relevance ranking of verbalized facts against a question.
//!
//! Question and facts are encoded into a shared embedding space; facts come
//! back ordered by descending dot-product similarity. Vectors are
//! unit-normalized, so the dot product equals cosine similarity.
//!
//! The encoder sits behind the [`Embedder`] trait: production uses
//! [`FastEmbedder`] (local ONNX sentence-embedding models via fastembed),
//! tests substitute a deterministic fixture so no model download happens.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

use crate::error::{RankError, RankResult};

/// A verbalized fact with its similarity score to the question.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFact {
    /// The fact's rendered text.
    pub text: String,
    /// Dot-product similarity to the question, in [-1, 1].
    pub score: f32,
}

/// Encodes text into fixed-dimension unit-normalized vectors.
pub trait Embedder {
    /// Encode a batch of texts. All returned vectors share one dimension
    /// and have unit length.
    fn encode(&self, texts: &[String]) -> RankResult<Vec<Vec<f32>>>;
}

// ---------------------------------------------------------------------------
// fastembed-backed embedder
// ---------------------------------------------------------------------------

/// Local ONNX sentence embedder.
///
/// The model file is fetched from the Hugging Face hub on first use and
/// cached locally by fastembed. Encoding is a blocking, CPU-bound call;
/// the whole batch goes through in one `embed` invocation.
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    name: String,
}

impl FastEmbedder {
    /// Load a model by name.
    ///
    /// Accepts the short names listed by [`parse_model_name`], with or
    /// without their Hugging Face organization prefix.
    pub fn new(name: &str) -> RankResult<Self> {
        let model = parse_model_name(name)?;
        info!(model = name, "loading embedding model");

        let options = InitOptions::new(model).with_show_download_progress(false);
        let model = TextEmbedding::try_new(options).map_err(|e| RankError::ModelInit {
            message: format!("{name}: {e}"),
        })?;

        Ok(Self {
            model: Mutex::new(model),
            name: name.to_string(),
        })
    }

    /// The model name this embedder was created with.
    pub fn model_name(&self) -> &str {
        &self.name
    }
}

impl Embedder for FastEmbedder {
    fn encode(&self, texts: &[String]) -> RankResult<Vec<Vec<f32>>> {
        let mut model = self.model.lock().map_err(|_| RankError::Encode {
            message: "embedding model lock poisoned".into(),
        })?;
        let raw = model
            .embed(texts.to_vec(), None)
            .map_err(|e| RankError::Encode {
                message: e.to_string(),
            })?;

        // Re-normalize: the dot-product ranking assumes unit vectors no
        // matter which model the user configured.
        Ok(raw.into_iter().map(unit_normalize).collect())
    }
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model", &self.name)
            .finish()
    }
}

/// Map a model name to its fastembed identifier.
pub fn parse_model_name(name: &str) -> RankResult<EmbeddingModel> {
    let short = name.rsplit('/').next().unwrap_or(name);
    match short {
        "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "all-MiniLM-L12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "paraphrase-multilingual-mpnet-base-v2" => Ok(EmbeddingModel::ParaphraseMLMpnetBaseV2),
        "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
        _ => Err(RankError::UnknownModel { name: name.into() }),
    }
}

fn unit_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

// ---------------------------------------------------------------------------
// Ranker
// ---------------------------------------------------------------------------

/// Ranks verbalized facts by similarity to a question.
pub struct RelevanceRanker<E: Embedder> {
    embedder: E,
}

impl<E: Embedder> RelevanceRanker<E> {
    /// Wrap an embedder.
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    /// The underlying embedder.
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Rank `facts` by descending similarity to `question`.
    ///
    /// Ties keep their input order (the sort is stable), so repeated calls
    /// with a fixed model and fixed inputs return identical orderings.
    /// An empty fact list returns empty without touching the embedder.
    pub fn rank(&self, question: &str, facts: &[String]) -> RankResult<Vec<RankedFact>> {
        if facts.is_empty() {
            return Ok(Vec::new());
        }

        let question_vec = self
            .embedder
            .encode(std::slice::from_ref(&question.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| RankError::Encode {
                message: "embedder returned no vector for the question".into(),
            })?;
        let fact_vecs = self.embedder.encode(facts)?;

        let mut ranked: Vec<RankedFact> = facts
            .iter()
            .zip(&fact_vecs)
            .map(|(text, vec)| RankedFact {
                text: text.clone(),
                score: dot(&question_vec, vec),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(facts = ranked.len(), "ranked facts");
        Ok(ranked)
    }
}

impl<E: Embedder> std::fmt::Debug for RelevanceRanker<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelevanceRanker").finish()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
