//! seshat CLI: knowledge-graph grounding for LLM prompts.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use seshat::batch::FactBatches;
use seshat::cache::ResultCache;
use seshat::config::RetrieverConfig;
use seshat::pipeline::{FactRetriever, GroundingPipeline, Mention};
use seshat::prompt::PromptTemplate;
use seshat::wikidata::client::{HttpWikidataApi, WikidataClient, WikidataEndpoints};

#[derive(Parser)]
#[command(name = "seshat", version, about = "Knowledge-graph grounding for LLM prompts")]
struct Cli {
    /// Config file (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache file location (overrides the config).
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ground a question and print the assembled prompt.
    Ask {
        /// The question to ground.
        question: String,

        /// Entity mentions from the question (comma-separated labels,
        /// e.g. "Inception,Christopher Nolan").
        #[arg(long)]
        entities: String,

        /// Treat the mentions as QIDs instead of labels.
        #[arg(long)]
        ids: bool,

        /// How many ranked facts to keep (overrides the config).
        #[arg(long)]
        top_k: Option<usize>,

        /// Prompt template file (TOML); built-in template when omitted.
        #[arg(long)]
        template: Option<PathBuf>,

        /// Include the template's few-shot examples.
        #[arg(long)]
        few_shot: bool,

        /// Print the messages as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// Extract and print all facts for one entity.
    Entity {
        /// Entity label, or QID with --id.
        entity: String,

        /// Treat the argument as a QID.
        #[arg(long)]
        id: bool,

        /// Print in relation-grouped batches (size comes from the config's
        /// batch_size).
        #[arg(long)]
        batches: bool,
    },

    /// Print an entity's short description.
    Describe {
        /// Entity label, or QID with --id.
        entity: String,

        /// Treat the argument as a QID.
        #[arg(long)]
        id: bool,
    },

    /// Inspect the result cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry counts and the cache location.
    Stats,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RetrieverConfig::load(path).into_diagnostic()?,
        None => RetrieverConfig::default(),
    };
    if let Some(cache) = &cli.cache {
        config.cache_path = cache.clone();
    }

    match cli.command {
        Commands::Ask {
            question,
            entities,
            ids,
            top_k,
            template,
            few_shot,
            json,
        } => {
            if let Some(top_k) = top_k {
                config.fact_budget = top_k;
            }

            let mentions: Vec<Mention> = entities
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    if ids {
                        Mention::Id(s.to_string())
                    } else {
                        Mention::Label(s.to_string())
                    }
                })
                .collect();
            if mentions.is_empty() {
                miette::bail!("no entity mentions provided");
            }

            let template = match template {
                Some(path) => PromptTemplate::load(&path).into_diagnostic()?,
                None => PromptTemplate::knowledge_qa(),
            };

            let mut pipeline = GroundingPipeline::from_config(&config).into_diagnostic()?;
            let context = pipeline.ground(&question, &mentions).into_diagnostic()?;
            pipeline.retriever().save_cache().into_diagnostic()?;

            let messages = template.render(&context, few_shot);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&messages).into_diagnostic()?
                );
            } else {
                for message in &messages {
                    println!("[{}]", message.role);
                    println!("{}\n", message.content);
                }
            }
        }

        Commands::Entity { entity, id, batches } => {
            let mut retriever = build_retriever(&config).into_diagnostic()?;
            let mention = if id {
                Mention::Id(entity.clone())
            } else {
                Mention::Label(entity.clone())
            };

            let facts = retriever.facts_for(&mention);
            retriever.save_cache().into_diagnostic()?;

            if facts.is_empty() {
                println!("No facts found for \"{entity}\".");
            } else if batches {
                for (i, batch) in FactBatches::new(&facts, config.batch_size).enumerate() {
                    println!("batch {} ({} facts):", i + 1, batch.len());
                    for line in batch {
                        println!("  {line}");
                    }
                }
            } else {
                println!("Facts for \"{entity}\" ({}):", facts.len());
                for fact in &facts {
                    println!("  {fact}");
                }
            }
        }

        Commands::Describe { entity, id } => {
            let retriever = build_retriever(&config).into_diagnostic()?;
            let client = retriever.client();

            let qid = if id {
                Some(entity.clone())
            } else {
                client.resolve_label(&entity)
            };

            match qid.and_then(|qid| client.describe(&qid)) {
                Some(description) => println!("{description}"),
                None => println!("No description found for \"{entity}\"."),
            }
        }

        Commands::Cache { action } => match action {
            CacheAction::Stats => {
                let cache = ResultCache::load(&config.cache_path).into_diagnostic()?;
                println!("Cache at {}", cache.path().display());
                println!("  labels:   {}", cache.label_count());
                println!("  entities: {}", cache.entity_count());
            }
        },
    }

    Ok(())
}

/// Build the cache-backed retriever without the embedding model, for
/// commands that never rank.
fn build_retriever(
    config: &RetrieverConfig,
) -> seshat::error::SeshatResult<FactRetriever<HttpWikidataApi>> {
    let endpoints = WikidataEndpoints {
        api_url: config.api_url.clone(),
        entity_data_url: config.entity_data_url.clone(),
        timeout_secs: config.timeout_secs,
    };
    let client = WikidataClient::new(HttpWikidataApi::new(endpoints));
    let cache = ResultCache::load(&config.cache_path)?;
    Ok(FactRetriever::new(client, cache))
}
