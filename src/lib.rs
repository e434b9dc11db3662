//! # seshat
//!
//! Knowledge-graph grounding for LLM prompts: retrieve structured facts
//! about the entities in a question from Wikidata, verbalize them, rank
//! them by semantic relevance, and assemble a grounding context.
//!
//! ## Architecture
//!
//! - **Fact extraction** (`wikidata`): entity resolution, statement and
//!   qualifier decoding against the live Wikidata HTTP API
//! - **Result cache** (`cache`): on-disk label→QID and per-entity fact
//!   storage, explicit flush
//! - **Relevance ranking** (`rank`): shared-embedding-space similarity via
//!   local ONNX sentence-embedding models
//! - **Batching** (`batch`): relation-grouped, bounded verbalization batches
//! - **Pipeline** (`pipeline`): cache-aware retrieval glued to ranking
//! - **Prompt assembly** (`prompt`): grounding context → chat messages
//!
//! ## Library usage
//!
//! ```no_run
//! use seshat::config::RetrieverConfig;
//! use seshat::pipeline::{GroundingPipeline, Mention};
//!
//! let config = RetrieverConfig::default();
//! let mut pipeline = GroundingPipeline::from_config(&config).unwrap();
//! let context = pipeline
//!     .ground(
//!         "Who directed Inception?",
//!         &[Mention::Label("Inception".into())],
//!     )
//!     .unwrap();
//! for fact in &context.facts {
//!     println!("{fact}");
//! }
//! pipeline.retriever().save_cache().unwrap();
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod rank;
pub mod wikidata;
