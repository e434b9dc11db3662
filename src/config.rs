//! Retriever configuration with TOML file loading.
//!
//! Every field has a default, so a config file only needs to mention what
//! it changes. The default cache location follows the XDG Base Directory
//! Specification with the usual env-var fallbacks.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::{ConfigError, ConfigResult};

/// Configuration for the grounding retriever.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// MediaWiki action API base (label search).
    pub api_url: String,
    /// EntityData base; `/{id}.json` is appended per request.
    pub entity_data_url: String,
    /// HTTP timeout per request, in seconds.
    pub timeout_secs: u64,
    /// Cache file location.
    pub cache_path: PathBuf,
    /// Budget for relation-grouped verbalization batches.
    pub batch_size: usize,
    /// How many ranked facts the grounding context keeps.
    pub fact_budget: usize,
    /// Sentence-embedding model name.
    pub embedding_model: String,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            api_url: "https://www.wikidata.org/w/api.php".into(),
            entity_data_url: "https://www.wikidata.org/wiki/Special:EntityData".into(),
            timeout_secs: 10,
            cache_path: default_cache_path(),
            batch_size: DEFAULT_BATCH_SIZE,
            fact_budget: 10,
            embedding_model: "all-MiniLM-L6-v2".into(),
        }
    }
}

impl RetrieverConfig {
    /// Load from a TOML file. Missing fields take their defaults.
    pub fn load(path: &std::path::Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// `$XDG_CACHE_HOME/seshat/wikidata.json`, falling back to
/// `~/.cache/seshat/wikidata.json`, or the working directory when no home
/// can be determined.
pub fn default_cache_path() -> PathBuf {
    let base = std::env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .unwrap_or_else(|_| PathBuf::from("."));
    base.join("seshat").join("wikidata.json")
}
