//! Persistent result cache backed by a JSON file.
//!
//! The cache remembers label→QID resolutions and per-entity fact lists
//! across runs so repeated questions about the same entities never hit the
//! network twice. Presence of a key means "previously computed, reuse
//! without a network call". Entries are never refreshed automatically, so
//! the cache can go stale relative to the live graph.
//!
//! Mutations happen in memory; [`ResultCache::persist`] is the explicit,
//! caller-triggered flush. A crash between mutation and flush loses only
//! that run's additions. Single-writer, single-process: concurrent
//! processes sharing one cache file need external coordination.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::wikidata::Fact;

/// Bump when the on-disk layout changes. A file with a different version
/// is discarded on load rather than misread.
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    labels: HashMap<String, String>,
    facts: HashMap<String, Vec<Fact>>,
}

/// On-disk cache of QID resolutions and extracted facts.
#[derive(Debug)]
pub struct ResultCache {
    path: PathBuf,
    labels: HashMap<String, String>,
    facts: HashMap<String, Vec<Fact>>,
}

impl ResultCache {
    /// Open a cache at the given path.
    ///
    /// A missing file yields an empty cache, not an error. A file written
    /// by a different schema version is discarded with a warning and the
    /// cache starts empty; the stale file stays on disk until the next
    /// [`persist`](ResultCache::persist) overwrites it.
    pub fn load(path: impl Into<PathBuf>) -> CacheResult<Self> {
        let path = path.into();

        if !path.exists() {
            debug!(path = %path.display(), "no cache file, starting empty");
            return Ok(Self::empty(path));
        }

        let data = std::fs::read_to_string(&path).map_err(|e| CacheError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let file: CacheFile =
            serde_json::from_str(&data).map_err(|e| CacheError::Serialization {
                message: format!("parse {}: {e}", path.display()),
            })?;

        if file.version != SCHEMA_VERSION {
            warn!(
                found = file.version,
                expected = SCHEMA_VERSION,
                "cache schema version mismatch, discarding contents"
            );
            return Ok(Self::empty(path));
        }

        debug!(
            labels = file.labels.len(),
            entities = file.facts.len(),
            "loaded cache"
        );
        Ok(Self {
            path,
            labels: file.labels,
            facts: file.facts,
        })
    }

    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            labels: HashMap::new(),
            facts: HashMap::new(),
        }
    }

    /// Look up a previously resolved QID for a label.
    pub fn qid_for(&self, label: &str) -> Option<&str> {
        self.labels.get(label).map(String::as_str)
    }

    /// Look up previously extracted facts for a QID.
    pub fn facts(&self, qid: &str) -> Option<&[Fact]> {
        self.facts.get(qid).map(Vec::as_slice)
    }

    /// Record the fact list for a QID, overwriting any prior entry.
    pub fn record_facts(&mut self, qid: impl Into<String>, facts: Vec<Fact>) {
        self.facts.insert(qid.into(), facts);
    }

    /// Merge discovered label→QID mappings. Empty input is a no-op.
    pub fn record_labels(&mut self, labels: HashMap<String, String>) {
        self.labels.extend(labels);
    }

    /// Number of cached label resolutions.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of entities with cached fact lists.
    pub fn entity_count(&self) -> usize {
        self.facts.len()
    }

    /// The file this cache reads from and persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the full in-memory cache to disk.
    ///
    /// Writes to a temporary sibling and renames over the target, so a
    /// crash mid-write never leaves a truncated cache file.
    pub fn persist(&self) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let file = CacheFile {
            version: SCHEMA_VERSION,
            labels: self.labels.clone(),
            facts: self.facts.clone(),
        };
        let json = serde_json::to_string(&file).map_err(|e| CacheError::Serialization {
            message: format!("serialize cache: {e}"),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| CacheError::Write {
            path: tmp.display().to_string(),
            source: e,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| CacheError::Write {
            path: self.path.display().to_string(),
            source: e,
        })?;

        debug!(
            path = %self.path.display(),
            labels = self.labels.len(),
            entities = self.facts.len(),
            "persisted cache"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fact() -> Fact {
        let mut fact = Fact::new("Inception", "cast member", "Leonardo DiCaprio");
        fact.add_qualifier("character role", "Cobb");
        fact
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = ResultCache::load(dir.path().join("cache.json")).unwrap();
        assert_eq!(cache.label_count(), 0);
        assert_eq!(cache.entity_count(), 0);
    }

    #[test]
    fn roundtrip_preserves_both_mappings() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        {
            let mut cache = ResultCache::load(&path).unwrap();
            cache.record_facts("Q25188", vec![sample_fact()]);
            cache.record_labels(HashMap::from([(
                "Inception".to_string(),
                "Q25188".to_string(),
            )]));
            cache.persist().unwrap();
        }

        let cache = ResultCache::load(&path).unwrap();
        assert_eq!(cache.qid_for("Inception").unwrap(), "Q25188");
        assert_eq!(cache.facts("Q25188").unwrap(), &[sample_fact()]);
    }

    #[test]
    fn record_facts_overwrites_prior_entry() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cache = ResultCache::load(dir.path().join("cache.json")).unwrap();

        cache.record_facts("Q1", vec![sample_fact()]);
        cache.record_facts("Q1", vec![]);
        assert!(cache.facts("Q1").unwrap().is_empty());
    }

    #[test]
    fn record_labels_merges() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cache = ResultCache::load(dir.path().join("cache.json")).unwrap();

        cache.record_labels(HashMap::from([("a".to_string(), "Q1".to_string())]));
        cache.record_labels(HashMap::new());
        cache.record_labels(HashMap::from([("b".to_string(), "Q2".to_string())]));
        assert_eq!(cache.label_count(), 2);
        assert_eq!(cache.qid_for("b").unwrap(), "Q2");
    }

    #[test]
    fn version_mismatch_discards_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            r#"{"version":99,"labels":{"x":"Q1"},"facts":{}}"#,
        )
        .unwrap();

        let cache = ResultCache::load(&path).unwrap();
        assert_eq!(cache.label_count(), 0);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json at all").unwrap();

        let err = ResultCache::load(&path).unwrap_err();
        assert!(matches!(err, CacheError::Serialization { .. }));
    }

    #[test]
    fn persist_leaves_no_temp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let cache = ResultCache::load(&path).unwrap();
        cache.persist().unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
