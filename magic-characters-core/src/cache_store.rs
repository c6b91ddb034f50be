//! Time-bounded on-disk cache for Scryfall query results
//!
//! Every key maps to its own JSON file holding `{"timestamp": ..., "data": ...}`.
//! Entries older than the TTL are ignored on read but left on disk; the next
//! successful fetch for the same key overwrites them.

use crate::error::FinderError;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

pub const CACHE_DURATION_DAYS: i64 = 7;

lazy_static! {
    static ref UNSAFE_KEY_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_]").unwrap();
}

#[derive(Serialize, Deserialize, Debug)]
struct CachedEntry<T> {
    #[serde(rename = "timestamp", with = "time::serde::rfc3339")]
    captured_at: OffsetDateTime,
    #[serde(rename = "data")]
    payload: T,
}

/// Turn a human-readable label into a filesystem-safe cache key.
///
/// Distinct labels can collide (`"Jace, the Mind"` and `"jace  the mind"`) and
/// then share one entry.
pub fn cache_key(label: &str) -> String {
    UNSAFE_KEY_CHARS
        .replace_all(&label.to_lowercase(), "_")
        .into_owned()
}

/// An entry captured at `captured_at` is still usable at `now` while its age is within `ttl`.
pub fn is_fresh(captured_at: OffsetDateTime, now: OffsetDateTime, ttl: Duration) -> bool {
    now - captured_at <= ttl
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, FinderError> {
        Self::with_ttl(cache_dir, Duration::days(CACHE_DURATION_DAYS))
    }

    pub fn with_ttl(cache_dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self, FinderError> {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).map_err(|e| {
                FinderError::Cache(format!(
                    "Failed to create cache directory {}: {}",
                    cache_dir.display(),
                    e
                ))
            })?;
            info!(cache_dir = %cache_dir.display(), "Created cache directory");
        }

        Ok(CacheStore { cache_dir, ttl })
    }

    /// Platform cache directory, e.g. `~/.cache/magic-characters` on Linux
    pub fn default_cache_dir() -> Result<PathBuf, FinderError> {
        ProjectDirs::from("", "", "magic-characters")
            .map(|proj_dirs| proj_dirs.cache_dir().to_path_buf())
            .ok_or_else(|| FinderError::Cache("Could not determine cache directory".to_string()))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Payload stored under `key`, if present, readable and not expired.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.load_at(key, OffsetDateTime::now_utc())
    }

    fn load_at<T: DeserializeOwned>(&self, key: &str, now: OffsetDateTime) -> Option<T> {
        let path = self.entry_path(key);
        if !path.exists() {
            debug!(key = key, "No cache entry on disk");
            return None;
        }

        let entry: CachedEntry<T> = match read_entry(&path) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = key, error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        if is_fresh(entry.captured_at, now, self.ttl) {
            let age = now - entry.captured_at;
            debug!(key = key, age_hours = age.whole_hours(), "Cache entry is fresh");
            Some(entry.payload)
        } else {
            debug!(
                key = key,
                max_age_days = self.ttl.whole_days(),
                "Cache entry expired"
            );
            None
        }
    }

    /// Write `payload` under `key`, replacing whatever was stored before.
    pub fn save<T: Serialize>(&self, key: &str, payload: &T) -> Result<(), FinderError> {
        self.save_at(key, payload, OffsetDateTime::now_utc())
    }

    fn save_at<T: Serialize>(
        &self,
        key: &str,
        payload: &T,
        captured_at: OffsetDateTime,
    ) -> Result<(), FinderError> {
        let path = self.entry_path(key);
        let staging = path.with_extension("json.tmp");
        let entry = CachedEntry {
            captured_at,
            payload,
        };

        // The previous entry stays in place until the rename succeeds
        let written = write_entry(&staging, &entry).and_then(|_| {
            fs::rename(&staging, &path).map_err(|e| {
                FinderError::Cache(format!(
                    "Failed to move cache entry into place at {}: {}",
                    path.display(),
                    e
                ))
            })
        });

        if written.is_err() {
            let _ = fs::remove_file(&staging);
        } else {
            debug!(key = key, cache_file = %path.display(), "Saved cache entry");
        }
        written
    }
}

fn read_entry<T: DeserializeOwned>(path: &Path) -> Result<CachedEntry<T>, FinderError> {
    let file = File::open(path)?;
    let entry = serde_json::from_reader(BufReader::new(file))?;
    Ok(entry)
}

fn write_entry<T: Serialize>(path: &Path, entry: &CachedEntry<T>) -> Result<(), FinderError> {
    let file = File::create(path).map_err(|e| {
        FinderError::Cache(format!(
            "Failed to create cache file {}: {}",
            path.display(),
            e
        ))
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, entry)
        .map_err(|e| FinderError::Cache(format!("Failed to serialize cache entry: {}", e)))?;
    writer
        .flush()
        .map_err(|e| FinderError::Cache(format!("Failed to write cache file: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::env;

    fn create_test_store(name: &str) -> CacheStore {
        let dir = env::temp_dir().join(format!(
            "magic-characters-cache-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        CacheStore::new(dir).unwrap()
    }

    fn cleanup(store: &CacheStore) {
        let _ = fs::remove_dir_all(store.cache_dir());
    }

    #[test]
    fn test_round_trip_within_ttl() {
        let store = create_test_store("round-trip");
        let payload: BTreeSet<String> = ["Urza, Academy Headmaster", "Urza's Saga"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        store.save("references_urza", &payload).unwrap();
        let loaded: Option<BTreeSet<String>> = store.load("references_urza");
        assert_eq!(loaded, Some(payload));

        cleanup(&store);
    }

    #[test]
    fn test_missing_entry_is_absent() {
        let store = create_test_store("missing");
        let loaded: Option<Vec<String>> = store.load("nothing_here");
        assert!(loaded.is_none());
        cleanup(&store);
    }

    #[test]
    fn test_expired_entry_is_absent_but_kept_on_disk() {
        let store = create_test_store("expired");
        let captured_at = OffsetDateTime::now_utc() - Duration::days(CACHE_DURATION_DAYS + 1);
        store
            .save_at("legendary_creatures", &vec!["Urza".to_string()], captured_at)
            .unwrap();

        let loaded: Option<Vec<String>> = store.load("legendary_creatures");
        assert!(loaded.is_none());
        assert!(store.entry_path("legendary_creatures").exists());

        cleanup(&store);
    }

    #[test]
    fn test_entry_exactly_at_ttl_is_fresh() {
        let captured_at = OffsetDateTime::now_utc();
        let now = captured_at + Duration::days(CACHE_DURATION_DAYS);
        assert!(is_fresh(captured_at, now, Duration::days(CACHE_DURATION_DAYS)));
        assert!(!is_fresh(
            captured_at,
            now + Duration::seconds(1),
            Duration::days(CACHE_DURATION_DAYS)
        ));
    }

    #[test]
    fn test_save_overwrites_previous_entry() {
        let store = create_test_store("overwrite");
        store.save("planeswalker_names", &vec!["Jace"]).unwrap();
        store.save("planeswalker_names", &vec!["Chandra", "Liliana"]).unwrap();

        let loaded: Option<Vec<String>> = store.load("planeswalker_names");
        assert_eq!(
            loaded,
            Some(vec!["Chandra".to_string(), "Liliana".to_string()])
        );
        assert!(!store.entry_path("planeswalker_names").with_extension("json.tmp").exists());

        cleanup(&store);
    }

    #[test]
    fn test_malformed_entry_is_treated_as_miss() {
        let store = create_test_store("malformed");
        fs::write(store.entry_path("references_jace"), "{ not json").unwrap();

        let loaded: Option<Vec<String>> = store.load("references_jace");
        assert!(loaded.is_none());

        // Well-formed JSON with the wrong payload shape is a miss as well
        store.save("references_jace", &42).unwrap();
        let loaded: Option<Vec<String>> = store.load("references_jace");
        assert!(loaded.is_none());

        cleanup(&store);
    }

    #[test]
    fn test_on_disk_format() {
        let store = create_test_store("format");
        store.save("references_teferi", &vec!["Teferi's Protection"]).unwrap();

        let raw = fs::read_to_string(store.entry_path("references_teferi")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["timestamp"].is_string());
        assert_eq!(value["data"], serde_json::json!(["Teferi's Protection"]));

        cleanup(&store);
    }

    #[test]
    fn test_failed_write_is_surfaced() {
        let store = create_test_store("write-failure");
        fs::remove_dir_all(store.cache_dir()).unwrap();

        let result = store.save("references_urza", &vec!["Urza's Saga"]);
        assert!(matches!(result, Err(FinderError::Cache(_))));
    }

    #[test]
    fn test_cache_key_transliteration() {
        assert_eq!(cache_key("Urza"), "urza");
        assert_eq!(cache_key("Nicol Bolas"), "nicol_bolas");
        assert_eq!(cache_key("Kaya's Ghost-Form"), "kaya_s_ghost_form");
        assert_eq!(cache_key("Lim-Dûl"), "lim_d_l");
        assert_eq!(cache_key("Jace, the Mind"), cache_key("jace  the mind"));
    }
}
