//! Local, TTL-bounded persistence of in-progress layout edits.
//!
//! Drafts are a best-effort convenience: they survive a closed tab or a
//! crashed session, but losing one never loses server-side data. Every
//! storage failure is therefore logged and swallowed — a broken draft
//! store must never block editing.
//!
//! A draft is rejected (and deleted) on load when its format version,
//! layout schema version, or age says it can no longer be trusted.
//! Unsupported versions are discarded, never migrated.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::layout::{LayoutConfig, LAYOUT_SCHEMA_VERSION};
use crate::types::{DbId, EntityType, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Version of the draft envelope itself. Bumped when the envelope shape
/// changes; a mismatch discards the draft.
pub const DRAFT_FORMAT_VERSION: u32 = 3;

/// Drafts older than this are discarded on load.
pub const DRAFT_TTL_DAYS: i64 = 7;

/// Prefix shared by all draft storage keys.
pub const DRAFT_KEY_PREFIX: &str = "coldwatch.layout-draft";

// ---------------------------------------------------------------------------
// Draft records
// ---------------------------------------------------------------------------

/// Composite key identifying one draft: which layout of which entity,
/// for which user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftKey {
    pub entity_type: EntityType,
    pub entity_id: DbId,
    pub layout_id: DbId,
    pub user_id: DbId,
}

impl DraftKey {
    /// The string key used in the underlying storage.
    ///
    /// No component may contain `_`; the file-backed storage relies on
    /// that to map keys to file names losslessly.
    pub fn storage_key(&self) -> String {
        format!(
            "{DRAFT_KEY_PREFIX}:{}:{}:{}:{}",
            self.entity_type, self.entity_id, self.layout_id, self.user_id
        )
    }
}

/// Envelope metadata checked on every load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMeta {
    pub draft_format_version: u32,
    pub schema_version: i32,
    pub entity_type: EntityType,
    pub entity_id: DbId,
    pub layout_id: DbId,
    pub user_id: DbId,
    pub updated_at: Timestamp,
}

/// The actual unsaved edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftData {
    pub config: LayoutConfig,
    pub timeline_state: serde_json::Value,
    pub widget_prefs: serde_json::Value,
}

/// A stored draft: metadata plus payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub meta: DraftMeta,
    pub data: DraftData,
}

// ---------------------------------------------------------------------------
// Storage collaborator
// ---------------------------------------------------------------------------

/// Failure writing to the underlying storage (quota, I/O). Callers of
/// the draft store never see this; it is logged and swallowed.
#[derive(Debug, thiserror::Error)]
#[error("draft storage failure: {0}")]
pub struct DraftStorageError(pub String);

/// Generic string key/value storage the draft store writes through.
pub trait DraftStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), DraftStorageError>;
    fn remove(&self, key: &str);
    /// All stored keys (used by the startup sweep).
    fn keys(&self) -> Vec<String>;
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryDraftStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl DraftStorage for MemoryDraftStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DraftStorageError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

/// File-backed storage: one JSON file per key under a data directory,
/// the server-side analogue of a browser profile's local storage.
pub struct FsDraftStorage {
    dir: PathBuf,
}

impl FsDraftStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Keys contain `:` which is awkward in file names; swap with `_`.
    /// Lossless because key components never contain `_`.
    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key.replace(':', "_")))
    }

    fn key_for(file_stem: &str) -> String {
        file_stem.replace('_', ":")
    }
}

impl DraftStorage for FsDraftStorage {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DraftStorageError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| DraftStorageError(e.to_string()))?;
        std::fs::write(self.path_for(key), value).map_err(|e| DraftStorageError(e.to_string()))
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }

    fn keys(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    Some(Self::key_for(path.file_stem()?.to_str()?))
                } else {
                    None
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Draft store
// ---------------------------------------------------------------------------

/// Versioned, TTL-bounded draft persistence over a [`DraftStorage`].
pub struct DraftStore<S: DraftStorage> {
    storage: S,
}

impl<S: DraftStorage> DraftStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Write (or overwrite) the draft for `key`. Best-effort: a storage
    /// failure is logged and otherwise ignored.
    pub fn save(&self, key: &DraftKey, data: DraftData) {
        let draft = Draft {
            meta: DraftMeta {
                draft_format_version: DRAFT_FORMAT_VERSION,
                schema_version: LAYOUT_SCHEMA_VERSION,
                entity_type: key.entity_type,
                entity_id: key.entity_id,
                layout_id: key.layout_id,
                user_id: key.user_id,
                updated_at: Utc::now(),
            },
            data,
        };

        let json = match serde_json::to_string(&draft) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Draft serialization failed, skipping save");
                return;
            }
        };
        if let Err(e) = self.storage.set(&key.storage_key(), &json) {
            tracing::warn!(error = %e, key = %key.storage_key(), "Draft save failed");
        }
    }

    /// Load the draft for `key`, or `None` if absent, corrupt, from a
    /// different format/schema version, or expired. Anything
    /// unloadable is deleted on the way out.
    pub fn load(&self, key: &DraftKey) -> Option<Draft> {
        self.load_at(key, Utc::now())
    }

    fn load_at(&self, key: &DraftKey, now: Timestamp) -> Option<Draft> {
        let storage_key = key.storage_key();
        let raw = self.storage.get(&storage_key)?;

        let draft = match serde_json::from_str::<Draft>(&raw) {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Corrupt draft discarded");
                self.storage.remove(&storage_key);
                return None;
            }
        };

        if let Some(reason) = rejection_reason(&draft.meta, now) {
            tracing::debug!(key = %storage_key, reason, "Stale draft discarded");
            self.storage.remove(&storage_key);
            return None;
        }

        Some(draft)
    }

    /// Delete the draft for `key`, if any.
    pub fn clear(&self, key: &DraftKey) {
        self.storage.remove(&key.storage_key());
    }

    /// True if a loadable draft exists for `key`.
    pub fn exists(&self, key: &DraftKey) -> bool {
        self.load(key).is_some()
    }

    /// True when the draft should win a draft-vs-server prompt: the
    /// server copy is missing a timestamp or is older than the draft.
    pub fn is_newer_than_server(draft: &Draft, server_updated_at: Option<Timestamp>) -> bool {
        match server_updated_at {
            None => true,
            Some(server) => draft.meta.updated_at > server,
        }
    }

    /// Delete every stored draft that [`DraftStore::load`] would reject.
    /// Intended to run once at process start. Returns how many were
    /// removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;

        for storage_key in self.storage.keys() {
            if !storage_key.starts_with(DRAFT_KEY_PREFIX) {
                continue;
            }
            let keep = self
                .storage
                .get(&storage_key)
                .and_then(|raw| serde_json::from_str::<Draft>(&raw).ok())
                .is_some_and(|draft| rejection_reason(&draft.meta, now).is_none());
            if !keep {
                self.storage.remove(&storage_key);
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Swept expired layout drafts");
        }
        removed
    }
}

/// Why a draft must be discarded, or `None` if it is still good.
fn rejection_reason(meta: &DraftMeta, now: Timestamp) -> Option<&'static str> {
    if meta.draft_format_version != DRAFT_FORMAT_VERSION {
        return Some("draft format version mismatch");
    }
    if meta.schema_version != LAYOUT_SCHEMA_VERSION {
        return Some("layout schema version mismatch");
    }
    if now - meta.updated_at > chrono::Duration::days(DRAFT_TTL_DAYS) {
        return Some("draft expired");
    }
    None
}
