//! Snapshot persistence behind an injectable interface.
//!
//! `JsonFileStore` is the durable implementation: one JSON document per
//! orchestrator instance, written atomically (temp file + rename) with a
//! `.bak` copy of the previous snapshot. A snapshot that fails to parse is
//! an error distinct from "no snapshot yet"; the backup is tried first.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::state::{OrchestratorState, STATE_VERSION};
use crate::{clog_debug, clog_warn};

/// Durable storage for the orchestrator snapshot.
pub trait StateStore {
    /// Load the snapshot. `Ok(None)` means no snapshot exists yet; parse
    /// failures are errors, never silently treated as absent.
    fn load(&self) -> Result<Option<OrchestratorState>>;

    /// Overwrite the snapshot with the given state.
    fn save(&self, state: &OrchestratorState) -> Result<()>;
}

/// File-backed store writing one JSON document.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.bak")
    }

    fn parse(contents: &str) -> Result<OrchestratorState> {
        let state: OrchestratorState = serde_json::from_str(contents)?;
        if state.version != STATE_VERSION {
            return Err(Error::UnsupportedStateVersion {
                found: state.version,
                expected: STATE_VERSION,
            });
        }
        Ok(state)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<OrchestratorState>> {
        clog_debug!("JsonFileStore::load path={}", self.path.display());

        if !self.path.exists() {
            clog_debug!("No snapshot found, starting fresh");
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        match Self::parse(&contents) {
            Ok(state) => Ok(Some(state)),
            Err(Error::UnsupportedStateVersion { found, expected }) => {
                Err(Error::UnsupportedStateVersion { found, expected })
            }
            Err(primary) => {
                // Corrupt main snapshot; try the backup before giving up.
                let backup = self.backup_path();
                if backup.exists() {
                    clog_warn!(
                        "Snapshot {} is corrupt, trying backup {}",
                        self.path.display(),
                        backup.display()
                    );
                    if let Ok(state) = fs::read_to_string(&backup)
                        .map_err(Error::from)
                        .and_then(|c| Self::parse(&c))
                    {
                        return Ok(Some(state));
                    }
                }
                Err(Error::CorruptSnapshot {
                    path: self.path.display().to_string(),
                    detail: primary.to_string(),
                })
            }
        }
    }

    fn save(&self, state: &OrchestratorState) -> Result<()> {
        clog_debug!(
            "JsonFileStore::save path={} tasks={}",
            self.path.display(),
            state.tasks.len()
        );

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        if self.path.exists() {
            fs::copy(&self.path, self.backup_path())?;
        }

        let contents = serde_json::to_string_pretty(state)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &contents)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// In-memory store for tests. Clones of one store share the same slot.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<OrchestratorState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks in the currently saved snapshot, if any.
    pub fn saved_task_count(&self) -> Option<usize> {
        self.slot.lock().unwrap().as_ref().map(|s| s.tasks.len())
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<OrchestratorState>> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn save(&self, state: &OrchestratorState) -> Result<()> {
        *self.slot.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}
