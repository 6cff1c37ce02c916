use thiserror::Error;

use crate::core::task::{TaskId, TaskStatus};
use crate::engine::history::HistoryAction;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Task not found: {id}")]
    TaskNotFound { id: TaskId },

    #[error("Cannot {action} task {task} from status {from}")]
    InvalidTransition {
        task: TaskId,
        from: TaskStatus,
        action: HistoryAction,
    },

    #[error("Dependency cycle detected at task {id}")]
    DependencyCycle { id: TaskId },

    #[error("State snapshot at {path} is corrupt and no usable backup exists: {detail}")]
    CorruptSnapshot { path: String, detail: String },

    #[error("State snapshot has version {found}, expected {expected}")]
    UnsupportedStateVersion { found: u32, expected: u32 },

    #[error("Catalogue error: {0}")]
    Catalog(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
