//! Block cursor persistence
//!
//! The last safely-processed block number is the watcher's only durable
//! state. It is written atomically (temp file + rename) after each processed
//! range; a crash between processing and saving re-processes an
//! already-confirmed range, which is safe. A save failure is the one fatal
//! error class: progressing without durability risks unbounded reprocessing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default path for the cursor state file
pub const DEFAULT_CURSOR_PATH: &str = "./state.json";

#[derive(Debug, Serialize, Deserialize)]
struct CursorState {
    last_block: u64,
}

/// Errors that can occur while saving the cursor
#[derive(Debug)]
pub enum CursorError {
    /// Failed to serialize cursor state
    SerializeError { reason: String },
    /// Failed to create or write the temporary file
    TempFileError { path: String, reason: String },
    /// Failed to rename the temporary file into place
    RenameError { from: String, to: String, reason: String },
}

impl std::fmt::Display for CursorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CursorError::SerializeError { reason } => {
                write!(f, "Failed to serialize cursor state: {}", reason)
            }
            CursorError::TempFileError { path, reason } => {
                write!(f, "Failed to write temp file '{}': {}", path, reason)
            }
            CursorError::RenameError { from, to, reason } => {
                write!(f, "Failed to rename '{}' to '{}': {}", from, to, reason)
            }
        }
    }
}

impl std::error::Error for CursorError {}

/// Loads and saves the last-processed block number
#[derive(Debug)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    /// Create a new cursor store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the cursor file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last-processed block number.
    ///
    /// Returns `None` on first run (no state file). An unreadable or corrupt
    /// file is logged and treated as a first run rather than an error.
    pub fn load(&self) -> Option<u64> {
        if !self.path.exists() {
            return None;
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cursor state unreadable, starting fresh");
                return None;
            }
        };

        match serde_json::from_str::<CursorState>(&contents) {
            Ok(state) => Some(state.last_block),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cursor state corrupted, starting fresh");
                None
            }
        }
    }

    /// Save the last-processed block number atomically.
    ///
    /// Uses write-to-temp-then-rename to prevent corruption.
    pub fn save(&self, last_block: u64) -> Result<(), CursorError> {
        use std::io::Write;

        let json = serde_json::to_string_pretty(&CursorState { last_block }).map_err(|e| {
            CursorError::SerializeError {
                reason: e.to_string(),
            }
        })?;

        let temp_path = self.path.with_extension("json.tmp");

        let mut file =
            std::fs::File::create(&temp_path).map_err(|e| CursorError::TempFileError {
                path: temp_path.display().to_string(),
                reason: e.to_string(),
            })?;

        file.write_all(json.as_bytes())
            .map_err(|e| CursorError::TempFileError {
                path: temp_path.display().to_string(),
                reason: e.to_string(),
            })?;

        file.sync_all().map_err(|e| CursorError::TempFileError {
            path: temp_path.display().to_string(),
            reason: format!("Failed to sync file: {}", e),
        })?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| CursorError::RenameError {
            from: temp_path.display().to_string(),
            to: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}
