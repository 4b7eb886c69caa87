//! Library configuration.
//!
//! Values are plain data; callers (CLI flags, environment) fill them in.
//! Nothing here reads the environment on its own.

use crate::db::FileConnectionProvider;
use crate::editor::EditorProgram;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Database file used when no path is configured.
pub const DEFAULT_DB_FILE_NAME: &str = "paragraphs.db";

/// Behavior of tag creation when the normalized name already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTagPolicy {
    /// Return the existing tag unchanged.
    #[default]
    Absorb,
    /// Fail with a conflict error.
    Reject,
}

/// Settings shared by every entry point into the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    #[serde(default)]
    pub duplicate_tags: DuplicateTagPolicy,
    /// Program used for interactive content editing.
    #[serde(default)]
    pub editor: EditorProgram,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            duplicate_tags: DuplicateTagPolicy::default(),
            editor: EditorProgram::default(),
        }
    }
}

impl LibraryConfig {
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    pub fn with_duplicate_tags(mut self, policy: DuplicateTagPolicy) -> Self {
        self.duplicate_tags = policy;
        self
    }

    pub fn with_editor(mut self, editor: EditorProgram) -> Self {
        self.editor = editor;
        self
    }

    /// Connection provider for the configured database file.
    pub fn connection_provider(&self) -> FileConnectionProvider {
        FileConnectionProvider::new(self.db_path.clone())
    }
}
