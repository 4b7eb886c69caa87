//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use excerpt_core::config::DEFAULT_DB_FILE_NAME;
use excerpt_core::default_log_level;
use std::path::PathBuf;

/// excerpt - keep titled paragraphs in collections, tag them, and export
/// the library as one cross-linked markdown document.
///
/// ```bash
/// excerpt init
/// excerpt add-collection Physics
/// excerpt add-tag "Thermo Dynamics"
/// excerpt add-paragraph --collection 1 --title Entropy --tag 1
/// excerpt generate --output notes.md
/// ```
#[derive(Debug, Parser)]
#[command(name = "excerpt", version)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "EXCERPT_DB", default_value = DEFAULT_DB_FILE_NAME)]
    pub db: PathBuf,

    /// Log level (trace|debug|info|warn|error); defaults to warn, or to the
    /// build default when logging to --log-dir
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Write rotated log files to this absolute directory instead of stderr
    #[arg(long, global = true, env = "EXCERPT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Editor command (falls back to $VISUAL, $EDITOR, then nano)
    #[arg(long, global = true, env = "EXCERPT_EDITOR")]
    pub editor: Option<String>,

    /// Fail when a tag with the same normalized name already exists
    #[arg(long, global = true)]
    pub strict_tags: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database and apply migrations
    Init,

    /// Add a new collection
    AddCollection {
        /// Collection name
        name: String,
    },

    /// List active collections
    ListCollections,

    /// Add a new tag
    AddTag {
        /// Tag name (normalized to a slug)
        name: String,

        /// Display text (defaults to the name as typed)
        #[arg(long)]
        description: Option<String>,
    },

    /// List active tags
    ListTags,

    /// Add a new paragraph
    AddParagraph(AddParagraphArgs),

    /// Print one paragraph
    ShowParagraph {
        /// Paragraph id
        id: i64,
    },

    /// Change title, content or tags of a paragraph
    UpdateParagraph(UpdateParagraphArgs),

    /// Edit paragraph content in the configured editor
    EditParagraph {
        /// Paragraph id
        id: i64,
    },

    /// Delete a paragraph
    DeleteParagraph {
        /// Paragraph id
        id: i64,
    },

    /// Generate the markdown document
    Generate {
        /// Only export this collection
        #[arg(long)]
        collection: Option<i64>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct AddParagraphArgs {
    /// Owning collection id
    #[arg(long)]
    pub collection: i64,

    /// Paragraph title
    #[arg(long)]
    pub title: String,

    /// Paragraph content; opens the editor when omitted
    #[arg(long)]
    pub content: Option<String>,

    /// Tag id (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<i64>,
}

#[derive(Debug, Args)]
pub struct UpdateParagraphArgs {
    /// Paragraph id
    pub id: i64,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New content
    #[arg(long)]
    pub content: Option<String>,

    /// Replacement tag id (repeatable)
    #[arg(long = "tag", conflicts_with = "clear_tags")]
    pub tags: Vec<i64>,

    /// Remove every tag
    #[arg(long)]
    pub clear_tags: bool,
}

impl Cli {
    /// Explicit level, else `warn` for stderr and the build default for files.
    pub fn effective_log_level(&self) -> &str {
        match (&self.log_level, &self.log_dir) {
            (Some(level), _) => level.as_str(),
            (None, Some(_)) => default_log_level(),
            (None, None) => "warn",
        }
    }
}

impl UpdateParagraphArgs {
    /// `None` keeps the current tags.
    pub fn tag_ids(&self) -> Option<Vec<i64>> {
        if self.clear_tags {
            Some(Vec::new())
        } else if self.tags.is_empty() {
            None
        } else {
            Some(self.tags.clone())
        }
    }
}
