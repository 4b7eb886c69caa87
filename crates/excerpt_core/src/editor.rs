//! Interactive free-text editing through an external program.
//!
//! # Responsibility
//! - Hand existing text to an editor and return the saved result.
//! - Report a missing program or an abnormal exit as errors.
//!
//! # Invariants
//! - The temp file is removed on every exit path.
//! - Edited text is returned as saved; no trimming happens here.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::process::Command;

/// Collaborator that lets a person edit a piece of text.
pub trait TextEditor {
    /// Opens `initial` for editing and returns the final text.
    fn edit(&self, initial: &str) -> Result<String, EditorError>;
}

/// Editor program selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorProgram {
    #[default]
    Nano,
    Vim,
    Notepad,
    /// Command line such as `code --wait`; the file path is appended.
    Custom(String),
}

impl EditorProgram {
    /// Picks `$VISUAL`, then `$EDITOR`, else nano.
    pub fn from_env() -> Self {
        ["VISUAL", "EDITOR"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.trim().is_empty())
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    /// Maps well-known program names to variants, anything else to `Custom`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "nano" => Self::Nano,
            "vim" => Self::Vim,
            "notepad" => Self::Notepad,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Program name and leading arguments.
    fn command_line(&self) -> (String, Vec<String>) {
        match self {
            Self::Nano => ("nano".to_string(), Vec::new()),
            Self::Vim => ("vim".to_string(), Vec::new()),
            Self::Notepad => ("notepad".to_string(), Vec::new()),
            Self::Custom(line) => {
                let mut parts = line.split_whitespace().map(str::to_string);
                let program = parts.next().unwrap_or_default();
                (program, parts.collect())
            }
        }
    }
}

impl Display for EditorProgram {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom(line) => f.write_str(line),
            other => f.write_str(&other.command_line().0),
        }
    }
}

/// Failure of an editing session.
#[derive(Debug)]
pub enum EditorError {
    /// The program could not be started (not installed / not in `PATH`).
    Unavailable(String),
    /// The program exited unsuccessfully. `None` when killed by a signal.
    ExitStatus(Option<i32>),
    /// Temp file could not be written or read back.
    Io(std::io::Error),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(program) => write!(
                f,
                "editor `{program}` not found; make sure it is installed and in PATH"
            ),
            Self::ExitStatus(Some(code)) => write!(f, "editor exited with status {code}"),
            Self::ExitStatus(None) => write!(f, "editor was terminated by a signal"),
            Self::Io(err) => write!(f, "editor temp file error: {err}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EditorError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// [`TextEditor`] backed by an external program and a temp file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEditor {
    program: EditorProgram,
}

impl ExternalEditor {
    pub fn new(program: EditorProgram) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &EditorProgram {
        &self.program
    }
}

impl TextEditor for ExternalEditor {
    fn edit(&self, initial: &str) -> Result<String, EditorError> {
        let (program, args) = self.program.command_line();
        if program.is_empty() {
            return Err(EditorError::Unavailable(self.program.to_string()));
        }

        let mut file = tempfile::Builder::new()
            .prefix("excerpt-")
            .suffix(".md")
            .tempfile()?;
        file.write_all(initial.as_bytes())?;
        file.flush()?;
        // Close our handle so the editor may replace the file; the path is
        // still removed when `path` drops.
        let path = file.into_temp_path();

        debug!("event=editor_open module=editor status=start program={program}");
        let status = Command::new(&program)
            .args(&args)
            .arg(path.as_os_str())
            .status()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    EditorError::Unavailable(program.clone())
                } else {
                    EditorError::Io(err)
                }
            })?;

        if !status.success() {
            warn!(
                "event=editor_open module=editor status=error program={program} exit_code={:?}",
                status.code()
            );
            return Err(EditorError::ExitStatus(status.code()));
        }

        let edited = std::fs::read_to_string(&*path)?;
        debug!(
            "event=editor_open module=editor status=ok program={program} bytes={}",
            edited.len()
        );
        Ok(edited)
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorError, EditorProgram, ExternalEditor, TextEditor};

    #[test]
    fn parse_maps_known_programs() {
        assert_eq!(EditorProgram::parse("vim"), EditorProgram::Vim);
        assert_eq!(EditorProgram::parse(" nano "), EditorProgram::Nano);
        assert_eq!(
            EditorProgram::parse("code --wait"),
            EditorProgram::Custom("code --wait".to_string())
        );
    }

    #[test]
    fn display_shows_command() {
        assert_eq!(EditorProgram::Notepad.to_string(), "notepad");
        assert_eq!(
            EditorProgram::Custom("code --wait".to_string()).to_string(),
            "code --wait"
        );
    }

    #[test]
    fn missing_program_is_unavailable() {
        let editor = ExternalEditor::new(EditorProgram::Custom(
            "excerpt-editor-that-does-not-exist".to_string(),
        ));
        let err = editor.edit("text").unwrap_err();
        assert!(matches!(err, EditorError::Unavailable(program) if program == "excerpt-editor-that-does-not-exist"));
    }

    #[test]
    fn blank_custom_command_is_unavailable() {
        let editor = ExternalEditor::new(EditorProgram::Custom("   ".to_string()));
        assert!(matches!(
            editor.edit("text"),
            Err(EditorError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn untouched_file_returns_initial_text() {
        let editor = ExternalEditor::new(EditorProgram::Custom("true".to_string()));
        let edited = editor.edit("line one\nline two\n").unwrap();
        assert_eq!(edited, "line one\nline two\n");
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_exit_status() {
        let editor = ExternalEditor::new(EditorProgram::Custom("false".to_string()));
        let err = editor.edit("text").unwrap_err();
        assert!(matches!(err, EditorError::ExitStatus(Some(1))));
    }

    #[cfg(unix)]
    #[test]
    fn saved_changes_are_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake_editor.sh");
        std::fs::write(&script, "printf 'rewritten body' > \"$1\"\n").unwrap();

        let editor = ExternalEditor::new(EditorProgram::Custom(format!(
            "sh {}",
            script.display()
        )));
        let edited = editor.edit("original body").unwrap();
        assert_eq!(edited, "rewritten body");
    }
}
