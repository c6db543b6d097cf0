use rustyline::error::ReadlineError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while reading, parsing or running one line.
///
/// The `Display` text of each variant is the exact line reported on the
/// diagnostic stream. Use [`ShellError::is_fatal`] to decide whether the
/// interpreter loop may continue after reporting it.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Error: the command is too long!")]
    LineTooLong,

    /// Empty or whitespace-only line. Never reported, the loop just re-prompts.
    #[error("empty command line")]
    BlankLine,

    #[error("Error: too many arguments!")]
    TooManyArgs,

    #[error("Error: too many arguments for '{0}'!")]
    TooManyBuiltinArgs(String),

    #[error("Error: HOME is not set")]
    HomeNotSet,

    #[error("Change dir error: {}: {}", .path.display(), .source)]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A command that could not be executed but names a directory.
    #[error("{0}: is a directory")]
    IsDirectory(String),

    #[error("Command error: {name}: {source}")]
    Command {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Wait error: {name}: {source}")]
    Wait {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Usage or help text produced by a built-in's argument parser.
    #[error("{0}")]
    Usage(String),

    /// The process-creation primitive itself failed.
    #[error("Spawn error: {0}")]
    Spawn(#[source] io::Error),

    #[error("{what} error: {source}")]
    Environment {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Input error: {0}")]
    Input(#[source] io::Error),

    #[error("Line editor error: {0}")]
    Editor(#[from] ReadlineError),
}

impl ShellError {
    /// Fatal errors end the interactive session, the rest only discard the current line.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShellError::Spawn(_)
                | ShellError::Environment { .. }
                | ShellError::Input(_)
                | ShellError::Editor(_)
        )
    }

    /// Whether the error deserves a line on the diagnostic stream.
    pub fn is_reported(&self) -> bool {
        !matches!(self, ShellError::BlankLine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_diagnostics() {
        assert_eq!(
            ShellError::LineTooLong.to_string(),
            "Error: the command is too long!"
        );
        assert_eq!(
            ShellError::TooManyBuiltinArgs("cd".into()).to_string(),
            "Error: too many arguments for 'cd'!"
        );
        assert_eq!(
            ShellError::IsDirectory("src".into()).to_string(),
            "src: is a directory"
        );
    }

    #[test]
    fn only_environment_and_spawn_failures_are_fatal() {
        assert!(ShellError::Spawn(io::Error::other("fork")).is_fatal());
        assert!(
            ShellError::Environment {
                what: "Hostname",
                source: io::Error::other("x"),
            }
            .is_fatal()
        );
        assert!(!ShellError::TooManyArgs.is_fatal());
        assert!(
            !ShellError::Command {
                name: "nope".into(),
                source: io::ErrorKind::NotFound.into(),
            }
            .is_fatal()
        );
        assert!(!ShellError::BlankLine.is_reported());
    }
}
