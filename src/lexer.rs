//! Splitting a raw line into an argument vector.
//!
//! Tokens are plain whitespace-separated words: there are no quotes, escapes or
//! substitutions, so a delimiter can never appear inside a token.

use crate::error::ShellError;
use std::ops::Deref;

/// Characters separating tokens. Runs of them collapse into one separator.
pub const DELIMITERS: [char; 2] = [' ', '\t'];

/// Argument vector borrowed from one input line.
///
/// Argument 0 is the command name and the vector is never empty. The borrow ties
/// its lifetime to the line it was cut from, i.e. to one interpreter cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argv<'a> {
    args: Vec<&'a str>,
}

impl<'a> Argv<'a> {
    pub fn command(&self) -> &'a str {
        self.args[0]
    }

    pub fn as_slice(&self) -> &[&'a str] {
        &self.args
    }
}

impl<'a> Deref for Argv<'a> {
    type Target = [&'a str];

    fn deref(&self) -> &Self::Target {
        &self.args
    }
}

fn words(line: &str) -> impl Iterator<Item = &str> {
    line.split(DELIMITERS).filter(|word| !word.is_empty())
}

/// First token of the line, if any.
pub fn command_name(line: &str) -> Option<&str> {
    words(line).next()
}

/// Split `line` into at most `max_args` arguments.
///
/// Fails with [`ShellError::TooManyArgs`] as soon as one more argument would be
/// recorded, and with [`ShellError::BlankLine`] when there is no command name.
pub fn tokenize(line: &str, max_args: usize) -> Result<Argv<'_>, ShellError> {
    let mut args = Vec::new();
    for word in words(line) {
        if args.len() == max_args {
            return Err(ShellError::TooManyArgs);
        }
        args.push(word);
    }
    if args.is_empty() {
        return Err(ShellError::BlankLine);
    }
    Ok(Argv { args })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_ARGS;

    #[test]
    fn consecutive_delimiters_collapse() {
        let argv = tokenize("  ls \t -l\t\t/tmp  ", MAX_ARGS).unwrap();
        assert_eq!(argv.as_slice(), &["ls", "-l", "/tmp"]);
        assert_eq!(argv.command(), "ls");
    }

    #[test]
    fn no_quote_or_escape_processing() {
        let argv = tokenize(r#"echo "a b" c\ d $HOME"#, MAX_ARGS).unwrap();
        assert_eq!(argv.as_slice(), &["echo", "\"a", "b\"", "c\\", "d", "$HOME"]);
    }

    #[test]
    fn blank_line_has_no_command() {
        assert!(matches!(
            tokenize(" \t ", MAX_ARGS),
            Err(ShellError::BlankLine)
        ));
        assert_eq!(command_name("\t "), None);
    }

    #[test]
    fn argument_bound_is_inclusive() {
        let exactly = vec!["x"; MAX_ARGS].join(" ");
        assert_eq!(tokenize(&exactly, MAX_ARGS).unwrap().len(), MAX_ARGS);

        let over = vec!["x"; MAX_ARGS + 1].join(" ");
        assert!(matches!(
            tokenize(&over, MAX_ARGS),
            Err(ShellError::TooManyArgs)
        ));
    }

    #[test]
    fn command_name_ignores_the_rest() {
        assert_eq!(command_name("  exit now please"), Some("exit"));
    }
}
