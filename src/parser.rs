//! Recognizing the single pipe stage in an argument vector.

use std::num::NonZeroUsize;
use tracing::debug;

/// Token separating the two commands of a pipeline.
pub const PIPE: &str = "|";

/// A tokenized line, either one command or two commands joined by a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandLine<'a> {
    Single(&'a [&'a str]),
    Pipeline {
        left: &'a [&'a str],
        right: &'a [&'a str],
    },
}

/// Index of the first pipe token that has a command on both sides.
///
/// Index 0 and the last index are never split points, which the `NonZeroUsize`
/// makes explicit.
pub fn find_split(argv: &[&str]) -> Option<NonZeroUsize> {
    let last = argv.len().checked_sub(1)?;
    (1..last)
        .find(|&i| argv[i] == PIPE)
        .and_then(NonZeroUsize::new)
}

/// Partition `argv` around the first pipe token.
///
/// Later pipe tokens are left in the right-hand command untouched.
pub fn split_pipeline<'a>(argv: &'a [&'a str]) -> CommandLine<'a> {
    match find_split(argv) {
        Some(split) => {
            let split = split.get();
            debug!(split, "pipeline detected");
            CommandLine::Pipeline {
                left: &argv[..split],
                right: &argv[split + 1..],
            }
        }
        None => CommandLine::Single(argv),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pipe_is_a_single_command() {
        let argv = ["ls", "-l"];
        assert_eq!(split_pipeline(&argv), CommandLine::Single(&argv));
    }

    #[test]
    fn pipe_splits_into_two_commands() {
        let argv = ["echo", "hi", "|", "wc", "-w"];
        assert_eq!(
            split_pipeline(&argv),
            CommandLine::Pipeline {
                left: &["echo", "hi"],
                right: &["wc", "-w"],
            }
        );
    }

    #[test]
    fn pipe_at_either_end_is_not_a_split_point() {
        assert_eq!(find_split(&["|", "wc"]), None);
        assert_eq!(find_split(&["echo", "|"]), None);
        assert_eq!(find_split(&["|"]), None);
        assert_eq!(find_split(&[]), None);
    }

    #[test]
    fn only_the_first_pipe_is_interpreted() {
        let argv = ["a", "|", "b", "|", "c"];
        assert_eq!(
            split_pipeline(&argv),
            CommandLine::Pipeline {
                left: &["a"],
                right: &["b", "|", "c"],
            }
        );
    }

    #[test]
    fn pipe_must_be_a_whole_token() {
        assert_eq!(find_split(&["echo", "a|b", "c"]), None);
    }
}
