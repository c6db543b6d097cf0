/// Longest accepted input line, in bytes.
pub const MAX_LINE_LEN: usize = 255;

/// Largest number of arguments (command name included) on one line.
pub const MAX_ARGS: usize = 100;

/// Bounds applied by the interpreter to every line it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub max_line_len: usize,
    pub max_args: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_line_len: MAX_LINE_LEN,
            max_args: MAX_ARGS,
        }
    }
}
