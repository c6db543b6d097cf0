//! Acquiring one bounded line of input per interpreter cycle.

use crate::error::ShellError;
use rustyline::config::Behavior;
use rustyline::error::ReadlineError;
use rustyline::{Config as EditorConfig, DefaultEditor};
use std::io::{self, Read, Write};

/// Where the interpreter loop gets its lines from.
///
/// `Ok(None)` is end-of-input. Recoverable errors ([`ShellError::LineTooLong`],
/// [`ShellError::BlankLine`]) leave the source positioned at the start of the next
/// line, so the caller can simply ask again.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError>;
}

fn is_blank(byte: u8) -> bool {
    byte.is_ascii_whitespace()
}

/// Read one line, byte by byte, from `bytes`.
///
/// A line longer than `max_len` is rejected after the rest of it has been consumed.
/// End-of-input is only reported when nothing but whitespace was read; a final line
/// without a trailing newline is returned as a regular line.
pub fn acquire<I>(bytes: &mut I, max_len: usize) -> Result<Option<String>, ShellError>
where
    I: Iterator<Item = io::Result<u8>>,
{
    let mut buf = Vec::with_capacity(max_len);
    let mut has_content = false;
    loop {
        let byte = match bytes.next().transpose().map_err(ShellError::Input)? {
            Some(byte) => byte,
            None if has_content => break,
            None => return Ok(None),
        };
        if byte == b'\n' {
            break;
        }
        if !is_blank(byte) {
            has_content = true;
        }
        if buf.len() == max_len {
            drain_line(bytes)?;
            return Err(ShellError::LineTooLong);
        }
        buf.push(byte);
    }
    if !has_content {
        return Err(ShellError::BlankLine);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

fn drain_line<I>(bytes: &mut I) -> Result<(), ShellError>
where
    I: Iterator<Item = io::Result<u8>>,
{
    for byte in bytes {
        if byte.map_err(ShellError::Input)? == b'\n' {
            break;
        }
    }
    Ok(())
}

/// Apply the length and blank-line rules to a line that arrived in one piece.
pub fn check_line(line: String, max_len: usize) -> Result<String, ShellError> {
    if line.len() > max_len {
        return Err(ShellError::LineTooLong);
    }
    if line.bytes().all(is_blank) {
        return Err(ShellError::BlankLine);
    }
    Ok(line)
}

/// Plain byte stream front-end, used for pipes, files and `--no-editor`.
///
/// The prompt goes to `prompt_out`, normally standard error, so it never mixes
/// with the output of the commands being run.
pub struct StreamSource<R: Read> {
    bytes: io::Bytes<R>,
    prompt_out: Box<dyn Write>,
    max_len: usize,
}

impl<R: Read> StreamSource<R> {
    pub fn new(input: R, prompt_out: impl Write + 'static, max_len: usize) -> Self {
        Self {
            bytes: input.bytes(),
            prompt_out: Box::new(prompt_out),
            max_len,
        }
    }
}

impl<R: Read> LineSource for StreamSource<R> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        write!(self.prompt_out, "{prompt}").map_err(ShellError::Input)?;
        self.prompt_out.flush().map_err(ShellError::Input)?;
        acquire(&mut self.bytes, self.max_len)
    }
}

/// Interactive front-end backed by `rustyline`, with in-memory history.
pub struct EditorSource {
    editor: DefaultEditor,
    max_len: usize,
}

impl EditorSource {
    pub fn new(max_len: usize) -> Result<Self, ShellError> {
        Ok(Self {
            editor: DefaultEditor::with_config(editor_config())?,
            max_len,
        })
    }
}

/// The editor talks to the terminal directly, leaving stdout to the commands.
fn editor_config() -> EditorConfig {
    EditorConfig::builder()
        .behavior(Behavior::PreferTerm)
        .build()
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let line = check_line(line, self.max_len)?;
                self.editor.add_history_entry(line.as_str())?;
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) => Ok(None),
            // Ctrl-C abandons the line being typed.
            Err(ReadlineError::Interrupted) => Err(ShellError::BlankLine),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_LINE_LEN;
    use crate::io_adapters::MemWriter;
    use std::io::Cursor;

    fn source(input: &str) -> StreamSource<Cursor<Vec<u8>>> {
        StreamSource::new(
            Cursor::new(input.as_bytes().to_vec()),
            io::sink(),
            MAX_LINE_LEN,
        )
    }

    #[test]
    fn returns_content_verbatim() {
        let mut src = source("  ls   -l\t/tmp \nnext\n");
        assert_eq!(
            src.read_line("").unwrap().as_deref(),
            Some("  ls   -l\t/tmp ")
        );
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("next"));
        assert_eq!(src.read_line("").unwrap(), None);
    }

    #[test]
    fn blank_lines_are_recoverable() {
        let mut src = source("\n \t \nls\n");
        assert!(matches!(src.read_line(""), Err(ShellError::BlankLine)));
        assert!(matches!(src.read_line(""), Err(ShellError::BlankLine)));
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("ls"));
    }

    #[test]
    fn overlong_line_is_drained() {
        let input = format!("{}\nls\n", "a".repeat(261));
        let mut src = source(&input);
        assert!(matches!(src.read_line(""), Err(ShellError::LineTooLong)));
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("ls"));
        assert_eq!(src.read_line("").unwrap(), None);
    }

    #[test]
    fn length_bound_is_inclusive() {
        let exact = "a".repeat(MAX_LINE_LEN);
        let mut src = source(&format!("{exact}\n{exact}b\n"));
        assert_eq!(src.read_line("").unwrap(), Some(exact));
        assert!(matches!(src.read_line(""), Err(ShellError::LineTooLong)));
        assert_eq!(src.read_line("").unwrap(), None);
    }

    #[test]
    fn overlong_final_line_without_newline() {
        let mut src = source(&"a".repeat(300));
        assert!(matches!(src.read_line(""), Err(ShellError::LineTooLong)));
        assert_eq!(src.read_line("").unwrap(), None);
    }

    #[test]
    fn last_line_without_newline_is_kept() {
        let mut src = source("pwd");
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("pwd"));
        assert_eq!(src.read_line("").unwrap(), None);
    }

    #[test]
    fn trailing_whitespace_before_eof_is_end_of_input() {
        let mut src = source("   ");
        assert_eq!(src.read_line("").unwrap(), None);
    }

    #[test]
    fn prompt_goes_to_prompt_stream() {
        let (out, handle) = MemWriter::with_handle();
        let mut src = StreamSource::new(Cursor::new(b"ls\n".to_vec()), out, MAX_LINE_LEN);
        src.read_line("user@host:/$ ").unwrap();
        assert_eq!(handle.borrow().as_slice(), b"user@host:/$ ");
    }

    #[test]
    fn editor_draws_on_the_terminal() {
        assert_eq!(editor_config().behavior(), Behavior::PreferTerm);
    }

    #[test]
    fn input_errors_are_fatal() {
        let mut bytes = [Err(io::Error::other("broken"))].into_iter();
        let err = acquire(&mut bytes, MAX_LINE_LEN).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn check_line_rules() {
        assert_eq!(check_line("ls".into(), 2).unwrap(), "ls");
        assert!(matches!(
            check_line("ls -l".into(), 2),
            Err(ShellError::LineTooLong)
        ));
        assert!(matches!(
            check_line(" \t".into(), 2),
            Err(ShellError::BlankLine)
        ));
    }
}
