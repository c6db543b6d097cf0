use crate::env::Environment;
use crate::error::ShellError;
use std::fs::File;
use std::io::{self, Write};
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// What the interpreter loop should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Source of fresh [`Stdio`] handles for launched programs.
///
/// Every child needs its own handle, so implementors hand out a new one per call.
/// Implemented for [`Inherit`] (the interpreter's own stream) and for [`File`],
/// which lets tests capture a pipeline's output.
pub trait StdioSource {
    fn stdio(&self) -> io::Result<Stdio>;
}

/// Children share the interpreter's own standard stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inherit;

impl StdioSource for Inherit {
    fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::inherit())
    }
}

impl StdioSource for File {
    fn stdio(&self) -> io::Result<Stdio> {
        self.try_clone().map(Stdio::from)
    }
}

/// Object-safe trait for a command that runs inside the interpreter's own process.
pub trait ExecutableCommand {
    /// Executes the command. `out` receives any text the command prints.
    fn execute(self: Box<Self>, out: &mut dyn Write, env: &mut Environment)
    -> Result<Flow, ShellError>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
