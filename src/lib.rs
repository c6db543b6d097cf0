//! A small interactive command interpreter.
//!
//! Each line read from the user is either a built-in directive (`exit`, `cd`,
//! `chdir`) run inside the interpreter's own process, or an external program,
//! optionally two programs joined by a single `|`. External programs run to
//! completion before the next line is read.
//!
//! The main entry point is [`Interpreter`], which drives the loop over any
//! [`line::LineSource`]. The public modules expose the pieces it is built from:
//! [`line`] for bounded line acquisition, [`lexer`] for tokenization, [`env`] for
//! the explicit environment and working directory, and [`error`] for the error
//! taxonomy.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod line;
pub mod parser;
pub mod prompt;

pub use command::Flow;
pub use config::Config;
pub use error::ShellError;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
