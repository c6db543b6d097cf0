use crate::command::{CommandFactory, ExecutableCommand, Flow};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use argh::{EarlyExit, FromArgs};
use std::io::Write;

/// Name of the built-in that ends the session.
pub(crate) const EXIT: &str = "exit";

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process, because their effect (leaving the loop, moving the working
/// directory) must outlive any child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Spellings of the command, matched exactly and case-sensitively.
    fn names() -> &'static [&'static str];

    /// Executes the command against the interpreter's environment.
    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<Flow, ShellError>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        out: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Flow, ShellError> {
        BuiltinCommand::execute(*self, out, env)
    }
}

/// The only argument handed to `argh` as an option; everything else is positional.
const HELP: &str = "--help";

/// `--help` output or an argument parsing failure from `argh`.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        out: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow, ShellError> {
        if self.is_error {
            return Err(ShellError::Usage(self.output));
        }
        writeln!(out, "{}", self.output).map_err(ShellError::Input)?;
        Ok(Flow::Continue)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if T::names().contains(&name) {
            // Operands such as `-x` or `--` are directory names, not flags.
            let parsed = match args {
                [HELP] => T::from_args(&[name], args),
                _ => {
                    let operands: Vec<&str> =
                        std::iter::once("--").chain(args.iter().copied()).collect();
                    T::from_args(&[name], &operands)
                }
            };
            Some(match parsed {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; a leading ~ stands for $HOME. Only one is accepted.
    pub targets: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn names() -> &'static [&'static str] {
        &["cd", "chdir"]
    }

    fn execute(self, _out: &mut dyn Write, env: &mut Environment) -> Result<Flow, ShellError> {
        match self.targets.as_slice() {
            [] => env.change_dir(None)?,
            [target] => env.change_dir(Some(target.as_str()))?,
            _ => return Err(ShellError::TooManyBuiltinArgs("cd".into())),
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Exit shell process
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn names() -> &'static [&'static str] {
        &[EXIT]
    }

    fn execute(self, _out: &mut dyn Write, _env: &mut Environment) -> Result<Flow, ShellError> {
        Ok(Flow::Exit)
    }
}

/// Factories for every built-in, in lookup order.
pub(crate) fn factories() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Cd>::default()),
    ]
}
