use crate::builtin::{self, EXIT};
use crate::command::{CommandFactory, Flow, Inherit, StdioSource};
use crate::config::Config;
use crate::env::Environment;
use crate::error::ShellError;
use crate::external;
use crate::lexer;
use crate::line::LineSource;
use crate::parser::{self, CommandLine};
use crate::prompt::{Prompt, SystemPrompt};
use std::io::{self, Write};
use tracing::{debug, warn};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the built-ins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The read-parse-dispatch-execute loop.
///
/// The interpreter owns an explicit [`Environment`] and hands it to built-ins and
/// launched programs. Lines are handled strictly one at a time: a command (or both
/// stages of a pipeline) has finished before the next line is read.
///
/// Example
/// ```no_run
/// use shell_interpreter::{Config, Flow, Interpreter};
/// let mut sh = Interpreter::new(Config::default()).unwrap();
/// assert_eq!(sh.execute_line("echo hello | wc -c").unwrap(), Flow::Continue);
/// ```
pub struct Interpreter {
    env: Environment,
    config: Config,
    builtins: Vec<Box<dyn CommandFactory>>,
    prompt: Box<dyn Prompt>,
    stdout: Box<dyn StdioSource>,
    diag: Box<dyn Write>,
}

impl Interpreter {
    /// Create an interpreter over the current process environment.
    pub fn new(config: Config) -> Result<Self, ShellError> {
        Ok(Self::with_env(config, Environment::new()?))
    }

    pub fn with_env(config: Config, env: Environment) -> Self {
        Self {
            env,
            config,
            builtins: builtin::factories(),
            prompt: Box::new(SystemPrompt),
            stdout: Box::new(Inherit),
            diag: Box::new(io::stderr()),
        }
    }

    /// Replace the prompt collaborator.
    pub fn with_prompt(mut self, prompt: impl Prompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// Send the standard output of every launched command line to `stdout`.
    pub fn with_output(mut self, stdout: impl StdioSource + 'static) -> Self {
        self.stdout = Box::new(stdout);
        self
    }

    /// Send diagnostics (errors, `(finished)`, built-in help) to `diag`.
    pub fn with_diagnostics(mut self, diag: impl Write + 'static) -> Self {
        self.diag = Box::new(diag);
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the loop until end-of-input, `exit`, or a fatal error.
    ///
    /// Recoverable errors are reported on the diagnostic stream and the loop moves on
    /// to the next line. Fatal errors are returned without being reported.
    pub fn repl(&mut self, source: &mut dyn LineSource) -> Result<(), ShellError> {
        loop {
            let prompt = self.prompt.render(&self.env)?;
            let flow = source
                .read_line(&prompt)
                .and_then(|line| match line {
                    Some(line) => self.execute_line(&line),
                    None => Ok(Flow::Exit),
                });
            match flow {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => {
                    self.note("(finished)");
                    return Ok(());
                }
                Err(err) if err.is_fatal() => {
                    warn!(%err, "leaving interpreter loop");
                    return Err(err);
                }
                Err(err) => self.report(&err),
            }
        }
    }

    /// Interpret one line: built-ins first, then a pipeline or a single command.
    ///
    /// Failures of individual pipeline stages are reported here and do not make the
    /// line fail.
    pub fn execute_line(&mut self, line: &str) -> Result<Flow, ShellError> {
        let name = lexer::command_name(line).ok_or(ShellError::BlankLine)?;
        // `exit` never looks at its arguments, so they are not counted either.
        if name == EXIT {
            return self.run_builtin(&[name]).unwrap_or(Ok(Flow::Exit));
        }

        let argv = lexer::tokenize(line, self.config.max_args)?;
        debug!(argv = ?argv.as_slice(), "tokenized");
        if let Some(flow) = self.run_builtin(&argv) {
            return flow;
        }

        let stdout = self.stdout.stdio().map_err(ShellError::Spawn)?;
        match parser::split_pipeline(&argv) {
            CommandLine::Single(argv) => {
                match external::run_single(&self.env, argv, stdout) {
                    Ok(code) => debug!(code, "command finished"),
                    // Not a failure: the line still counts as handled.
                    Err(err @ ShellError::IsDirectory(_)) => self.report(&err),
                    Err(err) => return Err(err),
                }
            }
            CommandLine::Pipeline { left, right } => {
                for outcome in external::run_pipeline(&self.env, left, right, stdout) {
                    if let Err(err) = outcome {
                        self.report(&err);
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn run_builtin(&mut self, argv: &[&str]) -> Option<Result<Flow, ShellError>> {
        let (name, args) = argv.split_first()?;
        let cmd = self
            .builtins
            .iter()
            .find_map(|factory| factory.try_create(name, args))?;
        debug!(%name, "running built-in");
        Some(cmd.execute(&mut self.diag, &mut self.env))
    }

    fn report(&mut self, err: &ShellError) {
        if err.is_reported() {
            self.note(&err.to_string());
        }
    }

    fn note(&mut self, message: &str) {
        if let Err(err) = writeln!(self.diag, "{message}") {
            warn!(%err, "failed to write diagnostic");
        }
    }
}
