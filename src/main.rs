use argh::FromArgs;
use shell_interpreter::config::{MAX_ARGS, MAX_LINE_LEN};
use shell_interpreter::line::{EditorSource, LineSource, StreamSource};
use shell_interpreter::{Config, Interpreter};
use std::io::{self, IsTerminal};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(FromArgs)]
/// Interactive command interpreter with single-pipe support.
struct Args {
    #[argh(option, default = "MAX_LINE_LEN")]
    /// longest accepted input line, in bytes
    max_line_len: usize,

    #[argh(option, default = "MAX_ARGS")]
    /// largest number of arguments on one line
    max_args: usize,

    #[argh(switch)]
    /// read plain lines even when standard input is a terminal
    no_editor: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args: Args = argh::from_env();
    let config = Config {
        max_line_len: args.max_line_len,
        max_args: args.max_args,
    };

    let mut source: Box<dyn LineSource> = if !args.no_editor && io::stdin().is_terminal() {
        Box::new(EditorSource::new(config.max_line_len)?)
    } else {
        Box::new(StreamSource::new(
            io::stdin().lock(),
            io::stderr(),
            config.max_line_len,
        ))
    };

    Interpreter::new(config)?.repl(source.as_mut())?;
    Ok(())
}
