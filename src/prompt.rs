//! The `user@host:cwd$ ` prompt shown before every line.

use crate::env::Environment;
use crate::error::ShellError;
use nix::unistd::{User, gethostname, getuid};
use std::io;
use std::path::Path;

/// Produces the prompt for the next line.
///
/// Failing to produce one is fatal: the interpreter cannot tell the user where
/// they are.
pub trait Prompt {
    fn render(&self, env: &Environment) -> Result<String, ShellError>;
}

impl<F> Prompt for F
where
    F: Fn(&Environment) -> Result<String, ShellError>,
{
    fn render(&self, env: &Environment) -> Result<String, ShellError> {
        self(env)
    }
}

/// Prompt built from the login name, the short host name and the working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPrompt;

impl Prompt for SystemPrompt {
    fn render(&self, env: &Environment) -> Result<String, ShellError> {
        Ok(render(&user_name()?, &host_name()?, env.working_dir()?))
    }
}

pub fn render(user: &str, host: &str, cwd: &Path) -> String {
    format!("{user}@{host}:{}$ ", cwd.display())
}

fn user_name() -> Result<String, ShellError> {
    let environment_error = |source| ShellError::Environment {
        what: "Login",
        source,
    };
    User::from_uid(getuid())
        .map_err(|errno| environment_error(io::Error::from(errno)))?
        .map(|user| user.name)
        .ok_or_else(|| environment_error(io::Error::from(io::ErrorKind::NotFound)))
}

/// Host name up to the first dot.
fn host_name() -> Result<String, ShellError> {
    let host = gethostname().map_err(|errno| ShellError::Environment {
        what: "Hostname",
        source: io::Error::from(errno),
    })?;
    let host = host.to_string_lossy();
    Ok(host.split('.').next().unwrap_or_default().to_owned())
}
