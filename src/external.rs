use crate::command::ExitCode;
use crate::env::Environment;
use crate::error::ShellError;
use nix::errno::Errno;
use nix::unistd::{AccessFlags, access};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::debug;

/// Search path used when `PATH` is unset, as `execvp` does.
pub const DEFAULT_PATH: &str = "/bin:/usr/bin";

/// Every child spawned for one command line, reaped exactly once.
///
/// Children are waited for explicitly with [`Children::wait_all`]; any child still
/// owned when the guard is dropped (an early return on an error path) is waited
/// for in `Drop`, so no zombie outlives the command line that created it.
#[derive(Default)]
pub struct Children {
    children: Vec<(String, Child)>,
}

impl Children {
    pub fn push(&mut self, name: impl Into<String>, child: Child) {
        debug!(pid = child.id(), "spawned child");
        self.children.push((name.into(), child));
    }

    /// Wait for every child in spawn order.
    pub fn wait_all(mut self) -> Vec<Result<ExitCode, ShellError>> {
        self.children
            .drain(..)
            .map(|(name, mut child)| match child.wait() {
                Ok(status) => {
                    let code = exit_code(status);
                    debug!(%name, code, "child exited");
                    Ok(code)
                }
                Err(source) => Err(ShellError::Wait { name, source }),
            })
            .collect()
    }
}

impl Drop for Children {
    fn drop(&mut self) {
        for (_, child) in &mut self.children {
            let _ = child.wait();
        }
    }
}

/// Launch `argv` with the given standard input and output.
///
/// The child gets exactly the interpreter's variables and working directory.
/// Errors are raw spawn errors; see [`is_exec_failure`] to tell a missing or
/// unrunnable program apart from a failing process-creation primitive.
pub fn spawn(env: &Environment, argv: &[&str], stdin: Stdio, stdout: Stdio) -> io::Result<Child> {
    let (name, args) = argv
        .split_first()
        .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
    let search_paths = env.get_var("PATH").unwrap_or(OsStr::new(DEFAULT_PATH));
    let program = find_command_path(search_paths, &env.current_dir, Path::new(name))
        .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
    debug!(program = %program.display(), ?args, "launching");

    let mut cmd = Command::new(&*program);
    cmd.args(args)
        .env_clear()
        .envs(env.vars.iter())
        .current_dir(&env.current_dir)
        .stdin(stdin)
        .stdout(stdout);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.arg0(name);
    }
    cmd.spawn()
}

/// Whether a spawn error means the program itself could not be run, as opposed
/// to the operating system refusing to create a process at all.
pub fn is_exec_failure(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) {
        return true;
    }
    err.raw_os_error().is_some_and(|code| {
        [
            Errno::ENOEXEC,
            Errno::ENOTDIR,
            Errno::EISDIR,
            Errno::ENAMETOOLONG,
            Errno::ELOOP,
            Errno::E2BIG,
            Errno::ETXTBSY,
        ]
        .contains(&Errno::from_raw(code))
    })
}

/// Run one external command and wait for it.
///
/// A program that cannot be executed but whose name (after `~` expansion) is a
/// directory the interpreter could enter reports [`ShellError::IsDirectory`]. This mirrors the classic
/// "cd into it" fallback and is not POSIX behaviour. Failing to create a process
/// at all is a fatal [`ShellError::Spawn`].
pub fn run_single(env: &Environment, argv: &[&str], stdout: Stdio) -> Result<ExitCode, ShellError> {
    let name = argv.first().copied().unwrap_or_default();
    let mut children = Children::default();
    match spawn(env, argv, Stdio::inherit(), stdout) {
        Ok(child) => children.push(name, child),
        Err(source) if is_exec_failure(&source) => {
            if let Ok(path) = env.expand_home(Some(name)) {
                if is_enterable_dir(&env.resolve(&path)) {
                    return Err(ShellError::IsDirectory(name.to_owned()));
                }
            }
            return Err(ShellError::Command {
                name: name.to_owned(),
                source,
            });
        }
        Err(source) => return Err(ShellError::Spawn(source)),
    }
    children
        .wait_all()
        .pop()
        .unwrap_or(Ok(0))
}

/// Run `left | right`, returning one outcome per stage, left first.
///
/// Each stage fails on its own: a left stage that cannot start leaves the right
/// one reading an empty stream, and a right stage that cannot start closes the
/// channel under the left one. Every child that did start is waited for.
pub fn run_pipeline(
    env: &Environment,
    left: &[&str],
    right: &[&str],
    stdout: Stdio,
) -> Vec<Result<ExitCode, ShellError>> {
    let mut children = Children::default();
    let mut outcomes: Vec<Option<Result<ExitCode, ShellError>>> = vec![None, None];

    // The write end lives only in the left child; the read end moves into the
    // right child's stdin and is closed in the parent when that spawn returns.
    let upstream = match spawn(env, left, Stdio::inherit(), Stdio::piped()) {
        Ok(mut child) => {
            let read_end = child.stdout.take();
            children.push(left[0], child);
            read_end.map_or_else(Stdio::null, Stdio::from)
        }
        Err(source) => {
            outcomes[0] = Some(Err(stage_error(left, source)));
            Stdio::null()
        }
    };

    let right_spawned = match spawn(env, right, upstream, stdout) {
        Ok(child) => {
            children.push(right[0], child);
            true
        }
        Err(source) => {
            outcomes[1] = Some(Err(stage_error(right, source)));
            false
        }
    };

    let mut waited = children.wait_all().into_iter();
    for (slot, spawned) in outcomes.iter_mut().zip([true, right_spawned]) {
        if slot.is_none() && spawned {
            *slot = waited.next();
        }
    }
    outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap_or(Ok(0)))
        .collect()
}

fn is_enterable_dir(path: &Path) -> bool {
    path.is_dir() && access(path, AccessFlags::X_OK).is_ok()
}

fn stage_error(argv: &[&str], source: io::Error) -> ShellError {
    ShellError::Command {
        name: argv.first().copied().unwrap_or_default().to_owned(),
        source,
    }
}

fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way `execvp` would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Any path with a separator (e.g. `bin/sh`, `./foo`): resolved against `cwd`,
///   returned if it exists.
/// - Single path component (no separators): search each directory in `search_paths`
///   (PATH) and return the first executable regular file.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result had to be built.
pub fn find_command_path<'a>(
    search_paths: &OsStr,
    cwd: &Path,
    path: &'a Path,
) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        // Empty path -> not found
        (None, _) => None,
        (Some(x), None) if !path.as_os_str().to_string_lossy().contains('/') => {
            find_in_path(search_paths, x.as_os_str()).map(Cow::Owned)
        }
        _ => {
            let joined = cwd.join(path);
            find_by_path(&joined).map(|found| Cow::Owned(found.to_path_buf()))
        }
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| is_executable_file(path))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
