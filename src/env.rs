use crate::error::ShellError;
use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Character that stands for the user's home directory at the start of a path.
pub const HOME_SHORTCUT: char = '~';

/// Explicit view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: the variables handed to every launched program (e.g. PATH, HOME).
/// - `current_dir`: the working directory for command execution.
///
/// Launched programs see exactly this state and nothing ambient. The process-wide
/// working directory is only ever touched through [`Environment::change_dir`], which
/// keeps it in sync with `current_dir`.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables, not necessarily UTF-8.
    pub vars: HashMap<OsString, OsString>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// Failing to query the working directory is fatal for the interpreter.
    pub fn new() -> Result<Self, ShellError> {
        let vars = stdenv::vars_os().collect();
        let current_dir = stdenv::current_dir().map_err(|source| ShellError::Environment {
            what: "Working directory",
            source,
        })?;
        Ok(Self { vars, current_dir })
    }

    pub fn get_var(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    pub fn set_var(&mut self, key: impl Into<OsString>, val: impl Into<OsString>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn home(&self) -> Result<&OsStr, ShellError> {
        self.get_var("HOME").ok_or(ShellError::HomeNotSet)
    }

    /// Rewrite a leading `~` into the home directory.
    ///
    /// `None` stands for the home directory itself. Only the first character is
    /// replaced and the rest is appended verbatim, so `~foo` becomes `$HOME` followed
    /// by `foo`, not another user's home. Anything else is returned unchanged.
    pub fn expand_home(&self, path: Option<&str>) -> Result<PathBuf, ShellError> {
        match path {
            None => Ok(PathBuf::from(self.home()?)),
            Some(path) => match path.strip_prefix(HOME_SHORTCUT) {
                Some(rest) => {
                    let mut expanded = self.home()?.to_os_string();
                    expanded.push(rest);
                    Ok(PathBuf::from(expanded))
                }
                None => Ok(PathBuf::from(path)),
            },
        }
    }

    /// Interpret `path` relative to the interpreter's working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }

    /// Working directory for the prompt, verified to still exist.
    pub fn working_dir(&self) -> Result<&Path, ShellError> {
        fs::metadata(&self.current_dir).map_err(|source| ShellError::Environment {
            what: "Working directory",
            source,
        })?;
        Ok(&self.current_dir)
    }

    /// Change the working directory, `~`-expanding the target first.
    ///
    /// On failure both the process and `current_dir` keep the previous directory.
    pub fn change_dir(&mut self, target: Option<&str>) -> Result<(), ShellError> {
        let new_dir = self.resolve(&self.expand_home(target)?);
        let canonical = fs::canonicalize(&new_dir).map_err(|source| ShellError::ChangeDir {
            path: new_dir.clone(),
            source,
        })?;
        stdenv::set_current_dir(&canonical).map_err(|source| ShellError::ChangeDir {
            path: new_dir,
            source,
        })?;
        debug!(dir = %canonical.display(), "changed working directory");
        self.current_dir = canonical;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    /// Serializes tests that move the process working directory.
    pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn env_with_home(home: &str) -> Environment {
        let mut env = Environment {
            vars: HashMap::new(),
            current_dir: stdenv::temp_dir(),
        };
        env.set_var("HOME", home);
        env
    }

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment {
            vars: HashMap::new(),
            current_dir: stdenv::temp_dir(),
        };

        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some(OsStr::new("VALUE")));
    }

    #[cfg(unix)]
    #[test]
    fn home_need_not_be_utf8() {
        use std::os::unix::ffi::OsStringExt;
        let mut env = env_with_home("/");
        env.set_var("HOME", OsString::from_vec(b"/home/\xffuser".to_vec()));
        assert_eq!(
            env.expand_home(Some("~/src")).unwrap().into_os_string(),
            OsString::from_vec(b"/home/\xffuser/src".to_vec())
        );
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new().unwrap();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn expand_home_variants() {
        let env = env_with_home("/home/user");
        assert_eq!(env.expand_home(None).unwrap(), PathBuf::from("/home/user"));
        assert_eq!(env.expand_home(Some("~")).unwrap(), PathBuf::from("/home/user"));
        assert_eq!(
            env.expand_home(Some("~/src")).unwrap(),
            PathBuf::from("/home/user/src")
        );
        assert_eq!(
            env.expand_home(Some("~foo")).unwrap(),
            PathBuf::from("/home/userfoo")
        );
        assert_eq!(
            env.expand_home(Some("/tmp/~")).unwrap(),
            PathBuf::from("/tmp/~")
        );
    }

    #[test]
    fn expand_home_without_home_is_an_error() {
        let env = Environment {
            vars: HashMap::new(),
            current_dir: PathBuf::from("/"),
        };
        assert!(matches!(env.expand_home(None), Err(ShellError::HomeNotSet)));
        assert!(matches!(
            env.expand_home(Some("~/x")),
            Err(ShellError::HomeNotSet)
        ));
        assert_eq!(env.expand_home(Some("x")).unwrap(), PathBuf::from("x"));
    }

    #[test]
    fn change_dir_to_home() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let canonical_home = fs::canonicalize(home.path()).unwrap();

        let mut env = env_with_home(&home.path().to_string_lossy());
        env.change_dir(Some("~")).unwrap();

        assert_eq!(env.current_dir, canonical_home);
        assert_eq!(
            fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(),
            canonical_home
        );

        stdenv::set_current_dir(orig).unwrap();
    }

    #[test]
    fn change_dir_failure_keeps_previous_directory() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let file = scratch.path().join("plain_file");
        fs::write(&file, b"x").unwrap();

        let mut env = env_with_home("/");
        let before = env.current_dir.clone();

        let missing = scratch.path().join("missing");
        let err = env.change_dir(Some(&missing.to_string_lossy())).unwrap_err();
        assert!(matches!(err, ShellError::ChangeDir { .. }));

        let err = env.change_dir(Some(&file.to_string_lossy())).unwrap_err();
        assert!(matches!(err, ShellError::ChangeDir { .. }));

        assert_eq!(env.current_dir, before);
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn change_dir_relative_to_current_dir() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        fs::create_dir(scratch.path().join("inner")).unwrap();

        let mut env = env_with_home("/");
        env.current_dir = fs::canonicalize(scratch.path()).unwrap();
        env.change_dir(Some("inner")).unwrap();

        assert!(env.current_dir.ends_with("inner"));

        stdenv::set_current_dir(orig).unwrap();
    }
}
