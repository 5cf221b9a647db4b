use std::{env,
          path::{Path, PathBuf}};

use crate::{extra::str::StrExtra, git::Branch};

/// Environment variable set on every git command pushjob runs.
///
/// Pushes made by pushjob itself trigger the same hook again;
/// the hook sees this variable and leaves them alone.
pub const INTERNAL_PUSH_VAR: &str = "PUSHJOB_INTERNAL";

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The canonical repository could not be located from the executable's path
  #[error("could not locate the canonical repository from {0:?}: {1}")]
  RepoNotFound(PathBuf, String),
}

/// Settings result
pub type Result<T> = core::result::Result<T, self::Error>;

/// Name and email used for commits pushjob makes
#[derive(Clone, Debug, PartialEq)]
pub struct Identity {
  /// Author & committer name
  pub name: String,
  /// Author & committer email
  pub email: String,
}

impl Default for Identity {
  fn default() -> Self {
    Self { name: "pushjob".into(),
           email: "pushjob@localhost".into() }
  }
}

/// Runtime configuration, shared by the receiver and the worker
#[derive(Clone, Debug)]
pub struct Settings {
  /// The canonical (bare) repository jobs are pushed to
  pub repo_dir: PathBuf,
  /// git binary
  pub git: String,
  /// Branch submitters push job descriptors to
  pub mainline: Branch,
  /// Name of the canonical remote in working copies
  pub remote: String,
  /// Identity for commits made by pushjob
  pub identity: Identity,
  /// Force verbose reporting regardless of job descriptors
  pub verbose: bool,
  /// This process was started by a push pushjob made itself
  pub internal_push: bool,
}

impl Settings {
  /// Defaults for a given canonical repository
  pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
    Self { repo_dir: repo_dir.into(),
           git: "git".into(),
           mainline: Branch::from("master"),
           remote: "origin".into(),
           identity: Identity::default(),
           verbose: false,
           internal_push: false }
  }

  /// Read settings from the environment.
  ///
  /// `repo_dir` wins over `PUSHJOB_REPO`, which wins over
  /// the location of the running executable (see [`hook_repo_dir`]).
  pub fn from_env(repo_dir: Option<PathBuf>) -> Result<Self> {
    let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

    let repo_dir = match repo_dir.or_else(|| var("PUSHJOB_REPO").map(PathBuf::from)) {
      | Some(dir) => dir,
      | None => env::current_exe().map_err(|e| Error::RepoNotFound(PathBuf::new(), e.to_string()))
                                  .and_then(|exe| hook_repo_dir(&exe))?,
    };

    let defaults = Self::new(repo_dir);
    let identity = Identity { name: var("PUSHJOB_COMMITTER_NAME").unwrap_or(defaults.identity.name.clone()),
                              email: var("PUSHJOB_COMMITTER_EMAIL").unwrap_or(defaults.identity.email.clone()) };

    Ok(Self { git: var("PUSHJOB_GIT").unwrap_or(defaults.git.clone()),
              mainline: var("PUSHJOB_MAINLINE").map(Branch::from)
                                               .unwrap_or(defaults.mainline.clone()),
              remote: var("PUSHJOB_REMOTE").unwrap_or(defaults.remote.clone()),
              verbose: var("PUSHJOB_VERBOSE").and_then(|v| v.bool_ish()).unwrap_or(false),
              internal_push: var(INTERNAL_PUSH_VAR).is_some(),
              identity,
              ..defaults })
  }
}

/// The repository a hook executable belongs to.
///
/// Hooks live at `<repo>/hooks/<name>`, so this is the grandparent of the executable.
pub fn hook_repo_dir(exe: &Path) -> Result<PathBuf> {
  exe.parent()
     .and_then(Path::parent)
     .filter(|dir| !dir.as_os_str().is_empty())
     .map(Path::to_path_buf)
     .ok_or_else(|| Error::RepoNotFound(exe.to_path_buf(), "executable is not inside <repo>/hooks".into()))
}
