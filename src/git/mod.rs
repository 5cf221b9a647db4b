use std::{fmt, fs::File, path::Path};

use serde::{Deserialize as De, Serialize as Ser};

/// Implementation
pub mod r#impl;

/// Variables git exports to hooks that point at the hook's repository.
///
/// They must not leak into commands run against a working copy.
pub const HOOK_ENV: &[&str] = &["GIT_DIR",
                                "GIT_WORK_TREE",
                                "GIT_INDEX_FILE",
                                "GIT_PREFIX",
                                "GIT_OBJECT_DIRECTORY",
                                "GIT_ALTERNATE_OBJECT_DIRECTORIES",
                                "GIT_QUARANTINE_PATH",
                                "GIT_PUSH_OPTION_COUNT"];

/// A git branch
#[derive(PartialEq, Eq, Hash, Clone, Debug, Ser, De)]
pub struct Branch(pub String);

impl Branch {
  /// Fully qualified ref name, e.g. `refs/heads/master`
  pub fn ref_name(&self) -> String {
    format!("refs/heads/{}", self.0)
  }
}

impl From<&str> for Branch {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

impl From<String> for Branch {
  fn from(s: String) -> Self {
    Self(s)
  }
}

impl fmt::Display for Branch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Text output of a git command
#[derive(PartialEq, Clone, Debug, Ser, De)]
pub struct Output(pub String);

impl Output {
  /// Lossily decode raw process output
  pub fn from_bytes(bytes: Vec<u8>) -> Self {
    Self(String::from_utf8_lossy(&bytes).to_string())
  }
}

impl fmt::Display for Output {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.0.trim_end())
  }
}

/// Git errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
  /// The git binary could not be started
  #[error("could not run git: {0}")]
  CouldNotSpawnGit(String),
  /// git ran and exited non-zero. Holds the arguments and stderr
  #[error("`git {0}` failed: {1}")]
  CommandFailed(String, Output),
  /// Reading or writing the working copy failed
  #[error("working copy io: {0}")]
  Io(String),
  /// A file in the working copy is not UTF-8 text
  #[error("{0} is not UTF-8 text")]
  NotText(String),
}

impl From<std::io::Error> for Error {
  fn from(e: std::io::Error) -> Self {
    Error::Io(e.to_string())
  }
}

/// Git result
pub type Result<T> = core::result::Result<T, self::Error>;

/// Something that can hand out fresh working copies of the canonical repository
pub trait Client: std::fmt::Debug {
  /// Acquire a new, empty ephemeral working copy.
  ///
  /// Nothing is cloned yet; see [`RepoContext::clone_repo`].
  /// The directory and everything in it are removed when the context is dropped.
  fn open(&self) -> self::Result<Box<dyn RepoContext>>;
}

/// An exclusively-owned working copy of the canonical repository.
///
/// Every git operation runs synchronously and yields the command's stdout,
/// or an [`Error`] carrying its stderr. Whether a failure matters is up to the caller.
pub trait RepoContext: std::fmt::Debug {
  /// Root of the working copy
  fn workdir(&self) -> &Path;

  /// Clone the canonical repository into the (empty) working copy
  fn clone_repo(&self) -> self::Result<Output>;

  /// Checkout an existing branch
  fn checkout(&self, branch: &Branch) -> self::Result<Output>;

  /// Create a new branch at HEAD and switch to it
  fn branch_create(&self, branch: &Branch) -> self::Result<Output>;

  /// Stage a single path
  fn add(&self, path: &str) -> self::Result<Output>;

  /// Stage every change, including new and deleted files
  fn add_all(&self) -> self::Result<Output>;

  /// Remove every tracked file from the index and the working tree
  fn remove_all(&self) -> self::Result<Output>;

  /// Commit all staged and tracked changes
  fn commit_all(&self, message: &str) -> self::Result<Output>;

  /// Push every local branch
  fn push_all(&self) -> self::Result<Output>;

  /// Push a single branch to a named remote
  fn push_branch(&self, remote: &str, branch: &Branch) -> self::Result<Output>;

  /// Abbreviated hash of HEAD
  fn short_revision(&self) -> self::Result<String>;

  /// Paths tracked at HEAD
  fn tracked_files(&self) -> self::Result<Vec<String>>;

  /// Contents of a file in the working copy, `None` if it doesn't exist.
  ///
  /// [`Error::NotText`] if it exists but isn't UTF-8.
  fn read_file(&self, name: &str) -> self::Result<Option<String>>;

  /// Create or overwrite a file in the working copy
  fn write_file(&self, name: &str, content: &str) -> self::Result<()>;

  /// Create or truncate a file in the working copy, yielding a handle to it
  fn open_file(&self, name: &str) -> self::Result<File>;

  /// Make `branch` hold exactly `file` with `content` and nothing else.
  ///
  /// Checks out `branch` and, only if it diverges (different content, or other tracked files),
  /// replaces its tree and commits with `message`. Yields whether a commit was made.
  fn reset_to(&self, branch: &Branch, file: &str, content: &str, message: &str) -> self::Result<bool> {
    self.checkout(branch)?;

    let holds_content = match self.read_file(file) {
      | Ok(current) => current.as_deref() == Some(content),
      | Err(Error::NotText(_)) => false,
      | Err(e) => return Err(e),
    };
    let only_file = self.tracked_files()?.iter().all(|f| f == file);

    if holds_content && only_file {
      return Ok(false);
    }

    self.remove_all()?;
    self.write_file(file, content)?;
    self.add(file)?;
    self.commit_all(message)?;

    Ok(true)
  }
}
