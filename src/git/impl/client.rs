use std::{fs,
          path::{Path, PathBuf},
          process::Command};

use crate::{git,
            git::{Error, Output},
            result_extra::ResultExtra,
            settings::{Identity, Settings, INTERNAL_PUSH_VAR}};

/// A wrapper around the git binary on the local machine,
/// handing out working copies of one canonical repository
#[derive(Clone, Debug)]
pub struct LocalClient {
  /// git binary
  pub(super) git: String,
  /// Canonical repository working copies are cloned from
  pub(super) url: PathBuf,
  /// Author & committer of commits made in working copies
  pub(super) identity: Identity,
}

impl LocalClient {
  /// Create a new LocalClient for the repository described by `settings`
  pub fn new(settings: &Settings) -> Self {
    // clones run from inside the working copy, so a relative path would point nowhere
    let url = fs::canonicalize(&settings.repo_dir).unwrap_or_else(|_| settings.repo_dir.clone());

    Self { git: settings.git.clone(),
           url,
           identity: settings.identity.clone() }
  }

  /// Canonical repository location
  pub fn url(&self) -> &Path {
    &self.url
  }

  /// Run git in `workdir`, yielding stdout on success and stderr on failure
  pub(super) fn git(&self, workdir: &Path, args: &[&str]) -> git::Result<Output> {
    let mut cmd = Command::new(&self.git);

    for var in git::HOOK_ENV {
      cmd.env_remove(var);
    }

    log::debug!("git {} (in {:?})", args.join(" "), workdir);

    cmd.current_dir(workdir)
       .args(args)
       .env(INTERNAL_PUSH_VAR, "1")
       .env("GIT_TERMINAL_PROMPT", "0")
       .env("GIT_AUTHOR_NAME", &self.identity.name)
       .env("GIT_AUTHOR_EMAIL", &self.identity.email)
       .env("GIT_COMMITTER_NAME", &self.identity.name)
       .env("GIT_COMMITTER_EMAIL", &self.identity.email)
       .output()
       .map_err(|e| Error::CouldNotSpawnGit(format!("{}: {}", self.git, e)))
       .filter(|out| out.status.success(),
               |out| Error::CommandFailed(args.join(" "), Output::from_bytes(out.stderr)))
       .map(|out| Output::from_bytes(out.stdout))
  }
}

impl git::Client for LocalClient {
  fn open(&self) -> git::Result<Box<dyn git::RepoContext>> {
    git::r#impl::WorkingCopy::new(self.clone()).map(|c| Box::new(c) as Box<dyn git::RepoContext>)
  }
}
