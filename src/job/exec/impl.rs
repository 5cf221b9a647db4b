use std::{env,
          path::PathBuf,
          process::{Command, Stdio}};

use super::{Error, Result};
use crate::{git, job, report::Reporter};

/// Runs each job in a new OS process: this executable, in worker mode.
///
/// The canonical repository is passed explicitly so the worker
/// doesn't depend on where it was started from.
#[derive(Clone, Debug)]
pub struct ProcessExecutor {
  /// Program to run as `<program> --repo <repo_dir> <job id>`
  pub program: PathBuf,
  /// Canonical repository
  pub repo_dir: PathBuf,
}

impl ProcessExecutor {
  /// Run workers with the currently running executable
  pub fn current(repo_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
    Ok(Self { program: env::current_exe()?,
              repo_dir: repo_dir.into() })
  }

  fn command(&self, job: &job::Id) -> Command {
    let mut cmd = Command::new(&self.program);

    for var in git::HOOK_ENV {
      cmd.env_remove(var);
    }

    cmd.arg("--repo").arg(&self.repo_dir).arg(job.as_str());
    cmd
  }
}

impl super::Executor for ProcessExecutor {
  fn spawn(&self, job: &job::Id, detach: bool, report: &Reporter) -> Result<()> {
    let mut cmd = self.command(job);
    let err = |e| Error::Spawn(job.clone(), e);

    if detach {
      // git waits for the hook's stdout & stderr to close,
      // so a detached worker must not hold on to them
      cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

      #[cfg(unix)]
      {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
      }

      let child = cmd.spawn().map_err(err)?;
      log::info!("job {}: worker started detached (pid {})", job, child.id());

      return Ok(());
    }

    log::info!("job {}: running worker", job);
    let out = cmd.stdin(Stdio::null()).output().map_err(err)?;

    report.debug(String::from_utf8_lossy(&out.stdout));
    report.debug(String::from_utf8_lossy(&out.stderr));

    if !out.status.success() {
      log::warn!("job {}: worker exited with {}", job, out.status);
    }

    Ok(())
  }
}
