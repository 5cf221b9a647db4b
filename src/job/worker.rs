use std::process::{ExitStatus, Stdio};

use chrono::Local;
use tokio::process::{Child, Command};

use super::{Config, Error, Id, Result, DONE_MESSAGE, EXITCODE_LOG, STDERR_LOG, STDOUT_LOG, TIMED_OUT_EXIT};
use crate::{git, report::Reporter, result_extra::ResultExtra};

/// How a job's command ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
  /// The command exited (or was killed by a signal) with this status
  Status(i32),
  /// The command outlived its `timeout` and was killed
  TimedOut,
}

impl Exit {
  /// The number written to `exitcode.log`
  pub fn code(&self) -> i32 {
    match self {
      | Exit::Status(code) => *code,
      | Exit::TimedOut => TIMED_OUT_EXIT,
    }
  }
}

impl From<ExitStatus> for Exit {
  fn from(status: ExitStatus) -> Self {
    #[cfg(unix)]
    {
      use std::os::unix::process::ExitStatusExt;
      if let Some(signal) = status.signal() {
        return Exit::Status(128 + signal);
      }
    }

    Exit::Status(status.code().unwrap_or(-1))
  }
}

/// Runs one job, identified by its id, in a working copy of its own.
///
/// The job's branch must already exist on the canonical repository.
#[derive(Debug)]
pub struct Worker<'a> {
  git: &'a dyn git::Client,
  report: Reporter,
}

impl<'a> Worker<'a> {
  /// Create a worker cloning from `git`
  pub fn new(git: &'a dyn git::Client, report: Reporter) -> Self {
    Self { git, report }
  }

  /// Check out `job`'s branch, wait until the job is due, run it,
  /// then commit and push its output.
  ///
  /// A command failing is not an error, its status is recorded in `exitcode.log`.
  pub async fn run(&self, job: &Id) -> Result<Exit> {
    let repo = self.git.open()?;

    repo.clone_repo().tolerate(&self.report, "clone");
    // running the job from any other branch would run the wrong job
    repo.checkout(&job.branch())?;

    let config = Config::load(&*repo)?.ok_or_else(|| Error::NotAJob(job.clone()))?;
    let report = self.report.verbose(self.report.is_verbose() || config.verbose);

    if &config.job_id != job {
      report.debug(format!("branch {} describes job {}", job, config.job_id));
    }

    let exit = execute(&config, &*repo, &report).await?;

    repo.add_all().tolerate(&report, "add");
    repo.commit_all(DONE_MESSAGE).tolerate(&report, "commit");
    repo.push_all().tolerate(&report, "push");

    log::info!("job {}: complete, exit code {}", job, exit.code());
    Ok(exit)
  }
}

/// Wait until `config` is due, then run its command in the root of `repo`,
/// writing `stdout.log`, `stderr.log` and `exitcode.log` there.
///
/// Blocks until the command ends or its timeout elapses; neither wait can be cancelled.
pub async fn execute(config: &Config, repo: &dyn git::RepoContext, report: &Reporter) -> Result<Exit> {
  if let Some(wait) = config.wait() {
    report.debug(format!("job {}: waiting {:.1}s until {}",
                         config.job_id,
                         wait.as_secs_f64(),
                         config.run_at.map(|t| t.to_string()).unwrap_or_default()));
    tokio::time::sleep(wait).await;
  }

  log::info!("job {}: running {:?} at {}", config.job_id, config.command, Local::now());

  let stdout = repo.open_file(STDOUT_LOG)?;
  let stderr = repo.open_file(STDERR_LOG)?;

  let mut cmd = Command::new("sh");
  for var in git::HOOK_ENV {
    cmd.env_remove(var);
  }

  // its own group, so a timeout can take down everything the command started
  #[cfg(unix)]
  cmd.process_group(0);

  let mut child = cmd.arg("-c")
                     .arg(&config.command)
                     .current_dir(repo.workdir())
                     .stdin(Stdio::null())
                     .stdout(stdout)
                     .stderr(stderr)
                     .kill_on_drop(true)
                     .spawn()?;

  let exit = match config.timeout {
    | Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
      | Ok(status) => Exit::from(status?),
      | Err(_) => {
        log::warn!("job {}: timed out after {}s, killing", config.job_id, limit.as_secs());
        kill_group(&mut child).await?;
        Exit::TimedOut
      },
    },
    | None => Exit::from(child.wait().await?),
  };

  repo.write_file(EXITCODE_LOG, &format!("{}\n", exit.code()))?;

  Ok(exit)
}

/// Kill `child` and every process in its group, then reap it
async fn kill_group(child: &mut Child) -> std::io::Result<()> {
  #[cfg(unix)]
  {
    use nix::{sys::signal::{killpg, Signal},
              unistd::Pid};

    if let Some(pid) = child.id() {
      match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        | Ok(()) => return child.wait().await.map(|_| ()),
        | Err(e) => log::warn!("could not kill process group {}: {}", pid, e),
      }
    }
  }

  child.kill().await
}
