//! A bare canonical repository plus a submitter's clone of it, in a temp dir.

#![allow(dead_code)]

use std::{ffi::OsStr,
          fs,
          path::{Path, PathBuf},
          process::{Command, Output},
          sync::Mutex};

use pushjob::{git::r#impl::LocalClient,
              job::{self, exec},
              report::Reporter,
              settings::{Settings, INTERNAL_PUSH_VAR}};
use tempfile::TempDir;

pub trait ExpectOk {
  fn expect_ok(self, what: &str) -> Self;
}

impl ExpectOk for Output {
  fn expect_ok(self, what: &str) -> Self {
    if !self.status.success() {
      panic!("{} failed ({}): {}", what, self.status, String::from_utf8_lossy(&self.stderr));
    }

    self
  }
}

pub fn init_logger() {
  simple_logger::SimpleLogger::new().with_level(log::LevelFilter::Info)
                                    .init()
                                    .ok();
}

/// Run git in `dir` as a user would, outside of any hook
pub fn git<A: AsRef<OsStr>>(dir: &Path, args: impl IntoIterator<Item = A>) -> Output {
  let mut cmd = Command::new("git");

  for var in pushjob::git::HOOK_ENV {
    cmd.env_remove(var);
  }

  cmd.args(args)
     .current_dir(dir)
     .env_remove(INTERNAL_PUSH_VAR)
     .env("GIT_AUTHOR_NAME", "Test")
     .env("GIT_AUTHOR_EMAIL", "test@test.com")
     .env("GIT_COMMITTER_NAME", "Test")
     .env("GIT_COMMITTER_EMAIL", "test@test.com")
     .output()
     .unwrap()
}

pub fn stdout(out: Output) -> String {
  String::from_utf8_lossy(&out.stdout).trim().to_string()
}

/// Records jobs instead of starting workers
#[derive(Debug, Default)]
pub struct RecordingExecutor {
  pub spawned: Mutex<Vec<(job::Id, bool)>>,
}

impl RecordingExecutor {
  pub fn spawned(&self) -> Vec<(job::Id, bool)> {
    self.spawned.lock().unwrap().clone()
  }
}

impl exec::Executor for RecordingExecutor {
  fn spawn(&self, job: &job::Id, detach: bool, _: &Reporter) -> exec::Result<()> {
    self.spawned.lock().unwrap().push((job.clone(), detach));
    Ok(())
  }
}

pub struct Fixture {
  pub dir: TempDir,
  /// The canonical bare repository
  pub bare: PathBuf,
  /// A submitter's clone
  pub client: PathBuf,
}

impl Fixture {
  pub fn new() -> Self {
    init_logger();

    let dir = TempDir::new().unwrap();
    let bare = dir.path().join("jobs.git");
    let client = dir.path().join("client");

    git(dir.path(), ["init", "--quiet", "--bare", "jobs.git"]).expect_ok("init bare repo");
    git(&bare, ["symbolic-ref", "HEAD", "refs/heads/master"]).expect_ok("point HEAD at master");
    git(dir.path(), ["clone", "--quiet", "jobs.git", "client"]).expect_ok("clone bare repo");
    git(&client, ["symbolic-ref", "HEAD", "refs/heads/master"]).expect_ok("point client HEAD at master");

    Self { dir, bare, client }
  }

  pub fn settings(&self) -> Settings {
    Settings::new(&self.bare)
  }

  pub fn local_client(&self) -> LocalClient {
    LocalClient::new(&self.settings())
  }

  /// Commit `files` on the client's master and push them,
  /// yielding the line git would feed `post-receive`
  pub fn submit(&self, files: &[(&str, &str)]) -> String {
    self.submit_to("master", files)
  }

  /// [`Fixture::submit`] to another branch
  pub fn submit_to(&self, branch: &str, files: &[(&str, &str)]) -> String {
    let raw = files.iter().map(|(name, content)| (*name, content.as_bytes())).collect::<Vec<_>>();
    self.submit_raw(branch, &raw)
  }

  /// [`Fixture::submit_to`] with arbitrary file contents
  pub fn submit_raw(&self, branch: &str, files: &[(&str, &[u8])]) -> String {
    for (name, content) in files {
      fs::write(self.client.join(name), content).unwrap();
    }

    let name = format!("refs/heads/{}", branch);
    let old = self.rev(&name)
                  .unwrap_or_else(|| "0000000000000000000000000000000000000000".into());

    git(&self.client, ["add", "-A"]).expect_ok("add");
    git(&self.client, ["commit", "--quiet", "--allow-empty", "-m", "submit"]).expect_ok("commit");
    git(&self.client, ["push".to_string(), "--quiet".into(), "origin".into(), format!("HEAD:{}", name)]).expect_ok("push");

    let new = self.rev(&name).unwrap();
    format!("{} {} {}", old, new, name)
  }

  /// Bring the client's master up to date with the canonical repository
  pub fn pull(&self) {
    self.pull_branch("master")
  }

  /// Reset the client's checkout to `branch` of the canonical repository
  pub fn pull_branch(&self, branch: &str) {
    git(&self.client, ["fetch", "--quiet", "origin"]).expect_ok("fetch");
    git(&self.client, ["reset".to_string(), "--quiet".into(), "--hard".into(), format!("origin/{}", branch)]).expect_ok("reset");
  }

  /// Full hash of a rev in the canonical repository
  pub fn rev(&self, rev: &str) -> Option<String> {
    let out = git(&self.bare, ["rev-parse", "--verify", "--quiet", rev]);
    Some(stdout(out)).filter(|s| !s.is_empty())
  }

  /// Contents of `path` at `rev` in the canonical repository
  pub fn show(&self, rev: &str, path: &str) -> Option<String> {
    let out = git(&self.bare, ["show".to_string(), format!("{}:{}", rev, path)]);

    match out.status.success() {
      | true => Some(String::from_utf8_lossy(&out.stdout).to_string()),
      | false => None,
    }
  }

  /// Files at `rev` in the canonical repository
  pub fn files(&self, rev: &str) -> Vec<String> {
    let out = git(&self.bare, ["ls-tree", "--name-only", rev]).expect_ok("ls-tree");
    stdout(out).lines().map(String::from).collect()
  }

  /// Branches of the canonical repository
  pub fn branches(&self) -> Vec<String> {
    let out = git(&self.bare, ["for-each-ref", "--format=%(refname:short)", "refs/heads"]).expect_ok("for-each-ref");
    stdout(out).lines().map(String::from).collect()
  }

  /// Subject of the last commit on `rev`
  pub fn subject(&self, rev: &str) -> String {
    stdout(git(&self.bare, ["log", "-1", "--format=%s", rev]).expect_ok("log"))
  }
}

/// A descriptor for `command`, with every other key given
pub fn descriptor(command: &str, name: &str, detach: bool, extra: &str) -> String {
  format!("[job]\ncommand = {}\nname = {}\ndetach = {}\nrun_at = 2000-01-01T12:00:00.0\nverbose = no\n{}",
          command,
          name,
          if detach { "yes" } else { "no" },
          extra)
}
