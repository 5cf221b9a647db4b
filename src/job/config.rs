use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use super::{Descriptor, Error, Id, Result, DESCRIPTOR_FILE};
use crate::{git, git::RepoContext};

/// A validated job, read from the descriptor committed at HEAD of a working copy
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  /// `<name>-<short hash of HEAD>`
  pub job_id: Id,
  /// Shell command to execute
  pub command: String,
  /// Return from the push without waiting for the job
  pub detach: bool,
  /// Requested start time, server-local
  pub run_at: Option<NaiveDateTime>,
  /// Report every git command and its output
  pub verbose: bool,
  /// Kill the command once this elapses
  pub timeout: Option<Duration>,
  /// Seconds from construction until `run_at`. Zero or negative means run immediately
  pub wait_seconds: f64,
}

impl Config {
  /// Validate a descriptor submitted as commit `short_hash`, scheduling it relative to `now`
  pub fn new(desc: Descriptor, short_hash: &str, now: NaiveDateTime) -> Self {
    let wait_seconds = desc.run_at
                           .map(|at| at.signed_duration_since(now))
                           .map(|d| {
                             d.num_microseconds()
                              .map(|us| us as f64 / 1_000_000.0)
                              .unwrap_or(d.num_seconds() as f64)
                           })
                           .unwrap_or(0.0);

    Self { job_id: Id::new(&desc.name, short_hash),
           command: desc.command,
           detach: desc.detach,
           run_at: desc.run_at,
           verbose: desc.verbose,
           timeout: desc.timeout.map(Duration::from_secs),
           wait_seconds }
  }

  /// Load the job committed at HEAD of `repo`, scheduled relative to the current local time.
  ///
  /// `Ok(None)` means HEAD holds no job: the descriptor file or its `[job]` section is missing.
  /// A descriptor that isn't text is an [`Error::Descriptor`] like any other unusable one.
  pub fn load(repo: &dyn RepoContext) -> Result<Option<Self>> {
    Self::load_at(repo, Local::now().naive_local())
  }

  /// [`Config::load`] with an explicit "now"
  pub fn load_at(repo: &dyn RepoContext, now: NaiveDateTime) -> Result<Option<Self>> {
    let desc = match repo.read_file(DESCRIPTOR_FILE) {
      | Ok(Some(text)) => Descriptor::parse(&text)?,
      | Ok(None) => None,
      | Err(git::Error::NotText(file)) => return Err(Error::Descriptor(format!("{} is not UTF-8 text", file))),
      | Err(e) => return Err(e.into()),
    };

    match desc {
      | Some(desc) => {
        let hash = repo.short_revision()?;
        Ok(Some(Self::new(desc, &hash, now)))
      },
      | None => Ok(None),
    }
  }

  /// How long to sleep before running, if at all
  pub fn wait(&self) -> Option<Duration> {
    match self.wait_seconds > 0.0 {
      | true => Some(Duration::from_secs_f64(self.wait_seconds)),
      | false => None,
    }
  }
}
