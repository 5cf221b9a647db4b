use std::{fmt, str::FromStr};

use serde::{Deserialize as De, Serialize as Ser};

use crate::{extra::str::StrExtra, git};

/// Validated, scheduled jobs
pub mod config;

/// The `job.ini` format
pub mod descriptor;

/// Handing jobs to workers
pub mod exec;

/// The `post-receive` side
pub mod receive;

/// Running a job and publishing its results
pub mod worker;

pub use config::Config;
pub use descriptor::Descriptor;

/// File on the mainline branch that holds a job descriptor
pub const DESCRIPTOR_FILE: &str = "job.ini";

/// The descriptor section pushjob reads; a file without it is not a job
pub const SECTION: &str = "job";

/// What the mainline branch holds when it is ready for submissions
pub const TEMPLATE: &str = r#"[job]
# Command to execute, run with `sh -c` from the root of this branch.
# It can refer to any file you commit alongside this one (e.g. sh build.sh)
command = uname -a

# Base name of your results branch
name = run_date

# Don't wait for the job to complete before the push returns
detach = yes

# Time to execute the command (server timezone).
# To execute instantly, set this to a date in the past.
run_at = 2000-01-01T12:00:00.0

# Print all debug information
verbose = no
"#;

/// Commit message used when mainline is reset to [`TEMPLATE`]
pub const READY_MESSAGE: &str = "Ready for job submissions.";

/// Commit message used by the worker for a job's results
pub const DONE_MESSAGE: &str = "Job complete";

/// Captured standard output of a job
pub const STDOUT_LOG: &str = "stdout.log";

/// Captured standard error of a job
pub const STDERR_LOG: &str = "stderr.log";

/// Exit status of a job, a single integer line
pub const EXITCODE_LOG: &str = "exitcode.log";

/// Exit status recorded for a job killed because its `timeout` elapsed
pub const TIMED_OUT_EXIT: i32 = 124;

/// Job errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The descriptor has a `[job]` section but is otherwise unusable
  #[error("invalid job descriptor: {0}")]
  Descriptor(String),
  /// A job id given on the command line can't name a branch
  #[error("{0:?} is not a job id")]
  InvalidId(String),
  /// The job branch holds no job descriptor
  #[error("branch {0} holds no job")]
  NotAJob(Id),
  /// Issue managing the repository
  #[error(transparent)]
  Git(#[from] git::Error),
  /// Running the job command
  #[error("job command: {0}")]
  Io(#[from] std::io::Error),
}

/// Job result
pub type Result<T> = core::result::Result<T, self::Error>;

/// Job ID, doubling as the name of the job's branch.
///
/// `<name>-<short hash of the submitted commit>`, so two submissions never share one.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Ser, De)]
pub struct Id(String);

impl Id {
  /// Build the id of a job named `name` submitted as commit `short_hash`
  pub fn new(name: &str, short_hash: &str) -> Self {
    Self(format!("{}-{}", name, short_hash))
  }

  /// The job's branch
  pub fn branch(&self) -> git::Branch {
    git::Branch(self.0.clone())
  }
}

impl FromStr for Id {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.is_ref_component() {
      | true => Ok(Self(s.to_string())),
      | false => Err(Error::InvalidId(s.to_string())),
    }
  }
}

impl std::ops::Deref for Id {
  type Target = String;

  fn deref(&self) -> &String {
    &self.0
  }
}

impl fmt::Display for Id {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn id_is_name_dash_hash() {
    let id = Id::new("nightly", "3f2a1c9");
    assert_eq!(&*id, "nightly-3f2a1c9");
    assert_eq!(id.branch(), git::Branch::from("nightly-3f2a1c9"));
  }

  #[test]
  fn ids_from_args_must_name_a_branch() {
    assert_eq!("job-abc1234".parse::<Id>().unwrap(), Id::new("job", "abc1234"));
    assert!("--help".parse::<Id>().is_err());
    assert!("a b".parse::<Id>().is_err());
    assert!("".parse::<Id>().is_err());
  }

  #[test]
  fn template_is_a_valid_job() {
    let desc = Descriptor::parse(TEMPLATE).unwrap().unwrap();
    assert_eq!(desc.command, "uname -a");
    assert_eq!(desc.name, "run_date");
    assert!(desc.detach);
    assert!(!desc.verbose);
  }
}
