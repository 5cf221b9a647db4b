use crate::{job, report::Reporter};

/// Implementation
pub mod r#impl;

/// Errors handing a job to a worker
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The worker process could not be started
  #[error("could not start worker for {0}: {1}")]
  Spawn(job::Id, std::io::Error),
}

/// Execute result
pub type Result<T> = core::result::Result<T, Error>;

/// Hand an accepted job to a worker.
///
/// `detach == true` is fire-and-forget: return as soon as the worker is started,
/// and let it outlive the caller.
/// `detach == false` blocks until the worker has finished, reporting its output at verbose level.
///
/// Either way the job's outcome is recorded on its branch, not returned here.
pub trait Executor: std::fmt::Debug {
  /// Start a worker for `job`
  fn spawn(&self, job: &job::Id, detach: bool, report: &Reporter) -> Result<()>;
}
