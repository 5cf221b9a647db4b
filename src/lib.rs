//! # pushjob
//! I'm a git `post-receive` hook that runs the commands you push to me.
//!
//! # Flow
//! - User commits a `job.ini` to `master` and pushes
//!   ```ini
//!   [job]
//!   command = make bench
//!   name = bench
//!   detach = yes
//!   run_at = 2031-01-01T03:00:00.0
//!   ```
//! - pushjob checks the push updated `master` and nothing else
//! - pushjob clones the repository into a temporary directory and reads `job.ini`
//! - no `[job]` section (or an unusable one): `master` is reset to a sample `job.ini`, user is told to pull and
//!   retry
//! - otherwise pushjob creates the branch `bench-<short hash>` holding the job,
//!   resets `master` to the sample and pushes both
//! - a worker process clones the job branch, sleeps until `run_at`, runs `command` with `sh -c`
//!   and commits `stdout.log`, `stderr.log` and `exitcode.log` to the job branch
//! - user does `git fetch --all && git checkout bench-<short hash>`
//!
//! # Setup
//! ```sh
//! git init --bare jobs.git
//! cp target/release/pushjob jobs.git/hooks/post-receive
//! git clone jobs.git && cd jobs && touch x && git add x && git commit -m init && git push
//! ```
//! The first push holds no job, so it installs the sample. Pull and edit it.
//!
//! # Configuration
//! Read from the environment (and `.env`, if present):
//!   - `PUSHJOB_REPO`: canonical repository. Defaults to the grandparent of the executable (`<repo>/hooks/..`)
//!   - `PUSHJOB_GIT`: git binary, default `git`
//!   - `PUSHJOB_MAINLINE`: submission branch, default `master`
//!   - `PUSHJOB_REMOTE`: remote name in working copies, default `origin`
//!   - `PUSHJOB_COMMITTER_NAME`, `PUSHJOB_COMMITTER_EMAIL`: identity of pushjob's commits
//!   - `PUSHJOB_VERBOSE`: report git output for every job
//!   - `RUST_LOG`: diagnostics on stderr, default `pushjob=warn`

#![cfg_attr(not(test), forbid(missing_debug_implementations, unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code, missing_copy_implementations))]

/// Helper result methods
pub mod result_extra;

/// Helper functions
pub mod extra;

/// Submitter-facing status lines
pub mod report;

/// Runtime configuration
pub mod settings;

/// Git stuff
pub mod git;

/// Jobs: descriptors, receiving pushes & running them
pub mod job;

/// Anything that can end a pushjob run
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Settings could not be resolved
  #[error(transparent)]
  Settings(#[from] settings::Error),
  /// A git operation that can't be tolerated failed
  #[error(transparent)]
  Git(#[from] git::Error),
  /// The job could not be read or run
  #[error(transparent)]
  Job(#[from] job::Error),
  /// The worker could not be started
  #[error(transparent)]
  Exec(#[from] job::exec::Error),
  /// Reading hook input
  #[error("reading ref updates: {0}")]
  Io(#[from] std::io::Error),
}

/// pushjob result
pub type Result<T> = core::result::Result<T, self::Error>;
