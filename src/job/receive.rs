use std::io::BufRead;

use super::{exec::Executor, Config, Error, Id, DESCRIPTOR_FILE, READY_MESSAGE, TEMPLATE};
use crate::{git, git::RepoContext, report::Reporter, result_extra::ResultExtra, settings::Settings};

/// One line of `post-receive` input: `<old-oid> <new-oid> <ref-name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
  /// Value of the ref before the push
  pub old: String,
  /// Value of the ref after the push
  pub new: String,
  /// Fully qualified ref name
  pub name: String,
}

impl RefUpdate {
  /// Parse one input line, `None` if it isn't three space-separated fields
  pub fn parse(line: &str) -> Option<Self> {
    match line.split_whitespace().collect::<Vec<_>>().as_slice() {
      | [old, new, name] => Some(Self { old: old.to_string(),
                                        new: new.to_string(),
                                        name: name.to_string() }),
      | _ => None,
    }
  }

  /// Whether the push deleted this ref (git reports an all-zero new object id)
  pub fn is_delete(&self) -> bool {
    !self.new.is_empty() && self.new.chars().all(|c| c == '0')
  }
}

/// What a receiver run did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  /// Not a single update of mainline; nothing was touched
  Rejected,
  /// A push made by pushjob itself; nothing was touched
  Ignored,
  /// Mainline held no usable job and was reset to the template
  Bootstrapped,
  /// A job branch was created and handed to a worker
  Accepted {
    /// The new job
    id: Id,
    /// Whether the worker was left running
    detach: bool,
  },
}

/// The receiving side of a push: decides whether it submitted a job,
/// records the job as a branch and hands it to a worker.
///
/// Each run ends in exactly one [`Outcome`].
#[derive(Debug)]
pub struct Receiver<'a> {
  settings: &'a Settings,
  git: &'a dyn git::Client,
  executor: &'a dyn Executor,
  report: Reporter,
}

impl<'a> Receiver<'a> {
  /// Create a receiver
  pub fn new(settings: &'a Settings,
             git: &'a dyn git::Client,
             executor: &'a dyn Executor,
             report: Reporter)
             -> Self {
    Self { settings,
           git,
           executor,
           report }
  }

  /// Read `post-receive` input and act on it
  pub fn receive_from(&self, input: impl BufRead) -> crate::Result<Outcome> {
    let lines = input.lines()
                     .collect::<std::io::Result<Vec<_>>>()?
                     .into_iter()
                     .filter(|l| !l.trim().is_empty())
                     .collect::<Vec<_>>();

    self.receive(&lines)
  }

  /// Act on the lines a push fed the hook, one per updated ref
  pub fn receive(&self, lines: &[String]) -> crate::Result<Outcome> {
    self.report.banner();
    self.report.debug(format!("{:?}", lines));

    if self.settings.internal_push {
      log::info!("push made by pushjob, ignoring");
      return Ok(Outcome::Ignored);
    }

    if !self.only_mainline(lines) {
      self.report
          .warn(format!("To create a job, push only to the {} branch.", self.settings.mainline));
      return Ok(Outcome::Rejected);
    }

    let repo = self.git.open()?;
    repo.clone_repo().tolerate(&self.report, "clone");
    repo.checkout(&self.settings.mainline).tolerate(&self.report, "checkout");

    match Config::load(&*repo) {
      | Ok(Some(config)) => self.accept(&*repo, config),
      | Ok(None) => {
        self.report.info(format!("No job found on {}, adding the sample {}.",
                                 self.settings.mainline, DESCRIPTOR_FILE));
        self.bootstrap(&*repo)
      },
      | Err(Error::Descriptor(why)) => {
        self.report.err(format!("Invalid {}: {}", DESCRIPTOR_FILE, why));
        self.bootstrap(&*repo)
      },
      | Err(e) => Err(e.into()),
    }
  }

  /// Exactly one ref was updated, and it is mainline
  fn only_mainline(&self, lines: &[String]) -> bool {
    let mainline = self.settings.mainline.ref_name();

    match lines {
      | [line] => RefUpdate::parse(line).map(|up| up.name == mainline && !up.is_delete())
                                        .unwrap_or(false),
      | _ => false,
    }
  }

  /// Put the template back on mainline and publish only mainline
  fn bootstrap(&self, repo: &dyn RepoContext) -> crate::Result<Outcome> {
    self.reset_mainline(repo, &self.report);
    repo.push_branch(&self.settings.remote, &self.settings.mainline)
        .tolerate(&self.report, "push");

    self.report.info("Please pull and try again.");
    Ok(Outcome::Bootstrapped)
  }

  /// Branch the job off mainline, reset mainline, publish both and start the worker
  fn accept(&self, repo: &dyn RepoContext, config: Config) -> crate::Result<Outcome> {
    let report = self.report.verbose(self.report.is_verbose() || config.verbose);
    let id = config.job_id.clone();

    report.info("Received job");

    repo.branch_create(&id.branch()).tolerate(&report, "branch");
    self.reset_mainline(repo, &report);

    // the worker clones this branch, so it must be pushed before the worker starts
    repo.push_all().tolerate(&report, "push");

    self.executor.spawn(&id, config.detach, &report)?;

    report.ok(format!("Job submitted, id {}", id));
    report.ok("To retrieve your job, do:");
    report.ok(format!("git fetch --all && git checkout {}", id));

    Ok(Outcome::Accepted { id,
                           detach: config.detach })
  }

  fn reset_mainline(&self, repo: &dyn RepoContext, report: &Reporter) {
    report.debug(format!("Rolling back {}", self.settings.mainline));

    repo.reset_to(&self.settings.mainline, DESCRIPTOR_FILE, TEMPLATE, READY_MESSAGE)
        .tolerate(report, "reset");
  }
}
