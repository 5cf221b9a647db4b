use std::{fmt,
          io::{self, Write},
          sync::{Arc, Mutex, MutexGuard, PoisonError}};

/// Where submitter-facing lines are written
pub type Sink = Arc<Mutex<dyn Write + Send>>;

/// Status lines relayed back to whoever pushed.
///
/// git forwards a hook's stdout to the pushing client (prefixed with `remote:`),
/// so this is the only response a submitter ever sees.
/// Every line is also mirrored to the `log` facade.
///
/// Cloning a reporter shares the sink; [`Reporter::verbose`] yields a copy
/// with a different verbosity that still writes to the same place.
#[derive(Clone)]
pub struct Reporter {
  verbose: bool,
  sink: Sink,
}

impl fmt::Debug for Reporter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Reporter")
     .field("verbose", &self.verbose)
     .field("sink", &"dyn Write")
     .finish()
  }
}

impl Reporter {
  /// Create a reporter writing to an arbitrary sink
  pub fn new(sink: Sink, verbose: bool) -> Self {
    Self { verbose, sink }
  }

  /// Create a reporter writing to this process' stdout
  pub fn stdout(verbose: bool) -> Self {
    Self::new(Arc::new(Mutex::new(io::stdout())), verbose)
  }

  /// Create a reporter writing to an in-memory buffer, yielding the buffer alongside it
  pub fn captured(verbose: bool) -> (Self, Captured) {
    let buf = Arc::new(Mutex::new(Vec::<u8>::new()));
    let sink: Sink = buf.clone();

    (Self::new(sink, verbose), Captured(buf))
  }

  /// A copy of this reporter with verbosity switched on or off
  pub fn verbose(&self, verbose: bool) -> Self {
    Self { verbose,
           sink: self.sink.clone() }
  }

  /// Whether verbose diagnostics are written to the sink
  pub fn is_verbose(&self) -> bool {
    self.verbose
  }

  /// Program banner
  pub fn banner(&self) {
    self.info("pushjob - git push to run a command");
  }

  /// Progress
  pub fn info(&self, msg: impl AsRef<str>) {
    log::debug!(target: "pushjob::report", "info: {}", msg.as_ref());
    self.line(msg.as_ref());
  }

  /// Success
  pub fn ok(&self, msg: impl AsRef<str>) {
    log::debug!(target: "pushjob::report", "ok: {}", msg.as_ref());
    self.line(msg.as_ref());
  }

  /// The push was not acted on
  pub fn warn(&self, msg: impl AsRef<str>) {
    log::debug!(target: "pushjob::report", "warn: {}", msg.as_ref());
    self.line(msg.as_ref());
  }

  /// Something went wrong on our end
  pub fn err(&self, msg: impl AsRef<str>) {
    log::debug!(target: "pushjob::report", "err: {}", msg.as_ref());
    self.line(msg.as_ref());
  }

  /// Diagnostics, only written to the sink when verbose
  pub fn debug(&self, msg: impl AsRef<str>) {
    let msg = msg.as_ref().trim_end();
    log::debug!("{}", msg);

    if self.verbose && !msg.is_empty() {
      self.line(msg);
    }
  }

  fn line(&self, msg: &str) {
    let mut sink = self.sink();

    // a closed stdout must never fail the hook
    if let Err(e) = writeln!(sink, ">>> {}", msg).and_then(|_| sink.flush()) {
      log::warn!("could not write report line: {}", e);
    }
  }

  fn sink(&self) -> MutexGuard<'_, dyn Write + Send + 'static> {
    self.sink.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// In-memory sink returned by [`Reporter::captured`]
#[derive(Clone, Debug)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
  /// Everything written so far
  pub fn contents(&self) -> String {
    let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&buf).to_string()
  }
}
