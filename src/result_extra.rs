use std::fmt::Display;

use crate::report::Reporter;

/// Extra result methods
pub trait ResultExtra<T, E> {
  /// turn Err state into Ok
  fn and_then_err<R>(self, f: impl Fn(E) -> Result<T, R>) -> Result<T, R>;

  /// if the result is Ok, pass the value through a predicate.
  /// If predicate fails, map to an error
  fn filter(self, f: impl Fn(&T) -> bool, err: impl Fn(T) -> E) -> Result<T, E>;

  /// Swallow an error, reporting it at verbose level.
  ///
  /// Used for operations that must never block a push
  /// (a failed clone, checkout or push is logged and the caller carries on).
  fn tolerate(self, report: &Reporter, what: &str) -> Option<T>
    where E: Display;
}

impl<T, E> ResultExtra<T, E> for Result<T, E> {
  fn and_then_err<R>(self, f: impl Fn(E) -> Result<T, R>) -> Result<T, R> {
    match self {
      | Ok(t) => Ok(t),
      | Err(e) => f(e),
    }
  }

  fn filter(self, f: impl Fn(&T) -> bool, err: impl Fn(T) -> E) -> Result<T, E> {
    self.and_then(|t| match f(&t) {
          | true => Ok(t),
          | false => Err(err(t)),
        })
  }

  fn tolerate(self, report: &Reporter, what: &str) -> Option<T>
    where E: Display
  {
    match self {
      | Ok(t) => Some(t),
      | Err(e) => {
        log::warn!("{} failed, continuing: {}", what, e);
        report.debug(format!("{} failed: {}", what, e));
        None
      },
    }
  }
}
