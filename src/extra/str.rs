/// Extra string stuff
pub trait StrExtra {
  /// Case- and whitespace-insensitive equality
  fn loose_eq<O: AsRef<str>>(&self, other: O) -> bool;

  /// Parse a boolean-ish descriptor value (`yes`, `no`, `on`, `off`, `1`, `0`, `true`, `false`)
  fn bool_ish(&self) -> Option<bool>;

  /// Whether this string can be used as a single branch name without quoting or escaping
  fn is_ref_component(&self) -> bool;
}

impl<T: AsRef<str>> StrExtra for T {
  fn loose_eq<O: AsRef<str>>(&self, other: O) -> bool {
    self.as_ref().trim().to_lowercase() == other.as_ref().trim().to_lowercase()
  }

  fn bool_ish(&self) -> Option<bool> {
    let is = |words: &[&str]| words.iter().any(|w| self.loose_eq(w));

    if is(&["1", "yes", "true", "on"][..]) {
      Some(true)
    } else if is(&["0", "no", "false", "off"][..]) {
      Some(false)
    } else {
      None
    }
  }

  fn is_ref_component(&self) -> bool {
    let s = self.as_ref();
    let allowed = |c: char| c.is_ascii_alphanumeric() || "-_.".contains(c);

    !s.is_empty()
    && s.chars().all(allowed)
    && !s.starts_with('-')
    && !s.starts_with('.')
    && !s.ends_with('.')
    && !s.ends_with(".lock")
    && !s.contains("..")
  }
}
