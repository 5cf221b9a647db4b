use std::collections::HashMap;

use chrono::NaiveDateTime;
use ini::{Ini, ParseOption};
use serde::{de::{value::MapDeserializer, Error as _},
            Deserialize as De,
            Deserializer};

use super::{Error, Result, SECTION};
use crate::extra::str::StrExtra;

/// Format of `run_at`, e.g. `2000-01-01T12:00:00.0` (fraction optional)
pub const RUN_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A job as described by the user in the descriptor file
#[derive(Debug, Clone, PartialEq, De)]
pub struct Descriptor {
  /// Shell command to execute
  pub command: String,
  /// Base name of the results branch
  #[serde(default = "default_name")]
  pub name: String,
  /// Return from the push without waiting for the job
  #[serde(default, deserialize_with = "bool_ish")]
  pub detach: bool,
  /// When to start, in server-local time. `None` or a past time means now
  #[serde(default, deserialize_with = "run_at")]
  pub run_at: Option<NaiveDateTime>,
  /// Report every git command and its output
  #[serde(default, deserialize_with = "bool_ish")]
  pub verbose: bool,
  /// Kill the command after this many seconds. Must be positive
  #[serde(default, deserialize_with = "seconds")]
  pub timeout: Option<u64>,
}

fn default_name() -> String {
  "job".into()
}

fn bool_ish<'de, D: Deserializer<'de>>(d: D) -> core::result::Result<bool, D::Error> {
  let s = String::deserialize(d)?;
  s.bool_ish()
   .ok_or_else(|| D::Error::custom(format!("expected yes or no, found {:?}", s)))
}

fn run_at<'de, D: Deserializer<'de>>(d: D) -> core::result::Result<Option<NaiveDateTime>, D::Error> {
  let s = String::deserialize(d)?;

  match s.trim() {
    | "" => Ok(None),
    | s => NaiveDateTime::parse_from_str(s, RUN_AT_FORMAT)
             .map(Some)
             .map_err(|e| D::Error::custom(format!("run_at {:?} is not YYYY-MM-DDTHH:MM:SS.ffffff ({})", s, e))),
  }
}

fn seconds<'de, D: Deserializer<'de>>(d: D) -> core::result::Result<Option<u64>, D::Error> {
  let s = String::deserialize(d)?;

  match s.trim() {
    | "" => Ok(None),
    | s => s.parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("timeout {:?} is not a whole number of seconds", s))),
  }
}

impl Descriptor {
  /// Parse descriptor text.
  ///
  /// Yields `Ok(None)` when the text has no `[job]` section, i.e. is not a job at all.
  pub fn parse(text: &str) -> Result<Option<Self>> {
    let section = match ini_section(text, SECTION)? {
      | Some(section) => section,
      | None => return Ok(None),
    };

    let map = MapDeserializer::<_, serde::de::value::Error>::new(section.into_iter());
    let desc = Self::deserialize(map).map_err(|e| Error::Descriptor(e.to_string()))?;

    if desc.command.trim().is_empty() {
      return Err(Error::Descriptor("command is empty".into()));
    }

    if desc.timeout == Some(0) {
      return Err(Error::Descriptor("timeout must be at least 1 second".into()));
    }

    if !desc.name.is_ref_component() {
      return Err(Error::Descriptor(format!("name {:?} can't be used as a branch name (use letters, digits, \
                                            '-', '_' or '.')",
                                           desc.name)));
    }

    Ok(Some(desc))
  }
}

/// Keys and values of every `[section]` named `wanted`, `None` if there is none.
///
/// Keys are lowercased. Indented lines continue the previous value.
/// Values are taken literally: no quotes, escapes or inline comments.
/// Repeated sections are merged, later keys win.
fn ini_section(text: &str, wanted: &str) -> Result<Option<HashMap<String, String>>> {
  let opt = ParseOption { enabled_quote: false,
                          enabled_escape: false,
                          enabled_indented_mutiline_value: true,
                          ..ParseOption::default() };

  let ini = Ini::load_from_str_opt(text, opt).map_err(|e| Error::Descriptor(e.to_string()))?;

  let mut sections = ini.section_all(Some(wanted)).peekable();
  if sections.peek().is_none() {
    return Ok(None);
  }

  let keys = sections.flat_map(|props| props.iter())
                     .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
                     .collect();

  Ok(Some(keys))
}
