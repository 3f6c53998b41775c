pub use anyhow::Result;

use std::fmt;

/// Node identifier, as found in the `id_*` columns of the input tables.
pub type Id = u32;
pub type Distance = f64;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
  MalformedInput { line: usize, column: String, reason: String },
  NegativeDistance { from: Id, to: Id, distance: Distance },
  UnknownIdentifier(Id),
  InvalidConfig(String),
}

impl Error {
  pub(crate) fn malformed(line: usize, column: &str, reason: impl Into<String>) -> Self {
    Error::MalformedInput { line, column: column.to_string(), reason: reason.into() }
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

impl std::error::Error for Error {}


pub mod raw;
pub mod parsers;

pub use raw::{Observation, SegmentRow, Day, FromRaw};
pub use parsers::{
  ParseTable,
  ObservationsCsv,
  SegmentsCsv,
  parse_observations,
  parse_segments,
  parse_day,
  parse_time,
  parse_clock_secs,
};
