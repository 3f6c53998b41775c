use chrono::{NaiveTime, Weekday};
use crate::{Error, Result};

mod observations;
pub use observations::{ObservationsCsv, parse_observations};

mod segments;
pub use segments::{SegmentsCsv, parse_segments};


mod nom_prelude {
  pub use nom::{
    IResult,
    error::{
      self,
      ParseError,
      FromExternalError,
    },
    sequence::*,
    branch::alt,
    combinator::*,
    character::complete::*,
    bytes::complete::take_while_m_n,
    number::complete::double,
    Finish,
  };
  pub use std::str::FromStr;
  pub use std::num::ParseIntError;
}

mod common;
mod table;

pub trait ParseTable<Fmt>: Sized {
  fn parse(inputs: Fmt) -> crate::Result<Self>;
}

fn parse_value<'a, T>(
  what: &str,
  input: &'a str,
  parser: impl FnMut(&'a str) -> nom_prelude::IResult<&'a str, T>,
) -> Result<T> {
  use nom_prelude::*;
  all_consuming(parser)(input.trim())
    .finish()
    .map(|(_, v)| v)
    .map_err(|_| Error::InvalidConfig(format!("invalid {}: {:?}", what, input)).into())
}

/// Parses a weekday name (`Monday`, `mon`, ...) or an ISO date, which stands for its weekday.
pub fn parse_day(input: &str) -> Result<Weekday> {
  parse_value("day", input, common::weekday_)
}

/// Parses a time of day in `HH:MM` or `HH:MM:SS` form.
pub fn parse_time(input: &str) -> Result<NaiveTime> {
  parse_value("time of day", input, common::time_of_day_)
}

/// Like [`parse_time`], but returns seconds since midnight and also accepts `24:00`.
pub fn parse_clock_secs(input: &str) -> Result<u32> {
  parse_value("clock time", input, common::clock_secs_)
}
