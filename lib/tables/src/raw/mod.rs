use crate::{Error, Id, Distance, Result};
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};

pub trait FromRaw<T> where Self: Sized {
  fn from_raw(raw: T) -> Result<Self>;
}

/// A directed distance measurement between two nodes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Observation {
  pub from: Id,
  pub to: Id,
  pub distance: Distance,
}

impl Observation {
  pub fn new(from: Id, to: Id, distance: Distance) -> Self {
    Observation { from, to, distance }
  }

  /// Rejects distances which cannot be stored in a distance matrix.
  pub fn check(&self) -> Result<()> {
    check_distance(self.from, self.to, self.distance, 0)
  }
}

/// A `startDay`/`endDay` value, which is either a day of the week or a calendar date.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Day {
  Weekday(Weekday),
  Date(NaiveDate),
}

impl Day {
  pub fn weekday(&self) -> Weekday {
    match self {
      Day::Weekday(d) => *d,
      Day::Date(d) => d.weekday(),
    }
  }
}

impl From<Weekday> for Day {
  fn from(d: Weekday) -> Day { Day::Weekday(d) }
}

/// A row of a segment-oriented table: a directed segment together with the
/// interval of the week it was recorded for.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SegmentRow {
  pub id_start: Id,
  pub id_end: Id,
  pub distance: Distance,
  pub start_day: Day,
  pub start_time: NaiveTime,
  pub end_day: Day,
  pub end_time: NaiveTime,
}

impl SegmentRow {
  pub fn check(&self) -> Result<()> {
    check_distance(self.id_start, self.id_end, self.distance, 0)
  }

  /// Seconds from start to end when both days are calendar dates.  Negative if the row ends
  /// before it starts.
  pub fn dated_span_secs(&self) -> Option<i64> {
    match (self.start_day, self.end_day) {
      (Day::Date(a), Day::Date(b)) => {
        Some((b.and_time(self.end_time) - a.and_time(self.start_time)).num_seconds())
      }
      _ => None,
    }
  }
}

/// `line` is only used for error reporting; pass 0 when the value did not come from a file.
pub(crate) fn check_distance(from: Id, to: Id, distance: Distance, line: usize) -> Result<()> {
  if distance.is_nan() || distance.is_infinite() {
    Err(Error::malformed(line, "distance", format!("distance {} is not finite", distance)).into())
  } else if distance < 0.0 {
    Err(Error::NegativeDistance { from, to, distance }.into())
  } else {
    Ok(())
  }
}
