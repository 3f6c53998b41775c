use itertools::Itertools;
use tracing::{debug, instrument, trace};

use crate::*;
use tables::SegmentRow;
use super::calendar::*;

/// Week coverage of the rows recorded for one directed pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PairCoverage {
  pub id_start: Id,
  pub id_end: Id,
  pub complete: bool,
  pub uncovered_secs: u32,
}

/// Seconds of the week covered by `row`, as up to two half-open `[start, end)` intervals in
/// `0..=SECS_PER_WEEK`.  The row's end is inclusive.
///
/// When both ends are calendar dates the real span is used, so a row lasting a week or more
/// covers everything and one ending before it starts covers nothing.  Otherwise the end is
/// the next matching weekday and time, wrapping past Sunday into Monday.
fn row_intervals(row: &SegmentRow) -> Vec<(u32, u32)> {
  let start = WeekInstant::new(row.start_day.weekday(), row.start_time);
  let len = match row.dated_span_secs() {
    Some(span) if span < 0 => {
      trace!(?row, "row ends before it starts");
      return Vec::new();
    }
    Some(span) if span >= SECS_PER_WEEK as i64 - 1 => return vec![(0, SECS_PER_WEEK)],
    Some(span) => span as u32 + 1,
    None => start.until(WeekInstant::new(row.end_day.weekday(), row.end_time)) + 1,
  };
  let s = start.secs();
  if s + len <= SECS_PER_WEEK {
    vec![(s, s + len)]
  } else {
    vec![(s, SECS_PER_WEEK), (0, s + len - SECS_PER_WEEK)]
  }
}

/// Size of the union of half-open intervals.
fn covered_secs(mut intervals: Vec<(u32, u32)>) -> u32 {
  intervals.sort_unstable();
  let mut total = 0;
  let mut current: Option<(u32, u32)> = None;
  for (a, b) in intervals {
    current = match current {
      Some((ca, cb)) if a <= cb => Some((ca, cb.max(b))),
      Some((ca, cb)) => {
        total += cb - ca;
        Some((a, b))
      }
      None => Some((a, b)),
    };
  }
  if let Some((ca, cb)) = current {
    total += cb - ca;
  }
  total
}

/// Checks, for every distinct `(id_start, id_end)`, whether its rows cover the whole week.
/// Results are in ascending pair order.
#[instrument(level="debug", skip(rows), fields(n=rows.len()))]
pub fn check_coverage(rows: &[SegmentRow]) -> Vec<PairCoverage> {
  let mut by_pair: Map<(Id, Id), Vec<(u32, u32)>> = Map::default();
  for r in rows {
    by_pair.entry((r.id_start, r.id_end)).or_default().extend(row_intervals(r));
  }

  let result = by_pair.into_iter()
    .sorted_by_key(|(pair, _)| *pair)
    .map(|((id_start, id_end), intervals)| {
      let uncovered_secs = SECS_PER_WEEK - covered_secs(intervals);
      trace!(id_start, id_end, uncovered_secs);
      PairCoverage { id_start, id_end, complete: uncovered_secs == 0, uncovered_secs }
    })
    .collect_vec();

  debug!(pairs=result.len(), incomplete=result.iter().filter(|c| !c.complete).count());
  result
}
