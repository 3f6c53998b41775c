use std::path::Path;
use anyhow::Context;
use tracing::info;
use tables::{FromRaw, Observation, SegmentRow, ParseTable, ObservationsCsv, SegmentsCsv};

use crate::Result;
use crate::toll::{Segment, WeekInstant, RateCoefficients, ScheduledRate, ScheduledSegment};

impl FromRaw<SegmentRow> for ScheduledSegment {
  fn from_raw(raw: SegmentRow) -> Result<Self> {
    raw.check()?;
    Ok(ScheduledSegment {
      segment: Segment { id_start: raw.id_start, id_end: raw.id_end, distance: raw.distance },
      start: WeekInstant::new(raw.start_day.weekday(), raw.start_time),
    })
  }
}

pub fn load_observations(path: impl AsRef<Path>) -> Result<Vec<Observation>> {
  let path = path.as_ref();
  let obs = Vec::<Observation>::parse(ObservationsCsv(path))
    .context(format!("failed to load observations from {:?}", path))?;
  info!(n=obs.len(), ?path, "loaded observations");
  Ok(obs)
}

pub fn load_segments(path: impl AsRef<Path>) -> Result<Vec<SegmentRow>> {
  let path = path.as_ref();
  let rows = Vec::<SegmentRow>::parse(SegmentsCsv(path))
    .context(format!("failed to load segments from {:?}", path))?;
  info!(n=rows.len(), ?path, "loaded segments");
  Ok(rows)
}

/// Base toll rates for segment-table rows, each scheduled from its own start day and time.
pub fn scheduled_rates(rows: &[SegmentRow], coefficients: &RateCoefficients) -> Result<Vec<ScheduledRate>> {
  rows.iter()
    .map(|&r| ScheduledSegment::from_raw(r).map(|s| ScheduledRate::new(&s, coefficients)))
    .collect()
}
