use std::path::Path;
use anyhow::Context;
use crate::Result;
use crate::raw::{SegmentRow, check_distance};
use super::{
  ParseTable,
  common::*,
  table::Table,
};

/// A comma-separated file of segments, each with the day and time interval it applies to.
#[derive(Debug, Copy, Clone)]
pub struct SegmentsCsv<P>(pub P);

impl<P: AsRef<Path>> ParseTable<SegmentsCsv<P>> for Vec<SegmentRow> {
  fn parse(path: SegmentsCsv<P>) -> Result<Vec<SegmentRow>> {
    let path = path.0.as_ref();
    let data = std::fs::read_to_string(path).context(format!("try read {:?}", path))?;
    parse_segments(&data)
  }
}

pub fn parse_segments(text: &str) -> Result<Vec<SegmentRow>> {
  let table = match Table::split(text)? {
    Some(t) => t,
    None => return Ok(Vec::new()),
  };
  let id_start = table.column(&["id_start", "id"])?;
  let id_end = table.column(&["id_end", "id_2"])?;
  let distance = table.column(&["distance"])?;
  let start_day = table.column(&["startDay", "start_day"])?;
  let start_time = table.column(&["startTime", "start_time"])?;
  let end_day = table.column(&["endDay", "end_day"])?;
  let end_time = table.column(&["endTime", "end_time"])?;

  table.rows.iter()
    .map(|row| -> Result<SegmentRow> {
      let s = SegmentRow {
        id_start: row.parse(&id_start, id_)?,
        id_end: row.parse(&id_end, id_)?,
        distance: row.parse(&distance, distance_)?,
        start_day: row.parse(&start_day, day_)?,
        start_time: row.parse(&start_time, time_of_day_)?,
        end_day: row.parse(&end_day, day_)?,
        end_time: row.parse(&end_time, time_of_day_)?,
      };
      check_distance(s.id_start, s.id_end, s.distance, row.line)?;
      Ok(s)
    })
    .collect()
}
