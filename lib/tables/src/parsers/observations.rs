use std::path::Path;
use anyhow::Context;
use crate::Result;
use crate::raw::{Observation, check_distance};
use super::{
  ParseTable,
  common::*,
  table::Table,
};

/// A comma-separated file with `id_1`, `id_2` and `distance` columns.
#[derive(Debug, Copy, Clone)]
pub struct ObservationsCsv<P>(pub P);

impl<P: AsRef<Path>> ParseTable<ObservationsCsv<P>> for Vec<Observation> {
  fn parse(path: ObservationsCsv<P>) -> Result<Vec<Observation>> {
    let path = path.0.as_ref();
    let data = std::fs::read_to_string(path).context(format!("try read {:?}", path))?;
    parse_observations(&data)
  }
}

pub fn parse_observations(text: &str) -> Result<Vec<Observation>> {
  let table = match Table::split(text)? {
    Some(t) => t,
    None => return Ok(Vec::new()),
  };
  let from = table.column(&["id_1", "id_start"])?;
  let to = table.column(&["id_2", "id_end"])?;
  let distance = table.column(&["distance"])?;

  table.rows.iter()
    .map(|row| -> Result<Observation> {
      let o = Observation {
        from: row.parse(&from, id_)?,
        to: row.parse(&to, id_)?,
        distance: row.parse(&distance, distance_)?,
      };
      check_distance(o.from, o.to, o.distance, row.line)?;
      Ok(o)
    })
    .collect()
}
