use std::str::FromStr;
use tracing::{debug, instrument};

use crate::*;
use super::DistanceMatrix;
use tables::Observation;

/// A directed distance record between two different identifiers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
  pub id_start: Id,
  pub id_end: Id,
  pub distance: Distance,
}

impl From<Segment> for Observation {
  fn from(s: Segment) -> Observation {
    Observation::new(s.id_start, s.id_end, s.distance)
  }
}

/// What to emit for a pair whose distance was never recorded.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UnobservedPolicy {
  /// Leave the pair out.
  Skip,
  /// Emit it with distance zero.
  Zero,
}

impl Default for UnobservedPolicy {
  fn default() -> Self { UnobservedPolicy::Skip }
}

impl FromStr for UnobservedPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "skip" => Ok(UnobservedPolicy::Skip),
      "zero" => Ok(UnobservedPolicy::Zero),
      _ => Err(format!("invalid string: {}", s)),
    }
  }
}

/// Flattens the matrix into directed segments, row by row.  Both `(i,j)` and `(j,i)` are
/// emitted; self-pairs never are.
#[instrument(level="debug", skip(matrix), fields(ids=matrix.len()))]
pub fn unroll(matrix: &DistanceMatrix, unobserved: UnobservedPolicy) -> Vec<Segment> {
  let mut segments = Vec::with_capacity(matrix.len() * matrix.len().saturating_sub(1));
  let mut skipped = 0usize;

  for &i in matrix.ids() {
    for &j in matrix.ids() {
      if i == j {
        continue;
      }
      let distance = match (matrix.get(i, j), unobserved) {
        (Some(d), _) => d,
        (None, UnobservedPolicy::Zero) => 0.0,
        (None, UnobservedPolicy::Skip) => {
          skipped += 1;
          continue;
        }
      };
      segments.push(Segment { id_start: i, id_end: j, distance });
    }
  }

  debug!(segments=segments.len(), skipped, "unrolled distance matrix");
  segments
}
