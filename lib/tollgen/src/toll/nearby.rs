use tracing::{debug, instrument, trace};

use crate::*;
use super::DistanceMatrix;

pub const DEFAULT_THRESHOLD: f64 = 0.10;

/// Identifiers whose mean distance lies within `reference_mean * (1 ± threshold)`, bounds
/// included, in ascending order.
///
/// Means are taken over recorded off-diagonal cells only, so identifiers without any recorded
/// neighbour are never returned.  The reference is part of the result whenever it has a mean.
#[instrument(level="debug", skip(matrix))]
pub fn ids_within_threshold(matrix: &DistanceMatrix, reference: Id, threshold: f64) -> Result<Vec<Id>> {
  if !threshold.is_finite() || threshold < 0.0 {
    return Err(Error::MalformedInput {
      line: 0,
      column: "threshold".to_string(),
      reason: format!("threshold must be finite and non-negative, got {}", threshold),
    }.into());
  }
  if !matrix.contains(reference) {
    return Err(Error::UnknownIdentifier(reference).into());
  }

  let reference_mean = match matrix.mean_distance(reference) {
    Some(m) => m,
    None => {
      debug!("reference has no recorded distances");
      return Ok(Vec::new());
    }
  };
  let lb = reference_mean * (1.0 - threshold);
  let ub = reference_mean * (1.0 + threshold);
  trace!(reference_mean, lb, ub);

  // axis labels are already ascending
  let ids: Vec<_> = matrix.ids().iter()
    .copied()
    .filter(|&id| matches!(matrix.mean_distance(id), Some(m) if lb <= m && m <= ub))
    .collect();
  debug!(found=ids.len());
  Ok(ids)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::toll::matrix::tests::observations;
  use tables::Observation;
  use proptest::prelude::*;

  fn star() -> Result<DistanceMatrix> {
    // means: 1 -> 10, 2 -> 10, 3 -> 11.5, 4 -> 11, 5 -> 12, 6 -> none
    DistanceMatrix::build(&[
      Observation::new(1, 2, 10.0),
      Observation::new(1, 3, 10.0),
      Observation::new(4, 5, 11.0),
      Observation::new(5, 3, 13.0),
      Observation::new(6, 6, 0.0),
    ])
  }

  #[test]
  fn within_ten_percent() -> Result<()> {
    let m = star()?;
    assert_eq!(m.mean_distance(3), Some(11.5));
    assert_eq!(ids_within_threshold(&m, 1, DEFAULT_THRESHOLD)?, vec![1, 2, 4]);
    assert_eq!(ids_within_threshold(&m, 5, DEFAULT_THRESHOLD)?, vec![3, 4, 5]);
    Ok(())
  }

  #[test]
  fn bounds_are_inclusive() -> Result<()> {
    let m = DistanceMatrix::build(&[
      Observation::new(1, 2, 7.5),
      Observation::new(3, 4, 10.0),
      Observation::new(5, 6, 12.5),
      Observation::new(7, 8, 13.0),
    ])?;
    assert_eq!(ids_within_threshold(&m, 3, 0.25)?, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(ids_within_threshold(&m, 1, 1.0)?, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(ids_within_threshold(&m, 1, 0.0)?, vec![1, 2]);
    Ok(())
  }

  #[test]
  fn unknown_reference() -> Result<()> {
    let err = ids_within_threshold(&star()?, 42, DEFAULT_THRESHOLD).unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::UnknownIdentifier(42)));
    Ok(())
  }

  #[test]
  fn reference_without_mean() -> Result<()> {
    assert!(ids_within_threshold(&star()?, 6, DEFAULT_THRESHOLD)?.is_empty());
    Ok(())
  }

  #[test]
  fn invalid_threshold() -> Result<()> {
    let m = star()?;
    for &t in &[-0.1, f64::NAN, f64::INFINITY] {
      let err = ids_within_threshold(&m, 1, t).unwrap_err();
      assert!(matches!(err.downcast_ref::<Error>(), Some(Error::MalformedInput { .. })));
    }
    Ok(())
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sorted_and_contains_reference(o in observations(), threshold in 0.0..1.0f64) {
      let m = DistanceMatrix::build(&o).unwrap();
      for &r in m.ids() {
        let ids = ids_within_threshold(&m, r, threshold).unwrap();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(ids.contains(&r), m.mean_distance(r).is_some());
      }
    }
  }
}
