use std::fmt;
use itertools::Itertools;
use ndarray::Array2;
use tracing::{debug, instrument, trace};

use crate::*;
use tables::Observation;

/// Dense distance table over every identifier seen in the input.
///
/// Both axes are the identifiers in ascending order.  A cell is `None` when no distance was
/// recorded for the pair in either direction, which is kept distinct from a recorded distance
/// of zero.  The diagonal is always `Some(0.0)` and off-diagonal cells are symmetric.
#[derive(Clone, PartialEq)]
pub struct DistanceMatrix {
  ids: Vec<Id>,
  index: Map<Id, usize>,
  cells: Array2<Option<Distance>>,
}

/// Running sums of the distances recorded for one unordered pair.
#[derive(Debug, Default, Copy, Clone)]
struct PairSamples {
  positive_sum: Distance,
  positive_count: usize,
  zero_count: usize,
}

impl PairSamples {
  fn add(&mut self, d: Distance) {
    if d > 0.0 {
      self.positive_sum += d;
      self.positive_count += 1;
    } else {
      self.zero_count += 1;
    }
  }

  /// A recorded zero never overrides a positive distance recorded for the same pair.
  fn value(&self) -> Option<Distance> {
    if self.positive_count > 0 {
      Some(self.positive_sum / self.positive_count as Distance)
    } else if self.zero_count > 0 {
      Some(0.0)
    } else {
      None
    }
  }
}

impl DistanceMatrix {
  pub fn empty() -> Self {
    DistanceMatrix { ids: Vec::new(), index: Map::default(), cells: Array2::from_elem((0, 0), None) }
  }

  /// Builds the matrix from directed observations.
  ///
  /// Every observation is checked first; a negative or non-finite distance aborts the build.
  /// The distance of a pair is the mean of all positive distances observed in either direction,
  /// so repeated observations are averaged and a pair observed in one direction only is copied
  /// to the other.  Self-loops contribute nothing: the diagonal is fixed at zero.
  #[instrument(level="debug", skip(observations), fields(n_obs=observations.len()))]
  pub fn build(observations: &[Observation]) -> Result<DistanceMatrix> {
    for o in observations {
      o.check()?;
    }

    let ids = observations.iter()
      .flat_map(|o| vec![o.from, o.to])
      .sorted()
      .dedup()
      .collect_vec();
    let index: Map<Id, usize> = ids.iter().enumerate().map(|(k, &id)| (id, k)).collect();

    let mut samples: Map<(usize, usize), PairSamples> = Map::default();
    for o in observations {
      if o.from == o.to {
        trace!(id=o.from, distance=o.distance, "ignore self-loop");
        continue;
      }
      let (i, j) = (index[&o.from], index[&o.to]);
      let key = if i < j { (i, j) } else { (j, i) };
      samples.entry(key).or_default().add(o.distance);
    }

    let n = ids.len();
    let mut cells = Array2::from_elem((n, n), None);
    for (&(i, j), s) in &samples {
      let d = s.value();
      trace!(from=ids[i], to=ids[j], ?d, positive=s.positive_count, zero=s.zero_count);
      cells[[i, j]] = d;
      cells[[j, i]] = d;
    }
    for k in 0..n {
      cells[[k, k]] = Some(0.0);
    }

    debug!(ids=n, pairs=samples.len(), "built distance matrix");
    Ok(DistanceMatrix { ids, index, cells })
  }

  /// Identifiers labelling both axes, ascending.
  pub fn ids(&self) -> &[Id] { &self.ids }

  pub fn len(&self) -> usize { self.ids.len() }

  pub fn is_empty(&self) -> bool { self.ids.is_empty() }

  pub fn contains(&self, id: Id) -> bool { self.index.contains_key(&id) }

  /// The recorded distance, or `None` if either identifier is unknown or nothing was recorded.
  pub fn get(&self, from: Id, to: Id) -> Option<Distance> {
    let i = *self.index.get(&from)?;
    let j = *self.index.get(&to)?;
    self.cells[[i, j]]
  }

  /// Cells of the row belonging to `id`, in column order.
  pub fn row(&self, id: Id) -> Option<impl Iterator<Item=(Id, Option<Distance>)> + '_> {
    let i = *self.index.get(&id)?;
    Some(self.ids.iter().zip(self.cells.row(i)).map(|(&j, &d)| (j, d)))
  }

  /// Mean of the recorded distances from `id` to every other identifier.
  pub fn mean_distance(&self, id: Id) -> Option<Distance> {
    let (sum, count) = self.row(id)?
      .filter(|&(j, _)| j != id)
      .filter_map(|(_, d)| d)
      .fold((0.0, 0usize), |(s, c), d| (s + d, c + 1));
    if count == 0 { None } else { Some(sum / count as Distance) }
  }
}

impl fmt::Debug for DistanceMatrix {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map()
      .entries(self.ids.iter().zip(self.cells.outer_iter()).map(|(id, row)| (id, row.to_vec())))
      .finish()
  }
}
