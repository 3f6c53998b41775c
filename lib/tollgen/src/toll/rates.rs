use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use tracing::instrument;

use crate::*;
use super::Segment;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum VehicleClass {
  Moto,
  Car,
  Rv,
  Bus,
  Truck,
}

impl VehicleClass {
  pub const ALL: [VehicleClass; 5] = [
    VehicleClass::Moto,
    VehicleClass::Car,
    VehicleClass::Rv,
    VehicleClass::Bus,
    VehicleClass::Truck,
  ];

  /// Column name used in input configuration and output tables.
  pub fn name(&self) -> &'static str {
    match self {
      VehicleClass::Moto => "moto",
      VehicleClass::Car => "car",
      VehicleClass::Rv => "rv",
      VehicleClass::Bus => "bus",
      VehicleClass::Truck => "truck",
    }
  }

  #[inline]
  fn idx(&self) -> usize { *self as usize }
}

impl fmt::Display for VehicleClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for VehicleClass {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    VehicleClass::ALL.iter()
      .cloned()
      .find(|c| c.name() == s)
      .ok_or_else(|| format!("invalid string: {}", s))
  }
}

/// One value per vehicle class.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rates([f64; 5]);

impl Rates {
  pub fn from_fn(mut f: impl FnMut(VehicleClass) -> f64) -> Self {
    let mut r = Rates::default();
    for &c in &VehicleClass::ALL {
      r[c] = f(c);
    }
    r
  }

  /// Every rate multiplied by `factor`.
  pub fn scaled(&self, factor: f64) -> Self {
    Rates::from_fn(|c| self[c] * factor)
  }

  pub fn iter(&self) -> impl Iterator<Item=(VehicleClass, f64)> + '_ {
    let all: &'static [VehicleClass; 5] = &VehicleClass::ALL;
    all.iter().map(move |&c| (c, self[c]))
  }
}

impl Index<VehicleClass> for Rates {
  type Output = f64;

  #[inline]
  fn index(&self, c: VehicleClass) -> &f64 { &self.0[c.idx()] }
}

impl IndexMut<VehicleClass> for Rates {
  #[inline]
  fn index_mut(&mut self, c: VehicleClass) -> &mut f64 { &mut self.0[c.idx()] }
}

/// Toll per unit distance for each vehicle class.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RateCoefficients(pub Rates);

impl Default for RateCoefficients {
  fn default() -> Self {
    RateCoefficients(Rates([0.8, 1.2, 1.5, 2.2, 3.6]))
  }
}

impl RateCoefficients {
  pub fn get(&self, c: VehicleClass) -> f64 { self.0[c] }

  pub fn set(&mut self, c: VehicleClass, coefficient: f64) { self.0[c] = coefficient; }

  pub fn check(&self) -> Result<()> {
    for (c, k) in self.0.iter() {
      if !k.is_finite() || k < 0.0 {
        return Err(Error::InvalidConfig(format!("coefficient for {} must be finite and non-negative, got {}", c, k)).into());
      }
    }
    Ok(())
  }
}

/// A segment with its undiscounted toll for every vehicle class.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TollRate {
  pub segment: Segment,
  pub rates: Rates,
}

#[inline]
pub fn toll_rate(segment: &Segment, coefficients: &RateCoefficients) -> TollRate {
  TollRate {
    segment: *segment,
    rates: Rates::from_fn(|c| segment.distance * coefficients.get(c)),
  }
}

/// Attaches the toll rates to every segment, keeping order.  Zero-distance segments are kept.
#[instrument(level="debug", skip(segments, coefficients), fields(n=segments.len()))]
pub fn calculate(segments: &[Segment], coefficients: &RateCoefficients) -> Vec<TollRate> {
  segments.iter().map(|s| toll_rate(s, coefficients)).collect()
}
