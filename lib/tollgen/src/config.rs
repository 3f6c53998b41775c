use std::path::Path;
use anyhow::Context;
use chrono::Timelike;
use json::JsonValue;
use tracing::debug;

use crate::*;
use crate::toll::{RateCoefficients, DiscountSchedule, DiscountBand, UnobservedPolicy, VehicleClass, WeekInstant};
use crate::toll::nearby::DEFAULT_THRESHOLD;

/// Settings shared by every stage of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TollConfig {
  pub coefficients: RateCoefficients,
  pub discounts: DiscountSchedule,
  /// Where the weekly schedule of segments without their own start begins.
  pub start: WeekInstant,
  pub unobserved: UnobservedPolicy,
  pub threshold: f64,
}

impl Default for TollConfig {
  fn default() -> Self {
    TollConfig {
      coefficients: RateCoefficients::default(),
      discounts: DiscountSchedule::default(),
      start: WeekInstant::ORIGIN,
      unobserved: UnobservedPolicy::default(),
      threshold: DEFAULT_THRESHOLD,
    }
  }
}

fn invalid<T>(msg: String) -> Result<T> {
  Err(Error::InvalidConfig(msg).into())
}

fn number(v: &JsonValue, key: &str) -> Result<f64> {
  match v.as_f64() {
    Some(x) => Ok(x),
    None => invalid(format!("{} must be a number, got {}", key, v.dump())),
  }
}

fn string<'a>(v: &'a JsonValue, key: &str) -> Result<&'a str> {
  match v.as_str() {
    Some(s) => Ok(s),
    None => invalid(format!("{} must be a string, got {}", key, v.dump())),
  }
}

fn parse_band(v: &JsonValue) -> Result<DiscountBand> {
  if !v.is_object() {
    return invalid(format!("discount band must be an object, got {}", v.dump()));
  }
  Ok(DiscountBand {
    from: tables::parse_clock_secs(string(&v["from"], "from")?)?,
    to: tables::parse_clock_secs(string(&v["to"], "to")?)?,
    discount: number(&v["discount"], "discount")?,
  })
}

impl TollConfig {
  /// Reads settings from a JSON object.  Missing keys keep their defaults and unknown keys are
  /// ignored.
  pub fn from_json(text: &str) -> Result<TollConfig> {
    let root = json::parse(text).map_err(|e| Error::InvalidConfig(format!("not valid JSON: {}", e)))?;
    if !root.is_object() {
      return invalid("configuration must be a JSON object".to_string());
    }
    let mut config = TollConfig::default();

    let coefficients = &root["coefficients"];
    if !coefficients.is_null() {
      if !coefficients.is_object() {
        return invalid(format!("coefficients must be an object, got {}", coefficients.dump()));
      }
      for (name, value) in coefficients.entries() {
        let class: VehicleClass = name.parse().map_err(Error::InvalidConfig)?;
        config.coefficients.set(class, number(value, name)?);
      }
    }

    let bands = &root["weekday_bands"];
    if !bands.is_null() {
      if !bands.is_array() {
        return invalid(format!("weekday_bands must be a list, got {}", bands.dump()));
      }
      config.discounts.weekday_bands = bands.members().map(parse_band).collect::<Result<_>>()?;
    }

    if !root["weekend_discount"].is_null() {
      config.discounts.weekend = number(&root["weekend_discount"], "weekend_discount")?;
    }

    let day = match &root["start_day"] {
      JsonValue::Null => config.start.weekday(),
      v => tables::parse_day(string(v, "start_day")?)?,
    };
    let secs = match &root["start_time"] {
      JsonValue::Null => config.start.secs_of_day(),
      v => tables::parse_time(string(v, "start_time")?)?.num_seconds_from_midnight(),
    };
    config.start = WeekInstant::at(day, secs);

    if !root["unobserved"].is_null() {
      config.unobserved = string(&root["unobserved"], "unobserved")?
        .parse()
        .map_err(Error::InvalidConfig)?;
    }

    if !root["threshold"].is_null() {
      config.threshold = number(&root["threshold"], "threshold")?;
    }

    config.check()?;
    debug!(?config, "parsed configuration");
    Ok(config)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<TollConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).context(format!("try read {:?}", path))?;
    TollConfig::from_json(&text).context(format!("in configuration file {:?}", path))
  }

  pub fn check(&self) -> Result<()> {
    self.coefficients.check()?;
    self.discounts.check()?;
    if !self.threshold.is_finite() || self.threshold < 0.0 {
      return invalid(format!("threshold must be finite and non-negative, got {}", self.threshold));
    }
    Ok(())
  }
}
