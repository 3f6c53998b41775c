use chrono::Weekday;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::*;
use super::{Segment, TollRate, Rates, RateCoefficients};
use super::calendar::*;
use super::rates::toll_rate;

pub const WINDOW_SECS: u32 = 30 * SECS_PER_MINUTE;
pub const WINDOWS_PER_WEEK: usize = (SECS_PER_WEEK / WINDOW_SECS) as usize;

/// A half-open 30 minute slice of the week, `[start, end)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TimeWindow {
  pub start: WeekInstant,
  pub end: WeekInstant,
}

impl TimeWindow {
  pub fn starting_at(start: WeekInstant) -> Self {
    TimeWindow { start, end: start.offset(WINDOW_SECS) }
  }

  pub fn start_day(&self) -> Weekday { self.start.weekday() }

  /// Day on which the window ends; the day after `start_day` if the window crosses midnight.
  pub fn end_day(&self) -> Weekday { self.end.weekday() }
}

/// The consecutive windows covering one full week from `start` onwards, in chronological order.
pub fn week_windows(start: WeekInstant) -> impl Iterator<Item=TimeWindow> {
  (0..WINDOWS_PER_WEEK as u32).map(move |k| TimeWindow::starting_at(start.offset(k * WINDOW_SECS)))
}

/// Discount applying on weekdays to windows starting within `[from, to)`, in seconds since midnight.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DiscountBand {
  pub from: u32,
  pub to: u32,
  pub discount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscountSchedule {
  pub weekday_bands: Vec<DiscountBand>,
  pub weekend: f64,
}

impl Default for DiscountSchedule {
  fn default() -> Self {
    DiscountSchedule {
      weekday_bands: vec![
        DiscountBand { from: 0, to: 10 * SECS_PER_HOUR, discount: 0.8 },
        DiscountBand { from: 10 * SECS_PER_HOUR, to: 18 * SECS_PER_HOUR, discount: 1.2 },
        DiscountBand { from: 18 * SECS_PER_HOUR, to: SECS_PER_DAY, discount: 0.8 },
      ],
      weekend: 0.7,
    }
  }
}

impl DiscountSchedule {
  /// Discount for a window starting at `at`.  Weekends take precedence over the weekday bands.
  /// A time no band covers pays the full rate; [`DiscountSchedule::check`] rules that out.
  pub fn discount(&self, at: WeekInstant) -> f64 {
    if at.is_weekend() {
      return self.weekend;
    }
    let t = at.secs_of_day();
    self.weekday_bands.iter()
      .find(|b| b.from <= t && t < b.to)
      .map(|b| b.discount)
      .unwrap_or(1.0)
  }

  /// The weekday bands must tile the day exactly and every discount must be a finite,
  /// non-negative factor.
  pub fn check(&self) -> Result<()> {
    let invalid = |msg: String| -> Result<()> { Err(Error::InvalidConfig(msg).into()) };

    let mut bands = self.weekday_bands.clone();
    bands.sort_by_key(|b| b.from);

    let mut covered_to = 0;
    for b in &bands {
      if b.from >= b.to {
        return invalid(format!("empty discount band {:?}", b));
      }
      if b.from != covered_to {
        return invalid(format!("discount bands leave a gap or overlap at {}s", covered_to.min(b.from)));
      }
      if !b.discount.is_finite() || b.discount < 0.0 {
        return invalid(format!("invalid discount {} in band {:?}", b.discount, b));
      }
      covered_to = b.to;
    }
    if covered_to != SECS_PER_DAY {
      return invalid(format!("discount bands end at {}s instead of the end of the day", covered_to));
    }
    if !self.weekend.is_finite() || self.weekend < 0.0 {
      return invalid(format!("invalid weekend discount {}", self.weekend));
    }
    Ok(())
  }
}

/// Toll rates for one segment during one window.  `rates` are the base rates times `discount`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimedTollRecord {
  pub segment: Segment,
  pub window: TimeWindow,
  pub discount: f64,
  pub rates: Rates,
}

/// A segment together with the instant its weekly schedule starts at.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScheduledSegment {
  pub segment: Segment,
  pub start: WeekInstant,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScheduledRate {
  pub rate: TollRate,
  pub start: WeekInstant,
}

impl ScheduledRate {
  pub fn new(s: &ScheduledSegment, coefficients: &RateCoefficients) -> Self {
    ScheduledRate { rate: toll_rate(&s.segment, coefficients), start: s.start }
  }
}

/// The full week of windows for one segment, starting at `start`.
pub fn expand_segment(rate: &TollRate, start: WeekInstant, schedule: &DiscountSchedule) -> Vec<TimedTollRecord> {
  week_windows(start)
    .map(|window| {
      let discount = schedule.discount(window.start);
      TimedTollRecord {
        segment: rate.segment,
        window,
        discount,
        rates: rate.rates.scaled(discount),
      }
    })
    .collect()
}

/// Expands every segment from its own start.  Segments are processed in parallel; the output
/// keeps the input order, with each segment's windows in chronological order.
///
/// Fails with `InvalidConfig` if the schedule does not pass [`DiscountSchedule::check`].
#[instrument(level="debug", skip(items, schedule), fields(n=items.len()))]
pub fn expand(items: &[ScheduledRate], schedule: &DiscountSchedule) -> Result<Vec<TimedTollRecord>> {
  schedule.check()?;
  let records: Vec<_> = items.par_iter()
    .flat_map_iter(|s| expand_segment(&s.rate, s.start, schedule))
    .collect();
  debug!(records=records.len(), "expanded time windows");
  Ok(records)
}

/// Like [`expand`], with every segment starting at the same instant.
#[instrument(level="debug", skip(rates, schedule), fields(n=rates.len()))]
pub fn expand_uniform(rates: &[TollRate], start: WeekInstant, schedule: &DiscountSchedule) -> Result<Vec<TimedTollRecord>> {
  schedule.check()?;
  let records: Vec<_> = rates.par_iter()
    .flat_map_iter(|r| expand_segment(r, start, schedule))
    .collect();
  debug!(records=records.len(), %start, "expanded time windows");
  Ok(records)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::init_test_logging;
  use crate::toll::rates::{calculate, VehicleClass};
  use chrono::NaiveTime;
  use proptest::prelude::*;

  fn at(day: Weekday, h: u32, m: u32) -> WeekInstant {
    WeekInstant::new(day, NaiveTime::from_hms_opt(h, m, 0).unwrap())
  }

  fn rate(distance: Distance) -> TollRate {
    let s = Segment { id_start: 1, id_end: 2, distance };
    toll_rate(&s, &RateCoefficients::default())
  }

  fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

  #[test]
  fn windows_per_week() {
    assert_eq!(WINDOWS_PER_WEEK, 336);
  }

  #[test]
  fn monday_morning_scenario() {
    let _g = init_test_logging(None::<&str>);
    let records = expand_segment(&rate(10.0), at(Weekday::Mon, 9, 30), &DiscountSchedule::default());
    assert_eq!(records.len(), 336);

    let first = &records[0];
    assert_eq!(first.window, TimeWindow { start: at(Weekday::Mon, 9, 30), end: at(Weekday::Mon, 10, 0) });
    assert_eq!(first.discount, 0.8);
    assert!(close(first.rates[VehicleClass::Car], 9.6));

    let second = &records[1];
    assert_eq!(second.window.start, at(Weekday::Mon, 10, 0));
    assert_eq!(second.discount, 1.2);
    assert!(close(second.rates[VehicleClass::Car], 14.4));

    let saturday: Vec<_> = records.iter().filter(|r| r.window.start_day() == Weekday::Sat).collect();
    assert_eq!(saturday.len(), 48);
    assert!(saturday.iter().all(|r| r.discount == 0.7));
  }

  #[test]
  fn weekday_bands() {
    let s = DiscountSchedule::default();
    assert_eq!(s.discount(at(Weekday::Tue, 0, 0)), 0.8);
    assert_eq!(s.discount(at(Weekday::Tue, 9, 59)), 0.8);
    assert_eq!(s.discount(at(Weekday::Wed, 10, 0)), 1.2);
    assert_eq!(s.discount(at(Weekday::Thu, 17, 30)), 1.2);
    assert_eq!(s.discount(at(Weekday::Fri, 18, 0)), 0.8);
    assert_eq!(s.discount(at(Weekday::Fri, 23, 30)), 0.8);
    assert_eq!(s.discount(at(Weekday::Sat, 12, 0)), 0.7);
    assert_eq!(s.discount(at(Weekday::Sun, 23, 30)), 0.7);
  }

  #[test]
  fn end_day_wraps_at_midnight() {
    let w = TimeWindow::starting_at(at(Weekday::Mon, 23, 30));
    assert_eq!(w.start_day(), Weekday::Mon);
    assert_eq!(w.end_day(), Weekday::Tue);
    assert_eq!(w.end.clock(), "00:00:00");

    let w = TimeWindow::starting_at(at(Weekday::Sun, 23, 45));
    assert_eq!(w.end_day(), Weekday::Mon);
    assert_eq!(w.end.clock(), "00:15:00");
  }

  #[test]
  fn discount_uses_window_start() {
    // starts on Friday evening, ends on Saturday
    let records = expand_segment(&rate(1.0), at(Weekday::Fri, 23, 45), &DiscountSchedule::default());
    assert_eq!(records[0].window.end_day(), Weekday::Sat);
    assert_eq!(records[0].discount, 0.8);
    assert_eq!(records[1].discount, 0.7);
  }

  #[test]
  fn schedule_check() {
    assert!(DiscountSchedule::default().check().is_ok());

    let mut gap = DiscountSchedule::default();
    gap.weekday_bands[1].to = 17 * SECS_PER_HOUR;
    assert!(matches!(gap.check().unwrap_err().downcast_ref::<Error>(), Some(Error::InvalidConfig(_))));

    let mut overlap = DiscountSchedule::default();
    overlap.weekday_bands[2].from = 17 * SECS_PER_HOUR;
    assert!(overlap.check().is_err());

    let mut short = DiscountSchedule::default();
    short.weekday_bands.pop();
    assert!(short.check().is_err());

    let mut negative = DiscountSchedule::default();
    negative.weekend = -0.1;
    assert!(negative.check().is_err());

    let unsorted = DiscountSchedule {
      weekday_bands: DiscountSchedule::default().weekday_bands.into_iter().rev().collect(),
      weekend: 0.5,
    };
    assert!(unsorted.check().is_ok());
  }

  #[test]
  fn parallel_matches_sequential() -> Result<()> {
    let _g = init_test_logging(None::<&str>);
    let segments: Vec<_> = (0..20)
      .map(|k| Segment { id_start: k, id_end: k + 1, distance: k as f64 * 1.5 })
      .collect();
    let rates = calculate(&segments, &RateCoefficients::default());
    let schedule = DiscountSchedule::default();
    let items: Vec<_> = rates.iter()
      .enumerate()
      .map(|(k, r)| ScheduledRate { rate: *r, start: WeekInstant::from_secs(k as u64 * 3599) })
      .collect();

    let sequential: Vec<_> = items.iter()
      .flat_map(|s| expand_segment(&s.rate, s.start, &schedule))
      .collect();
    assert_eq!(expand(&items, &schedule)?, sequential);
    assert_eq!(expand(&items, &schedule)?, expand(&items, &schedule)?);

    let uniform = expand_uniform(&rates, WeekInstant::ORIGIN, &schedule)?;
    assert_eq!(uniform.len(), 20 * WINDOWS_PER_WEEK);
    assert_eq!(uniform[WINDOWS_PER_WEEK].segment, segments[1]);
    Ok(())
  }

  #[test]
  fn expansion_rejects_schedule_with_gap() {
    let mut gap = DiscountSchedule::default();
    gap.weekday_bands.remove(1);
    assert_eq!(gap.discount(WeekInstant::at(Weekday::Mon, 12 * SECS_PER_HOUR)), 1.0);

    let rates = vec![rate(5.0)];
    let err = expand_uniform(&rates, WeekInstant::ORIGIN, &gap).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidConfig(_))));

    let items = vec![ScheduledRate { rate: rates[0], start: WeekInstant::ORIGIN }];
    assert!(expand(&items, &gap).is_err());
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn windows_cover_the_week(start in 0..SECS_PER_WEEK, distance in 0.0..500.0f64) {
      let start = WeekInstant::from_secs(start as u64);
      let base = rate(distance);
      let schedule = DiscountSchedule::default();
      let records = expand_segment(&base, start, &schedule);

      prop_assert_eq!(records.len(), WINDOWS_PER_WEEK);
      prop_assert_eq!(records[0].window.start, start);
      prop_assert_eq!(records[WINDOWS_PER_WEEK - 1].window.end, start);
      for w in records.windows(2) {
        prop_assert_eq!(w[0].window.end, w[1].window.start);
      }

      let mut total = 0u64;
      for r in &records {
        prop_assert_eq!(r.window.start.until(r.window.end), WINDOW_SECS);
        total += r.window.start.until(r.window.end) as u64;
        prop_assert_eq!(r.discount, schedule.discount(r.window.start));
        for &c in &VehicleClass::ALL {
          prop_assert_eq!(r.rates[c], base.rates[c] * r.discount);
        }
      }
      prop_assert_eq!(total, SECS_PER_WEEK as u64);
    }
  }
}
