use tracing::{debug, instrument};

use crate::*;
use crate::config::TollConfig;
use tables::Observation;

pub mod matrix;
pub mod unroll;
pub mod rates;
pub mod windows;
pub mod nearby;
pub mod coverage;

pub use matrix::DistanceMatrix;
pub use unroll::{Segment, UnobservedPolicy};
pub use rates::{VehicleClass, Rates, RateCoefficients, TollRate};
pub use windows::{TimeWindow, DiscountSchedule, DiscountBand, TimedTollRecord, ScheduledSegment, ScheduledRate};
pub use calendar::WeekInstant;

pub mod calendar {
    use std::fmt;
    use chrono::{NaiveTime, Timelike, Weekday};

    pub const SECS_PER_MINUTE: u32 = 60;
    pub const SECS_PER_HOUR: u32 = 60 * SECS_PER_MINUTE;
    pub const SECS_PER_DAY: u32 = 24 * SECS_PER_HOUR;
    pub const SECS_PER_WEEK: u32 = 7 * SECS_PER_DAY;

    /// Days of the week in the order they are counted from the week's origin.
    pub const WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn day_name(day: Weekday) -> &'static str {
        match day {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    #[inline]
    pub fn is_weekend(day: Weekday) -> bool {
        matches!(day, Weekday::Sat | Weekday::Sun)
    }

    /// A point in the weekly cycle, stored as seconds elapsed since Monday 00:00:00.
    /// Always in `0..SECS_PER_WEEK`; arithmetic wraps around the end of the week.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
    pub struct WeekInstant(u32);

    impl WeekInstant {
        pub const ORIGIN: WeekInstant = WeekInstant(0);

        pub fn new(day: Weekday, time: NaiveTime) -> Self {
            Self::at(day, time.num_seconds_from_midnight())
        }

        /// `secs` past midnight on `day`; values of a day or more carry into the following days.
        pub fn at(day: Weekday, secs: u32) -> Self {
            Self::from_secs(day.num_days_from_monday() as u64 * SECS_PER_DAY as u64 + secs as u64)
        }

        pub fn from_secs(secs: u64) -> Self {
            WeekInstant((secs % SECS_PER_WEEK as u64) as u32)
        }

        #[inline]
        pub fn secs(&self) -> u32 { self.0 }

        /// The instant `secs` seconds later, wrapping into the next week.
        #[inline]
        pub fn offset(&self, secs: u32) -> Self {
            Self::from_secs(self.0 as u64 + secs as u64)
        }

        /// Seconds from `self` forward to `later`, in `0..SECS_PER_WEEK`.
        pub fn until(&self, later: WeekInstant) -> u32 {
            if later.0 >= self.0 { later.0 - self.0 } else { SECS_PER_WEEK - self.0 + later.0 }
        }

        #[inline]
        pub fn weekday(&self) -> Weekday {
            WEEKDAYS[(self.0 / SECS_PER_DAY) as usize]
        }

        #[inline]
        pub fn secs_of_day(&self) -> u32 {
            self.0 % SECS_PER_DAY
        }

        pub fn is_weekend(&self) -> bool {
            is_weekend(self.weekday())
        }

        /// Time of day formatted as `HH:MM:SS`.
        pub fn clock(&self) -> String {
            let s = self.secs_of_day();
            format!("{:02}:{:02}:{:02}", s / SECS_PER_HOUR, (s % SECS_PER_HOUR) / SECS_PER_MINUTE, s % SECS_PER_MINUTE)
        }
    }

    impl Default for WeekInstant {
        fn default() -> Self { WeekInstant::ORIGIN }
    }

    impl fmt::Display for WeekInstant {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{} {}", day_name(self.weekday()), self.clock())
        }
    }

}


/// All intermediate tables of one run from observations to timed toll records.
#[derive(Debug, Clone)]
pub struct TollPipeline {
    pub matrix: DistanceMatrix,
    pub segments: Vec<Segment>,
    pub rates: Vec<TollRate>,
    pub timed: Vec<TimedTollRecord>,
}

impl TollPipeline {
    #[instrument(level="debug", skip(observations, config), fields(n_obs=observations.len()))]
    pub fn run(observations: &[Observation], config: &TollConfig) -> Result<TollPipeline> {
        config.check()?;
        let matrix = DistanceMatrix::build(observations)?;
        let segments = unroll::unroll(&matrix, config.unobserved);
        let rates = rates::calculate(&segments, &config.coefficients);
        let timed = windows::expand_uniform(&rates, config.start, &config.discounts)?;
        debug!(ids=matrix.len(), segments=segments.len(), timed=timed.len(), "pipeline finished");
        Ok(TollPipeline { matrix, segments, rates, timed })
    }
}
