use super::nom_prelude::*;
use chrono::{NaiveDate, NaiveTime, Weekday};
use crate::{Id, Distance, Day};

const SECS_PER_DAY: u32 = 24 * 60 * 60;

pub fn id_<'a, E>(input: &'a str) -> IResult<&'a str, Id, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, Id::from_str)(input)
}

pub fn distance_<'a, E>(input: &'a str) -> IResult<&'a str, Distance, E>
  where
    E: ParseError<&'a str>
{
  double(input)
}

fn digits_m_n<'a, E>(min: usize, max: usize) -> impl FnMut(&'a str) -> IResult<&'a str, u32, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(take_while_m_n(min, max, |c: char| c.is_ascii_digit()), u32::from_str)
}

/// `HH:MM` or `HH:MM:SS`, as (hours, minutes, seconds). Fields are not range-checked.
fn clock_<'a, E>(input: &'a str) -> IResult<&'a str, (u32, u32, u32), E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map(
    tuple((
      digits_m_n(1, 2),
      preceded(char(':'), digits_m_n(2, 2)),
      opt(preceded(char(':'), digits_m_n(2, 2))),
    )),
    |(h, m, s)| (h, m, s.unwrap_or(0)),
  )(input)
}

pub fn time_of_day_<'a, E>(input: &'a str) -> IResult<&'a str, NaiveTime, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_opt(clock_, |(h, m, s)| NaiveTime::from_hms_opt(h, m, s))(input)
}

/// Seconds since midnight, where `24:00:00` (the end of the day) is allowed.
pub fn clock_secs_<'a, E>(input: &'a str) -> IResult<&'a str, u32, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_opt(clock_, |(h, m, s)| {
    if m >= 60 || s >= 60 { return None }
    let secs = h * 3600 + m * 60 + s;
    if secs > SECS_PER_DAY { None } else { Some(secs) }
  })(input)
}

fn weekday_name_<'a, E>(input: &'a str) -> IResult<&'a str, Weekday, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, chrono::ParseWeekdayError>
{
  map_res(alpha1, Weekday::from_str)(input)
}

fn date_<'a, E>(input: &'a str) -> IResult<&'a str, NaiveDate, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_opt(
    tuple((
      map_res(take_while_m_n(4, 4, |c: char| c.is_ascii_digit()), i32::from_str),
      preceded(char('-'), digits_m_n(2, 2)),
      preceded(char('-'), digits_m_n(2, 2)),
    )),
    |(y, m, d)| NaiveDate::from_ymd_opt(y, m, d),
  )(input)
}

/// A weekday name (full or abbreviated, any case) or a `YYYY-MM-DD` date.
pub fn day_<'a, E>(input: &'a str) -> IResult<&'a str, Day, E>
  where
    E: ParseError<&'a str>
      + error::FromExternalError<&'a str, ParseIntError>
      + error::FromExternalError<&'a str, chrono::ParseWeekdayError>
{
  alt((map(date_, Day::Date), map(weekday_name_, Day::Weekday)))(input)
}

/// Like [`day_`], with a date standing for its day of the week.
pub fn weekday_<'a, E>(input: &'a str) -> IResult<&'a str, Weekday, E>
  where
    E: ParseError<&'a str>
      + error::FromExternalError<&'a str, ParseIntError>
      + error::FromExternalError<&'a str, chrono::ParseWeekdayError>
{
  map(day_, |d: Day| d.weekday())(input)
}
