//! Writers for the tables each stage produces, as JSON, a JSON summary or CSV.
use std::io::Write;
use std::str::FromStr;
use itertools::Itertools;

use crate::*;
use crate::toll::*;
use crate::toll::calendar::day_name;
use crate::toll::coverage::PairCoverage;

pub const OUTPUT_FORMAT_STRINGS: [&str; 3] = ["json", "json-summ", "csv"];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OutputFormat {
    Json,
    JsonSummary,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "json" => Ok(Self::Json),
            "json-summ" => Ok(Self::JsonSummary),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}


impl Default for OutputFormat {
    fn default() -> Self { OutputFormat::JsonSummary }
}


/// Something the command line can print as one of the output formats.
pub trait TollTable {
    fn write_json(&self, buf: impl Write) -> Result<()>;
    fn write_json_summary(&self, buf: impl Write) -> Result<()>;
    fn write_csv(&self, buf: impl Write) -> Result<()>;

    fn write(&self, buf: impl Write, output: OutputFormat) -> Result<()> {
        match output {
            OutputFormat::JsonSummary => self.write_json_summary(buf)?,
            OutputFormat::Json => self.write_json(buf)?,
            OutputFormat::Csv => self.write_csv(buf)?,
        };
        Ok(())
    }
}


fn rates_json(rates: &Rates) -> json::JsonValue {
    let mut obj = json::JsonValue::new_object();
    for (c, r) in rates.iter() {
        obj[c.name()] = r.into();
    }
    obj
}

fn rates_fields(rates: &Rates) -> impl Iterator<Item=String> + '_ {
    rates.iter().map(|(_, r)| r.to_string())
}

fn write_csv_rows<I, R>(buf: impl Write, header: &[&str], rows: I) -> Result<()>
    where
        I: IntoIterator<Item=R>,
        R: IntoIterator<Item=String>,
{
    let mut w = csv::Writer::from_writer(buf);
    w.write_record(header)?;
    for r in rows {
        w.write_record(r)?;
    }
    w.flush()?;
    Ok(())
}

fn write_row_count(mut buf: impl Write, rows: usize) -> Result<()> {
    let root = json::object! { rows: rows };
    root.write_pretty(&mut buf, 2)?;
    Ok(())
}

const RATE_COLUMNS: [&str; 5] = ["moto", "car", "rv", "bus", "truck"];

fn with_rate_columns(leading: &[&'static str]) -> Vec<&'static str> {
    leading.iter().chain(RATE_COLUMNS.iter()).copied().collect()
}


impl TollTable for DistanceMatrix {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        let rows: json::JsonValue = self.ids().iter()
            .filter_map(|&id| self.row(id))
            .map(|row| json::JsonValue::from(row.map(|(_, d)| d).collect_vec()))
            .collect_vec()
            .into();
        let root = json::object! {
            ids: self.ids().to_vec(),
            distances: rows,
        };
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_json_summary(&self, mut buf: impl Write) -> Result<()> {
        let recorded = self.ids().iter()
            .filter_map(|&id| self.row(id).map(|row| row.filter(|&(j, d)| j != id && d.is_some()).count()))
            .sum::<usize>();
        let root = json::object! {
            ids: self.len(),
            recorded_cells: recorded,
        };
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_csv(&self, buf: impl Write) -> Result<()> {
        let header = std::iter::once("id".to_string())
            .chain(self.ids().iter().map(|id| id.to_string()))
            .collect_vec();
        let mut w = csv::Writer::from_writer(buf);
        w.write_record(&header)?;
        for &id in self.ids() {
            if let Some(row) = self.row(id) {
                let cells = row.map(|(_, d)| d.map(|d| d.to_string()).unwrap_or_default());
                w.write_record(std::iter::once(id.to_string()).chain(cells))?;
            }
        }
        w.flush()?;
        Ok(())
    }
}

impl TollTable for Vec<Segment> {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        let root: json::JsonValue = self.iter()
            .map(|s| json::object! {
                id_start: s.id_start,
                id_end: s.id_end,
                distance: s.distance,
            })
            .collect_vec()
            .into();
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_json_summary(&self, buf: impl Write) -> Result<()> {
        write_row_count(buf, self.len())
    }

    fn write_csv(&self, buf: impl Write) -> Result<()> {
        write_csv_rows(buf, &["id_start", "id_end", "distance"], self.iter().map(|s| {
            vec![s.id_start.to_string(), s.id_end.to_string(), s.distance.to_string()]
        }))
    }
}

impl TollTable for Vec<TollRate> {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        let root: json::JsonValue = self.iter()
            .map(|r| json::object! {
                id_start: r.segment.id_start,
                id_end: r.segment.id_end,
                distance: r.segment.distance,
                rates: rates_json(&r.rates),
            })
            .collect_vec()
            .into();
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_json_summary(&self, buf: impl Write) -> Result<()> {
        write_row_count(buf, self.len())
    }

    fn write_csv(&self, buf: impl Write) -> Result<()> {
        let header = with_rate_columns(&["id_start", "id_end", "distance"]);
        write_csv_rows(buf, &header, self.iter().map(|r| {
            vec![r.segment.id_start.to_string(), r.segment.id_end.to_string(), r.segment.distance.to_string()]
                .into_iter()
                .chain(rates_fields(&r.rates))
        }))
    }
}

impl TollTable for Vec<TimedTollRecord> {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        let root: json::JsonValue = self.iter()
            .map(|r| json::object! {
                id_start: r.segment.id_start,
                id_end: r.segment.id_end,
                distance: r.segment.distance,
                start_day: day_name(r.window.start_day()),
                start_time: r.window.start.clock(),
                end_day: day_name(r.window.end_day()),
                end_time: r.window.end.clock(),
                discount: r.discount,
                rates: rates_json(&r.rates),
            })
            .collect_vec()
            .into();
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_json_summary(&self, mut buf: impl Write) -> Result<()> {
        let root = json::object! {
            rows: self.len(),
            segments: self.len() / windows::WINDOWS_PER_WEEK,
            windows_per_segment: windows::WINDOWS_PER_WEEK,
        };
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_csv(&self, buf: impl Write) -> Result<()> {
        let header = with_rate_columns(&["id_start", "id_end", "distance", "start_day", "start_time", "end_day", "end_time"]);
        write_csv_rows(buf, &header, self.iter().map(|r| {
            vec![
                r.segment.id_start.to_string(),
                r.segment.id_end.to_string(),
                r.segment.distance.to_string(),
                day_name(r.window.start_day()).to_string(),
                r.window.start.clock(),
                day_name(r.window.end_day()).to_string(),
                r.window.end.clock(),
            ].into_iter().chain(rates_fields(&r.rates))
        }))
    }
}

impl TollTable for Vec<PairCoverage> {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        let root: json::JsonValue = self.iter()
            .map(|c| json::object! {
                id_start: c.id_start,
                id_end: c.id_end,
                complete: c.complete,
                uncovered_secs: c.uncovered_secs,
            })
            .collect_vec()
            .into();
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_json_summary(&self, mut buf: impl Write) -> Result<()> {
        let root = json::object! {
            pairs: self.len(),
            complete: self.iter().filter(|c| c.complete).count(),
        };
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_csv(&self, buf: impl Write) -> Result<()> {
        write_csv_rows(buf, &["id_start", "id_end", "complete", "uncovered_secs"], self.iter().map(|c| {
            vec![c.id_start.to_string(), c.id_end.to_string(), c.complete.to_string(), c.uncovered_secs.to_string()]
        }))
    }
}

/// Identifiers found near a reference, together with the query that found them.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyIds {
    pub reference: Id,
    pub threshold: f64,
    pub ids: Vec<Id>,
}

impl TollTable for NearbyIds {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        let root = json::object! {
            reference: self.reference,
            threshold: self.threshold,
            ids: self.ids.clone(),
        };
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_json_summary(&self, mut buf: impl Write) -> Result<()> {
        let root = json::object! {
            reference: self.reference,
            threshold: self.threshold,
            found: self.ids.len(),
        };
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_csv(&self, buf: impl Write) -> Result<()> {
        write_csv_rows(buf, &["id"], self.ids.iter().map(|id| vec![id.to_string()]))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_test_logging;
    use chrono::{NaiveTime, Weekday};

    fn one_segment(distance: Distance) -> Vec<TollRate> {
        rates::calculate(&[Segment { id_start: 1, id_end: 2, distance }], &RateCoefficients::default())
    }

    fn timed(start: WeekInstant) -> Result<Vec<TimedTollRecord>> {
        windows::expand_uniform(&one_segment(10.0), start, &DiscountSchedule::default())
    }

    fn read_csv(table: &impl TollTable) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut buf = Vec::new();
        table.write(&mut buf, OutputFormat::Csv)?;
        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let rows = reader.records()
            .map(|r| -> Result<Vec<String>> { Ok(r?.iter().map(String::from).collect()) })
            .collect::<Result<Vec<_>>>()?;
        Ok((header, rows))
    }

    fn rate_field(row: &[String], col: usize) -> f64 {
        row[col].parse().unwrap()
    }

    fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

    #[test]
    fn timed_csv_from_monday_morning() -> Result<()> {
        let _g = init_test_logging(None::<&str>);
        let start = WeekInstant::new(Weekday::Mon, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        let (header, rows) = read_csv(&timed(start)?)?;

        assert_eq!(header, vec![
            "id_start", "id_end", "distance", "start_day", "start_time", "end_day", "end_time",
            "moto", "car", "rv", "bus", "truck",
        ]);
        assert_eq!(rows.len(), windows::WINDOWS_PER_WEEK);

        let first = &rows[0];
        assert_eq!(first[..7].to_vec(), vec!["1", "2", "10", "Monday", "09:30:00", "Monday", "10:00:00"]);
        assert!(close(rate_field(first, 7), 6.4));
        assert!(close(rate_field(first, 8), 9.6));
        assert!(close(rate_field(first, 11), 28.8));

        let second = &rows[1];
        assert_eq!(second[4..7].to_vec(), vec!["10:00:00", "Monday", "10:30:00"]);
        assert!(close(rate_field(second, 8), 14.4));

        let last = &rows[rows.len() - 1];
        assert_eq!(last[3..7].to_vec(), vec!["Monday", "09:00:00", "Monday", "09:30:00"]);
        Ok(())
    }

    #[test]
    fn timed_csv_window_crossing_week_end() -> Result<()> {
        let start = WeekInstant::new(Weekday::Sun, NaiveTime::from_hms_opt(23, 30, 0).unwrap());
        let (_, rows) = read_csv(&timed(start)?)?;
        assert_eq!(rows[0][3..7].to_vec(), vec!["Sunday", "23:30:00", "Monday", "00:00:00"]);
        assert!(close(rate_field(&rows[0], 8), 12.0 * 0.7));
        assert_eq!(rows[1][3..5].to_vec(), vec!["Monday", "00:00:00"]);
        assert!(close(rate_field(&rows[1], 8), 12.0 * 0.8));
        Ok(())
    }

    #[test]
    fn timed_json_summary() -> Result<()> {
        let mut buf = Vec::new();
        timed(WeekInstant::ORIGIN)?.write(&mut buf, OutputFormat::JsonSummary)?;
        let root = json::parse(std::str::from_utf8(&buf)?)?;
        assert_eq!(root["rows"].as_usize(), Some(windows::WINDOWS_PER_WEEK));
        assert_eq!(root["segments"].as_usize(), Some(1));
        Ok(())
    }

    #[test]
    fn segments_csv() -> Result<()> {
        let segments = vec![
            Segment { id_start: 1, id_end: 2, distance: 9.7 },
            Segment { id_start: 2, id_end: 1, distance: 0.0 },
        ];
        let (header, rows) = read_csv(&segments)?;
        assert_eq!(header, vec!["id_start", "id_end", "distance"]);
        assert_eq!(rows, vec![vec!["1", "2", "9.7"], vec!["2", "1", "0"]]);
        Ok(())
    }

    #[test]
    fn rates_json_names_classes() -> Result<()> {
        let mut buf = Vec::new();
        one_segment(10.0).write(&mut buf, OutputFormat::Json)?;
        let root = json::parse(std::str::from_utf8(&buf)?)?;
        assert_eq!(root.len(), 1);
        assert_eq!(root[0]["id_start"].as_u64(), Some(1));
        let car = root[0]["rates"]["car"].as_f64().unwrap();
        assert!(close(car, 12.0));
        Ok(())
    }

    #[test]
    fn nearby_ids_csv() -> Result<()> {
        let nearby = NearbyIds { reference: 1, threshold: 0.1, ids: vec![3, 7] };
        let (header, rows) = read_csv(&nearby)?;
        assert_eq!(header, vec!["id"]);
        assert_eq!(rows, vec![vec!["3"], vec!["7"]]);
        Ok(())
    }

    #[test]
    fn format_strings() {
        let parsed: Vec<_> = OUTPUT_FORMAT_STRINGS.iter().map(|s| s.parse::<OutputFormat>()).collect();
        assert_eq!(parsed, vec![Ok(OutputFormat::Json), Ok(OutputFormat::JsonSummary), Ok(OutputFormat::Csv)]);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default(), OutputFormat::JsonSummary);
    }
}
