use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use std::str::FromStr;
use chrono::{NaiveTime, Timelike, Weekday};
use anyhow::{anyhow, Result};
use tracing::{debug, info};

use tollgen::*;
use tollgen::config::TollConfig;
use tollgen::data::{load_observations, load_segments, scheduled_rates};
use tollgen::toll::*;
use tollgen::toll::coverage::check_coverage;
use tollgen::output::NearbyIds;
use tollgen::toll::nearby::ids_within_threshold;

mod common;
use common::*;

use structopt::StructOpt;

#[derive(Debug, Copy, Clone)]
enum Stage {
    Matrix,
    Unroll,
    Rates,
    Timed,
    Schedule,
    Coverage,
    Nearby,
}

const STAGE_STRINGS: [&str; 7] = ["matrix", "unroll", "rates", "timed", "schedule", "coverage", "nearby"];

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "matrix" => Ok(Self::Matrix),
            "unroll" => Ok(Self::Unroll),
            "rates" => Ok(Self::Rates),
            "timed" => Ok(Self::Timed),
            "schedule" => Ok(Self::Schedule),
            "coverage" => Ok(Self::Coverage),
            "nearby" => Ok(Self::Nearby),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}


#[derive(Debug, StructOpt)]
struct ClArgs {
    #[structopt(parse(try_from_str), possible_values=&STAGE_STRINGS)]
    stage: Stage,
    /// Observations table, or segment table for the `schedule` and `coverage` stages
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    /// JSON configuration file
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(long, short="c", default_value="1", validator=clap_range_validator(Some(1), None))]
    cpus: usize,
    /// Reference identifier for the `nearby` stage
    #[structopt(long)]
    reference: Option<Id>,
    #[structopt(long, validator=clap_range_validator(Some(0.0), None))]
    threshold: Option<f64>,
    #[structopt(long="start-day", parse(try_from_str=tables::parse_day))]
    start_day: Option<Weekday>,
    #[structopt(long="start-time", parse(try_from_str=tables::parse_time))]
    start_time: Option<NaiveTime>,
    /// Emit pairs without a recorded distance with distance zero instead of dropping them
    #[structopt(long="keep-unobserved")]
    keep_unobserved: bool,
    #[structopt(flatten)]
    output: OutputOptions,
}

fn build_config(args: &ClArgs) -> Result<TollConfig> {
    let mut config = match args.config.as_ref() {
        Some(p) => TollConfig::load(p)?,
        None => TollConfig::default(),
    };
    if args.start_day.is_some() || args.start_time.is_some() {
        let day = args.start_day.unwrap_or_else(|| config.start.weekday());
        let secs = args.start_time
            .map(|t| t.num_seconds_from_midnight())
            .unwrap_or_else(|| config.start.secs_of_day());
        config.start = WeekInstant::at(day, secs);
    }
    if args.keep_unobserved {
        config.unobserved = UnobservedPolicy::Zero;
    }
    if let Some(t) = args.threshold {
        config.threshold = t;
    }
    config.check()?;
    Ok(config)
}


fn main() -> anyhow::Result<()> {
    let args : ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.as_ref())?;
    debug!(?args);
    ThreadPoolBuilder::new().num_threads(args.cpus).build_global()?;
    let config = build_config(&args)?;

    match args.stage {
        Stage::Matrix => {
            let matrix = DistanceMatrix::build(&load_observations(&args.input)?)?;
            output_table(&args.output, &matrix)?;
        },
        Stage::Unroll => {
            let matrix = DistanceMatrix::build(&load_observations(&args.input)?)?;
            output_table(&args.output, &unroll::unroll(&matrix, config.unobserved))?;
        },
        Stage::Rates => {
            let matrix = DistanceMatrix::build(&load_observations(&args.input)?)?;
            let segments = unroll::unroll(&matrix, config.unobserved);
            output_table(&args.output, &rates::calculate(&segments, &config.coefficients))?;
        },
        Stage::Timed => {
            let pipeline = TollPipeline::run(&load_observations(&args.input)?, &config)?;
            output_table(&args.output, &pipeline.timed)?;
        },
        Stage::Schedule => {
            let rows = load_segments(&args.input)?;
            let scheduled = scheduled_rates(&rows, &config.coefficients)?;
            output_table(&args.output, &windows::expand(&scheduled, &config.discounts)?)?;
        },
        Stage::Coverage => {
            let coverage = check_coverage(&load_segments(&args.input)?);
            info!(incomplete=coverage.iter().filter(|c| !c.complete).count(), "checked coverage");
            output_table(&args.output, &coverage)?;
        },
        Stage::Nearby => {
            let reference = args.reference.ok_or_else(|| anyhow!("--reference is required by the nearby stage"))?;
            let matrix = DistanceMatrix::build(&load_observations(&args.input)?)?;
            let ids = ids_within_threshold(&matrix, reference, config.threshold)?;
            output_table(&args.output, &NearbyIds { reference, threshold: config.threshold, ids })?;
        },
    }
    Ok(())
}
