//! The calibration runner behind the `pair-formation` binary: loads society parameters and a
//! population of eligible individuals, runs a number of cycles, and writes every rate to CSV.
//!
//! The population file has one row per eligible individual:
//!
//! ```text
//! age_days,sex,risk_group,relationship_type
//! 7300,male,low,transitory
//! 9125.5,female,high,marital
//! ```
//!
//! Individuals age by `dt` each step. The output has one row per rate per step:
//!
//! ```text
//! time,relationship_type,risk_group,sex,bin,rate
//! ```
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use log::{info, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::demographics::{RelationshipType, RiskGroup, Sex};
use crate::error::PairFormationError;
use crate::parameters::SocietyParameters;
use crate::snapshot::PairFormationSnapshot;
use crate::society::Society;

/// Command line arguments for the calibration runner
#[derive(Parser, Debug, Clone)]
#[command(name = "pair-formation", version, about)]
pub struct BaseArgs {
    /// Path to the society parameters JSON file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Path to the population CSV file
    #[arg(short, long)]
    pub population: PathBuf,

    /// Simulated time of the first step, in days
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub start_time: f64,

    /// Length of a step, in days
    #[arg(long, default_value_t = 1.0)]
    pub dt: f64,

    /// Number of steps to run
    #[arg(long, default_value_t = 1)]
    pub steps: usize,

    /// Optional path for rate output; rates go to stdout if omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Optional path to write a JSON snapshot of the final state
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Set the global log level (error, warn, info, debug, trace, off)
    #[arg(long, value_parser = parse_log_level)]
    pub log_level: Option<LevelFilter>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_log_level(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("'{level}' is not one of off, error, warn, info, debug, trace"))
}

impl BaseArgs {
    /// Arguments with every optional value at its default.
    #[must_use]
    pub fn new(config: &Path, population: &Path) -> Self {
        BaseArgs {
            config: config.to_path_buf(),
            population: population.to_path_buf(),
            start_time: 0.0,
            dt: 1.0,
            steps: 1,
            output: None,
            snapshot: None,
            log_level: None,
            verbose: 0,
        }
    }

    fn effective_log_level(&self) -> Option<LevelFilter> {
        self.log_level.or(match self.verbose {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            _ => Some(LevelFilter::Trace),
        })
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
struct PopulationRecord {
    age_days: f64,
    sex: Sex,
    risk_group: RiskGroup,
    relationship_type: RelationshipType,
}

#[derive(Serialize)]
struct RateRecord {
    time: f64,
    relationship_type: RelationshipType,
    risk_group: RiskGroup,
    sex: Sex,
    bin: usize,
    rate: f64,
}

fn read_population(path: &Path) -> Result<Vec<PopulationRecord>, PairFormationError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut population = Vec::new();
    for (row, record) in reader.deserialize::<PopulationRecord>().enumerate() {
        let record = record?;
        if !record.age_days.is_finite() || record.age_days < 0.0 {
            return Err(PairFormationError::InvalidInput(format!(
                "population row {}: age_days must be a non-negative number, got {}",
                row + 1,
                record.age_days
            )));
        }
        population.push(record);
    }
    Ok(population)
}

fn write_rates<W: Write>(
    writer: &mut csv::Writer<W>,
    society: &Society,
    time: f64,
) -> Result<(), PairFormationError> {
    for relationship_type in society.relationship_types() {
        let Some(rates) = society.rates(relationship_type) else {
            continue;
        };
        for (risk_group, sex, bin, rate) in rates.rates().iter() {
            writer.serialize(RateRecord {
                time,
                relationship_type,
                risk_group,
                sex,
                bin,
                rate,
            })?;
        }
    }
    Ok(())
}

/// Runs the calibration cycle `args.steps` times and returns a snapshot of the final state.
///
/// # Errors
///
/// Returns a `PairFormationError` if an input file cannot be read or is invalid, the
/// population names an unconfigured relationship type, or the output cannot be written.
pub fn run_with_args(args: &BaseArgs) -> Result<PairFormationSnapshot, PairFormationError> {
    if let Some(level) = args.effective_log_level() {
        crate::log::set_log_level(level);
    }
    if !(args.dt.is_finite() && args.dt > 0.0) {
        return Err(PairFormationError::InvalidInput(format!(
            "dt must be a positive number of days, got {}",
            args.dt
        )));
    }
    if !args.start_time.is_finite() {
        return Err(PairFormationError::InvalidInput(format!(
            "start time must be finite, got {}",
            args.start_time
        )));
    }

    info!("loading pair formation parameters from {}", args.config.display());
    let parameters = SocietyParameters::load_from_json(&args.config)?;
    info!("loading population from {}", args.population.display());
    let population = read_population(&args.population)?;
    info!("{} eligible individuals", population.len());

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = csv::Writer::from_writer(sink);

    let mut society = Society::new(&parameters);
    for step in 0..args.steps {
        #[allow(clippy::cast_precision_loss)]
        let elapsed = step as f64 * args.dt;
        let time = args.start_time + elapsed;

        society.reset_eligibility();
        for individual in &population {
            society.update_eligible(
                individual.relationship_type,
                individual.age_days + elapsed,
                individual.sex,
                individual.risk_group,
                1,
            )?;
        }
        society.update_pair_formation_rates(time, args.dt);
        write_rates(&mut writer, &society, time)?;
    }
    writer.flush()?;
    society.dump();

    let snapshot = society.snapshot();
    if let Some(path) = &args.snapshot {
        snapshot.save_json(path)?;
        info!("wrote snapshot to {}", path.display());
    }
    Ok(snapshot)
}
