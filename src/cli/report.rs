//! Report commands.

use clap::Subcommand;
use jiff::Zoned;

use crate::data::DataStore;
use crate::model::CropType;
use crate::report::{self, AnnualHarvest, AnnualPlanting, Period, PeriodSummary};

use super::FilterArgs;
use super::format::{hectares, tons};

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Cultivated area for one year.
    AnnualPlanting {
        /// Defaults to the current year.
        #[arg(long, value_parser = year_parser())]
        year: Option<i16>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Harvest progress and production for one year.
    AnnualHarvest {
        /// Defaults to the current year.
        #[arg(long, value_parser = year_parser())]
        year: Option<i16>,

        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long)]
        json: bool,
    },

    /// Planted area, harvest progress, and production over five periods.
    ///
    /// Periods default to the five calendar years ending with --end-year.
    FiveYear {
        /// Last year of the range. Defaults to the current year.
        #[arg(long, value_parser = year_parser(), conflicts_with = "range")]
        end_year: Option<i16>,

        /// A custom period, START..END (YYYY-MM-DD). Repeatable.
        #[arg(long = "range", value_name = "START..END")]
        range: Vec<Period>,

        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long)]
        json: bool,
    },
}

pub(super) fn run(data: &DataStore, command: ReportCommand) -> Result<(), String> {
    match command {
        ReportCommand::AnnualPlanting { year, filter, json } => {
            let filter = filter.resolve(data)?;
            let report = report::annual_planting(data.snapshot(), year_or_current(year), &filter);
            if json {
                print_json(&report)?;
            } else {
                print_planting(&report);
            }
        }
        ReportCommand::AnnualHarvest { year, filter, json } => {
            let filter = filter.resolve(data)?;
            let report = report::annual_harvest(data.snapshot(), year_or_current(year), &filter);
            if json {
                print_json(&report)?;
            } else {
                print_harvest(&report);
            }
        }
        ReportCommand::FiveYear {
            end_year,
            range,
            filter,
            json,
        } => {
            let filter = filter.resolve(data)?;
            let periods = if range.is_empty() {
                let end_year = year_or_current(end_year);
                report::five_year_periods(end_year)
                    .ok_or_else(|| format!("year {end_year} is out of range"))?
            } else {
                range
            };
            let summaries = report::period_summaries(data.snapshot(), &periods, &filter);
            if json {
                print_json(&summaries)?;
            } else {
                print_periods(&summaries);
            }
        }
    }
    Ok(())
}

/// Years whose five-year window stays within the supported dates.
fn year_parser() -> clap::builder::RangedI64ValueParser<i16> {
    clap::value_parser!(i16).range(-9995..=9999)
}

fn year_or_current(year: Option<i16>) -> i16 {
    year.unwrap_or_else(|| Zoned::now().year())
}

fn print_json(value: &impl serde::Serialize) -> Result<(), String> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| format!("failed to encode report: {e}"))?;
    println!("{json}");
    Ok(())
}

fn print_planting(report: &AnnualPlanting) {
    println!("Planting {}: {}", report.year, hectares(report.total_area));

    println!("\nBy crop type:");
    for crop_type in CropType::ALL {
        let area = report.by_crop_type.get(&crop_type).copied().unwrap_or_default();
        println!("  {crop_type}  {}", hectares(area));
    }

    println!("\nBy commune:");
    for (name, area) in &report.by_commune {
        println!("  {name}  {}", hectares(*area));
    }

    println!("\nBy village:");
    for (name, area) in &report.by_village {
        println!("  {name}  {}", hectares(*area));
    }

    println!("\nBy month:");
    for (month, area) in report.by_month.iter().enumerate() {
        println!("  {:02}  {}", month + 1, hectares(*area));
    }
}

fn print_harvest(report: &AnnualHarvest) {
    println!("Harvest {}", report.year);
    println!("  flowering  {}", hectares(report.flowering_area));
    println!("  ripe       {}", hectares(report.ripe_area));
    println!("  harvested  {}", hectares(report.harvested_area));
    println!("  production {}", tons(report.production));

    println!("\nHarvested by commune:");
    for (name, area) in &report.harvested_by_commune {
        println!("  {name}  {}", hectares(*area));
    }

    println!("\nHarvested by village:");
    for (name, area) in &report.harvested_by_village {
        println!("  {name}  {}", hectares(*area));
    }

    println!("\nProduction by month:");
    for (month, amount) in report.production_by_month.iter().enumerate() {
        println!("  {:02}  {}", month + 1, tons(*amount));
    }
}

fn print_periods(summaries: &[PeriodSummary]) {
    for s in summaries {
        println!(
            "{}  planted {}  flowering {}  ripe {}  harvested {}  production {}",
            s.label,
            hectares(s.planted_area),
            hectares(s.flowering_area),
            hectares(s.ripe_area),
            hectares(s.harvested_area),
            tons(s.production),
        );
    }
}
