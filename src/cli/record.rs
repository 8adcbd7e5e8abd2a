//! Record commands: planting and harvest entry, listing, removal, import.

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use jiff::civil::Date;

use crate::data::DataStore;
use crate::import::{self, ImportReport};
use crate::model::{CropType, HarvestDraft, PlantingDraft, Season};

use super::PlaceArgs;
use super::format::{format_harvest, format_planting};

#[derive(Debug, Subcommand)]
pub enum PlantingCommand {
    /// Record a planting. Prints its id.
    Add(PlantingArgs),

    /// Replace a planting record, keeping its id.
    Edit {
        /// Record id.
        id: String,

        #[command(flatten)]
        record: PlantingArgs,
    },

    /// Remove one or more planting records.
    Remove {
        /// Record ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List planting records.
    List {
        /// Only records planted in this year.
        #[arg(long)]
        year: Option<i16>,
    },
}

#[derive(Debug, Subcommand)]
pub enum HarvestCommand {
    /// Record a harvest. Prints its id.
    Add(HarvestArgs),

    /// Replace a harvest record, keeping its id.
    Edit {
        /// Record id.
        id: String,

        #[command(flatten)]
        record: HarvestArgs,
    },

    /// Remove one or more harvest records.
    Remove {
        /// Record ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List harvest records.
    List {
        /// Only records harvested in this year.
        #[arg(long)]
        year: Option<i16>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Import planting records.
    Planting { file: PathBuf },

    /// Import harvest records.
    Harvest { file: PathBuf },
}

#[derive(Debug, Args)]
pub struct PlantingArgs {
    #[command(flatten)]
    place: PlaceArgs,

    /// `wet` or `dry`.
    #[arg(long)]
    season: Season,

    #[arg(long)]
    crop_name: String,

    /// `horticulture`, `industrial`, or `rice`.
    #[arg(long)]
    crop_type: CropType,

    /// Cultivated area in hectares.
    #[arg(long)]
    area: f64,

    /// Planting date (YYYY-MM-DD).
    #[arg(long)]
    date: Date,
}

#[derive(Debug, Args)]
pub struct HarvestArgs {
    #[command(flatten)]
    place: PlaceArgs,

    /// `wet` or `dry`.
    #[arg(long)]
    season: Season,

    #[arg(long)]
    crop_name: String,

    /// `horticulture`, `industrial`, or `rice`.
    #[arg(long)]
    crop_type: CropType,

    /// Flowering area in hectares.
    #[arg(long)]
    flowering: f64,

    /// Ripe area in hectares.
    #[arg(long)]
    ripe: f64,

    /// Harvested area in hectares.
    #[arg(long)]
    harvested: f64,

    /// Yield in tons per hectare.
    #[arg(long = "yield")]
    yield_per_hectare: f64,

    /// Harvest date (YYYY-MM-DD).
    #[arg(long)]
    date: Date,
}

impl PlantingArgs {
    fn into_draft(self, data: &DataStore) -> Result<PlantingDraft, String> {
        let (commune_id, village_id) = self.place.resolve(data)?;
        Ok(PlantingDraft {
            commune_id,
            village_id,
            season: self.season,
            crop_name: self.crop_name,
            crop_type: self.crop_type,
            cultivated_area: self.area,
            planting_date: self.date,
        })
    }
}

impl HarvestArgs {
    fn into_draft(self, data: &DataStore) -> Result<HarvestDraft, String> {
        let (commune_id, village_id) = self.place.resolve(data)?;
        Ok(HarvestDraft {
            commune_id,
            village_id,
            season: self.season,
            crop_name: self.crop_name,
            crop_type: self.crop_type,
            flowering_area: self.flowering,
            ripe_area: self.ripe,
            harvested_area: self.harvested,
            yield_per_hectare: self.yield_per_hectare,
            harvest_date: self.date,
        })
    }
}

pub(super) fn run_planting(data: &mut DataStore, command: PlantingCommand) -> Result<(), String> {
    match command {
        PlantingCommand::Add(args) => {
            let draft = args.into_draft(data)?;
            let record = data
                .add_planting(draft)
                .map_err(|e| format!("failed to add planting record: {e}"))?;
            println!("{}", record.id);
        }
        PlantingCommand::Edit { id, record } => {
            let draft = record.into_draft(data)?;
            data.edit_planting(&id, draft)
                .map_err(|e| format!("failed to edit planting record: {e}"))?;
        }
        PlantingCommand::Remove { ids } => {
            let removed = data.remove_plantings(&ids);
            eprintln!("Removed {removed} of {} planting record(s)", ids.len());
        }
        PlantingCommand::List { year } => {
            let records: Vec<_> = data
                .planting_records()
                .iter()
                .filter(|r| year.is_none_or(|y| r.planting_date.year() == y))
                .collect();
            if records.is_empty() {
                println!("No planting records");
            }
            for r in records {
                println!("{}", format_planting(data.snapshot(), r));
            }
        }
    }
    Ok(())
}

pub(super) fn run_harvest(data: &mut DataStore, command: HarvestCommand) -> Result<(), String> {
    match command {
        HarvestCommand::Add(args) => {
            let draft = args.into_draft(data)?;
            let record = data
                .add_harvest(draft)
                .map_err(|e| format!("failed to add harvest record: {e}"))?;
            println!("{}", record.id);
        }
        HarvestCommand::Edit { id, record } => {
            let draft = record.into_draft(data)?;
            data.edit_harvest(&id, draft)
                .map_err(|e| format!("failed to edit harvest record: {e}"))?;
        }
        HarvestCommand::Remove { ids } => {
            let removed = data.remove_harvests(&ids);
            eprintln!("Removed {removed} of {} harvest record(s)", ids.len());
        }
        HarvestCommand::List { year } => {
            let records: Vec<_> = data
                .harvest_records()
                .iter()
                .filter(|r| year.is_none_or(|y| r.harvest_date.year() == y))
                .collect();
            if records.is_empty() {
                println!("No harvest records");
            }
            for r in records {
                println!("{}", format_harvest(data.snapshot(), r));
            }
        }
    }
    Ok(())
}

pub(super) fn run_import(data: &mut DataStore, command: ImportCommand) -> Result<(), String> {
    match command {
        ImportCommand::Planting { file } => {
            let input = open(&file)?;
            let report = import::decode_plantings(input, data.snapshot())
                .map_err(|e| format!("failed to import {}: {e}", file.display()))?;
            let imported = summarize(&report);
            data.append_plantings(report.records);
            eprintln!("Imported {imported} planting record(s)");
        }
        ImportCommand::Harvest { file } => {
            let input = open(&file)?;
            let report = import::decode_harvests(input, data.snapshot())
                .map_err(|e| format!("failed to import {}: {e}", file.display()))?;
            let imported = summarize(&report);
            data.append_harvests(report.records);
            eprintln!("Imported {imported} harvest record(s)");
        }
    }
    Ok(())
}

fn open(path: &Path) -> Result<File, String> {
    File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))
}

/// Prints skipped rows and returns the number of records to import.
fn summarize<T>(report: &ImportReport<T>) -> usize {
    for skipped in &report.skipped {
        eprintln!("Skipped row {}: {}", skipped.row, skipped.reason);
    }
    report.records.len()
}
