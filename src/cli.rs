//! CLI interface for croplog.
//!
//! Every invocation is one execution context on the shared origin database:
//! it loads the aggregate, applies one command, and writes pending changes
//! before exiting. `croplog watch` stays attached and follows changes made
//! by other invocations.
//!
//! Locations are referenced by id or by exact name.

mod format;
mod location;
mod record;
mod report;
mod watch;

use std::path::PathBuf;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};

use crate::clock::SystemClock;
use crate::config::Config;
use crate::data::DataStore;
use crate::model::{Commune, CropType, Season, Village};
use crate::storage::{SqliteMedium, StorageMedium};

use location::{CommuneCommand, VillageCommand};
use record::{HarvestCommand, ImportCommand, PlantingCommand};
use report::ReportCommand;

/// croplog: planting and harvest records for communes and villages.
#[derive(Debug, Parser)]
#[command(name = "croplog", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Origin database to use instead of the configured one.
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: recording a season
  1. croplog commune add "Prey Veng"
  2. croplog village add Chrey --commune "Prey Veng"
  3. croplog planting add --commune "Prey Veng" --village Chrey \
       --season wet --crop-name Jasmine --crop-type rice --area 2.5 --date 2024-06-01
  4. croplog import harvest harvest-2024.csv
  5. croplog report annual-harvest --year 2024

Run `croplog watch` in another terminal to follow changes as they land."#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage communes.
    Commune {
        #[command(subcommand)]
        command: CommuneCommand,
    },

    /// Manage villages.
    Village {
        #[command(subcommand)]
        command: VillageCommand,
    },

    /// Manage planting records.
    Planting {
        #[command(subcommand)]
        command: PlantingCommand,
    },

    /// Manage harvest records.
    Harvest {
        #[command(subcommand)]
        command: HarvestCommand,
    },

    /// Append records from a CSV file.
    ///
    /// Rows naming an unknown commune or a village outside that commune are
    /// skipped and listed with their row numbers.
    Import {
        #[command(subcommand)]
        command: ImportCommand,
    },

    /// Aggregated reports.
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Follow changes made by other croplog processes.
    Watch,
}

/// Where a record was made.
#[derive(Debug, Args)]
pub struct PlaceArgs {
    /// Commune id or name.
    #[arg(long)]
    commune: String,

    /// Village id or name (within the commune).
    #[arg(long)]
    village: String,
}

/// Criteria shared by the reports.
#[derive(Debug, Args)]
pub struct FilterArgs {
    #[arg(long)]
    season: Option<Season>,

    /// Commune id or name.
    #[arg(long)]
    commune: Option<String>,

    /// Village id or name (requires --commune when given by name).
    #[arg(long)]
    village: Option<String>,

    #[arg(long)]
    crop_type: Option<CropType>,

    #[arg(long)]
    crop_name: Option<String>,
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();
    let storage = cli.storage.clone().or_else(|| config.storage_path());
    let mut data = DataStore::open(
        open_medium(storage),
        Rc::new(SystemClock),
        config.debounce(),
    );

    let result = match cli.command {
        Command::Commune { command } => location::run_commune(&mut data, command),
        Command::Village { command } => location::run_village(&mut data, command),
        Command::Planting { command } => record::run_planting(&mut data, command),
        Command::Harvest { command } => record::run_harvest(&mut data, command),
        Command::Import { command } => record::run_import(&mut data, command),
        Command::Report { command } => report::run(&data, command),
        Command::Watch => watch::run(&mut data, config.poll_interval()),
    };

    data.flush();
    result
}

/// Opens the origin database, or runs without persistence if it can't.
fn open_medium(path: Option<PathBuf>) -> Option<Rc<dyn StorageMedium>> {
    let Some(path) = path else {
        log::warn!("could not determine home directory; changes will not be saved");
        return None;
    };
    match SqliteMedium::open(&path) {
        Ok(medium) => Some(Rc::new(medium)),
        Err(e) => {
            log::warn!(
                "cannot open storage at {}: {e}; changes will not be saved",
                path.display()
            );
            None
        }
    }
}

/// Resolve a commune reference (id or exact name).
fn resolve_commune<'a>(data: &'a DataStore, reference: &str) -> Result<&'a Commune, String> {
    data.communes()
        .iter()
        .find(|c| c.id == reference)
        .or_else(|| data.commune_named(reference))
        .ok_or_else(|| format!("no commune matching '{reference}'"))
}

/// Resolve a village reference (id, or exact name within `commune_id`).
fn resolve_village<'a>(
    data: &'a DataStore,
    commune_id: Option<&str>,
    reference: &str,
) -> Result<&'a Village, String> {
    if let Some(village) = data.villages().iter().find(|v| v.id == reference) {
        return Ok(village);
    }
    match commune_id {
        Some(commune_id) => data
            .village_named(commune_id, reference)
            .ok_or_else(|| format!("no village matching '{reference}' in that commune")),
        None => {
            let matches: Vec<&Village> = data
                .villages()
                .iter()
                .filter(|v| v.name == reference)
                .collect();
            match matches.as_slice() {
                [] => Err(format!("no village matching '{reference}'")),
                [village] => Ok(*village),
                _ => Err(format!(
                    "'{reference}' is ambiguous; matches {} villages, pass --commune",
                    matches.len()
                )),
            }
        }
    }
}

impl PlaceArgs {
    /// Resolves to `(commune_id, village_id)`.
    fn resolve(&self, data: &DataStore) -> Result<(String, String), String> {
        let commune = resolve_commune(data, &self.commune)?;
        let village = resolve_village(data, Some(&commune.id), &self.village)?;
        Ok((commune.id.clone(), village.id.clone()))
    }
}

impl FilterArgs {
    fn resolve(&self, data: &DataStore) -> Result<crate::report::RecordFilter, String> {
        let commune_id = self
            .commune
            .as_deref()
            .map(|c| resolve_commune(data, c).map(|c| c.id.clone()))
            .transpose()?;
        let village_id = self
            .village
            .as_deref()
            .map(|v| resolve_village(data, commune_id.as_deref(), v).map(|v| v.id.clone()))
            .transpose()?;
        Ok(crate::report::RecordFilter {
            season: self.season,
            commune_id,
            village_id,
            crop_type: self.crop_type,
            crop_name: self.crop_name.clone(),
        })
    }
}
