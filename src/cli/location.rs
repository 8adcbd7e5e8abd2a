//! Location commands: communes and villages.

use clap::Subcommand;

use crate::data::DataStore;

use super::format::location_name;
use super::{resolve_commune, resolve_village};

#[derive(Debug, Subcommand)]
pub enum CommuneCommand {
    /// Add a commune. Prints its id.
    Add { name: String },

    /// Rename a commune.
    Rename {
        /// Commune id or name.
        commune: String,
        name: String,
    },

    /// Remove a commune and all of its villages.
    Remove {
        /// Commune id or name.
        commune: String,
    },

    /// List communes.
    List,
}

#[derive(Debug, Subcommand)]
pub enum VillageCommand {
    /// Add a village to a commune. Prints its id.
    Add {
        name: String,

        /// Commune id or name.
        #[arg(long)]
        commune: String,
    },

    /// Rename a village or move it to another commune.
    Edit {
        /// Village id.
        village: String,

        /// New name (defaults to the current one).
        #[arg(long)]
        name: Option<String>,

        /// New commune id or name (defaults to the current one).
        #[arg(long)]
        commune: Option<String>,
    },

    /// Remove a village.
    Remove {
        /// Village id, or name with --commune.
        village: String,

        #[arg(long)]
        commune: Option<String>,
    },

    /// List villages.
    List {
        /// Only villages in this commune (id or name).
        #[arg(long)]
        commune: Option<String>,
    },
}

pub(super) fn run_commune(data: &mut DataStore, command: CommuneCommand) -> Result<(), String> {
    match command {
        CommuneCommand::Add { name } => {
            let commune = data
                .add_commune(&name)
                .map_err(|e| format!("failed to add commune: {e}"))?;
            println!("{}", commune.id);
        }
        CommuneCommand::Rename { commune, name } => {
            let id = resolve_commune(data, &commune)?.id.clone();
            data.rename_commune(&id, &name)
                .map_err(|e| format!("failed to rename commune: {e}"))?;
        }
        CommuneCommand::Remove { commune } => {
            let commune = resolve_commune(data, &commune)?.clone();
            let villages = data
                .remove_commune(&commune.id)
                .map_err(|e| format!("failed to remove commune: {e}"))?;
            eprintln!("Removed {} and {villages} village(s)", commune.name);
        }
        CommuneCommand::List => {
            if data.communes().is_empty() {
                println!("No communes");
            }
            for c in data.communes() {
                let villages = data
                    .villages()
                    .iter()
                    .filter(|v| v.commune_id == c.id)
                    .count();
                println!("{}  {}  ({villages} villages)", c.id, c.name);
            }
        }
    }
    Ok(())
}

pub(super) fn run_village(data: &mut DataStore, command: VillageCommand) -> Result<(), String> {
    match command {
        VillageCommand::Add { name, commune } => {
            let commune_id = resolve_commune(data, &commune)?.id.clone();
            let village = data
                .add_village(&name, &commune_id)
                .map_err(|e| format!("failed to add village: {e}"))?;
            println!("{}", village.id);
        }
        VillageCommand::Edit {
            village,
            name,
            commune,
        } => {
            let current = resolve_village(data, None, &village)?.clone();
            let commune_id = match commune {
                Some(reference) => resolve_commune(data, &reference)?.id.clone(),
                None => current.commune_id.clone(),
            };
            let name = name.unwrap_or(current.name);
            data.edit_village(&current.id, &name, &commune_id)
                .map_err(|e| format!("failed to edit village: {e}"))?;
        }
        VillageCommand::Remove { village, commune } => {
            let commune_id = commune
                .as_deref()
                .map(|c| resolve_commune(data, c).map(|c| c.id.clone()))
                .transpose()?;
            let id = resolve_village(data, commune_id.as_deref(), &village)?.id.clone();
            data.remove_village(&id)
                .map_err(|e| format!("failed to remove village: {e}"))?;
        }
        VillageCommand::List { commune } => {
            let commune_id = commune
                .as_deref()
                .map(|c| resolve_commune(data, c).map(|c| c.id.clone()))
                .transpose()?;
            let villages: Vec<_> = data
                .villages()
                .iter()
                .filter(|v| commune_id.as_ref().is_none_or(|id| &v.commune_id == id))
                .collect();
            if villages.is_empty() {
                println!("No villages");
            }
            for v in villages {
                let commune = data
                    .communes()
                    .iter()
                    .find(|c| c.id == v.commune_id)
                    .map(|c| c.name.as_str());
                let commune = location_name(commune);
                println!("{}  {}  [{commune}]", v.id, v.name);
            }
        }
    }
    Ok(())
}
