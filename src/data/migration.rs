//! One-time import from the legacy layout, where each collection was stored
//! under its own key.
//!
//! Runs only while the unified aggregate is empty and the legacy `communes`
//! key exists. A legacy key that fails to parse aborts the whole import and
//! leaves every legacy key in place. The legacy keys are removed only after
//! the unified aggregate has been written.

use serde::de::DeserializeOwned;

use crate::model::AppData;
use crate::storage::{StorageError, StorageMedium};

use super::DataStore;

const LEGACY_COMMUNES: &str = "communes";
const LEGACY_VILLAGES: &str = "villages";
const LEGACY_PLANTING: &str = "plantingData";
const LEGACY_HARVEST: &str = "harvestData";

/// Keys of the pre-unification layout.
pub const LEGACY_KEYS: [&str; 4] = [
    LEGACY_COMMUNES,
    LEGACY_VILLAGES,
    LEGACY_PLANTING,
    LEGACY_HARVEST,
];

/// What a migration attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The unified aggregate already holds data; legacy keys were not read.
    AlreadyPopulated,

    /// No legacy `communes` key (or no medium).
    NoLegacyData,

    /// Legacy keys parsed but held nothing; they were left in place.
    NothingToImport,

    /// Imported, written, and the legacy keys removed.
    Migrated {
        communes: usize,
        villages: usize,
        planting: usize,
        harvest: usize,
    },

    /// Imported into memory, but the unified write failed; legacy keys kept.
    Unpersisted,

    /// A legacy key failed to parse or read; nothing changed.
    Aborted,
}

#[derive(Debug, thiserror::Error)]
enum LegacyError {
    #[error("invalid legacy {key}: {source}")]
    Parse {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DataStore {
    /// Imports the legacy layout into the unified aggregate if needed.
    ///
    /// Safe to call repeatedly: once the aggregate holds data this returns
    /// [`MigrationOutcome::AlreadyPopulated`] without touching the medium.
    pub fn migrate_legacy(&mut self) -> MigrationOutcome {
        if !self.store.get().is_empty() {
            return MigrationOutcome::AlreadyPopulated;
        }
        let Some(medium) = self.store.medium() else {
            return MigrationOutcome::NoLegacyData;
        };

        let communes_raw = match medium.get_item(LEGACY_COMMUNES) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return MigrationOutcome::NoLegacyData,
            Err(e) => {
                log::error!("failed to check for legacy data: {e}");
                return MigrationOutcome::Aborted;
            }
        };

        log::info!("attempting to migrate data from legacy storage keys");
        let legacy = match read_legacy(medium, &communes_raw) {
            Ok(legacy) => legacy,
            Err(e) => {
                log::error!("failed to migrate legacy data: {e}");
                return MigrationOutcome::Aborted;
            }
        };
        if legacy.is_empty() {
            return MigrationOutcome::NothingToImport;
        }

        let outcome = MigrationOutcome::Migrated {
            communes: legacy.communes.len(),
            villages: legacy.villages.len(),
            planting: legacy.planting_data.len(),
            harvest: legacy.harvest_data.len(),
        };
        self.store.set(legacy);
        if let Err(e) = self.store.write_now() {
            log::error!("failed to persist migrated data, keeping legacy keys: {e}");
            return MigrationOutcome::Unpersisted;
        }

        if let Some(medium) = self.store.medium() {
            for key in LEGACY_KEYS {
                if let Err(e) = medium.remove_item(key) {
                    log::warn!("failed to remove legacy key {key}: {e}");
                }
            }
        }
        log::info!("data migration successful");
        outcome
    }
}

fn read_legacy(
    medium: &dyn StorageMedium,
    communes_raw: &str,
) -> Result<AppData, LegacyError> {
    Ok(AppData {
        communes: parse_legacy(LEGACY_COMMUNES, Some(communes_raw))?,
        villages: parse_legacy(LEGACY_VILLAGES, medium.get_item(LEGACY_VILLAGES)?.as_deref())?,
        planting_data: parse_legacy(
            LEGACY_PLANTING,
            medium.get_item(LEGACY_PLANTING)?.as_deref(),
        )?,
        harvest_data: parse_legacy(LEGACY_HARVEST, medium.get_item(LEGACY_HARVEST)?.as_deref())?,
    })
}

/// Absent or empty means an empty collection; anything else must parse.
fn parse_legacy<T: DeserializeOwned>(
    key: &'static str,
    raw: Option<&str>,
) -> Result<Vec<T>, LegacyError> {
    match raw.filter(|raw| !raw.is_empty()) {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw).map_err(|source| LegacyError::Parse { key, source }),
    }
}
