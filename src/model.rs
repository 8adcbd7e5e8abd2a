//! Core data model for croplog.
//!
//! Everything the operator records lives in a single [`AppData`] aggregate:
//! administrative locations (communes and their villages) and the planting
//! and harvest records entered against them.

mod crop;
mod location;
mod record;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crop::{CropType, Season};
pub use location::{Commune, Village};
pub use record::{HarvestDraft, HarvestRecord, PlantingDraft, PlantingRecord};

/// The unified persisted aggregate.
///
/// Persisted and loaded as one unit. A field missing from stored JSON
/// reads back as an empty collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppData {
    pub communes: Vec<Commune>,
    pub villages: Vec<Village>,
    pub planting_data: Vec<PlantingRecord>,
    pub harvest_data: Vec<HarvestRecord>,
}

impl AppData {
    /// True when all four collections are empty.
    pub fn is_empty(&self) -> bool {
        self.communes.is_empty()
            && self.villages.is_empty()
            && self.planting_data.is_empty()
            && self.harvest_data.is_empty()
    }
}

/// Generates an opaque identifier for a newly created entity.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
