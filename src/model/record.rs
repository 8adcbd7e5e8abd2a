//! Planting and harvest records.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::{CropType, Season};

/// Land put under cultivation in a village during a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantingRecord {
    pub id: String,
    pub commune_id: String,
    pub village_id: String,
    pub season: Season,
    pub crop_name: String,
    pub crop_type: CropType,
    /// Hectares.
    pub cultivated_area: f64,
    pub planting_date: Date,
}

/// Harvest progress for a crop in a village during a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestRecord {
    pub id: String,
    pub commune_id: String,
    pub village_id: String,
    pub season: Season,
    pub crop_name: String,
    pub crop_type: CropType,
    /// Hectares.
    pub flowering_area: f64,
    /// Hectares.
    pub ripe_area: f64,
    /// Hectares.
    pub harvested_area: f64,
    /// Tons per hectare.
    #[serde(rename = "yield")]
    pub yield_per_hectare: f64,
    pub harvest_date: Date,
}

impl HarvestRecord {
    /// Tons produced: harvested area times yield.
    pub fn production(&self) -> f64 {
        self.harvested_area * self.yield_per_hectare
    }
}

/// A planting record before it has been assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantingDraft {
    pub commune_id: String,
    pub village_id: String,
    pub season: Season,
    pub crop_name: String,
    pub crop_type: CropType,
    pub cultivated_area: f64,
    pub planting_date: Date,
}

impl PlantingDraft {
    pub fn into_record(self, id: String) -> PlantingRecord {
        PlantingRecord {
            id,
            commune_id: self.commune_id,
            village_id: self.village_id,
            season: self.season,
            crop_name: self.crop_name,
            crop_type: self.crop_type,
            cultivated_area: self.cultivated_area,
            planting_date: self.planting_date,
        }
    }
}

/// A harvest record before it has been assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestDraft {
    pub commune_id: String,
    pub village_id: String,
    pub season: Season,
    pub crop_name: String,
    pub crop_type: CropType,
    pub flowering_area: f64,
    pub ripe_area: f64,
    pub harvested_area: f64,
    pub yield_per_hectare: f64,
    pub harvest_date: Date,
}

impl HarvestDraft {
    pub fn into_record(self, id: String) -> HarvestRecord {
        HarvestRecord {
            id,
            commune_id: self.commune_id,
            village_id: self.village_id,
            season: self.season,
            crop_name: self.crop_name,
            crop_type: self.crop_type,
            flowering_area: self.flowering_area,
            ripe_area: self.ripe_area,
            harvested_area: self.harvested_area,
            yield_per_hectare: self.yield_per_hectare,
            harvest_date: self.harvest_date,
        }
    }
}
