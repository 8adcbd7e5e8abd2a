//! Formatting helpers for CLI output.

use crate::model::{AppData, HarvestRecord, PlantingRecord};
use crate::report::UNKNOWN_LOCATION;

/// The name, or the placeholder for a deleted location.
pub(super) fn location_name(name: Option<&str>) -> &str {
    name.unwrap_or(UNKNOWN_LOCATION)
}

/// Hectares with two decimals.
pub(super) fn hectares(area: f64) -> String {
    format!("{area:.2} ha")
}

/// Tons with two decimals.
pub(super) fn tons(amount: f64) -> String {
    format!("{amount:.2} t")
}

fn place(data: &AppData, commune_id: &str, village_id: &str) -> String {
    let commune = data
        .communes
        .iter()
        .find(|c| c.id == commune_id)
        .map(|c| c.name.as_str());
    let village = data
        .villages
        .iter()
        .find(|v| v.id == village_id)
        .map(|v| v.name.as_str());
    format!("{} / {}", location_name(commune), location_name(village))
}

pub(super) fn format_planting(data: &AppData, r: &PlantingRecord) -> String {
    format!(
        "{}  {}  {}  {} ({}, {})  {}",
        r.id,
        r.planting_date,
        place(data, &r.commune_id, &r.village_id),
        r.crop_name,
        r.crop_type,
        r.season,
        hectares(r.cultivated_area),
    )
}

pub(super) fn format_harvest(data: &AppData, r: &HarvestRecord) -> String {
    format!(
        "{}  {}  {}  {} ({}, {})  flowering {}  ripe {}  harvested {}  {} t/ha  {}",
        r.id,
        r.harvest_date,
        place(data, &r.commune_id, &r.village_id),
        r.crop_name,
        r.crop_type,
        r.season,
        hectares(r.flowering_area),
        hectares(r.ripe_area),
        hectares(r.harvested_area),
        r.yield_per_hectare,
        tons(r.production()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{Commune, CropType, Season, Village};
    use jiff::civil::date;

    #[test]
    fn missing_location_uses_placeholder() {
        assert_eq!(location_name(None), UNKNOWN_LOCATION);
        assert_eq!(location_name(Some("Chrey")), "Chrey");
    }

    #[test]
    fn planting_line_names_locations() {
        let data = AppData {
            communes: vec![Commune {
                id: "c1".into(),
                name: "Prey Veng".into(),
            }],
            villages: vec![Village {
                id: "v1".into(),
                name: "Chrey".into(),
                commune_id: "c1".into(),
            }],
            ..AppData::default()
        };
        let record = PlantingRecord {
            id: "p1".into(),
            commune_id: "c1".into(),
            village_id: "gone".into(),
            season: Season::Wet,
            crop_name: "Jasmine".into(),
            crop_type: CropType::Rice,
            cultivated_area: 2.5,
            planting_date: date(2024, 6, 1),
        };
        let line = format_planting(&data, &record);
        assert!(line.contains("2024-06-01"));
        assert!(line.contains(&format!("Prey Veng / {UNKNOWN_LOCATION}")));
        assert!(line.ends_with("2.50 ha"));
    }
}
