//! Planting and harvest record management.
//!
//! Manual entry goes through `add_*`/`edit_*`, which validate the draft
//! against the current locations. Bulk import hands over ready-made records
//! to `append_*`.

use std::collections::HashSet;

use crate::model::{HarvestDraft, HarvestRecord, PlantingDraft, PlantingRecord, new_id};

use super::{DataError, DataStore, Result};

impl DataStore {
    pub fn add_planting(&mut self, draft: PlantingDraft) -> Result<PlantingRecord> {
        self.validate_planting(&draft)?;
        let record = draft.into_record(new_id());
        self.append_plantings(vec![record.clone()]);
        Ok(record)
    }

    /// Replaces the record with `id`, keeping its id.
    pub fn edit_planting(&mut self, id: &str, draft: PlantingDraft) -> Result<()> {
        if !self.planting_records().iter().any(|r| r.id == id) {
            return Err(DataError::UnknownRecord(id.to_string()));
        }
        self.validate_planting(&draft)?;
        let replacement = draft.into_record(id.to_string());
        self.update_planting_records(|prev| {
            prev.iter()
                .map(|r| if r.id == id { replacement.clone() } else { r.clone() })
                .collect()
        });
        Ok(())
    }

    /// Removes every record whose id is in `ids`. Returns how many were removed.
    pub fn remove_plantings(&mut self, ids: &[String]) -> usize {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let kept: Vec<_> = self
            .planting_records()
            .iter()
            .filter(|r| !ids.contains(r.id.as_str()))
            .cloned()
            .collect();
        let removed = self.planting_records().len() - kept.len();
        if removed > 0 {
            self.set_planting_records(kept);
        }
        removed
    }

    pub fn append_plantings(&mut self, records: Vec<PlantingRecord>) {
        self.update_planting_records(|prev| [prev, records.as_slice()].concat());
    }

    pub fn add_harvest(&mut self, draft: HarvestDraft) -> Result<HarvestRecord> {
        self.validate_harvest(&draft)?;
        let record = draft.into_record(new_id());
        self.append_harvests(vec![record.clone()]);
        Ok(record)
    }

    /// Replaces the record with `id`, keeping its id.
    pub fn edit_harvest(&mut self, id: &str, draft: HarvestDraft) -> Result<()> {
        if !self.harvest_records().iter().any(|r| r.id == id) {
            return Err(DataError::UnknownRecord(id.to_string()));
        }
        self.validate_harvest(&draft)?;
        let replacement = draft.into_record(id.to_string());
        self.update_harvest_records(|prev| {
            prev.iter()
                .map(|r| if r.id == id { replacement.clone() } else { r.clone() })
                .collect()
        });
        Ok(())
    }

    /// Removes every record whose id is in `ids`. Returns how many were removed.
    pub fn remove_harvests(&mut self, ids: &[String]) -> usize {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let kept: Vec<_> = self
            .harvest_records()
            .iter()
            .filter(|r| !ids.contains(r.id.as_str()))
            .cloned()
            .collect();
        let removed = self.harvest_records().len() - kept.len();
        if removed > 0 {
            self.set_harvest_records(kept);
        }
        removed
    }

    pub fn append_harvests(&mut self, records: Vec<HarvestRecord>) {
        self.update_harvest_records(|prev| [prev, records.as_slice()].concat());
    }

    fn validate_planting(&self, draft: &PlantingDraft) -> Result<()> {
        self.require_location(&draft.commune_id, &draft.village_id)?;
        require_crop_name(&draft.crop_name)?;
        require_area("cultivatedArea", draft.cultivated_area)
    }

    fn validate_harvest(&self, draft: &HarvestDraft) -> Result<()> {
        self.require_location(&draft.commune_id, &draft.village_id)?;
        require_crop_name(&draft.crop_name)?;
        require_area("floweringArea", draft.flowering_area)?;
        require_area("ripeArea", draft.ripe_area)?;
        require_area("harvestedArea", draft.harvested_area)?;
        require_area("yield", draft.yield_per_hectare)
    }
}

fn require_crop_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DataError::EmptyCropName);
    }
    Ok(())
}

fn require_area(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DataError::InvalidArea { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;

    use jiff::civil::date;

    use crate::data::tests::{open_data, sample_planting};
    use crate::model::{CropType, Season};
    use crate::storage::MemoryOrigin;

    /// A store with one commune holding one village.
    fn test_data() -> (DataStore, String, String) {
        let mut data = open_data(MemoryOrigin::new().context());
        let commune = data.add_commune("C1").unwrap();
        let village = data.add_village("V1", &commune.id).unwrap();
        (data, commune.id, village.id)
    }

    fn planting_draft(commune_id: &str, village_id: &str) -> PlantingDraft {
        PlantingDraft {
            commune_id: commune_id.into(),
            village_id: village_id.into(),
            season: Season::Wet,
            crop_name: "Jasmine".into(),
            crop_type: CropType::Rice,
            cultivated_area: 3.5,
            planting_date: date(2024, 6, 15),
        }
    }

    fn harvest_draft(commune_id: &str, village_id: &str) -> HarvestDraft {
        HarvestDraft {
            commune_id: commune_id.into(),
            village_id: village_id.into(),
            season: Season::Wet,
            crop_name: "Jasmine".into(),
            crop_type: CropType::Rice,
            flowering_area: 3.0,
            ripe_area: 2.0,
            harvested_area: 1.5,
            yield_per_hectare: 4.0,
            harvest_date: date(2024, 11, 20),
        }
    }

    #[test]
    fn add_planting_assigns_id() {
        let (mut data, commune_id, village_id) = test_data();

        let record = data.add_planting(planting_draft(&commune_id, &village_id)).unwrap();

        assert!(!record.id.is_empty());
        assert_eq!(data.planting_records(), &[record]);
    }

    #[test]
    fn planting_in_foreign_village_is_rejected() {
        let (mut data, _, village_id) = test_data();
        let other = data.add_commune("C2").unwrap();

        let err = data
            .add_planting(planting_draft(&other.id, &village_id))
            .unwrap_err();

        assert!(matches!(err, DataError::VillageOutsideCommune { .. }));
        assert!(data.planting_records().is_empty());
    }

    #[test]
    fn negative_area_is_rejected() {
        let (mut data, commune_id, village_id) = test_data();
        let mut draft = harvest_draft(&commune_id, &village_id);
        draft.ripe_area = -1.0;

        let err = data.add_harvest(draft).unwrap_err();

        assert_eq!(
            err,
            DataError::InvalidArea {
                field: "ripeArea",
                value: -1.0
            }
        );
    }

    #[test]
    fn blank_crop_name_is_rejected() {
        let (mut data, commune_id, village_id) = test_data();
        let mut draft = planting_draft(&commune_id, &village_id);
        draft.crop_name = " ".into();

        assert_eq!(data.add_planting(draft).unwrap_err(), DataError::EmptyCropName);
    }

    #[test]
    fn edit_harvest_keeps_id() {
        let (mut data, commune_id, village_id) = test_data();
        let record = data.add_harvest(harvest_draft(&commune_id, &village_id)).unwrap();
        let mut draft = harvest_draft(&commune_id, &village_id);
        draft.yield_per_hectare = 5.5;

        data.edit_harvest(&record.id, draft).unwrap();

        assert_eq!(data.harvest_records()[0].id, record.id);
        assert_eq!(data.harvest_records()[0].yield_per_hectare, 5.5);
    }

    #[test]
    fn edit_unknown_record_fails() {
        let (mut data, commune_id, village_id) = test_data();
        let err = data
            .edit_planting("missing", planting_draft(&commune_id, &village_id))
            .unwrap_err();

        assert!(matches!(err, DataError::UnknownRecord(_)));
    }

    #[test]
    fn batch_delete_removes_only_selected() {
        let (mut data, _, _) = test_data();
        data.append_plantings(vec![
            sample_planting("p1"),
            sample_planting("p2"),
            sample_planting("p3"),
        ]);

        let removed = data.remove_plantings(&["p1".to_string(), "p3".to_string(), "nope".to_string()]);

        assert_eq!(removed, 2);
        let ids: Vec<&str> = data.planting_records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["p2"]);
    }

    #[test]
    fn removing_unknown_ids_changes_nothing() {
        let (mut data, _, _) = test_data();
        data.append_plantings(vec![sample_planting("p1")]);
        let changes = Rc::new(Cell::new(0));
        let seen = Rc::clone(&changes);
        data.on_change(move |_| seen.set(seen.get() + 1));

        assert_eq!(data.remove_plantings(&["nope".to_string()]), 0);
        assert_eq!(data.remove_harvests(&["p1".to_string()]), 0);

        assert_eq!(changes.get(), 0);
        assert_eq!(data.planting_records().len(), 1);
    }

    #[test]
    fn append_keeps_existing_records() {
        let (mut data, commune_id, village_id) = test_data();
        data.add_harvest(harvest_draft(&commune_id, &village_id)).unwrap();
        let imported = harvest_draft(&commune_id, &village_id).into_record("imported".into());

        data.append_harvests(vec![imported]);

        assert_eq!(data.harvest_records().len(), 2);
        assert_eq!(data.harvest_records()[1].id, "imported");
        assert_eq!(data.remove_harvests(&["imported".to_string()]), 1);
    }
}
