//! Commune and village management.
//!
//! Deleting a commune also deletes its villages. Records that reference a
//! deleted location are kept; reports show them under an unknown location.

use crate::model::{Commune, Village, new_id};

use super::{DataError, DataStore, Result};

impl DataStore {
    /// Adds a commune. The name is trimmed and must not be empty.
    pub fn add_commune(&mut self, name: &str) -> Result<Commune> {
        let commune = Commune {
            id: new_id(),
            name: validate_name(name)?,
        };
        let added = commune.clone();
        self.update_communes(|prev| {
            let mut next = prev.to_vec();
            next.push(added);
            next
        });
        Ok(commune)
    }

    pub fn rename_commune(&mut self, id: &str, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        self.require_commune(id)?;
        self.update_communes(|prev| {
            prev.iter()
                .map(|c| {
                    if c.id == id {
                        Commune {
                            id: c.id.clone(),
                            name: name.clone(),
                        }
                    } else {
                        c.clone()
                    }
                })
                .collect()
        });
        Ok(())
    }

    /// Removes a commune and every village in it. Returns the number of
    /// villages removed along with it.
    pub fn remove_commune(&mut self, id: &str) -> Result<usize> {
        self.require_commune(id)?;
        let communes = self
            .communes()
            .iter()
            .filter(|c| c.id != id)
            .cloned()
            .collect();
        let villages: Vec<Village> = self
            .villages()
            .iter()
            .filter(|v| v.commune_id != id)
            .cloned()
            .collect();
        let orphans = self.villages().len() - villages.len();
        self.set_communes(communes);
        self.set_villages(villages);
        Ok(orphans)
    }

    /// Adds a village to an existing commune.
    pub fn add_village(&mut self, name: &str, commune_id: &str) -> Result<Village> {
        let name = validate_name(name)?;
        self.require_commune(commune_id)?;
        let village = Village {
            id: new_id(),
            name,
            commune_id: commune_id.to_string(),
        };
        let added = village.clone();
        self.update_villages(|prev| {
            let mut next = prev.to_vec();
            next.push(added);
            next
        });
        Ok(village)
    }

    /// Renames a village and/or moves it to another commune.
    pub fn edit_village(&mut self, id: &str, name: &str, commune_id: &str) -> Result<()> {
        let name = validate_name(name)?;
        self.require_commune(commune_id)?;
        if !self.villages().iter().any(|v| v.id == id) {
            return Err(DataError::UnknownVillage(id.to_string()));
        }
        self.update_villages(|prev| {
            prev.iter()
                .map(|v| {
                    if v.id == id {
                        Village {
                            id: v.id.clone(),
                            name: name.clone(),
                            commune_id: commune_id.to_string(),
                        }
                    } else {
                        v.clone()
                    }
                })
                .collect()
        });
        Ok(())
    }

    pub fn remove_village(&mut self, id: &str) -> Result<()> {
        if !self.villages().iter().any(|v| v.id == id) {
            return Err(DataError::UnknownVillage(id.to_string()));
        }
        self.update_villages(|prev| prev.iter().filter(|v| v.id != id).cloned().collect());
        Ok(())
    }

    /// Finds a commune by exact name.
    pub fn commune_named(&self, name: &str) -> Option<&Commune> {
        self.communes().iter().find(|c| c.name == name)
    }

    /// Finds a village by exact name within a commune.
    pub fn village_named(&self, commune_id: &str, name: &str) -> Option<&Village> {
        self.villages()
            .iter()
            .find(|v| v.commune_id == commune_id && v.name == name)
    }

    /// Checks that `village_id` exists and sits in `commune_id`.
    pub(super) fn require_location(&self, commune_id: &str, village_id: &str) -> Result<()> {
        self.require_commune(commune_id)?;
        let village = self
            .villages()
            .iter()
            .find(|v| v.id == village_id)
            .ok_or_else(|| DataError::UnknownVillage(village_id.to_string()))?;
        if village.commune_id != commune_id {
            return Err(DataError::VillageOutsideCommune {
                village: village_id.to_string(),
                commune: commune_id.to_string(),
            });
        }
        Ok(())
    }

    fn require_commune(&self, id: &str) -> Result<()> {
        if self.communes().iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(DataError::UnknownCommune(id.to_string()))
        }
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DataError::EmptyName);
    }
    Ok(name.to_string())
}
