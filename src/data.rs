//! The application data aggregate.
//!
//! All four collections live in one [`AppData`] value persisted under
//! [`APP_DATA_KEY`]. Each collection has its own accessor pair: `set_*`
//! replaces the collection, `update_*` transforms the latest one. Both go
//! through the store's update path and leave the other three collections
//! untouched.
//!
//! `DataStore` is the context object handed to every command. Location and
//! record operations are implemented in submodules.

mod locations;
mod migration;
mod records;

use std::rc::Rc;

use jiff::SignedDuration;

use crate::clock::Clock;
use crate::model::{AppData, Commune, HarvestRecord, PlantingRecord, Village};
use crate::persisted::PersistedStore;
use crate::storage::StorageMedium;

/// Key of the unified aggregate.
pub const APP_DATA_KEY: &str = "appData";

/// Errors returned by location and record operations.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("crop name must not be empty")]
    EmptyCropName,

    #[error("commune not found: {0}")]
    UnknownCommune(String),

    #[error("village not found: {0}")]
    UnknownVillage(String),

    #[error("village {village} does not belong to commune {commune}")]
    VillageOutsideCommune { village: String, commune: String },

    #[error("record not found: {0}")]
    UnknownRecord(String),

    #[error("{field} must be a non-negative number, got {value}")]
    InvalidArea { field: &'static str, value: f64 },
}

pub type Result<T> = core::result::Result<T, DataError>;

/// The persisted aggregate and the operations over it.
pub struct DataStore {
    store: PersistedStore<AppData>,
}

impl DataStore {
    /// Opens the aggregate and runs the one-time legacy migration.
    pub fn open(
        medium: Option<Rc<dyn StorageMedium>>,
        clock: Rc<dyn Clock>,
        debounce: SignedDuration,
    ) -> Self {
        let store = PersistedStore::open(APP_DATA_KEY, AppData::default(), medium, clock, debounce);
        let mut data = Self { store };
        let outcome = data.migrate_legacy();
        log::debug!("legacy migration: {outcome:?}");
        data
    }

    /// The whole aggregate.
    pub fn snapshot(&self) -> &AppData {
        self.store.get()
    }

    pub fn communes(&self) -> &[Commune] {
        &self.store.get().communes
    }

    pub fn villages(&self) -> &[Village] {
        &self.store.get().villages
    }

    pub fn planting_records(&self) -> &[PlantingRecord] {
        &self.store.get().planting_data
    }

    pub fn harvest_records(&self) -> &[HarvestRecord] {
        &self.store.get().harvest_data
    }

    pub fn set_communes(&mut self, communes: Vec<Commune>) {
        self.update_communes(move |_| communes);
    }

    pub fn update_communes(&mut self, f: impl FnOnce(&[Commune]) -> Vec<Commune>) {
        self.store.update(|prev| {
            let mut next = prev.clone();
            next.communes = f(&prev.communes);
            next
        });
    }

    pub fn set_villages(&mut self, villages: Vec<Village>) {
        self.update_villages(move |_| villages);
    }

    pub fn update_villages(&mut self, f: impl FnOnce(&[Village]) -> Vec<Village>) {
        self.store.update(|prev| {
            let mut next = prev.clone();
            next.villages = f(&prev.villages);
            next
        });
    }

    pub fn set_planting_records(&mut self, records: Vec<PlantingRecord>) {
        self.update_planting_records(move |_| records);
    }

    pub fn update_planting_records(
        &mut self,
        f: impl FnOnce(&[PlantingRecord]) -> Vec<PlantingRecord>,
    ) {
        self.store.update(|prev| {
            let mut next = prev.clone();
            next.planting_data = f(&prev.planting_data);
            next
        });
    }

    pub fn set_harvest_records(&mut self, records: Vec<HarvestRecord>) {
        self.update_harvest_records(move |_| records);
    }

    pub fn update_harvest_records(
        &mut self,
        f: impl FnOnce(&[HarvestRecord]) -> Vec<HarvestRecord>,
    ) {
        self.store.update(|prev| {
            let mut next = prev.clone();
            next.harvest_data = f(&prev.harvest_data);
            next
        });
    }

    /// Registers a listener for every change to the aggregate.
    pub fn on_change(&mut self, listener: impl FnMut(&AppData) + 'static) {
        self.store.on_change(listener);
    }

    /// Services external changes and the debounced write. See [`PersistedStore::poll`].
    pub fn poll(&mut self) -> bool {
        self.store.poll()
    }

    /// Writes any pending change now.
    pub fn flush(&mut self) {
        self.store.flush();
    }
}
