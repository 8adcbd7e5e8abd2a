//! `croplog watch`: follow changes made by other processes.

use std::thread;
use std::time::Duration;

use crate::data::DataStore;
use crate::model::AppData;

pub(super) fn run(data: &mut DataStore, interval: Duration) -> Result<(), String> {
    println!("{}", counts(data.snapshot()));
    data.on_change(|app| println!("{}", counts(app)));
    log::info!("watching for changes every {}ms", interval.as_millis());
    loop {
        data.poll();
        thread::sleep(interval);
    }
}

fn counts(data: &AppData) -> String {
    format!(
        "{} communes, {} villages, {} planting records, {} harvest records",
        data.communes.len(),
        data.villages.len(),
        data.planting_data.len(),
        data.harvest_data.len(),
    )
}
