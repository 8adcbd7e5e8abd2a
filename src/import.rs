//! Bulk import of planting and harvest records from CSV.
//!
//! The first row holds column headers, either the Khmer headings of the
//! operators' spreadsheets or the English field names. Each data row is
//! decoded strictly: a row that fails to decode, names an unknown commune,
//! or names a village outside that commune is skipped and reported with its
//! spreadsheet row number. Every other row becomes a record with a fresh id.
//!
//! Dates must be ISO `YYYY-MM-DD`.

use std::io;

use jiff::civil::Date;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::model::{AppData, CropType, HarvestRecord, PlantingRecord, Season, new_id};

/// Errors that stop an import as a whole.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("no data rows")]
    Empty,
}

pub type Result<T> = core::result::Result<T, ImportError>;

/// A row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based spreadsheet row; the header is row 1.
    pub row: u64,
    pub reason: String,
}

/// The decoded records plus the rows that were left out.
#[derive(Debug)]
pub struct ImportReport<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Deserialize)]
struct PlantingRow {
    #[serde(rename = "ឃុំ", alias = "commune")]
    commune: String,
    #[serde(rename = "ភូមិ", alias = "village")]
    village: String,
    #[serde(rename = "រដូវ", alias = "season")]
    season: String,
    #[serde(rename = "ឈ្មោះដំណាំ", alias = "cropName")]
    crop_name: String,
    #[serde(rename = "ប្រភេទដំណាំ", alias = "cropType")]
    crop_type: String,
    #[serde(rename = "ផ្ទៃដីដាំដុះ (ហិចតា)", alias = "cultivatedArea")]
    cultivated_area: f64,
    #[serde(rename = "កាលបរិច្ឆេទដាំដុះ", alias = "plantingDate")]
    planting_date: Date,
}

#[derive(Debug, Deserialize)]
struct HarvestRow {
    #[serde(rename = "ឃុំ", alias = "commune")]
    commune: String,
    #[serde(rename = "ភូមិ", alias = "village")]
    village: String,
    #[serde(rename = "រដូវ", alias = "season")]
    season: String,
    #[serde(rename = "ឈ្មោះដំណាំ", alias = "cropName")]
    crop_name: String,
    #[serde(rename = "ប្រភេទដំណាំ", alias = "cropType")]
    crop_type: String,
    #[serde(rename = "ផ្ទៃដីបែកផ្កា (ហិចតា)", alias = "floweringArea")]
    flowering_area: f64,
    #[serde(rename = "ផ្ទៃដីទុំ (ហិចតា)", alias = "ripeArea")]
    ripe_area: f64,
    #[serde(rename = "ផ្ទៃដីប្រមូលផល (ហិចតា)", alias = "harvestedArea")]
    harvested_area: f64,
    #[serde(rename = "ទិន្នផល (តោន/ហិចតា)", alias = "yield")]
    yield_per_hectare: f64,
    #[serde(rename = "កាលបរិច្ឆេទប្រមូលផល", alias = "harvestDate")]
    harvest_date: Date,
}

/// Resolved ids of a row's commune and village.
struct Location {
    commune_id: String,
    village_id: String,
}

trait ImportRow: DeserializeOwned {
    type Record;

    fn place(&self) -> (&str, &str);

    fn into_record(self, location: Location) -> core::result::Result<Self::Record, String>;
}

impl ImportRow for PlantingRow {
    type Record = PlantingRecord;

    fn place(&self) -> (&str, &str) {
        (&self.commune, &self.village)
    }

    fn into_record(self, location: Location) -> core::result::Result<PlantingRecord, String> {
        Ok(PlantingRecord {
            id: new_id(),
            commune_id: location.commune_id,
            village_id: location.village_id,
            season: self.season.parse::<Season>()?,
            crop_name: crop_name(self.crop_name)?,
            crop_type: self.crop_type.parse::<CropType>()?,
            cultivated_area: non_negative("cultivatedArea", self.cultivated_area)?,
            planting_date: self.planting_date,
        })
    }
}

impl ImportRow for HarvestRow {
    type Record = HarvestRecord;

    fn place(&self) -> (&str, &str) {
        (&self.commune, &self.village)
    }

    fn into_record(self, location: Location) -> core::result::Result<HarvestRecord, String> {
        Ok(HarvestRecord {
            id: new_id(),
            commune_id: location.commune_id,
            village_id: location.village_id,
            season: self.season.parse::<Season>()?,
            crop_name: crop_name(self.crop_name)?,
            crop_type: self.crop_type.parse::<CropType>()?,
            flowering_area: non_negative("floweringArea", self.flowering_area)?,
            ripe_area: non_negative("ripeArea", self.ripe_area)?,
            harvested_area: non_negative("harvestedArea", self.harvested_area)?,
            yield_per_hectare: non_negative("yield", self.yield_per_hectare)?,
            harvest_date: self.harvest_date,
        })
    }
}

/// Decodes planting records, resolving locations against `data`.
pub fn decode_plantings(
    input: impl io::Read,
    data: &AppData,
) -> Result<ImportReport<PlantingRecord>> {
    decode::<PlantingRow>(input, data)
}

/// Decodes harvest records, resolving locations against `data`.
pub fn decode_harvests(input: impl io::Read, data: &AppData) -> Result<ImportReport<HarvestRecord>> {
    decode::<HarvestRow>(input, data)
}

fn decode<R: ImportRow>(input: impl io::Read, data: &AppData) -> Result<ImportReport<R::Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let fallback_row = index as u64 + 2;
        let (row, outcome) = match result {
            Ok(record) => (
                record.position().map_or(fallback_row, csv::Position::line),
                decode_row::<R>(&record, &headers, data),
            ),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => (
                e.position().map_or(fallback_row, csv::Position::line),
                Err(e.to_string()),
            ),
        };
        match outcome {
            Ok(record) => records.push(record),
            Err(reason) => {
                log::warn!("skipping row {row}: {reason}");
                skipped.push(SkippedRow { row, reason });
            }
        }
    }

    if records.is_empty() && skipped.is_empty() {
        return Err(ImportError::Empty);
    }
    log::info!(
        "decoded {} rows, skipped {}",
        records.len(),
        skipped.len()
    );
    Ok(ImportReport { records, skipped })
}

fn decode_row<R: ImportRow>(
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
    data: &AppData,
) -> core::result::Result<R::Record, String> {
    let decoded = record
        .deserialize::<R>(Some(headers))
        .map_err(|e| e.to_string())?;
    let location = resolve(data, decoded.place())?;
    decoded.into_record(location)
}

fn resolve(data: &AppData, (commune, village): (&str, &str)) -> core::result::Result<Location, String> {
    let commune_id = data
        .communes
        .iter()
        .find(|c| c.name == commune)
        .map(|c| c.id.clone())
        .ok_or_else(|| format!("no commune named \"{commune}\""))?;
    let village_id = data
        .villages
        .iter()
        .find(|v| v.name == village && v.commune_id == commune_id)
        .map(|v| v.id.clone())
        .ok_or_else(|| format!("no village named \"{village}\" in commune \"{commune}\""))?;
    Ok(Location {
        commune_id,
        village_id,
    })
}

fn crop_name(name: String) -> core::result::Result<String, String> {
    if name.is_empty() {
        return Err("crop name is empty".to_string());
    }
    Ok(name)
}

fn non_negative(field: &str, value: f64) -> core::result::Result<f64, String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{field} must be a non-negative number, got {value}"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    use crate::model::{Commune, Village};

    fn locations() -> AppData {
        AppData {
            communes: vec![
                Commune {
                    id: "c1".into(),
                    name: "Prey Veng".into(),
                },
                Commune {
                    id: "c2".into(),
                    name: "Takeo".into(),
                },
            ],
            villages: vec![
                Village {
                    id: "v1".into(),
                    name: "Chrey".into(),
                    commune_id: "c1".into(),
                },
                Village {
                    id: "v2".into(),
                    name: "Svay".into(),
                    commune_id: "c2".into(),
                },
            ],
            ..AppData::default()
        }
    }

    #[test]
    fn decodes_english_headers() {
        let csv = "\
commune,village,season,cropName,cropType,cultivatedArea,plantingDate
Prey Veng,Chrey,WET,Jasmine,RICE,2.5,2024-06-01
";
        let report = decode_plantings(csv.as_bytes(), &locations()).unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.commune_id, "c1");
        assert_eq!(record.village_id, "v1");
        assert_eq!(record.season, Season::Wet);
        assert_eq!(record.crop_type, CropType::Rice);
        assert_eq!(record.planting_date, date(2024, 6, 1));
    }

    #[test]
    fn decodes_khmer_headers() {
        let csv = "\
ឃុំ,ភូមិ,រដូវ,ឈ្មោះដំណាំ,ប្រភេទដំណាំ,ផ្ទៃដីបែកផ្កា (ហិចតា),ផ្ទៃដីទុំ (ហិចតា),ផ្ទៃដីប្រមូលផល (ហិចតា),ទិន្នផល (តោន/ហិចតា),កាលបរិច្ឆេទប្រមូលផល
Takeo,Svay,រដូវប្រាំង,Mango,សាកវប្បកម្ម,4,3,2,1.5,2024-03-10
";
        let report = decode_harvests(csv.as_bytes(), &locations()).unwrap();

        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.village_id, "v2");
        assert_eq!(record.season, Season::Dry);
        assert_eq!(record.crop_type, CropType::Horticulture);
        assert!((record.production() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reports_unresolvable_rows_with_row_numbers() {
        let csv = "\
commune,village,season,cropName,cropType,cultivatedArea,plantingDate
Prey Veng,Chrey,WET,Jasmine,RICE,2.5,2024-06-01
Kandal,Chrey,WET,Jasmine,RICE,1,2024-06-01
Prey Veng,Svay,WET,Jasmine,RICE,1,2024-06-01
Takeo,Svay,monsoon,Jasmine,RICE,1,2024-06-01
Takeo,Svay,DRY,Corn,INDUSTRIAL,not-a-number,2024-06-01
";
        let report = decode_plantings(csv.as_bytes(), &locations()).unwrap();

        assert_eq!(report.records.len(), 1);
        let rows: Vec<u64> = report.skipped.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![3, 4, 5, 6]);
        assert!(report.skipped[0].reason.contains("Kandal"));
        assert!(report.skipped[1].reason.contains("Svay"));
        assert!(report.skipped[2].reason.contains("season"));
    }

    #[test]
    fn negative_areas_are_skipped() {
        let csv = "\
commune,village,season,cropName,cropType,cultivatedArea,plantingDate
Prey Veng,Chrey,WET,Jasmine,RICE,-2,2024-06-01
";
        let report = decode_plantings(csv.as_bytes(), &locations()).unwrap();

        assert!(report.records.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn header_only_input_is_an_error() {
        let csv = "commune,village,season,cropName,cropType,cultivatedArea,plantingDate\n";
        let err = decode_plantings(csv.as_bytes(), &locations()).unwrap_err();

        assert!(matches!(err, ImportError::Empty));
    }

    #[test]
    fn imported_ids_are_distinct() {
        let csv = "\
commune,village,season,cropName,cropType,cultivatedArea,plantingDate
Prey Veng,Chrey,WET,Jasmine,RICE,1,2024-06-01
Prey Veng,Chrey,WET,Jasmine,RICE,1,2024-06-02
";
        let report = decode_plantings(csv.as_bytes(), &locations()).unwrap();

        assert_ne!(report.records[0].id, report.records[1].id);
    }

    #[test]
    fn ragged_row_is_skipped() {
        let csv = "\
commune,village,season,cropName,cropType,cultivatedArea,plantingDate
Prey Veng,Chrey,WET,Jasmine,RICE,2.5,2024-06-01
Prey Veng,Chrey,WET,Jasmine
Takeo,Svay,DRY,Mango,HORTICULTURE,1,2024-01-12
";
        let report = decode_plantings(csv.as_bytes(), &locations()).unwrap();

        assert_eq!(report.records.len(), 2);
        let rows: Vec<u64> = report.skipped.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![3]);
    }

    #[test]
    fn invalid_utf8_row_is_skipped() {
        let mut csv = b"commune,village,season,cropName,cropType,cultivatedArea,plantingDate\n\
Prey Veng,Chrey,WET,Jasmine,RICE,2.5,2024-06-01\n"
            .to_vec();
        csv.extend_from_slice(b"Prey Veng,Chrey,WET,\xff\xfe,RICE,1,2024-06-01\n");
        csv.extend_from_slice(b"Takeo,Svay,DRY,Corn,INDUSTRIAL,1,2024-01-10\n");

        let report = decode_plantings(csv.as_slice(), &locations()).unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].row, 3);
    }

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk gone"))
        }
    }

    #[test]
    fn read_failure_aborts_with_source_message() {
        let err = decode_plantings(FailingReader, &locations()).unwrap_err();

        assert!(matches!(err, ImportError::Csv(_)));
        assert_eq!(err.to_string(), "disk gone");
    }
}
