//! Aggregated reports over the recorded data.
//!
//! All reports filter records the same way ([`RecordFilter`]) and name
//! locations by their current names; a record whose commune or village no
//! longer exists is counted under [`UNKNOWN_LOCATION`].

use std::collections::BTreeMap;
use std::str::FromStr;

use jiff::civil::Date;
use serde::Serialize;

use crate::model::{AppData, CropType, HarvestRecord, PlantingRecord, Season};

/// Label for records whose location was deleted.
pub const UNKNOWN_LOCATION: &str = "មិនស្គាល់";

/// Optional criteria a record must match. `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub season: Option<Season>,
    pub commune_id: Option<String>,
    pub village_id: Option<String>,
    pub crop_type: Option<CropType>,
    pub crop_name: Option<String>,
}

impl RecordFilter {
    fn matches(
        &self,
        season: Season,
        commune_id: &str,
        village_id: &str,
        crop_type: CropType,
        crop_name: &str,
    ) -> bool {
        self.season.is_none_or(|s| s == season)
            && self.commune_id.as_deref().is_none_or(|c| c == commune_id)
            && self.village_id.as_deref().is_none_or(|v| v == village_id)
            && self.crop_type.is_none_or(|t| t == crop_type)
            && self.crop_name.as_deref().is_none_or(|n| n == crop_name)
    }

    fn matches_planting(&self, r: &PlantingRecord) -> bool {
        self.matches(r.season, &r.commune_id, &r.village_id, r.crop_type, &r.crop_name)
    }

    fn matches_harvest(&self, r: &HarvestRecord) -> bool {
        self.matches(r.season, &r.commune_id, &r.village_id, r.crop_type, &r.crop_name)
    }
}

/// Cultivated area for one year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnualPlanting {
    pub year: i16,
    pub total_area: f64,
    pub by_commune: BTreeMap<String, f64>,
    pub by_village: BTreeMap<String, f64>,
    pub by_crop_type: BTreeMap<CropType, f64>,
    /// January first.
    pub by_month: [f64; 12],
}

/// Harvest progress and production for one year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnualHarvest {
    pub year: i16,
    pub flowering_area: f64,
    pub ripe_area: f64,
    pub harvested_area: f64,
    /// Tons.
    pub production: f64,
    pub harvested_by_commune: BTreeMap<String, f64>,
    pub harvested_by_village: BTreeMap<String, f64>,
    /// Tons, January first.
    pub production_by_month: [f64; 12],
}

/// An inclusive date range with a display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub start: Date,
    pub end: Date,
}

impl Period {
    /// `"2024"` for a range within one year, `"2023-2024"` otherwise.
    pub fn label(&self) -> String {
        if self.start.year() == self.end.year() {
            self.start.year().to_string()
        } else {
            format!("{}-{}", self.start.year(), self.end.year())
        }
    }

    fn contains(&self, day: Date) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Parses `START..END`, both ISO dates, with `START <= END`.
impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once("..")
            .ok_or_else(|| format!("expected START..END, got '{s}'"))?;
        let start: Date = start
            .trim()
            .parse()
            .map_err(|e| format!("invalid start date '{start}': {e}"))?;
        let end: Date = end
            .trim()
            .parse()
            .map_err(|e| format!("invalid end date '{end}': {e}"))?;
        if start > end {
            return Err(format!("range starts after it ends: {s}"));
        }
        Ok(Self { start, end })
    }
}

/// Planted and harvested totals for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub label: String,
    pub planted_area: f64,
    pub flowering_area: f64,
    pub ripe_area: f64,
    pub harvested_area: f64,
    /// Tons.
    pub production: f64,
}

/// The five calendar years ending with `end_year`, oldest first.
///
/// `None` when any of those years is outside the supported date range.
pub fn five_year_periods(end_year: i16) -> Option<Vec<Period>> {
    let start_year = end_year.checked_sub(4)?;
    (start_year..=end_year)
        .map(|year| {
            Some(Period {
                start: Date::new(year, 1, 1).ok()?,
                end: Date::new(year, 12, 31).ok()?,
            })
        })
        .collect()
}

pub fn annual_planting(data: &AppData, year: i16, filter: &RecordFilter) -> AnnualPlanting {
    let names = Names::new(data);
    let mut report = AnnualPlanting {
        year,
        ..AnnualPlanting::default()
    };
    for r in data
        .planting_data
        .iter()
        .filter(|r| r.planting_date.year() == year && filter.matches_planting(r))
    {
        report.total_area += r.cultivated_area;
        *report
            .by_commune
            .entry(names.commune(&r.commune_id))
            .or_default() += r.cultivated_area;
        *report
            .by_village
            .entry(names.village(&r.village_id))
            .or_default() += r.cultivated_area;
        *report.by_crop_type.entry(r.crop_type).or_default() += r.cultivated_area;
        report.by_month[month_index(r.planting_date)] += r.cultivated_area;
    }
    report
}

pub fn annual_harvest(data: &AppData, year: i16, filter: &RecordFilter) -> AnnualHarvest {
    let names = Names::new(data);
    let mut report = AnnualHarvest {
        year,
        ..AnnualHarvest::default()
    };
    for r in data
        .harvest_data
        .iter()
        .filter(|r| r.harvest_date.year() == year && filter.matches_harvest(r))
    {
        report.flowering_area += r.flowering_area;
        report.ripe_area += r.ripe_area;
        report.harvested_area += r.harvested_area;
        report.production += r.production();
        *report
            .harvested_by_commune
            .entry(names.commune(&r.commune_id))
            .or_default() += r.harvested_area;
        *report
            .harvested_by_village
            .entry(names.village(&r.village_id))
            .or_default() += r.harvested_area;
        report.production_by_month[month_index(r.harvest_date)] += r.production();
    }
    report
}

/// Planted area, harvested area, and production for each period.
pub fn period_summaries(
    data: &AppData,
    periods: &[Period],
    filter: &RecordFilter,
) -> Vec<PeriodSummary> {
    periods
        .iter()
        .map(|period| {
            let planted_area = data
                .planting_data
                .iter()
                .filter(|r| period.contains(r.planting_date) && filter.matches_planting(r))
                .map(|r| r.cultivated_area)
                .sum();
            let mut summary = PeriodSummary {
                label: period.label(),
                planted_area,
                flowering_area: 0.0,
                ripe_area: 0.0,
                harvested_area: 0.0,
                production: 0.0,
            };
            for r in data
                .harvest_data
                .iter()
                .filter(|r| period.contains(r.harvest_date) && filter.matches_harvest(r))
            {
                summary.flowering_area += r.flowering_area;
                summary.ripe_area += r.ripe_area;
                summary.harvested_area += r.harvested_area;
                summary.production += r.production();
            }
            summary
        })
        .collect()
}

fn month_index(day: Date) -> usize {
    usize::try_from(day.month() - 1).unwrap_or_default()
}

/// Id to name lookup for locations.
struct Names<'a> {
    data: &'a AppData,
}

impl<'a> Names<'a> {
    fn new(data: &'a AppData) -> Self {
        Self { data }
    }

    fn commune(&self, id: &str) -> String {
        self.data
            .communes
            .iter()
            .find(|c| c.id == id)
            .map_or(UNKNOWN_LOCATION, |c| c.name.as_str())
            .to_string()
    }

    fn village(&self, id: &str) -> String {
        self.data
            .villages
            .iter()
            .find(|v| v.id == id)
            .map_or(UNKNOWN_LOCATION, |v| v.name.as_str())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    use crate::model::{Commune, Village};

    fn planting(id: &str, village_id: &str, area: f64, day: Date) -> PlantingRecord {
        PlantingRecord {
            id: id.into(),
            commune_id: "c1".into(),
            village_id: village_id.into(),
            season: Season::Wet,
            crop_name: "Jasmine".into(),
            crop_type: CropType::Rice,
            cultivated_area: area,
            planting_date: day,
        }
    }

    fn harvest(id: &str, harvested: f64, yield_per_hectare: f64, day: Date) -> HarvestRecord {
        HarvestRecord {
            id: id.into(),
            commune_id: "c1".into(),
            village_id: "v1".into(),
            season: Season::Wet,
            crop_name: "Jasmine".into(),
            crop_type: CropType::Rice,
            flowering_area: harvested + 1.0,
            ripe_area: harvested,
            harvested_area: harvested,
            yield_per_hectare,
            harvest_date: day,
        }
    }

    fn sample_data() -> AppData {
        AppData {
            communes: vec![Commune {
                id: "c1".into(),
                name: "Prey Veng".into(),
            }],
            villages: vec![Village {
                id: "v1".into(),
                name: "Chrey".into(),
                commune_id: "c1".into(),
            }],
            planting_data: vec![
                planting("p1", "v1", 2.0, date(2024, 1, 15)),
                planting("p2", "v1", 3.0, date(2024, 7, 1)),
                planting("p3", "gone", 1.0, date(2024, 7, 9)),
                planting("p4", "v1", 8.0, date(2023, 7, 1)),
            ],
            harvest_data: vec![
                harvest("h1", 2.0, 3.0, date(2024, 11, 2)),
                harvest("h2", 1.0, 4.0, date(2024, 12, 31)),
                harvest("h3", 5.0, 2.0, date(2022, 11, 2)),
            ],
        }
    }

    #[test]
    fn annual_planting_totals_by_location_and_month() {
        let report = annual_planting(&sample_data(), 2024, &RecordFilter::default());

        assert_eq!(report.total_area, 6.0);
        assert_eq!(report.by_commune["Prey Veng"], 6.0);
        assert_eq!(report.by_village["Chrey"], 5.0);
        assert_eq!(report.by_village[UNKNOWN_LOCATION], 1.0);
        assert_eq!(report.by_crop_type[&CropType::Rice], 6.0);
        assert_eq!(report.by_month[0], 2.0);
        assert_eq!(report.by_month[6], 4.0);
    }

    #[test]
    fn filter_narrows_records() {
        let filter = RecordFilter {
            village_id: Some("v1".into()),
            ..RecordFilter::default()
        };
        let report = annual_planting(&sample_data(), 2024, &filter);
        assert_eq!(report.total_area, 5.0);

        let filter = RecordFilter {
            season: Some(Season::Dry),
            ..RecordFilter::default()
        };
        let report = annual_planting(&sample_data(), 2024, &filter);
        assert_eq!(report.total_area, 0.0);
    }

    #[test]
    fn annual_harvest_production_is_area_times_yield() {
        let report = annual_harvest(&sample_data(), 2024, &RecordFilter::default());

        assert_eq!(report.harvested_area, 3.0);
        assert_eq!(report.flowering_area, 5.0);
        assert_eq!(report.production, 10.0);
        assert_eq!(report.production_by_month[10], 6.0);
        assert_eq!(report.production_by_month[11], 4.0);
        assert_eq!(report.harvested_by_commune["Prey Veng"], 3.0);
    }

    #[test]
    fn five_year_periods_end_with_given_year() {
        let periods = five_year_periods(2024).unwrap();

        assert_eq!(periods.len(), 5);
        assert_eq!(periods[0].label(), "2020");
        assert_eq!(periods[4].start, date(2024, 1, 1));
        assert_eq!(periods[4].end, date(2024, 12, 31));
    }

    #[test]
    fn period_summaries_include_range_ends() {
        let summaries = period_summaries(
            &sample_data(),
            &five_year_periods(2024).unwrap(),
            &RecordFilter::default(),
        );

        let last = &summaries[4];
        assert_eq!(last.label, "2024");
        assert_eq!(last.planted_area, 6.0);
        assert_eq!(last.flowering_area, 5.0);
        assert_eq!(last.ripe_area, 3.0);
        assert_eq!(last.harvested_area, 3.0);
        assert_eq!(last.production, 10.0);
        assert_eq!(summaries[3].planted_area, 8.0);
        assert_eq!(summaries[2].production, 10.0);
    }

    #[test]
    fn multi_year_period_label() {
        let period = Period {
            start: date(2023, 7, 1),
            end: date(2024, 6, 30),
        };

        assert_eq!(period.label(), "2023-2024");
    }

    #[test]
    fn five_year_periods_outside_date_range() {
        assert_eq!(five_year_periods(10000), None);
        assert_eq!(five_year_periods(-9996), None);
        assert_eq!(five_year_periods(i16::MIN), None);
        assert_eq!(five_year_periods(9999).unwrap()[4].label(), "9999");
        assert_eq!(five_year_periods(-9995).unwrap()[0].label(), "-9999");
    }

    #[test]
    fn custom_periods_span_years() {
        let periods: Vec<Period> = ["2023-07-01..2024-06-30", "2024-07-01..2024-12-31"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();

        let summaries = period_summaries(&sample_data(), &periods, &RecordFilter::default());

        assert_eq!(summaries[0].label, "2023-2024");
        assert_eq!(summaries[0].planted_area, 10.0);
        assert_eq!(summaries[0].harvested_area, 0.0);
        assert_eq!(summaries[1].label, "2024");
        assert_eq!(summaries[1].planted_area, 4.0);
        assert_eq!(summaries[1].harvested_area, 3.0);
    }

    #[test]
    fn malformed_period_is_rejected() {
        assert!("2024-01-01".parse::<Period>().is_err());
        assert!("2024-12-31..2024-01-01".parse::<Period>().is_err());
        assert!("2024-01-01..later".parse::<Period>().is_err());
    }
}
