//! Purpose: Selection filtering and per-year aggregation over the export table.
//! Exports: `Selection`, `LookupKey`, `YearTotal`, `filter`, `aggregate_by_year`, `lookup_volume`.
//! Role: Pure functions behind every chart and lookup request.
//! Invariants: Filtering never yields a row outside the selected region/sector sets.
//! Invariants: Totals are summed in table order and returned sorted by year.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::record::{ExportRecord, ExportTable};

/// Multi-select state of the chart view. Empty sets match nothing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Selection {
    pub regions: Vec<String>,
    pub sectors: Vec<String>,
}

impl Selection {
    pub fn matches(&self, record: &ExportRecord) -> bool {
        self.regions.iter().any(|region| *region == record.region)
            && self.sectors.iter().any(|sector| *sector == record.sector)
    }
}

/// Fully specified (region, year, sector) triple of the lookup view.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LookupKey<'a> {
    pub region: &'a str,
    pub year: &'a str,
    pub sector: &'a str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YearTotal {
    pub year: String,
    pub volume: f64,
}

pub fn filter<'a>(
    table: &'a ExportTable,
    selection: &'a Selection,
) -> impl Iterator<Item = &'a ExportRecord> + 'a {
    table
        .records()
        .iter()
        .filter(move |record| selection.matches(record))
}

pub fn aggregate_by_year<'a, I>(records: I) -> Vec<YearTotal>
where
    I: IntoIterator<Item = &'a ExportRecord>,
{
    let mut totals: BTreeMap<&'a str, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.year.as_str()).or_insert(0.0) += record.volume;
    }
    totals
        .into_iter()
        .map(|(year, volume)| YearTotal {
            year: year.to_string(),
            volume,
        })
        .collect()
}

/// Volume of the first record matching `key`, if any.
pub fn lookup_volume(table: &ExportTable, key: LookupKey<'_>) -> Option<f64> {
    table
        .records()
        .iter()
        .find(|record| {
            record.region == key.region && record.year == key.year && record.sector == key.sector
        })
        .map(|record| record.volume)
}
