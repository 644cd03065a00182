//! Purpose: Long-form export table model shared by loading, querying, and serving.
//! Exports: `ExportRecord`, `ExportTable`.
//! Role: The single in-memory dataset; built once at startup, read-only afterwards.
//! Invariants: Records keep load order (region order, then year-major within a region).
//! Invariants: Distinct region/sector/year lists keep first-seen order.

use serde::Serialize;

/// One (region, sector, year) observation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportRecord {
    pub sector: String,
    pub year: String,
    pub volume: f64,
    pub region: String,
}

#[derive(Clone, Debug, Default)]
pub struct ExportTable {
    records: Vec<ExportRecord>,
    regions: Vec<String>,
    sectors: Vec<String>,
    years: Vec<String>,
}

impl ExportTable {
    pub fn from_records(records: Vec<ExportRecord>) -> Self {
        let mut regions = Vec::new();
        let mut sectors = Vec::new();
        let mut years = Vec::new();
        for record in &records {
            push_distinct(&mut regions, &record.region);
            push_distinct(&mut sectors, &record.sector);
            push_distinct(&mut years, &record.year);
        }
        Self {
            records,
            regions,
            sectors,
            years,
        }
    }

    pub fn records(&self) -> &[ExportRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn sectors(&self) -> &[String] {
        &self.sectors
    }

    pub fn years(&self) -> &[String] {
        &self.years
    }
}

// Linear scan: the distinct lists hold a handful of provinces and a few dozen sectors.
fn push_distinct(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|existing| existing == value) {
        values.push(value.to_string());
    }
}
