//! Purpose: Request/response surface of the dashboard over a loaded export table.
//! Exports: `Dashboard`, `Options`, `ChartRequest`, `LookupRequest`, `LookupAnswer`.
//! Role: Shared by the HTTP server and the CLI; one call per user interaction.
//! Invariants: The table is never mutated after construction.
//! Invariants: Zero matching rows is an answer (placeholder), never an error.

use serde::{Deserialize, Serialize};

use crate::api::figure::{Figure, NO_DATA_TEXT, line_chart};
use crate::core::error::Error;
use crate::core::format::format_currency;
use crate::core::load::{RegionSource, load_sources};
use crate::core::query::{LookupKey, Selection, aggregate_by_year, filter, lookup_volume};
use crate::core::record::ExportTable;

#[derive(Clone, Debug)]
pub struct Dashboard {
    table: ExportTable,
}

/// Values for every selection control plus the initial selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Options {
    pub regions: Vec<String>,
    pub sectors: Vec<String>,
    pub years: Vec<String>,
    pub default_regions: Vec<String>,
    pub default_sectors: Vec<String>,
    pub default_region: Option<String>,
    pub default_year: Option<String>,
    pub default_sector: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ChartRequest {
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct LookupRequest {
    pub region: Option<String>,
    pub year: Option<String>,
    pub sector: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LookupAnswer {
    pub found: bool,
    pub volume: Option<f64>,
    pub text: String,
}

impl Dashboard {
    pub fn new(table: ExportTable) -> Self {
        Self { table }
    }

    /// Load every source and build the dashboard; any failure is fatal to startup.
    pub fn load(sources: &[RegionSource]) -> Result<Self, Error> {
        load_sources(sources).map(Self::new)
    }

    pub fn table(&self) -> &ExportTable {
        &self.table
    }

    pub fn options(&self) -> Options {
        let first = |values: &[String]| values.first().cloned();
        Options {
            regions: self.table.regions().to_vec(),
            sectors: self.table.sectors().to_vec(),
            years: self.table.years().to_vec(),
            default_regions: first(self.table.regions()).into_iter().collect(),
            default_sectors: first(self.table.sectors()).into_iter().collect(),
            default_region: first(self.table.regions()),
            default_year: first(self.table.years()),
            default_sector: first(self.table.sectors()),
        }
    }

    pub fn chart(&self, request: &ChartRequest) -> Figure {
        let selection = Selection {
            regions: request.regions.clone(),
            sectors: request.sectors.clone(),
        };
        let totals = aggregate_by_year(filter(&self.table, &selection));
        line_chart(&totals)
    }

    pub fn lookup(&self, request: &LookupRequest) -> LookupAnswer {
        let (Some(region), Some(year), Some(sector)) = (
            request.region.as_deref(),
            request.year.as_deref(),
            request.sector.as_deref(),
        ) else {
            return no_data();
        };
        let key = LookupKey {
            region,
            year,
            sector,
        };
        match lookup_volume(&self.table, key) {
            Some(volume) => LookupAnswer {
                found: true,
                volume: Some(volume),
                text: format!(
                    "El volumen de exportaciones de {sector} en {region} en {year} fue de {}.",
                    format_currency(volume)
                ),
            },
            None => no_data(),
        }
    }
}

fn no_data() -> LookupAnswer {
    LookupAnswer {
        found: false,
        volume: None,
        text: NO_DATA_TEXT.to_string(),
    }
}
