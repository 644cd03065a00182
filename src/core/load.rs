//! Purpose: Read per-region wide CSV tables and melt them into long rows.
//! Exports: `RegionSource`, `WideTable`, `LongRow`, `DEFAULT_REGION_FILES`,
//! `default_sources`, `read_wide`, `melt`, `load_sources`.
//! Role: First startup stage; everything here runs once before the server binds.
//! Invariants: Every failure (missing file, missing `Sector`, ragged row, bad number) is fatal.
//! Invariants: Melted rows are year-major per region and regions keep source order.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use tracing::{debug, info, warn};

use crate::core::error::{Error, ErrorKind};
use crate::core::normalize::normalize_rows;
use crate::core::record::ExportTable;

/// Header of the identifier column; every other column is a year.
pub const SECTOR_COLUMN: &str = "Sector";

/// Province files loaded when no explicit file list is given.
pub const DEFAULT_REGION_FILES: [&str; 8] = [
    "almeria.csv",
    "cadiz.csv",
    "cordoba.csv",
    "granada.csv",
    "huelva.csv",
    "jaen.csv",
    "malaga.csv",
    "sevilla.csv",
];

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegionSource {
    pub region: String,
    pub path: PathBuf,
}

impl RegionSource {
    /// Derive the region name from the file stem: `data/sevilla.csv` -> `Sevilla`.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| {
                Error::new(ErrorKind::Usage)
                    .with_message("region file has no usable name")
                    .with_path(&path)
                    .with_hint("Name region files after the province, e.g. sevilla.csv.")
            })?;
        Ok(Self {
            region: capitalize(stem),
            path,
        })
    }
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn default_sources(data_dir: &Path) -> Result<Vec<RegionSource>, Error> {
    DEFAULT_REGION_FILES
        .iter()
        .map(|name| RegionSource::from_path(data_dir.join(name)))
        .collect()
}

/// One source table as read from disk, before melting.
#[derive(Clone, Debug, PartialEq)]
pub struct WideTable {
    pub years: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WideRow {
    pub sector: String,
    /// Raw volume strings, aligned with `WideTable::years`.
    pub cells: Vec<String>,
    pub line: Option<u64>,
}

/// A melted row whose volume has not been normalized yet.
#[derive(Clone, Debug, PartialEq)]
pub struct LongRow {
    pub sector: String,
    pub year: String,
    pub raw_volume: String,
    pub region: String,
    pub path: PathBuf,
    pub line: Option<u64>,
}

fn format_error(path: &Path, message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Format)
        .with_message(message)
        .with_path(path)
}

fn csv_error(path: &Path, err: csv::Error) -> Error {
    let line = err.position().map(|pos| pos.line());
    let kind = if err.is_io_error() {
        ErrorKind::Io
    } else {
        ErrorKind::Format
    };
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
            format!("row has {len} fields, header has {expected_len}")
        }
        _ => "failed to parse CSV".to_string(),
    };
    let mut out = Error::new(kind).with_message(message).with_path(path);
    if let Some(line) = line {
        out = out.with_line(line);
    }
    out.with_source(err)
}

/// Parse a wide table: a `Sector` column plus one column per year.
///
/// `path` is only used to label errors.
pub fn read_wide<R: Read>(reader: R, path: &Path) -> Result<WideTable, Error> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|err| csv_error(path, err))?.clone();
    let sector_index = headers
        .iter()
        .position(|header| header == SECTOR_COLUMN)
        .ok_or_else(|| {
            format_error(path, format!("missing {SECTOR_COLUMN:?} column")).with_hint(
                "The first row must name a Sector column followed by one column per year.",
            )
        })?;
    let years: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != sector_index)
        .map(|(_, header)| header.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|err| csv_error(path, err))?;
        let sector = record.get(sector_index).unwrap_or_default().to_string();
        let cells = record
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != sector_index)
            .map(|(_, cell)| cell.to_string())
            .collect();
        rows.push(WideRow {
            sector,
            cells,
            line: record.position().map(|pos| pos.line()),
        });
    }

    Ok(WideTable { years, rows })
}

/// Reshape a wide table into one row per (sector, year), tagged with `source.region`.
pub fn melt(wide: WideTable, source: &RegionSource) -> Vec<LongRow> {
    let mut out = Vec::with_capacity(wide.years.len() * wide.rows.len());
    for (col, year) in wide.years.iter().enumerate() {
        for row in &wide.rows {
            out.push(LongRow {
                sector: row.sector.clone(),
                year: year.clone(),
                raw_volume: row.cells.get(col).cloned().unwrap_or_default(),
                region: source.region.clone(),
                path: source.path.clone(),
                line: row.line,
            });
        }
    }
    out
}

fn open_source(path: &Path) -> Result<File, Error> {
    File::open(path).map_err(|err| {
        let kind = if err.kind() == io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Io
        };
        Error::new(kind)
            .with_message("failed to open region file")
            .with_path(path)
            .with_hint("Check --data-dir or pass the region files with --file.")
            .with_source(err)
    })
}

/// Load, melt, concatenate, and normalize every source into one table.
pub fn load_sources(sources: &[RegionSource]) -> Result<ExportTable, Error> {
    if sources.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("no region files configured")
            .with_hint("Pass at least one --file, or point --data-dir at the province CSVs."));
    }

    let mut rows = Vec::new();
    let mut expected_years: Option<Vec<String>> = None;
    for source in sources {
        let file = open_source(&source.path)?;
        let wide = read_wide(file, &source.path)?;
        match &expected_years {
            None => expected_years = Some(wide.years.clone()),
            Some(years) if *years != wide.years => {
                warn!(
                    region = %source.region,
                    path = %source.path.display(),
                    "year columns differ from the first region"
                );
            }
            Some(_) => {}
        }
        let melted = melt(wide, source);
        debug!(region = %source.region, rows = melted.len(), "melted region");
        rows.extend(melted);
    }

    let table = normalize_rows(rows)?;
    info!(
        rows = table.len(),
        regions = table.regions().len(),
        sectors = table.sectors().len(),
        years = table.years().len(),
        "export table loaded"
    );
    Ok(table)
}
