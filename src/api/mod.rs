//! Purpose: Define the public Rust API boundary for exportboard.
//! Exports: Table model, loading, query helpers, the `Dashboard`, and chart types.
//! Role: Single import path for the binary and integration tests.
//! Invariants: Core modules stay reachable only through these re-exports.

mod dashboard;
mod figure;

pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::core::format::{format_currency, format_grouped};
pub use crate::core::load::{
    DEFAULT_REGION_FILES, LongRow, RegionSource, WideRow, WideTable, default_sources,
    load_sources, melt, read_wide,
};
pub use crate::core::normalize::{normalize_rows, normalize_volume};
pub use crate::core::query::{
    LookupKey, Selection, YearTotal, aggregate_by_year, filter, lookup_volume,
};
pub use crate::core::record::{ExportRecord, ExportTable};
pub use dashboard::{ChartRequest, Dashboard, LookupAnswer, LookupRequest, Options};
pub use figure::{
    Annotation, Axis, CHART_TITLE, Figure, Layout, NO_DATA_TEXT, Title, Trace, X_AXIS_TITLE,
    Y_AXIS_TITLE, line_chart,
};
