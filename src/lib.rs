//! Purpose: Library crate behind the `exportboard` dashboard binary.
//! Exports: `api` (table loading, normalization, queries, chart model).
//! Role: Keeps the data pipeline testable without an HTTP server.
//! Invariants: The loaded table is immutable; every query is a pure read.
pub mod api;
mod core;
