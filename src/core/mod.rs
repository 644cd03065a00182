// Core modules: loading, normalization, the table model, querying, and errors.
pub mod error;
pub mod format;
pub mod load;
pub mod normalize;
pub mod query;
pub mod record;
