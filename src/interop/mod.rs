//! Conversions between this crate's batches and dataframe libraries.
//!
//! Enabled per library via Cargo features; currently only `polars`.

pub mod polars;
