//! Place Schemas
//!
//! Canonical types shared by the parsers, the deduplicator and the writer.
//! All structs use `serde(rename_all = "camelCase")` for JSON output.

pub mod common;
pub mod place;
pub mod upsert_summary;

pub use common::*;
pub use place::*;
pub use upsert_summary::*;
