//! Field normalization helpers shared by the source parsers.
//!
//! Everything here is a pure function: address decomposition, category tables,
//! coordinate conversion, slugs and JSON field access.

pub mod address;
pub mod category;
pub mod coords;
pub mod fields;
pub mod slug;

pub use address::{decompose_address, expand_province};
pub use category::{category_from_content_type, category_from_label, category_from_labels};
pub use coords::{planar_to_wgs84, wgs84, PLANAR_COORD_SCALE};
pub use fields::{fallback_external_id, first_entry, first_text, item_list, join_text, number, text};
pub use slug::{place_slug, slugify};
