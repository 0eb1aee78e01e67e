//! Diff sectioning and sensitive-path filtering.

pub mod filter;
pub mod section;

pub use filter::{DEFAULT_EXCLUDE_PATTERNS, FilteredDiff, filter_sensitive};
pub use section::{DiffSection, parse_sections};
