// src/schema/mod.rs

pub mod arrow;
pub mod columns;

pub use arrow::{build_arrow_schema, map_to_arrow_type};
pub use columns::{canonicalize, Canonical, ColumnSource, Derived, OutputColumn};
