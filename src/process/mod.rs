// src/process/mod.rs

pub mod convert;
pub mod derive;
pub mod impute;
pub mod pipeline;
pub mod raw_table;
pub mod record;
pub mod split;
pub mod stats;
pub mod table;
pub mod trimming;
pub mod utils;
pub mod validate;

pub use pipeline::{clean, CleanOutput};
pub use raw_table::{Cell, RawTable};
pub use record::{CleanRecord, Measures};
pub use stats::CleanStats;
pub use table::{CleanTable, Partition};
