// src/lib.rs

pub mod analysis;
pub mod config;
pub mod error;
pub mod output;
pub mod process;
pub mod reader;
pub mod report;
pub mod schema;

pub use config::PipelineConfig;
pub use error::SchemaError;
pub use process::{clean, CleanOutput, CleanStats, RawTable};
