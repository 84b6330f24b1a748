pub mod config;
pub mod error;
pub mod telemetry;
pub mod workbook;
pub mod workflows;
