pub mod adapters;
#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{
    archive::BackupArchiver, csv_export::CsvExporter, drive::DriveExporter,
    json_store::JsonFileStore, local_storage::LocalStorage, sheets::SheetsExporter,
    xlsx_export::XlsxExporter,
    xlsx_store::XlsxStore,
};
pub use config::{AppConfig, Backend};
pub use crate::core::{phone::normalize, service::ReportService};
pub use utils::error::{Result, SalesLogError};
