// Adapters layer: concrete implementations of the domain ports (record stores, exporters, storage).

pub mod archive;
pub mod csv_export;
pub mod drive;
pub mod json_store;
pub mod local_storage;
pub mod sheets;
pub mod xlsx_export;
pub mod xlsx_store;
