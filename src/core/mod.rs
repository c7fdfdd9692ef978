pub mod form;
pub mod phone;
pub mod service;
pub mod summary;

pub use crate::domain::model::{Catalog, SalesRecord, Status};
pub use crate::domain::ports::{ConfigProvider, Exporter, RecordStore, Storage};
pub use crate::utils::error::Result;
