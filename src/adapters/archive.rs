use crate::adapters::xlsx_export::{list_file_name, list_workbook};
use crate::domain::model::{Catalog, SalesRecord};
use crate::domain::ports::ExportOutcome;
use crate::utils::error::Result;
use chrono::Local;
use std::io::Write;
use std::path::PathBuf;
use zip::write::{FileOptions, ZipWriter};

/// 資料檔原樣加上清單活頁簿打包成 ZIP
#[derive(Debug, Clone)]
pub struct BackupArchiver {
    data_path: PathBuf,
    catalog: Catalog,
}

impl BackupArchiver {
    pub fn new(data_path: impl Into<PathBuf>, catalog: Catalog) -> Self {
        Self {
            data_path: data_path.into(),
            catalog,
        }
    }

    pub fn archive(&self, records: &[SalesRecord]) -> Result<ExportOutcome> {
        let data_name = self
            .data_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "records".to_string());
        let data = std::fs::read(&self.data_path)?;

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>(data_name.as_str(), FileOptions::default())?;
            zip.write_all(&data)?;

            if !records.is_empty() {
                let workbook = list_workbook(records, &self.catalog)?;
                zip.start_file::<_, ()>(list_file_name("xlsx"), FileOptions::default())?;
                zip.write_all(&workbook)?;
            }

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Built backup archive ({} bytes)", zip_data.len());
        Ok(ExportOutcome {
            file_name: format!(
                "영업보고서_백업_{}.zip",
                Local::now().format("%Y%m%d_%H%M%S")
            ),
            bytes: Some(zip_data),
            url: None,
        })
    }
}
