use crate::adapters::xlsx_export::{list_file_name, list_row, record_file_stem, LIST_HEADERS};
use crate::domain::model::SalesRecord;
use crate::domain::ports::{ExportOutcome, ExportTarget, Exporter};
use crate::utils::error::{Result, SalesLogError};
use async_trait::async_trait;

/// 與清單工作表相同欄位的 CSV
pub fn list_csv(records: &[SalesRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(LIST_HEADERS)?;
    for record in records {
        writer.write_record(list_row(record))?;
    }
    writer
        .into_inner()
        .map_err(|e| SalesLogError::export(format!("CSV flush failed: {}", e)))
}

#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

#[async_trait]
impl Exporter for CsvExporter {
    async fn export(&self, target: ExportTarget) -> Result<ExportOutcome> {
        let (file_name, records) = match target {
            ExportTarget::Record(record) => (record_file_stem(&record) + ".csv", vec![record]),
            ExportTarget::All(records) => {
                if records.is_empty() {
                    return Err(SalesLogError::export("nothing to export"));
                }
                (list_file_name("csv"), records)
            }
        };
        let bytes = list_csv(&records)?;
        Ok(ExportOutcome {
            file_name,
            bytes: Some(bytes),
            url: None,
        })
    }
}
