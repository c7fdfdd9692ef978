use crate::domain::model::SalesRecord;
use crate::domain::ports::RecordStore;
use crate::utils::error::{Result, SalesLogError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordsDocument {
    #[serde(default)]
    records: Vec<SalesRecord>,
}

/// `{"records": [...]}` 形式的 JSON 檔
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_file(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        tracing::debug!("Creating empty record file at {}", self.path.display());
        self.write_document(&RecordsDocument::default())
    }

    fn read_document(&self) -> Result<RecordsDocument> {
        self.ensure_file()?;
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(RecordsDocument::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_document(&self, document: &RecordsDocument) -> Result<()> {
        let content = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load_all(&self) -> Result<Vec<SalesRecord>> {
        Ok(self.read_document()?.records)
    }

    async fn save(&self, record: &SalesRecord) -> Result<()> {
        let mut document = self.read_document()?;
        if document.records.iter().any(|r| r.id == record.id) {
            return Err(SalesLogError::DuplicateId {
                id: record.id.clone(),
            });
        }
        document.records.push(record.clone());
        self.write_document(&document)
    }

    async fn update(&self, record: &SalesRecord) -> Result<bool> {
        let mut document = self.read_document()?;
        match document.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record.clone();
                self.write_document(&document)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        let mut document = self.read_document()?;
        let before = document.records.len();
        document.records.retain(|r| !ids.contains(&r.id));
        let deleted = before - document.records.len();
        if deleted > 0 {
            self.write_document(&document)?;
        }
        Ok(deleted)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
