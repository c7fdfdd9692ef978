use crate::adapters::archive::BackupArchiver;
use crate::core::form::{FormAction, FormState};
use crate::core::summary::matches_query;
use crate::domain::model::{next_record_id, SalesRecord};
use crate::domain::ports::{ConfigProvider, ExportOutcome, ExportTarget, Exporter, RecordStore};
use crate::utils::error::{Result, SalesLogError};
use chrono::{Local, NaiveDateTime};
use std::collections::HashSet;

/// 表單、儲存後端與匯出之間的協調者
pub struct ReportService<S: RecordStore, C: ConfigProvider> {
    store: S,
    config: C,
}

impl<S: RecordStore, C: ConfigProvider> ReportService<S, C> {
    pub fn new(store: S, config: C) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// 以今天日期與預設營業員開一張空白表單
    pub fn blank_form(&self) -> FormState {
        FormState::new(
            Local::now().date_naive(),
            self.config.default_salesperson(),
            self.config.catalog(),
        )
    }

    pub async fn create(&self, form: &FormState, now: NaiveDateTime) -> Result<SalesRecord> {
        form.validate()?;
        let existing: HashSet<String> = self
            .store
            .load_all()
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        let id = next_record_id(now, &existing);
        let record = form.submit(id, now)?;

        self.store.save(&record).await?;
        tracing::info!(
            "💾 Saved report {} ({}) to {}",
            record.id,
            record.site_name,
            self.store.location()
        );
        Ok(record)
    }

    pub async fn update(&self, form: &FormState, now: NaiveDateTime) -> Result<SalesRecord> {
        let id = form.editing_id.clone().ok_or_else(|| {
            SalesLogError::validation("먼저 수정할 레코드를 불러오세요.")
        })?;
        let record = form.submit(id, now)?;

        if !self.store.update(&record).await? {
            return Err(SalesLogError::not_found(&record.id));
        }
        tracing::info!("✏️ Updated report {}", record.id);
        Ok(record)
    }

    pub async fn load_into_form(&self, id: &str) -> Result<FormState> {
        let record = self.get(id).await?;
        tracing::debug!("Loading report {} into form", id);
        self.blank_form().apply(FormAction::LoadRecord(record))
    }

    pub async fn get(&self, id: &str) -> Result<SalesRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| SalesLogError::not_found(id))
    }

    pub async fn list(&self, query: Option<&str>) -> Result<Vec<SalesRecord>> {
        let records = self.store.load_all().await?;
        let query = query.unwrap_or("");
        let filtered: Vec<SalesRecord> = records
            .into_iter()
            .filter(|r| matches_query(r, query))
            .collect();
        tracing::debug!("Listing {} reports (query: {:?})", filtered.len(), query);
        Ok(filtered)
    }

    pub async fn delete(&self, ids: &[String]) -> Result<usize> {
        let deleted = self.store.delete(ids).await?;
        if deleted == 0 {
            return Err(SalesLogError::not_found(ids.join(", ")));
        }
        tracing::info!("🗑️ Deleted {} report(s)", deleted);
        Ok(deleted)
    }

    pub async fn export_record<E: Exporter + ?Sized>(
        &self,
        id: &str,
        exporter: &E,
    ) -> Result<ExportOutcome> {
        let record = self.get(id).await?;
        let outcome = exporter.export(ExportTarget::Record(record)).await?;
        tracing::info!("📤 Exported report {} as {}", id, outcome.file_name);
        Ok(outcome)
    }

    pub async fn export_all<E: Exporter + ?Sized>(&self, exporter: &E) -> Result<ExportOutcome> {
        let records = self.store.load_all().await?;
        let count = records.len();
        let outcome = exporter.export(ExportTarget::All(records)).await?;
        tracing::info!("📤 Exported {} reports as {}", count, outcome.file_name);
        Ok(outcome)
    }

    pub async fn backup(&self, archiver: &BackupArchiver) -> Result<ExportOutcome> {
        // 先讀一次，確保資料檔存在
        let records = self.store.load_all().await?;
        let outcome = archiver.archive(&records)?;
        tracing::info!("🗄️ Backup of {} built as {}", self.store.location(), outcome.file_name);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::json_store::JsonFileStore;
    use crate::core::form::Field;
    use crate::domain::model::Catalog;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    struct TestConfig {
        data_path: String,
        catalog: Catalog,
    }

    impl ConfigProvider for TestConfig {
        fn data_path(&self) -> &str {
            &self.data_path
        }
        fn output_path(&self) -> &str {
            "./output"
        }
        fn default_salesperson(&self) -> &str {
            "김범준"
        }
        fn catalog(&self) -> &Catalog {
            &self.catalog
        }
    }

    fn service(dir: &TempDir) -> ReportService<JsonFileStore, TestConfig> {
        let path = dir.path().join("records.json");
        let config = TestConfig {
            data_path: path.to_string_lossy().to_string(),
            catalog: Catalog::default(),
        };
        ReportService::new(JsonFileStore::new(path), config)
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 26)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn form(svc: &ReportService<JsonFileStore, TestConfig>, site: &str) -> FormState {
        svc.blank_form()
            .apply_all([
                FormAction::SetField(Field::Site, site.to_string()),
                FormAction::SetField(Field::Manager, "담당".to_string()),
                FormAction::EditPhone("0212345678".to_string()),
            ])
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_allocates_unique_ids() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        let a = svc.create(&form(&svc, "A"), now()).await.unwrap();
        let b = svc.create(&form(&svc, "B"), now()).await.unwrap();
        assert_eq!(a.id, "SR-20250826090000-0001");
        assert_eq!(b.id, "SR-20250826090000-0002");
        assert_eq!(a.salesperson, "김범준");
    }

    #[tokio::test]
    async fn test_update_requires_loaded_record() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        let err = svc.update(&form(&svc, "A"), now()).await.unwrap_err();
        assert!(matches!(err, SalesLogError::ValidationError { .. }));

        let created = svc.create(&form(&svc, "A"), now()).await.unwrap();
        let loaded = svc
            .load_into_form(&created.id)
            .await
            .unwrap()
            .apply(FormAction::SetField(Field::Site, "A 2차".to_string()))
            .unwrap();
        let updated = svc.update(&loaded, now()).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(svc.get(&created.id).await.unwrap().site_name, "A 2차");
    }

    #[tokio::test]
    async fn test_delete_and_missing_ids() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let created = svc.create(&form(&svc, "A"), now()).await.unwrap();

        assert!(matches!(
            svc.delete(&["SR-none".to_string()]).await,
            Err(SalesLogError::NotFound { .. })
        ));
        assert_eq!(svc.delete(&[created.id.clone()]).await.unwrap(), 1);
        assert!(matches!(
            svc.load_into_form(&created.id).await,
            Err(SalesLogError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_query() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        svc.create(&form(&svc, "Seoul Tower"), now()).await.unwrap();
        svc.create(&form(&svc, "Busan Port"), now()).await.unwrap();

        assert_eq!(svc.list(None).await.unwrap().len(), 2);
        let hits = svc.list(Some("busan")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].site_name, "Busan Port");
    }
}
