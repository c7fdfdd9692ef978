use crate::domain::model::{Catalog, SalesRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 匯出檔案的落地位置 (本機目錄)
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn default_salesperson(&self) -> &str;
    fn catalog(&self) -> &Catalog;
}

/// 報告的持久化後端
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<SalesRecord>>;

    async fn get(&self, id: &str) -> Result<Option<SalesRecord>> {
        Ok(self.load_all().await?.into_iter().find(|r| r.id == id))
    }

    /// 新增；ID 重複時回傳錯誤
    async fn save(&self, record: &SalesRecord) -> Result<()>;

    /// 依 ID 取代；找不到時回傳 `false`
    async fn update(&self, record: &SalesRecord) -> Result<bool>;

    /// 回傳實際刪除的筆數
    async fn delete(&self, ids: &[String]) -> Result<usize>;

    fn location(&self) -> String;
}

#[derive(Debug, Clone)]
pub enum ExportTarget {
    Record(SalesRecord),
    All(Vec<SalesRecord>),
}

#[derive(Debug, Clone, Default)]
pub struct ExportOutcome {
    pub file_name: String,
    pub bytes: Option<Vec<u8>>,
    pub url: Option<String>,
}

#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, target: ExportTarget) -> Result<ExportOutcome>;
}
