use crate::adapters::xlsx_export::{XlsxExporter, XLSX_MIME};
use crate::domain::model::Catalog;
use crate::domain::ports::{ExportOutcome, ExportTarget, Exporter};
use crate::utils::error::{Result, SalesLogError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

#[derive(Debug, Clone)]
pub struct DriveSettings {
    pub api_base: String,
    pub folder_id: Option<String>,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    web_view_link: Option<String>,
    web_content_link: Option<String>,
}

/// 把 XLSX 上傳到 Google Drive，回傳檢視連結
///
/// 存取權杖由外部取得後傳入，這裡不處理授權流程。
pub struct DriveExporter {
    settings: DriveSettings,
    workbooks: XlsxExporter,
    client: Client,
}

impl DriveExporter {
    pub fn new(settings: DriveSettings, catalog: Catalog) -> Self {
        Self {
            settings,
            workbooks: XlsxExporter::new(catalog),
            client: Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.settings.api_base.trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path)).map_err(|e| {
            SalesLogError::InvalidConfigValueError {
                field: "drive.api_base".to_string(),
                value: self.settings.api_base.clone(),
                reason: e.to_string(),
            }
        })
    }

    async fn upload_media(&self, bytes: Vec<u8>) -> Result<DriveFile> {
        let mut url = self.endpoint("/upload/drive/v3/files")?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("supportsAllDrives", "true");

        tracing::debug!("Uploading {} bytes to {}", bytes.len(), url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.settings.access_token)
            .header(reqwest::header::CONTENT_TYPE, XLSX_MIME)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SalesLogError::export(format!(
                "Drive upload returned {}: {}",
                status, body
            )));
        }
        Ok(response.json().await?)
    }

    async fn finalize_metadata(&self, file_id: &str, file_name: &str) -> Result<DriveFile> {
        let mut url = self.endpoint(&format!("/drive/v3/files/{}", file_id))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("fields", "id,webViewLink,webContentLink")
                .append_pair("supportsAllDrives", "true");
            if let Some(folder) = self.settings.folder_id.as_deref().filter(|f| !f.is_empty()) {
                query.append_pair("addParents", folder);
            }
        }

        let response = self
            .client
            .patch(url)
            .bearer_auth(&self.settings.access_token)
            .json(&serde_json::json!({ "name": file_name, "mimeType": XLSX_MIME }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SalesLogError::export(format!(
                "Drive metadata update returned {}: {}",
                status, body
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Exporter for DriveExporter {
    async fn export(&self, target: ExportTarget) -> Result<ExportOutcome> {
        let workbook = self.workbooks.export(target).await?;
        let bytes = workbook
            .bytes
            .ok_or_else(|| SalesLogError::export("workbook was not generated"))?;

        let uploaded = self.upload_media(bytes).await?;
        tracing::info!("📤 Uploaded {} as Drive file {}", workbook.file_name, uploaded.id);

        let file = self
            .finalize_metadata(&uploaded.id, &workbook.file_name)
            .await?;
        let url = file
            .web_view_link
            .or(file.web_content_link)
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", file.id));

        Ok(ExportOutcome {
            file_name: workbook.file_name,
            bytes: None,
            url: Some(url),
        })
    }
}
