use crate::adapters::drive::DriveSettings;
use crate::adapters::xlsx_export::{list_row, LIST_HEADERS};
use crate::core::summary::catalog_totals;
use crate::domain::model::{Catalog, ItemKind, SalesRecord};
use crate::domain::ports::{ExportOutcome, ExportTarget, Exporter};
use crate::utils::error::{Result, SalesLogError};
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spreadsheet {
    spreadsheet_id: String,
    spreadsheet_url: Option<String>,
}

/// 一個分頁：名稱與從 A1 開始的儲存格
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTab {
    pub title: &'static str,
    pub rows: Vec<Vec<Value>>,
}

impl SheetTab {
    fn new(title: &'static str, headers: &[&str]) -> Self {
        Self {
            title,
            rows: vec![headers.iter().map(|h| json!(h)).collect()],
        }
    }
}

/// 單筆報告的分頁：기본정보、수량，有其他型號時加 기타모델
pub fn record_tabs(record: &SalesRecord, catalog: &Catalog) -> Vec<SheetTab> {
    let mut base = SheetTab::new("기본정보", &["항목", "값"]);
    for (label, value) in [
        ("작성일", record.created_at.as_str()),
        ("날짜", record.date.as_str()),
        ("영업자", record.salesperson.as_str()),
        ("현장명", record.site_name.as_str()),
        ("담당자", record.manager_name.as_str()),
        ("연락처", record.phone.as_str()),
        ("진행상태", record.status.label()),
        ("불가 사유", record.reason.as_str()),
        ("비고", record.remarks.as_str()),
    ] {
        base.rows.push(vec![json!(label), json!(value)]);
    }

    let mut quantities = SheetTab::new("수량", &["분류", "항목", "수량"]);
    for (kind, counts) in [
        (ItemKind::Charger, &record.chargers),
        (ItemKind::Ancillary, &record.ancillaries),
    ] {
        for name in catalog.items(kind) {
            let qty = counts.get(name).copied().unwrap_or(0);
            quantities
                .rows
                .push(vec![json!(kind.label()), json!(name), json!(qty)]);
        }
    }

    let mut tabs = vec![base, quantities];
    if !record.extras.is_empty() {
        let mut extras = SheetTab::new("기타모델", &["모델명", "수량"]);
        for extra in &record.extras {
            extras.rows.push(vec![json!(extra.name), json!(extra.qty)]);
        }
        tabs.push(extras);
    }
    tabs
}

/// 全部報告的分頁：목록與兩個合計
pub fn list_tabs(records: &[SalesRecord], catalog: &Catalog) -> Vec<SheetTab> {
    let mut list = SheetTab::new("목록", &LIST_HEADERS);
    for record in records {
        let row = list_row(record);
        // 最後三欄是合計數字
        let numeric_from = row.len().saturating_sub(3);
        list.rows.push(
            row.into_iter()
                .enumerate()
                .map(|(col, value)| match value.parse::<u64>() {
                    Ok(number) if col >= numeric_from => json!(number),
                    _ => json!(value),
                })
                .collect(),
        );
    }

    let mut tabs = vec![list];
    for (kind, title) in [
        (ItemKind::Charger, "충전기합계"),
        (ItemKind::Ancillary, "부대공사합계"),
    ] {
        let mut totals = SheetTab::new(title, &["항목", "수량"]);
        for (name, qty) in catalog_totals(catalog, kind, records) {
            totals.rows.push(vec![json!(name), json!(qty)]);
        }
        tabs.push(totals);
    }
    tabs
}

/// 直接建立 Google 試算表，回傳試算表連結
///
/// 與 Drive 上傳共用同一組權杖設定。
pub struct SheetsExporter {
    settings: DriveSettings,
    api_base: String,
    catalog: Catalog,
    client: Client,
}

impl SheetsExporter {
    pub fn new(settings: DriveSettings, catalog: Catalog) -> Self {
        Self {
            settings,
            api_base: DEFAULT_SHEETS_API_BASE.to_string(),
            catalog,
            client: Client::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.api_base.trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path)).map_err(|e| {
            SalesLogError::InvalidConfigValueError {
                field: "drive.sheets_api_base".to_string(),
                value: self.api_base.clone(),
                reason: e.to_string(),
            }
        })
    }

    async fn create_spreadsheet(&self, title: &str, tabs: &[SheetTab]) -> Result<Spreadsheet> {
        let url = self.endpoint("/v4/spreadsheets")?;
        let sheets: Vec<Value> = tabs
            .iter()
            .map(|tab| json!({ "properties": { "title": tab.title } }))
            .collect();

        tracing::debug!("Creating spreadsheet {} with {} tabs", title, tabs.len());
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.settings.access_token)
            .json(&json!({ "properties": { "title": title }, "sheets": sheets }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SalesLogError::export(format!(
                "Sheets create returned {}: {}",
                status, body
            )));
        }
        Ok(response.json().await?)
    }

    async fn write_values(&self, spreadsheet_id: &str, tabs: &[SheetTab]) -> Result<()> {
        let url = self.endpoint(&format!(
            "/v4/spreadsheets/{}/values:batchUpdate",
            spreadsheet_id
        ))?;
        let data: Vec<Value> = tabs
            .iter()
            .map(|tab| json!({ "range": format!("{}!A1", tab.title), "values": tab.rows }))
            .collect();

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.settings.access_token)
            .json(&json!({ "valueInputOption": "RAW", "data": data }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SalesLogError::export(format!(
                "Sheets values update returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Exporter for SheetsExporter {
    async fn export(&self, target: ExportTarget) -> Result<ExportOutcome> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let (title, tabs) = match target {
            ExportTarget::Record(record) => (
                format!("영업보고서_현재입력_{}", stamp),
                record_tabs(&record, &self.catalog),
            ),
            ExportTarget::All(records) => {
                if records.is_empty() {
                    return Err(SalesLogError::export("nothing to export"));
                }
                (
                    format!("영업보고서_목록_{}", stamp),
                    list_tabs(&records, &self.catalog),
                )
            }
        };

        let spreadsheet = self.create_spreadsheet(&title, &tabs).await?;
        self.write_values(&spreadsheet.spreadsheet_id, &tabs).await?;
        tracing::info!("📊 Created spreadsheet {} ({})", title, spreadsheet.spreadsheet_id);

        let url = spreadsheet.spreadsheet_url.unwrap_or_else(|| {
            format!(
                "https://docs.google.com/spreadsheets/d/{}/edit",
                spreadsheet.spreadsheet_id
            )
        });
        Ok(ExportOutcome {
            file_name: title,
            bytes: None,
            url: Some(url),
        })
    }
}
