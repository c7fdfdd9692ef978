use crate::core::summary::catalog_totals;
use crate::domain::model::{Catalog, ItemKind, SalesRecord};
use crate::domain::ports::{ExportOutcome, ExportTarget, Exporter};
use crate::utils::error::{Result, SalesLogError};
use async_trait::async_trait;
use chrono::Local;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const LIST_HEADERS: [&str; 12] = [
    "ID",
    "날짜",
    "영업자",
    "현장명",
    "담당자",
    "연락처",
    "진행상태",
    "불가 사유",
    "비고",
    "충전기 합계",
    "부대공사 합계",
    "기타 합계",
];

/// 檔名中不允許的字元 (路徑分隔符、保留字元、控制字元) 換成 `_`
pub fn safe_file_component(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

pub fn record_file_name(record: &SalesRecord) -> String {
    record_file_stem(record) + ".xlsx"
}

/// `영업보고서_<날짜>_<현장명>`，副檔名由呼叫端決定
pub fn record_file_stem(record: &SalesRecord) -> String {
    format!(
        "영업보고서_{}_{}",
        safe_file_component(&record.date),
        safe_file_component(&record.site_name)
    )
}

pub fn list_file_name(extension: &str) -> String {
    format!(
        "영업보고서_목록_{}.{}",
        Local::now().format("%Y%m%d"),
        extension
    )
}

/// 清單工作表/CSV 共用的一列
pub fn list_row(record: &SalesRecord) -> Vec<String> {
    vec![
        record.id.clone(),
        record.date.clone(),
        record.salesperson.clone(),
        record.site_name.clone(),
        record.manager_name.clone(),
        record.phone.clone(),
        record.status.label().to_string(),
        record.reason.clone(),
        record.remarks.clone(),
        record.totals.chargers_total.to_string(),
        record.totals.ancillaries_total.to_string(),
        record.totals.extras_total.to_string(),
    ]
}

fn write_header(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, format)?;
    }
    Ok(())
}

/// 單筆報告：基本資料、數量、其他型號 (有才寫)
pub fn record_workbook(record: &SalesRecord, catalog: &Catalog) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let base_rows = [
        ("작성일", record.created_at.as_str()),
        ("날짜", record.date.as_str()),
        ("영업자", record.salesperson.as_str()),
        ("현장명", record.site_name.as_str()),
        ("담당자", record.manager_name.as_str()),
        ("연락처", record.phone.as_str()),
        ("진행상태", record.status.label()),
        ("불가 사유", record.reason.as_str()),
        ("비고", record.remarks.as_str()),
    ];
    let sheet = workbook.add_worksheet();
    sheet.set_name("기본정보")?;
    sheet.set_column_width(0, 12)?;
    sheet.set_column_width(1, 30)?;
    write_header(sheet, &["항목", "값"], &header_format)?;
    for (idx, (label, value)) in base_rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, *label)?;
        sheet.write_string(row, 1, *value)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("수량")?;
    write_header(sheet, &["분류", "항목", "수량"], &header_format)?;
    let mut row = 1u32;
    for (kind, counts) in [
        (ItemKind::Charger, &record.chargers),
        (ItemKind::Ancillary, &record.ancillaries),
    ] {
        for name in catalog.items(kind) {
            sheet.write_string(row, 0, kind.label())?;
            sheet.write_string(row, 1, name)?;
            sheet.write_number(row, 2, f64::from(counts.get(name).copied().unwrap_or(0)))?;
            row += 1;
        }
    }

    if !record.extras.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name("기타모델")?;
        write_header(sheet, &["모델명", "수량"], &header_format)?;
        for (idx, extra) in record.extras.iter().enumerate() {
            let row = (idx + 1) as u32;
            sheet.write_string(row, 0, &extra.name)?;
            sheet.write_number(row, 1, f64::from(extra.qty))?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// 全部報告：清單與各品項合計
pub fn list_workbook(records: &[SalesRecord], catalog: &Catalog) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("목록")?;
    write_header(sheet, &LIST_HEADERS, &header_format)?;
    for (idx, record) in records.iter().enumerate() {
        let row = (idx + 1) as u32;
        let values = list_row(record);
        for (col, value) in values.iter().enumerate() {
            // 合計欄寫成數字
            if col >= 9 {
                let number: f64 = value.parse().unwrap_or(0.0);
                sheet.write_number(row, col as u16, number)?;
            } else {
                sheet.write_string(row, col as u16, value)?;
            }
        }
    }

    for (kind, sheet_name) in [
        (ItemKind::Charger, "충전기합계"),
        (ItemKind::Ancillary, "부대공사합계"),
    ] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;
        write_header(sheet, &["항목", "수량"], &header_format)?;
        for (idx, (name, qty)) in catalog_totals(catalog, kind, records).iter().enumerate() {
            let row = (idx + 1) as u32;
            sheet.write_string(row, 0, name)?;
            sheet.write_number(row, 1, f64::from(*qty))?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[derive(Debug, Clone)]
pub struct XlsxExporter {
    catalog: Catalog,
}

impl XlsxExporter {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Exporter for XlsxExporter {
    async fn export(&self, target: ExportTarget) -> Result<ExportOutcome> {
        let (file_name, bytes) = match &target {
            ExportTarget::Record(record) => (
                record_file_name(record),
                record_workbook(record, &self.catalog)?,
            ),
            ExportTarget::All(records) => {
                if records.is_empty() {
                    return Err(SalesLogError::export("nothing to export"));
                }
                (list_file_name("xlsx"), list_workbook(records, &self.catalog)?)
            }
        };
        tracing::debug!("Built workbook {} ({} bytes)", file_name, bytes.len());
        Ok(ExportOutcome {
            file_name,
            bytes: Some(bytes),
            url: None,
        })
    }
}
