use crate::core::summary::record_summary;
use crate::domain::model::{
    Catalog, ExtraItem, ItemKind, RecordTotals, SalesRecord, Status, DATE_FORMAT,
};
use crate::domain::ports::RecordStore;
use crate::utils::error::{Result, SalesLogError};
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, Local, NaiveDate};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

pub const SHEET_NAME: &str = "Reports";

pub const COL_ID: &str = "ID";
pub const COL_DATE: &str = "날짜";
pub const COL_SALESPERSON: &str = "영업자";
pub const COL_SITE: &str = "현장명";
pub const COL_MANAGER: &str = "담당자";
pub const COL_PHONE: &str = "연락처";
pub const COL_STATUS: &str = "진행상태";
pub const COL_REASON: &str = "불가사유";
pub const COL_REMARKS: &str = "비고";
pub const COL_EXTRAS: &str = "기타(JSON)";
pub const COL_SUMMARY: &str = "충전기요약";

const MODEL_PREFIX: &str = "모델_";
const ACCESSORY_PREFIX: &str = "자재_";

/// 工作表欄位順序
pub fn columns(catalog: &Catalog) -> Vec<String> {
    let mut cols: Vec<String> = [
        COL_ID,
        COL_DATE,
        COL_SALESPERSON,
        COL_SITE,
        COL_MANAGER,
        COL_PHONE,
        COL_STATUS,
        COL_REASON,
        COL_REMARKS,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    cols.extend(catalog.chargers.iter().map(|m| format!("{}{}", MODEL_PREFIX, m)));
    cols.extend(
        catalog
            .ancillaries
            .iter()
            .map(|a| format!("{}{}", ACCESSORY_PREFIX, a)),
    );
    cols.push(COL_EXTRAS.to_string());
    cols.push(COL_SUMMARY.to_string());
    cols
}

/// 每筆報告一列的 Excel 活頁簿
#[derive(Debug, Clone)]
pub struct XlsxStore {
    path: PathBuf,
    catalog: Catalog,
}

impl XlsxStore {
    pub fn new(path: impl Into<PathBuf>, catalog: Catalog) -> Self {
        Self {
            path: path.into(),
            catalog,
        }
    }

    fn ensure_workbook(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!("Creating workbook with header row at {}", self.path.display());
        self.write_sheet(&SheetData::default())
    }

    fn read_sheet(&self) -> Result<SheetData> {
        self.ensure_workbook()?;

        let mut workbook = open_workbook_auto(&self.path)?;
        let names = workbook.sheet_names();
        let sheet_name = names
            .iter()
            .find(|name| name.as_str() == SHEET_NAME)
            .or_else(|| names.first())
            .cloned()
            .ok_or_else(|| SalesLogError::ConfigError {
                message: format!("Workbook has no sheets: {}", self.path.display()),
            })?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header_row: Vec<String> = match rows.next() {
            Some(row) => row.iter().map(cell_text).collect(),
            None => return Ok(SheetData::default()),
        };
        let header: HashMap<String, usize> = header_row
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        // 不屬於目前欄位配置的欄位照原樣保留
        let known = columns(&self.catalog);
        let mut legacy: Vec<(String, usize)> = Vec::new();
        for (idx, name) in header_row.iter().enumerate() {
            if !name.is_empty()
                && !known.contains(name)
                && !legacy.iter().any(|(seen, _)| seen == name)
            {
                legacy.push((name.clone(), idx));
            }
        }

        let mut sheet = SheetData {
            legacy_columns: legacy.iter().map(|(name, _)| name.clone()).collect(),
            ..SheetData::default()
        };
        let mut retrofitted = false;
        let stamp = Local::now().format("%Y%m%d%H%M%S").to_string();

        // 第一列是標題，資料從第 2 列開始
        for (offset, row) in rows.enumerate() {
            if row.iter().all(|cell| cell_text(cell).is_empty()) {
                continue;
            }
            let mut record = self.row_to_record(&header, row);
            if record.id.is_empty() {
                record.id = format!("SR-{}-{:04}", stamp, offset + 2);
                retrofitted = true;
            }
            if !legacy.is_empty() {
                let cells = legacy
                    .iter()
                    .map(|(_, idx)| row.get(*idx).cloned().unwrap_or(Data::Empty))
                    .collect();
                sheet.legacy_cells.insert(record.id.clone(), cells);
            }
            sheet.records.push(record);
        }

        if retrofitted {
            tracing::info!("Assigned ids to rows without one in {}", self.path.display());
            self.write_sheet(&sheet)?;
        }
        Ok(sheet)
    }

    fn row_to_record(&self, header: &HashMap<String, usize>, row: &[Data]) -> SalesRecord {
        let text = |col: &str| -> String {
            header
                .get(col)
                .and_then(|idx| row.get(*idx))
                .map(cell_text)
                .unwrap_or_default()
        };
        let qty = |col: String| -> u32 {
            header
                .get(&col)
                .and_then(|idx| row.get(*idx))
                .map(cell_quantity)
                .unwrap_or(0)
        };

        let chargers: BTreeMap<String, u32> = self
            .catalog
            .items(ItemKind::Charger)
            .iter()
            .map(|m| (m.clone(), qty(format!("{}{}", MODEL_PREFIX, m))))
            .collect();
        let ancillaries: BTreeMap<String, u32> = self
            .catalog
            .items(ItemKind::Ancillary)
            .iter()
            .map(|a| (a.clone(), qty(format!("{}{}", ACCESSORY_PREFIX, a))))
            .collect();
        let extras = parse_extras(&text(COL_EXTRAS));

        let date = header
            .get(COL_DATE)
            .and_then(|idx| row.get(*idx))
            .map(cell_date)
            .unwrap_or_default();

        SalesRecord {
            id: text(COL_ID),
            created_at: if date.is_empty() {
                String::new()
            } else {
                format!("{} 00:00:00", date)
            },
            date,
            salesperson: text(COL_SALESPERSON),
            site_name: text(COL_SITE),
            manager_name: text(COL_MANAGER),
            phone: text(COL_PHONE),
            remarks: text(COL_REMARKS),
            status: text(COL_STATUS).parse::<Status>().unwrap_or_default(),
            reason: text(COL_REASON),
            totals: RecordTotals::compute(&chargers, &ancillaries, &extras),
            chargers,
            ancillaries,
            extras,
        }
    }

    /// 整本重寫，保留的舊欄位接在目前欄位之後
    fn write_sheet(&self, sheet: &SheetData) -> Result<()> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        let known = columns(&self.catalog);
        for (col, name) in known.iter().chain(&sheet.legacy_columns).enumerate() {
            worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
        }
        let legacy_start = known.len() as u16;

        for (idx, record) in sheet.records.iter().enumerate() {
            let row = (idx + 1) as u32;
            let base = [
                record.id.as_str(),
                record.date.as_str(),
                record.salesperson.as_str(),
                record.site_name.as_str(),
                record.manager_name.as_str(),
                record.phone.as_str(),
                record.status.label(),
                record.reason.as_str(),
                record.remarks.as_str(),
            ];
            let mut col: u16 = 0;
            for value in base {
                worksheet.write_string(row, col, value)?;
                col += 1;
            }
            for (kind, counts) in [
                (ItemKind::Charger, &record.chargers),
                (ItemKind::Ancillary, &record.ancillaries),
            ] {
                for name in self.catalog.items(kind) {
                    let qty = counts.get(name).copied().unwrap_or(0);
                    worksheet.write_number(row, col, f64::from(qty))?;
                    col += 1;
                }
            }
            let pairs: Vec<(&str, u32)> = record
                .extras
                .iter()
                .map(|e| (e.name.as_str(), e.qty))
                .collect();
            worksheet.write_string(row, col, serde_json::to_string(&pairs)?)?;
            worksheet.write_string(row, col + 1, record_summary(&self.catalog, record))?;

            if let Some(cells) = sheet.legacy_cells.get(&record.id) {
                for (offset, cell) in cells.iter().enumerate() {
                    write_cell(worksheet, row, legacy_start + offset as u16, cell)?;
                }
            }
        }

        workbook.save(&self.path)?;
        Ok(())
    }
}

/// 工作表內容：報告本身，加上目前欄位配置以外的舊欄位
#[derive(Debug, Default)]
struct SheetData {
    records: Vec<SalesRecord>,
    legacy_columns: Vec<String>,
    // 報告 ID -> 依 legacy_columns 順序的儲存格
    legacy_cells: HashMap<String, Vec<Data>>,
}

#[async_trait]
impl RecordStore for XlsxStore {
    async fn load_all(&self) -> Result<Vec<SalesRecord>> {
        Ok(self.read_sheet()?.records)
    }

    async fn save(&self, record: &SalesRecord) -> Result<()> {
        let mut sheet = self.read_sheet()?;
        if sheet.records.iter().any(|r| r.id == record.id) {
            return Err(SalesLogError::DuplicateId {
                id: record.id.clone(),
            });
        }
        sheet.records.push(record.clone());
        self.write_sheet(&sheet)
    }

    async fn update(&self, record: &SalesRecord) -> Result<bool> {
        let mut sheet = self.read_sheet()?;
        match sheet.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record.clone();
                self.write_sheet(&sheet)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        let mut sheet = self.read_sheet()?;
        let before = sheet.records.len();
        sheet.records.retain(|r| !ids.contains(&r.id));
        let deleted = before - sheet.records.len();
        if deleted > 0 {
            sheet.legacy_cells.retain(|id, _| !ids.contains(id));
            self.write_sheet(&sheet)?;
        }
        Ok(deleted)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// 舊欄位的儲存格依原型別寫回
fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Data) -> Result<()> {
    match cell {
        Data::Empty => {}
        Data::String(s) => {
            worksheet.write_string(row, col, s)?;
        }
        Data::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        Data::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Data::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Data::DateTime(dt) => {
            worksheet.write_number(row, col, dt.as_f64())?;
        }
        other => {
            worksheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_quantity(cell: &Data) -> u32 {
    match cell {
        Data::Int(i) => u32::try_from(*i).unwrap_or(0),
        Data::Float(f) if *f > 0.0 => *f as u32,
        Data::String(s) => s.trim().parse::<f64>().map(|f| f.max(0.0) as u32).unwrap_or(0),
        _ => 0,
    }
}

// 日期可能存成文字或 Excel 序號
fn cell_date(cell: &Data) -> String {
    let serial = match cell {
        Data::DateTime(dt) => Some(dt.as_f64()),
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        _ => None,
    };
    match serial {
        Some(days) => NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|epoch| epoch.checked_add_signed(Duration::days(days.trunc() as i64)))
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
        None => {
            let text = cell_text(cell);
            // "2025-08-26 00:00:00" 之類的只取日期部分
            text.split_whitespace().next().unwrap_or("").to_string()
        }
    }
}

/// `[["모델", 2]]` 或 `[{"name": "모델", "qty": 2}]`，解析失敗時視為沒有
pub fn parse_extras(raw: &str) -> Vec<ExtraItem> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => return Vec::new(),
    };
    let items = match value.as_array() {
        Some(items) => items,
        None => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| {
            let (name, qty) = match item {
                serde_json::Value::Array(pair) => (pair.first()?, pair.get(1)?),
                serde_json::Value::Object(obj) => (obj.get("name")?, obj.get("qty")?),
                _ => return None,
            };
            let qty = qty
                .as_u64()
                .or_else(|| qty.as_str().and_then(|s| s.trim().parse().ok()))?;
            Some(ExtraItem::new(name.as_str()?.trim(), u32::try_from(qty).ok()?))
        })
        .filter(|e| e.is_meaningful())
        .collect()
}
