//! 報告輸入表單
//!
//! 表單狀態是不可變的值，每個使用者動作透過 [`FormState::apply`] 產生新的狀態。

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::core::phone;
use crate::domain::model::{
    Catalog, ExtraItem, ItemKind, RecordTotals, SalesRecord, Status, DATE_FORMAT,
    MAX_QUANTITY, MAX_REMARKS_CHARS, TIMESTAMP_FORMAT,
};
use crate::utils::error::{Result, SalesLogError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Salesperson,
    Site,
    Manager,
    Remarks,
    Status,
    Reason,
}

#[derive(Debug, Clone)]
pub enum FormAction {
    EditPhone(String),
    SetField(Field, String),
    SetCount {
        kind: ItemKind,
        name: String,
        qty: u32,
    },
    AddExtra {
        name: String,
        qty: u32,
    },
    RemoveExtra(usize),
    ClearExtras,
    LoadRecord(SalesRecord),
    Clear {
        today: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub editing_id: Option<String>,
    pub date: NaiveDate,
    pub salesperson: String,
    pub site_name: String,
    pub manager_name: String,
    pub phone: String,
    pub remarks: String,
    pub status: Status,
    pub reason: String,
    pub chargers: BTreeMap<String, u32>,
    pub ancillaries: BTreeMap<String, u32>,
    pub extras: Vec<ExtraItem>,
    catalog: Catalog,
    default_salesperson: String,
}

impl FormState {
    pub fn new(today: NaiveDate, default_salesperson: &str, catalog: &Catalog) -> Self {
        Self {
            editing_id: None,
            date: today,
            salesperson: default_salesperson.to_string(),
            site_name: String::new(),
            manager_name: String::new(),
            phone: String::new(),
            remarks: String::new(),
            status: Status::default(),
            reason: String::new(),
            chargers: catalog.empty_counts(ItemKind::Charger),
            ancillaries: catalog.empty_counts(ItemKind::Ancillary),
            extras: Vec::new(),
            catalog: catalog.clone(),
            default_salesperson: default_salesperson.to_string(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    /// 依序套用多個動作
    pub fn apply_all<I>(self, actions: I) -> Result<Self>
    where
        I: IntoIterator<Item = FormAction>,
    {
        actions
            .into_iter()
            .try_fold(self, |state, action| state.apply(action))
    }

    pub fn apply(self, action: FormAction) -> Result<Self> {
        let mut next = self;
        match action {
            FormAction::EditPhone(raw) => {
                next.phone = phone::normalize(&raw);
            }
            FormAction::SetField(field, value) => next.set_field(field, value)?,
            FormAction::SetCount { kind, name, qty } => {
                if !next.catalog.contains(kind, &name) {
                    return Err(SalesLogError::validation(format!(
                        "알 수 없는 {} 항목: {}",
                        kind.label(),
                        name
                    )));
                }
                check_quantity(&name, qty)?;
                let counts = match kind {
                    ItemKind::Charger => &mut next.chargers,
                    ItemKind::Ancillary => &mut next.ancillaries,
                };
                counts.insert(name, qty);
            }
            FormAction::AddExtra { name, qty } => {
                let name = name.trim().to_string();
                if name.is_empty() || qty == 0 {
                    return Err(SalesLogError::validation(
                        "기타 모델명과 수량을 확인하세요.",
                    ));
                }
                check_quantity(&name, qty)?;
                next.extras.push(ExtraItem::new(name, qty));
            }
            FormAction::RemoveExtra(index) => {
                if index >= next.extras.len() {
                    return Err(SalesLogError::validation(format!(
                        "삭제할 항목을 선택하세요. (index {})",
                        index
                    )));
                }
                next.extras.remove(index);
            }
            FormAction::ClearExtras => next.extras.clear(),
            FormAction::LoadRecord(record) => next = next.loaded(record),
            FormAction::Clear { today } => {
                next = FormState::new(today, &next.default_salesperson, &next.catalog);
            }
        }
        Ok(next)
    }

    fn set_field(&mut self, field: Field, value: String) -> Result<()> {
        match field {
            Field::Date => {
                self.date = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
                    SalesLogError::validation(format!("날짜 형식 오류 ({}): {}", value, e))
                })?;
            }
            Field::Salesperson => self.salesperson = value,
            Field::Site => self.site_name = value,
            Field::Manager => self.manager_name = value,
            Field::Remarks => self.remarks = value,
            Field::Status => self.status = value.parse()?,
            Field::Reason => self.reason = value,
        }
        Ok(())
    }

    fn loaded(self, record: SalesRecord) -> Self {
        let date = record.parsed_date().unwrap_or(self.date);
        let catalog = self.catalog;
        let mut chargers = catalog.empty_counts(ItemKind::Charger);
        let mut ancillaries = catalog.empty_counts(ItemKind::Ancillary);
        // 型錄已移除的品項直接略過
        for (name, qty) in record.chargers {
            if let Some(slot) = chargers.get_mut(&name) {
                *slot = qty;
            }
        }
        for (name, qty) in record.ancillaries {
            if let Some(slot) = ancillaries.get_mut(&name) {
                *slot = qty;
            }
        }

        Self {
            editing_id: Some(record.id),
            date,
            salesperson: record.salesperson,
            site_name: record.site_name,
            manager_name: record.manager_name,
            phone: record.phone,
            remarks: record.remarks,
            status: record.status,
            reason: record.reason,
            chargers,
            ancillaries,
            extras: record.extras,
            catalog,
            default_salesperson: self.default_salesperson,
        }
    }

    /// 收集所有輸入錯誤，一次回報
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.salesperson.trim().is_empty() {
            errors.push("영업자를 입력하세요.");
        }
        if self.site_name.trim().is_empty() {
            errors.push("현장명을 입력하세요.");
        }
        if self.manager_name.trim().is_empty() {
            errors.push("담당자를 입력하세요.");
        }
        if phone::strip_digits(&self.phone).is_empty() {
            errors.push("연락처를 입력하세요.");
        }
        if self.status == Status::Rejected && self.reason.trim().is_empty() {
            errors.push("불가 사유를 입력하세요.");
        }
        if self.remarks.trim().chars().count() > MAX_REMARKS_CHARS {
            errors.push("비고는 400자 이내로 입력하세요.");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SalesLogError::validation(errors.join(" ")))
        }
    }

    /// 驗證後組成要保存的報告
    pub fn submit(&self, id: String, now: NaiveDateTime) -> Result<SalesRecord> {
        self.validate()?;

        let chargers = self
            .catalog
            .complete_counts(ItemKind::Charger, &self.chargers)?;
        let ancillaries = self
            .catalog
            .complete_counts(ItemKind::Ancillary, &self.ancillaries)?;
        let extras: Vec<ExtraItem> = self
            .extras
            .iter()
            .filter(|e| e.is_meaningful())
            .map(|e| ExtraItem::new(e.name.trim(), e.qty))
            .collect();
        let totals = RecordTotals::compute(&chargers, &ancillaries, &extras);

        Ok(SalesRecord {
            id,
            created_at: now.format(TIMESTAMP_FORMAT).to_string(),
            date: self.date.format(DATE_FORMAT).to_string(),
            salesperson: self.salesperson.trim().to_string(),
            site_name: self.site_name.trim().to_string(),
            manager_name: self.manager_name.trim().to_string(),
            phone: phone::normalize(&self.phone),
            remarks: self.remarks.trim().to_string(),
            status: self.status,
            reason: if self.status == Status::Rejected {
                self.reason.trim().to_string()
            } else {
                String::new()
            },
            chargers,
            ancillaries,
            extras,
            totals,
        })
    }
}

fn check_quantity(name: &str, qty: u32) -> Result<()> {
    if qty > MAX_QUANTITY {
        return Err(SalesLogError::validation(format!(
            "{} 수량은 0~{} 사이여야 합니다: {}",
            name, MAX_QUANTITY, qty
        )));
    }
    Ok(())
}
