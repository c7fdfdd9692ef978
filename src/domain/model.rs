use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::{Result, SalesLogError};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const MAX_QUANTITY: u32 = 999;
pub const MAX_REMARKS_CHARS: usize = 400;

pub const DEFAULT_CHARGER_MODELS: [&str; 10] = [
    "2100A", "1100A", "3050A", "3050B", "3050C", "2007CP", "2007A", "2007C", "1007B", "1030A",
];

pub const DEFAULT_ANCILLARY_ITEMS: [&str; 7] = [
    "I형 볼라드",
    "U형 볼라드",
    "기초패드(완속)",
    "기초패드(급속)",
    "캐노피(완속)",
    "캐노피(급속)",
    "바닥면도색",
];

/// 可選的充電樁型號與附帶工程品項
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub chargers: Vec<String>,
    pub ancillaries: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            chargers: DEFAULT_CHARGER_MODELS.iter().map(|s| s.to_string()).collect(),
            ancillaries: DEFAULT_ANCILLARY_ITEMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Catalog {
    /// 每個型號數量為 0 的表
    pub fn empty_counts(&self, kind: ItemKind) -> BTreeMap<String, u32> {
        self.items(kind).iter().map(|name| (name.clone(), 0)).collect()
    }

    pub fn items(&self, kind: ItemKind) -> &[String] {
        match kind {
            ItemKind::Charger => &self.chargers,
            ItemKind::Ancillary => &self.ancillaries,
        }
    }

    pub fn contains(&self, kind: ItemKind, name: &str) -> bool {
        self.items(kind).iter().any(|item| item == name)
    }

    /// 補齊缺漏的型號並拒絕型錄以外的鍵
    pub fn complete_counts(
        &self,
        kind: ItemKind,
        counts: &BTreeMap<String, u32>,
    ) -> Result<BTreeMap<String, u32>> {
        if let Some(unknown) = counts.keys().find(|name| !self.contains(kind, name)) {
            return Err(SalesLogError::validation(format!(
                "알 수 없는 {} 항목: {}",
                kind.label(),
                unknown
            )));
        }
        Ok(self
            .items(kind)
            .iter()
            .map(|name| (name.clone(), counts.get(name).copied().unwrap_or(0)))
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Charger,
    Ancillary,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Charger => "충전기",
            ItemKind::Ancillary => "부대공사",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "진행중")]
    InProgress,
    #[serde(rename = "완료")]
    Done,
    #[serde(rename = "불가")]
    Rejected,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::InProgress, Status::Done, Status::Rejected];

    pub fn label(&self) -> &'static str {
        match self {
            Status::InProgress => "진행중",
            Status::Done => "완료",
            Status::Rejected => "불가",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = SalesLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "진행중" | "in-progress" | "in_progress" => Ok(Status::InProgress),
            "완료" | "done" => Ok(Status::Done),
            "불가" | "rejected" => Ok(Status::Rejected),
            other => {
                let labels: Vec<&str> = Status::ALL.iter().map(Status::label).collect();
                Err(SalesLogError::validation(format!(
                    "진행상태는 {} 중 하나여야 합니다: {}",
                    labels.join("/"),
                    other
                )))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraItem {
    pub name: String,
    pub qty: u32,
}

impl ExtraItem {
    pub fn new(name: impl Into<String>, qty: u32) -> Self {
        Self {
            name: name.into(),
            qty,
        }
    }

    /// 名稱空白或數量為 0 的列不保存
    pub fn is_meaningful(&self) -> bool {
        !self.name.trim().is_empty() && self.qty > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordTotals {
    pub chargers_total: u32,
    pub ancillaries_total: u32,
    pub extras_total: u32,
}

/// 一筆營業訪問報告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub id: String,
    pub created_at: String,
    pub date: String,
    pub salesperson: String,
    pub site_name: String,
    pub manager_name: String,
    pub phone: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub chargers: BTreeMap<String, u32>,
    #[serde(default)]
    pub ancillaries: BTreeMap<String, u32>,
    #[serde(default)]
    pub extras: Vec<ExtraItem>,
    #[serde(default)]
    pub totals: RecordTotals,
}

impl SalesRecord {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }
}

/// 產生 `SR-<時間戳>-<序號>` 形式的 ID，序號取第一個未使用的值
pub fn next_record_id(now: NaiveDateTime, existing: &HashSet<String>) -> String {
    let stamp = now.format("%Y%m%d%H%M%S");
    // 最多 existing.len() + 1 次就會找到空位
    let mut seq: usize = 1;
    loop {
        let candidate = format!("SR-{}-{:04}", stamp, seq);
        if !existing.contains(&candidate) {
            return candidate;
        }
        seq += 1;
    }
}
