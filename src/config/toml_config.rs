use crate::adapters::drive::{DriveSettings, DEFAULT_API_BASE};
use crate::adapters::sheets::DEFAULT_SHEETS_API_BASE;
use crate::domain::model::Catalog;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SalesLogError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_JSON_PATH: &str = "data/sales_records.json";
pub const DEFAULT_XLSX_PATH: &str = "영업보고서.xlsx";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_SALESPERSON: &str = "김범준";
pub const EXCEL_PATH_ENV: &str = "SR_EXCEL_PATH";
pub const DRIVE_TOKEN_ENV: &str = "DRIVE_ACCESS_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Json,
    Xlsx,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub default_salesperson: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_salesperson: DEFAULT_SALESPERSON.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveConfig {
    pub api_base: Option<String>,
    pub sheets_api_base: Option<String>,
    pub folder_id: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub export: ExportConfig,
    pub drive: Option<DriveConfig>,
    #[serde(skip)]
    resolved_data_path: String,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SalesLogError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: Self =
            toml::from_str(&processed_content).map_err(|e| SalesLogError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        // xlsx 後端的路徑可由環境變數覆蓋
        if config.storage.backend == Backend::Xlsx {
            if let Some(path) = Self::excel_path_from_env() {
                config.storage.path = Some(path);
            }
        }
        config.resolve();
        Ok(config)
    }

    fn excel_path_from_env() -> Option<String> {
        std::env::var(EXCEL_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
    }

    /// 沒有設定檔時的預設值
    pub fn defaults() -> Self {
        let mut config = Self::default();
        config.resolve();
        config
    }

    /// 替換環境變數 (例如 ${DRIVE_ACCESS_TOKEN})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;

        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
            SalesLogError::ConfigError {
                message: format!("env placeholder pattern: {}", e),
            }
        })?;

        Ok(re
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string())
    }

    /// 套用命令列覆蓋設定
    pub fn apply_overrides(
        &mut self,
        backend: Option<Backend>,
        data_path: Option<String>,
        output_path: Option<String>,
    ) {
        if let Some(backend) = backend {
            if backend != self.storage.backend && data_path.is_none() {
                // 換後端時舊路徑的副檔名不再適用
                self.storage.path = None;
            }
            self.storage.backend = backend;
        }
        if let Some(path) = data_path {
            self.storage.path = Some(path);
        }
        if let Some(output) = output_path {
            self.export.output_path = output;
        }
        self.resolve();
    }

    fn resolve(&mut self) {
        self.resolved_data_path = match self.storage.path.as_deref() {
            Some(path) if !path.trim().is_empty() => path.to_string(),
            _ => match self.storage.backend {
                Backend::Json => DEFAULT_JSON_PATH.to_string(),
                Backend::Xlsx => Self::excel_path_from_env()
                    .unwrap_or_else(|| DEFAULT_XLSX_PATH.to_string()),
            },
        };
    }

    pub fn backend(&self) -> Backend {
        self.storage.backend
    }

    /// Drive 上傳設定；權杖可由設定檔或環境變數提供
    pub fn drive_settings(&self) -> Result<DriveSettings> {
        let drive = self.drive.clone().unwrap_or_default();
        let token = drive
            .access_token
            .filter(|t| !t.trim().is_empty() && !t.starts_with("${"))
            .or_else(|| std::env::var(DRIVE_TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty());
        let token = validation::validate_required_field("drive.access_token", &token)?;

        Ok(DriveSettings {
            api_base: drive
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            folder_id: drive.folder_id,
            access_token: token.clone(),
        })
    }

    pub fn sheets_api_base(&self) -> String {
        self.drive
            .as_ref()
            .and_then(|d| d.sheets_api_base.clone())
            .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("storage.path", &self.resolved_data_path)?;
        let extensions: &[&str] = match self.storage.backend {
            Backend::Json => &["json"],
            Backend::Xlsx => &["xlsx"],
        };
        validation::validate_file_extension("storage.path", &self.resolved_data_path, extensions)?;

        validation::validate_path("export.output_path", &self.export.output_path)?;
        validation::validate_non_empty_string(
            "report.default_salesperson",
            &self.report.default_salesperson,
        )?;
        validation::validate_unique_names("catalog.chargers", &self.catalog.chargers)?;
        validation::validate_unique_names("catalog.ancillaries", &self.catalog.ancillaries)?;

        if let Some(api_base) = self.drive.as_ref().and_then(|d| d.api_base.as_deref()) {
            validation::validate_url("drive.api_base", api_base)?;
        }
        if let Some(api_base) = self.drive.as_ref().and_then(|d| d.sheets_api_base.as_deref()) {
            validation::validate_url("drive.sheets_api_base", api_base)?;
        }

        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn data_path(&self) -> &str {
        &self.resolved_data_path
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }

    fn default_salesperson(&self) -> &str {
        &self.report.default_salesperson
    }

    fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
