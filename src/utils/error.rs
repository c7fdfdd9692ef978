use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesLogError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Workbook write error: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook read error: {0}")]
    XlsxReadError(#[from] calamine::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Record not found: {id}")]
    NotFound { id: String },

    #[error("Record id already exists: {id}")]
    DuplicateId { id: String },

    #[error("Export failed: {message}")]
    ExportError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Storage,
    Network,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SalesLogError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::ExportError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ValidationError { .. } | Self::NotFound { .. } | Self::DuplicateId { .. } => {
                ErrorCategory::Input
            }
            Self::IoError(_)
            | Self::SerializationError(_)
            | Self::XlsxReadError(_)
            | Self::XlsxWriteError(_) => ErrorCategory::Storage,
            Self::HttpError(_) => ErrorCategory::Network,
            Self::ZipError(_) | Self::CsvError(_) | Self::ExportError { .. } => {
                ErrorCategory::Export
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Export => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ValidationError { .. } => {
                "Fill in the missing fields and submit again".to_string()
            }
            Self::NotFound { .. } => "Run `list` to see the ids that exist".to_string(),
            Self::DuplicateId { .. } => "Retry; a new id will be allocated".to_string(),
            Self::HttpError(_) => {
                "Check the network connection and the Drive access token".to_string()
            }
            Self::ExportError { .. } => {
                "Make sure there are saved records and the export target is reachable".to_string()
            }
            Self::MissingConfigError { field } => {
                format!("Set '{}' in the config file or environment", field)
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Check the config file and command-line flags".to_string()
            }
            Self::IoError(_) => "Check that the data path exists and is writable".to_string(),
            Self::SerializationError(_) | Self::XlsxReadError(_) => {
                "The data file may be corrupted; restore it from a backup".to_string()
            }
            Self::XlsxWriteError(_) | Self::CsvError(_) | Self::ZipError(_) => {
                "Check free disk space and output directory permissions".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { message } => format!("입력 오류: {}", message),
            Self::NotFound { id } => format!("해당 ID를 찾을 수 없습니다: {}", id),
            Self::ExportError { message } => format!("내보내기 실패: {}", message),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SalesLogError>;
