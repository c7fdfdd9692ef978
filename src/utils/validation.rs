use crate::utils::error::{Result, SalesLogError};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: impl Into<String>) -> SalesLogError {
    SalesLogError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(field_name, url_str, format!("Invalid URL format: {}", e))),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

/// 檢查資料檔副檔名是否符合儲存後端
pub fn validate_file_extension(
    field_name: &str,
    file: &str,
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(invalid(
            field_name,
            file,
            format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        )),
        None => Err(invalid(field_name, file, "File has no extension")),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| SalesLogError::MissingConfigError {
            field: field_name.to_string(),
        })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be blank"));
    }
    Ok(())
}

/// 品項清單不可為空，也不可重複
pub fn validate_unique_names(field_name: &str, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(invalid(field_name, "", "List cannot be empty"));
    }

    let mut seen = HashSet::new();
    for name in names {
        validate_non_empty_string(field_name, name)?;
        if !seen.insert(name.as_str()) {
            return Err(invalid(field_name, name.as_str(), "Duplicate entry"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("drive.api_base", "https://www.googleapis.com").is_ok());
        assert!(validate_url("drive.api_base", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("drive.api_base", "").is_err());
        assert!(validate_url("drive.api_base", "invalid-url").is_err());
        assert!(validate_url("drive.api_base", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("storage.path", "data/records.json", &["json"]).is_ok());
        assert!(validate_file_extension("storage.path", "영업보고서.XLSX", &["xlsx"]).is_ok());
        assert!(validate_file_extension("storage.path", "records.csv", &["json"]).is_err());
        assert!(validate_file_extension("storage.path", "records", &["json"]).is_err());
    }

    #[test]
    fn test_validate_unique_names() {
        let names = vec!["2100A".to_string(), "1100A".to_string()];
        assert!(validate_unique_names("catalog.chargers", &names).is_ok());

        let dup = vec!["2100A".to_string(), "2100A".to_string()];
        assert!(validate_unique_names("catalog.chargers", &dup).is_err());
        assert!(validate_unique_names("catalog.chargers", &[]).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let token: Option<String> = None;
        assert!(matches!(
            validate_required_field("drive.access_token", &token),
            Err(SalesLogError::MissingConfigError { .. })
        ));
    }
}
