use crate::adapters::archive::BackupArchiver;
use crate::adapters::csv_export::CsvExporter;
use crate::adapters::drive::DriveExporter;
use crate::adapters::json_store::JsonFileStore;
use crate::adapters::local_storage::LocalStorage;
use crate::adapters::sheets::SheetsExporter;
use crate::adapters::xlsx_export::XlsxExporter;
use crate::adapters::xlsx_store::XlsxStore;
use crate::config::cli::{Command, ExportFormat, TargetCommand};
use crate::config::{AppConfig, Backend};
use crate::core::form::FormAction;
use crate::core::phone;
use crate::core::service::ReportService;
use crate::core::summary::{list_line, record_summary};
use crate::domain::ports::{ConfigProvider, ExportOutcome, Exporter, RecordStore, Storage};
use crate::utils::error::{Result, SalesLogError};
use chrono::Local;

/// 執行一個子命令，回傳要印到 stdout 的文字
pub async fn execute(config: AppConfig, command: Command) -> Result<String> {
    // 正規化不需要碰資料檔
    if let Command::Phone { numbers } = &command {
        return Ok(normalize_all(numbers));
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    with_backend(config, &storage, command).await
}

async fn with_backend<W: Storage>(config: AppConfig, output: &W, command: Command) -> Result<String> {
    match config.backend() {
        Backend::Json => {
            let store = JsonFileStore::new(config.data_path());
            run(&ReportService::new(store, config), output, command).await
        }
        Backend::Xlsx => {
            let store = XlsxStore::new(config.data_path(), config.catalog().clone());
            run(&ReportService::new(store, config), output, command).await
        }
    }
}

pub fn normalize_all(numbers: &[String]) -> String {
    numbers
        .iter()
        .map(|raw| phone::normalize(raw))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn run<S, W>(
    service: &ReportService<S, AppConfig>,
    output: &W,
    command: Command,
) -> Result<String>
where
    S: RecordStore,
    W: Storage,
{
    let now = Local::now().naive_local();
    let catalog = service.config().catalog().clone();

    match command {
        Command::Phone { numbers } => Ok(normalize_all(&numbers)),
        Command::Add(fields) => {
            let form = service.blank_form().apply_all(fields.actions())?;
            let record = service.create(&form, now).await?;
            Ok(format!(
                "✅ 저장 완료: {}\n{}",
                record.id,
                record_summary(&catalog, &record)
            ))
        }
        Command::Edit {
            id,
            fields,
            clear_extras,
        } => {
            let mut form = service.load_into_form(&id).await?;
            if clear_extras {
                form = form.apply(FormAction::ClearExtras)?;
            }
            let form = form.apply_all(fields.actions())?;
            let record = service.update(&form, now).await?;
            Ok(format!(
                "✏️ 수정 완료: {}\n{}",
                record.id,
                record_summary(&catalog, &record)
            ))
        }
        Command::List { query } => {
            let records = service.list(query.as_deref()).await?;
            if records.is_empty() {
                return Ok("저장된 보고서가 없습니다.".to_string());
            }
            Ok(records
                .iter()
                .map(|r| format!("{}  {}", r.id, list_line(r)))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Command::Show { id } => {
            let record = service.get(&id).await?;
            Ok(serde_json::to_string_pretty(&record)?)
        }
        Command::Delete { ids } => {
            let deleted = service.delete(&ids).await?;
            Ok(format!("🗑️ {}건 삭제", deleted))
        }
        Command::Export { target, format } => {
            let outcome = match format {
                ExportFormat::Xlsx => {
                    export_target(service, &XlsxExporter::new(catalog), target).await?
                }
                ExportFormat::Csv => export_target(service, &CsvExporter, target).await?,
            };
            let location = write_outcome(output, outcome).await?;
            Ok(format!("📁 {}", location))
        }
        Command::Upload { target } => {
            let exporter = DriveExporter::new(service.config().drive_settings()?, catalog);
            let outcome = export_target(service, &exporter, target).await?;
            Ok(format!(
                "☁️ {} -> {}",
                outcome.file_name,
                outcome.url.unwrap_or_default()
            ))
        }
        Command::Sheets { target } => {
            let config = service.config();
            let exporter = SheetsExporter::new(config.drive_settings()?, catalog)
                .with_api_base(config.sheets_api_base());
            let outcome = export_target(service, &exporter, target).await?;
            Ok(format!(
                "📊 {} -> {}",
                outcome.file_name,
                outcome.url.unwrap_or_default()
            ))
        }
        Command::Backup => {
            let archiver = BackupArchiver::new(service.config().data_path(), catalog);
            let outcome = service.backup(&archiver).await?;
            let location = write_outcome(output, outcome).await?;
            Ok(format!("🗄️ {}", location))
        }
    }
}

async fn export_target<S, E>(
    service: &ReportService<S, AppConfig>,
    exporter: &E,
    target: TargetCommand,
) -> Result<ExportOutcome>
where
    S: RecordStore,
    E: Exporter + ?Sized,
{
    match target {
        TargetCommand::Record { id } => service.export_record(&id, exporter).await,
        TargetCommand::All => service.export_all(exporter).await,
    }
}

async fn write_outcome<W: Storage>(output: &W, outcome: ExportOutcome) -> Result<String> {
    let bytes = outcome
        .bytes
        .ok_or_else(|| SalesLogError::export("exporter produced no file content"))?;
    let location = output.write_file(&outcome.file_name, &bytes).await?;
    tracing::debug!("Wrote {} bytes to {}", bytes.len(), location);
    Ok(location)
}
