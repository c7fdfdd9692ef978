use calamine::{open_workbook_auto, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use sales_log::core::form::{Field, FormAction, FormState};
use sales_log::core::summary::record_summary;
use sales_log::core::{ConfigProvider, RecordStore, Status};
use sales_log::domain::model::ItemKind;
use sales_log::{
    BackupArchiver, CsvExporter, JsonFileStore, LocalStorage, ReportService, SalesLogError,
    XlsxExporter, XlsxStore,
};
use sales_log::core::Storage;
use std::io::Read;
use tempfile::TempDir;

mod common;
use common::TestConfig;

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 26)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn visit<S: RecordStore>(service: &ReportService<S, TestConfig>, site: &str) -> FormState {
    service
        .blank_form()
        .apply_all([
            FormAction::SetField(Field::Date, "2025-08-26".to_string()),
            FormAction::SetField(Field::Site, site.to_string()),
            FormAction::SetField(Field::Manager, "이담당".to_string()),
            FormAction::EditPhone("010 9876 5432".to_string()),
            FormAction::SetCount {
                kind: ItemKind::Charger,
                name: "2100A".to_string(),
                qty: 2,
            },
            FormAction::SetCount {
                kind: ItemKind::Ancillary,
                name: "바닥면도색".to_string(),
                qty: 1,
            },
            FormAction::AddExtra {
                name: "신형 7kW".to_string(),
                qty: 3,
            },
        ])
        .unwrap()
}

async fn crud_workflow<S: RecordStore>(service: ReportService<S, TestConfig>) {
    let first = service.create(&visit(&service, "강남 현장"), at(9)).await.unwrap();
    let second = service.create(&visit(&service, "부산 현장"), at(9)).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(first.phone, "010-9876-5432");
    assert_eq!(first.totals.chargers_total, 2);
    assert_eq!(first.totals.ancillaries_total, 1);
    assert_eq!(first.totals.extras_total, 3);

    let all = service.list(None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(service.list(Some("부산")).await.unwrap().len(), 1);

    // 載入、改狀態為不可並填原因
    let form = service
        .load_into_form(&first.id)
        .await
        .unwrap()
        .apply_all([
            FormAction::SetField(Field::Status, "불가".to_string()),
            FormAction::SetField(Field::Reason, "예산 부족".to_string()),
            FormAction::ClearExtras,
        ])
        .unwrap();
    let updated = service.update(&form, at(11)).await.unwrap();
    assert_eq!(updated.id, first.id);

    let reloaded = service.get(&first.id).await.unwrap();
    assert_eq!(reloaded.status, Status::Rejected);
    assert_eq!(reloaded.reason, "예산 부족");
    assert!(reloaded.extras.is_empty());
    assert_eq!(reloaded.chargers["2100A"], 2);
    assert!(record_summary(service.config().catalog(), &reloaded).contains("2100A"));

    assert_eq!(service.delete(&[second.id.clone()]).await.unwrap(), 1);
    assert_eq!(service.list(None).await.unwrap().len(), 1);
    assert!(matches!(
        service.get(&second.id).await,
        Err(SalesLogError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_json_store_workflow() {
    let dir = TempDir::new().unwrap();
    let config = TestConfig::new(dir.path().join("data").join("sales_records.json"));
    let store = JsonFileStore::new(config.data_path.clone());

    crud_workflow(ReportService::new(store, config)).await;

    let raw = std::fs::read_to_string(dir.path().join("data").join("sales_records.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_xlsx_store_workflow() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("영업보고서.xlsx");
    let config = TestConfig::new(&path);
    let store = XlsxStore::new(&path, config.catalog.clone());

    crud_workflow(ReportService::new(store, config)).await;

    let mut workbook = open_workbook_auto(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Reports".to_string()]);
    let range = workbook.worksheet_range("Reports").unwrap();
    // 表頭加一筆資料
    assert_eq!(range.height(), 2);
}

#[tokio::test]
async fn test_rejected_without_reason_is_refused() {
    let dir = TempDir::new().unwrap();
    let config = TestConfig::new(dir.path().join("records.json"));
    let service = ReportService::new(JsonFileStore::new(config.data_path.clone()), config);

    let form = visit(&service, "대전 현장")
        .apply(FormAction::SetField(Field::Status, "rejected".to_string()))
        .unwrap();
    let err = service.create(&form, at(9)).await.unwrap_err();
    assert!(matches!(err, SalesLogError::ValidationError { .. }));
    assert!(service.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_exports_and_backup_written_to_output() {
    let dir = TempDir::new().unwrap();
    let config = TestConfig::new(dir.path().join("records.json"));
    let output = LocalStorage::new(config.output_path.clone());
    let catalog = config.catalog.clone();
    let data_path = config.data_path.clone();
    let service = ReportService::new(JsonFileStore::new(data_path.clone()), config);

    let record = service.create(&visit(&service, "인천 현장"), at(9)).await.unwrap();

    let workbook = service
        .export_record(&record.id, &XlsxExporter::new(catalog.clone()))
        .await
        .unwrap();
    assert_eq!(workbook.file_name, "영업보고서_2025-08-26_인천 현장.xlsx");
    let written = output
        .write_file(&workbook.file_name, &workbook.bytes.unwrap())
        .await
        .unwrap();
    assert!(std::path::Path::new(&written).exists());

    let csv = service.export_all(&CsvExporter).await.unwrap();
    let csv_text = String::from_utf8(csv.bytes.unwrap()).unwrap();
    assert!(csv_text.contains("인천 현장"));
    assert!(csv_text.contains("010-9876-5432"));

    let backup = service
        .backup(&BackupArchiver::new(data_path, catalog))
        .await
        .unwrap();
    assert!(backup.file_name.starts_with("영업보고서_백업_"));
    assert!(backup.file_name.ends_with(".zip"));

    let cursor = std::io::Cursor::new(backup.bytes.unwrap());
    let mut archive = zip::ZipArchive::new(cursor).unwrap();
    assert_eq!(archive.len(), 2);

    let mut data_file = archive.by_name("records.json").unwrap();
    let mut content = String::new();
    data_file.read_to_string(&mut content).unwrap();
    assert!(content.contains(&record.id));
}

#[tokio::test]
async fn test_export_with_path_like_site_stays_in_output() {
    let dir = TempDir::new().unwrap();
    let config = TestConfig::new(dir.path().join("records.json"));
    let output_dir = config.output_path.clone();
    let output = LocalStorage::new(output_dir.clone());
    let catalog = config.catalog.clone();
    let service = ReportService::new(JsonFileStore::new(config.data_path.clone()), config);

    let record = service
        .create(&visit(&service, "../../escaped"), at(9))
        .await
        .unwrap();

    let workbook = service
        .export_record(&record.id, &XlsxExporter::new(catalog))
        .await
        .unwrap();
    let csv = service.export_record(&record.id, &CsvExporter).await.unwrap();
    assert_eq!(workbook.file_name, "영업보고서_2025-08-26_.._.._escaped.xlsx");
    assert_eq!(csv.file_name, "영업보고서_2025-08-26_.._.._escaped.csv");

    for outcome in [workbook, csv] {
        let written = output
            .write_file(&outcome.file_name, &outcome.bytes.unwrap())
            .await
            .unwrap();
        let written = std::path::Path::new(&written);
        assert!(written.exists());
        assert_eq!(written.parent().unwrap(), std::path::Path::new(&output_dir));
    }
    assert!(!dir.path().parent().unwrap().join("escaped").exists());
}
