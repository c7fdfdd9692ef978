use crate::config::toml_config::Backend;
use crate::core::form::{Field, FormAction};
use crate::domain::model::ItemKind;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "sales-log")]
#[command(about = "Sales visit reports with Korean phone normalization")]
pub struct Cli {
    #[arg(long, global = true, help = "TOML config file")]
    pub config: Option<String>,

    #[arg(long, value_enum, global = true)]
    pub backend: Option<Backend>,

    #[arg(long, global = true, help = "Data file (JSON or XLSX)")]
    pub data_path: Option<String>,

    #[arg(long, global = true, help = "Output directory for exports and backups")]
    pub output: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 正規化電話號碼
    Phone {
        #[arg(required = true)]
        numbers: Vec<String>,
    },
    /// 新增報告
    Add(RecordArgs),
    /// 載入報告、套用變更後存回
    Edit {
        id: String,
        #[command(flatten)]
        fields: RecordArgs,
        #[arg(long, help = "Drop existing extra models before applying --extra")]
        clear_extras: bool,
    },
    List {
        #[arg(short, long)]
        query: Option<String>,
    },
    Show {
        id: String,
    },
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Export {
        #[command(subcommand)]
        target: TargetCommand,
        #[arg(long, value_enum, default_value = "xlsx", global = true)]
        format: ExportFormat,
    },
    /// 上傳 XLSX 到 Google Drive
    Upload {
        #[command(subcommand)]
        target: TargetCommand,
    },
    /// 直接建立 Google 試算表
    Sheets {
        #[command(subcommand)]
        target: TargetCommand,
    },
    /// 資料檔與總表打包成 ZIP
    Backup,
}

#[derive(Debug, Clone, Subcommand)]
pub enum TargetCommand {
    Record { id: String },
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RecordArgs {
    #[arg(long, help = "Visit date (YYYY-MM-DD)")]
    pub date: Option<String>,

    #[arg(long)]
    pub salesperson: Option<String>,

    #[arg(long)]
    pub site: Option<String>,

    #[arg(long)]
    pub manager: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long, help = "진행중 | 완료 | 불가")]
    pub status: Option<String>,

    #[arg(long)]
    pub reason: Option<String>,

    #[arg(long)]
    pub remarks: Option<String>,

    #[arg(long = "charger", value_name = "MODEL=QTY", value_parser = parse_quantity_pair)]
    pub chargers: Vec<(String, u32)>,

    #[arg(long = "ancillary", value_name = "ITEM=QTY", value_parser = parse_quantity_pair)]
    pub ancillaries: Vec<(String, u32)>,

    #[arg(long = "extra", value_name = "MODEL=QTY", value_parser = parse_quantity_pair)]
    pub extras: Vec<(String, u32)>,
}

impl RecordArgs {
    /// 轉成表單動作；狀態先於不可能原因套用
    pub fn actions(&self) -> Vec<FormAction> {
        let mut actions = Vec::new();

        let fields = [
            (Field::Date, &self.date),
            (Field::Salesperson, &self.salesperson),
            (Field::Site, &self.site),
            (Field::Manager, &self.manager),
            (Field::Status, &self.status),
            (Field::Reason, &self.reason),
            (Field::Remarks, &self.remarks),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                actions.push(FormAction::SetField(field, value.clone()));
            }
        }

        if let Some(phone) = &self.phone {
            actions.push(FormAction::EditPhone(phone.clone()));
        }

        for (name, qty) in &self.chargers {
            actions.push(FormAction::SetCount {
                kind: ItemKind::Charger,
                name: name.clone(),
                qty: *qty,
            });
        }
        for (name, qty) in &self.ancillaries {
            actions.push(FormAction::SetCount {
                kind: ItemKind::Ancillary,
                name: name.clone(),
                qty: *qty,
            });
        }
        for (name, qty) in &self.extras {
            actions.push(FormAction::AddExtra {
                name: name.clone(),
                qty: *qty,
            });
        }

        actions
    }
}

/// 解析 `NAME=QTY`，名稱本身可以含 `=`，以最後一個為準
pub fn parse_quantity_pair(raw: &str) -> Result<(String, u32), String> {
    let (name, qty) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=QTY, got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{}'", raw));
    }
    let qty = qty
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid quantity in '{}': {}", raw, e))?;

    Ok((name.to_string(), qty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_pair() {
        assert_eq!(
            parse_quantity_pair("2100A=3"),
            Ok(("2100A".to_string(), 3))
        );
        assert_eq!(
            parse_quantity_pair(" 분전반 = 12 "),
            Ok(("분전반".to_string(), 12))
        );
        assert_eq!(
            parse_quantity_pair("A=B=1"),
            Ok(("A=B".to_string(), 1))
        );
        assert!(parse_quantity_pair("2100A").is_err());
        assert!(parse_quantity_pair("=3").is_err());
        assert!(parse_quantity_pair("2100A=-1").is_err());
    }

    #[test]
    fn test_parse_sheets_command() {
        let cli = Cli::try_parse_from(["sales-log", "sheets", "record", "SR-1"]).unwrap();
        match cli.command {
            Command::Sheets {
                target: TargetCommand::Record { id },
            } => assert_eq!(id, "SR-1"),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["sales-log", "sheets"]).is_err());
    }

    #[test]
    fn test_parse_add_command() {
        let cli = Cli::try_parse_from([
            "sales-log",
            "--backend",
            "xlsx",
            "add",
            "--site",
            "테스트 현장",
            "--phone",
            "01012345678",
            "--charger",
            "2100A=2",
            "--extra",
            "신형=1",
        ])
        .unwrap();

        assert_eq!(cli.backend, Some(Backend::Xlsx));
        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.site.as_deref(), Some("테스트 현장"));
        assert_eq!(args.chargers, vec![("2100A".to_string(), 2)]);
        assert_eq!(args.actions().len(), 4);
    }

    #[test]
    fn test_parse_export_with_trailing_format() {
        let cli =
            Cli::try_parse_from(["sales-log", "export", "all", "--format", "csv", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Export { target, format } => {
                assert!(matches!(target, TargetCommand::All));
                assert_eq!(format, ExportFormat::Csv);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["sales-log", "export", "record", "SR-1"]).unwrap();
        match cli.command {
            Command::Export { target, format } => {
                assert!(matches!(target, TargetCommand::Record { ref id } if id == "SR-1"));
                assert_eq!(format, ExportFormat::Xlsx);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_status_before_reason() {
        let args = RecordArgs {
            reason: Some("예산".to_string()),
            status: Some("불가".to_string()),
            ..Default::default()
        };
        let actions = args.actions();
        assert!(matches!(actions[0], FormAction::SetField(Field::Status, _)));
        assert!(matches!(actions[1], FormAction::SetField(Field::Reason, _)));
    }

    #[test]
    fn test_phone_requires_numbers() {
        assert!(Cli::try_parse_from(["sales-log", "phone"]).is_err());
    }
}
