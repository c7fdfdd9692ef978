use anyhow::Context;
use clap::Parser;
use sales_log::app;
use sales_log::config::cli::Cli;
use sales_log::utils::error::{ErrorSeverity, SalesLogError};
use sales_log::utils::{logger, validation::Validate};
use sales_log::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI args: {:?}", cli);

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => AppConfig::defaults(),
    };
    config.apply_overrides(cli.backend, cli.data_path.clone(), cli.output.clone());

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match app::execute(config, cli.command).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => report_failure(&e),
    }

    Ok(())
}

fn report_failure(e: &SalesLogError) {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
}
