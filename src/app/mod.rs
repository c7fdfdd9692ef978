// 命令列子命令到 ReportService 的接線
pub mod commands;

pub use commands::execute;
