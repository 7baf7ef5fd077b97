// ZAP-Job Core Library
// 核心功能库，包含扫描结果模型、告警分级、HTML 报告渲染、报告存储和扫描脚本调用

pub mod alerts;
pub mod report;
pub mod runner;
pub mod store;

// 重新导出常用类型
pub use alerts::{classify, Instance, RiskLevel, ScanAlert, ScanDocument, SeverityStats, Site};
pub use report::{render_html_report, render_report, RenderError};
pub use runner::{ScanOutput, ScanScript};
pub use store::{ReportRecord, ReportStore};

pub mod error {
    use std::path::PathBuf;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CoreError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Decode error: {0}")]
        Decode(#[from] serde_json::Error),

        #[error("Report store not found: {}", .0.display())]
        StoreMissing(PathBuf),

        #[error("No report found for URL: {0}")]
        ReportNotFound(String),

        #[error("Scan script not found: {}", .0.display())]
        ScriptMissing(PathBuf),

        #[error("Scan script exited with code {code}")]
        ScriptFailed {
            code: i32,
            stdout: String,
            stderr: String,
        },

        #[error("Scan script timed out after {0} seconds")]
        Timeout(u64),

        #[error("Scan finished but {} was not produced", path.display())]
        OutputMissing {
            path: PathBuf,
            stdout: String,
            stderr: String,
        },
    }

    pub type Result<T> = std::result::Result<T, CoreError>;
}
