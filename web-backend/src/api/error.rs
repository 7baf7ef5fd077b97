use std::path::{Path, PathBuf};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::{json, Value};
use thiserror::Error;
use zapjob_core::error::CoreError;

/// 所有接口的错误都转换为带 `error` 和 `message` 字段的 JSON
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Dashboard not found: {}", .0.display())]
    DashboardMissing(PathBuf),

    #[error(transparent)]
    Core(#[from] CoreError),
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl ApiError {
    fn body(&self) -> Value {
        match self {
            ApiError::BadRequest(reason) => json!({
                "error": reason,
                "message": "Send a JSON body with non-empty \"url\" and \"email\" fields."
            }),
            ApiError::DashboardMissing(path) => json!({
                "error": "Dashboard not found.",
                "expected_path": path.display().to_string(),
                "message": "Check that the dashboard HTML file exists at the configured path."
            }),
            ApiError::Core(err) => match err {
                CoreError::StoreMissing(path) => json!({
                    "error": format!("{} not found.", file_name(path)),
                    "expected_json_path": path.display().to_string(),
                    "message": "Run POST /start-configured-tests to generate the reports."
                }),
                CoreError::ReportNotFound(url) => json!({
                    "error": "Report not found.",
                    "message": format!("No report found for URL: {}", url)
                }),
                CoreError::ScriptMissing(path) => json!({
                    "error": "Scan script not found.",
                    "expected_path": path.display().to_string(),
                    "message": "Check that the scan script is mounted at the configured path and is executable."
                }),
                CoreError::ScriptFailed { code, stdout, stderr } => json!({
                    "error": format!("Error running scan script (exit code {}).", code),
                    "message": "The scan script reported a problem. Check the error output.",
                    "stdout": stdout,
                    "stderr": stderr
                }),
                CoreError::Timeout(secs) => json!({
                    "error": format!("Scan script timed out after {} seconds.", secs),
                    "message": "The scan was stopped. Increase ZAPJOB_SCAN_TIMEOUT_SECS for long scans."
                }),
                CoreError::OutputMissing { path, stdout, stderr } => json!({
                    "error": format!("Script finished, but {} was not found or generated.", file_name(path)),
                    "expected_json_path": path.display().to_string(),
                    "bash_stdout": stdout,
                    "bash_stderr": stderr,
                    "message": "Check that the scan script creates or updates the JSON file in the expected directory."
                }),
                CoreError::Decode(e) => json!({
                    "error": "Error decoding the reports JSON file.",
                    "message": format!("Check the JSON file format. It may have been generated incorrectly by the scan script: {}", e)
                }),
                CoreError::Io(e) => json!({
                    "error": "Internal error.",
                    "message": e.to_string()
                }),
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DashboardMissing(_) => StatusCode::NOT_FOUND,
            ApiError::Core(err) => match err {
                CoreError::StoreMissing(_)
                | CoreError::ReportNotFound(_)
                | CoreError::ScriptMissing(_) => StatusCode::NOT_FOUND,
                CoreError::ScriptFailed { .. }
                | CoreError::Timeout(_)
                | CoreError::OutputMissing { .. }
                | CoreError::Decode(_)
                | CoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(self.body())
    }
}
