use std::convert::Infallible;

use actix_web::{http::header, web, HttpResponse};
use futures_util::stream;
use serde::{Deserialize, Serialize};
use zapjob_core::error::CoreError;
use zapjob_core::ReportRecord;

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ScanRequest {
    /// 两个字段都必须存在且非空
    fn validate(self) -> Result<(String, String), ApiError> {
        let url = self.url.filter(|u| !u.trim().is_empty());
        let email = self.email.filter(|e| !e.trim().is_empty());
        match (url, email) {
            (Some(url), Some(email)) => Ok((url, email)),
            _ => Err(ApiError::BadRequest("URL and email are required.".to_string())),
        }
    }
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub message: String,
    pub target_url: String,
    pub email: String,
    pub bash_stdout: String,
    pub bash_stderr: String,
    pub reports: Vec<ReportRecord>,
}

pub fn configure_scan_routes(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/start-configured-tests", web::post().to(start_configured_tests))
        .route("/stream-test", web::post().to(stream_test));
}

/// 同步执行扫描脚本，结束后返回脚本输出和最新的报告列表
pub async fn start_configured_tests(
    state: web::Data<AppState>,
    req: web::Json<ScanRequest>,
) -> Result<HttpResponse, ApiError> {
    let (target_url, email) = req.into_inner().validate()?;

    tracing::info!("Triggering scan for URL: {}, email: {}", target_url, email);
    let output = state.script.run(&target_url, &email).await?;

    let reports = match state.store.load().await {
        Ok(reports) => reports,
        Err(CoreError::StoreMissing(path)) => {
            return Err(CoreError::OutputMissing {
                path,
                stdout: output.stdout,
                stderr: output.stderr,
            }
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Ok().json(ScanResponse {
        message: format!("Scan finished for {}. Reports updated!", target_url),
        target_url,
        email,
        bash_stdout: output.stdout,
        bash_stderr: output.stderr,
        reports,
    }))
}

/// 以 Server-Sent Events 逐行推送脚本输出
pub async fn stream_test(
    state: web::Data<AppState>,
    req: web::Json<ScanRequest>,
) -> Result<HttpResponse, ApiError> {
    let (target_url, email) = req.into_inner().validate()?;

    tracing::info!("Streaming scan for URL: {}, email: {}", target_url, email);
    let lines = state.script.stream(&target_url, &email).await?;

    // 响应被丢弃时 lines 随之关闭，脚本进程会被终止
    let events = stream::unfold(lines, |mut lines| async move {
        let line = lines.recv().await?;
        let event = web::Bytes::from(format!("data: {}\n\n", line));
        Some((Ok::<_, Infallible>(event), lines))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(events))
}
