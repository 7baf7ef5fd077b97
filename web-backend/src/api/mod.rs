use actix_files::NamedFile;
use actix_web::{web, HttpResponse, Responder};

pub mod error;
pub mod reports;
pub mod scans;

pub use error::ApiError;

use crate::state::AppState;

/// 注册所有路由（路径与扫描脚本、前端约定保持一致，不加 /api 前缀）
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/", web::get().to(home))
        .route("/health", web::get().to(health_check))
        .route("/dashboard", web::get().to(dashboard))
        .configure(reports::configure_report_routes)
        .configure(scans::configure_scan_routes);
}

/// 非 JSON 或无法解析的请求体统一返回 400
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Request must be JSON: {}", err)).into()
    })
}

async fn home() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(
        "ZAP-Job API is running. Use GET /reports for the data, or POST /start-configured-tests to run the scans.",
    )
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn dashboard(state: web::Data<AppState>) -> Result<NamedFile, ApiError> {
    NamedFile::open_async(&state.dashboard)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ApiError::DashboardMissing(state.dashboard.clone()),
            _ => ApiError::Core(e.into()),
        })
}
