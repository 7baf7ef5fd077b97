use actix_web::{web, HttpResponse};

use super::ApiError;
use crate::state::AppState;

pub fn configure_report_routes(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/reports", web::get().to(get_reports))
        // URL 本身包含 `/`，因此匹配剩余的整个路径
        .route("/del-reports/{url:.*}", web::delete().to(delete_report));
}

/// 返回 relatory-reports.json 的当前内容
pub async fn get_reports(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reports = state.store.list_all().await?;
    Ok(HttpResponse::Ok().json(reports))
}

/// 删除指定 URL 的报告及其 HTML 文件
pub async fn delete_report(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let url = path.into_inner();
    let remaining = state.store.delete_by_url(&url).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Report for {} removed successfully.", url),
        "remaining_reports": remaining
    })))
}
