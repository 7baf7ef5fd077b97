// Store module - relatory-reports.json 的读写
//
// 文件由扫描脚本追加，这里只负责读取、删除和启动时的初始化。
// 文件没有加锁，并发写入时以最后一次写入为准。

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{CoreError, Result};

/// 回填 `data_execucao` 时使用的格式
const EXECUTED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 扫描脚本写入的一条报告记录，未知字段原样保留
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(rename = "url_executado")]
    pub executed_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "data_execucao", default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<String>,
    #[serde(rename = "caminho_html", default, skip_serializing_if = "Option::is_none")]
    pub html_path: Option<String>,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ReportRecord {
    fn matches_url(&self, url: &str) -> bool {
        self.executed_url.trim_end_matches('/') == url.trim_end_matches('/')
    }
}

#[derive(Debug, Clone)]
pub struct ReportStore {
    json_path: PathBuf,
    base_dir: PathBuf,
}

impl ReportStore {
    /// `base_dir` 用于解析记录里的相对 HTML 路径
    pub fn new(json_path: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            json_path: json_path.into(),
            base_dir: base_dir.into(),
        }
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.json_path).await.unwrap_or(false)
    }

    /// 文件不存在时创建目录和空列表，返回是否新建
    pub async fn ensure_exists(&self) -> Result<bool> {
        if self.exists().await {
            return Ok(false);
        }
        if let Some(parent) = self.json_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.json_path, "[]").await?;
        tracing::info!("{} not found, created an empty report list", self.json_path.display());
        Ok(true)
    }

    /// 严格解析整个文件
    pub async fn load(&self) -> Result<Vec<ReportRecord>> {
        let content = match fs::read_to_string(&self.json_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::StoreMissing(self.json_path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// 读取全部记录，缺少执行时间的记录用当前 UTC 时间补上（不写回文件）
    pub async fn list_all(&self) -> Result<Vec<ReportRecord>> {
        let mut records = self.load().await?;
        let now = Utc::now().format(EXECUTED_AT_FORMAT).to_string();
        for record in &mut records {
            if record.executed_at.as_deref().map_or(true, str::is_empty) {
                record.executed_at = Some(now.clone());
            }
        }
        Ok(records)
    }

    /// 按 URL 删除记录及其 HTML 文件，返回剩余记录数
    pub async fn delete_by_url(&self, url: &str) -> Result<usize> {
        let records = self.load().await?;

        let deleted = records
            .iter()
            .find(|r| r.matches_url(url))
            .cloned()
            .ok_or_else(|| CoreError::ReportNotFound(url.to_string()))?;

        let remaining: Vec<ReportRecord> =
            records.into_iter().filter(|r| !r.matches_url(url)).collect();

        if let Some(html_path) = deleted.html_path.as_deref().filter(|p| !p.is_empty()) {
            self.remove_artifact(html_path).await;
        }

        let serialized = serde_json::to_string_pretty(&remaining)?;
        fs::write(&self.json_path, serialized).await?;

        tracing::info!(
            "Deleted report for {} ({} remaining)",
            deleted.executed_url,
            remaining.len()
        );
        Ok(remaining.len())
    }

    async fn remove_artifact(&self, html_path: &str) {
        // 绝对路径会覆盖 base_dir
        let path = self.base_dir.join(html_path);
        match fs::remove_file(&path).await {
            Ok(()) => tracing::debug!("Removed HTML report {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove HTML report {}: {}", path.display(), e),
        }
    }
}
