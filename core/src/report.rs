// Report module - 将 ZAP JSON 结果渲染为静态 HTML 报告
//
// 模板是不透明的 HTML 文件，只通过三个注释占位符做纯文本替换。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::alerts::{classify, RiskLevel, ScanAlert, ScanDocument, SeverityStats};

pub const DATE_PLACEHOLDER: &str = "<!-- ZAP_SCAN_DATE_PLACEHOLDER -->";
pub const STATS_PLACEHOLDER: &str = "<!-- ZAP_STATS_PLACEHOLDER -->";
pub const ALERTS_PLACEHOLDER: &str = "<!-- ZAP_ALERTS_LIST_PLACEHOLDER -->";

/// ZAP 的 `@generated` 格式，例如 `Mon, 21 Jul 2025 15:43:23 -0300`
const ZAP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";
pub const REPORT_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub const NO_INSTANCES_ITEM: &str = "<li>No specific URL found</li>";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("'{}' is not valid JSON: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error on '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// 渲染报告并写入 `output_path`。
///
/// 所有错误都在这里记录日志并转换成 `false`，调用方（CLI 或扫描脚本）不会因此崩溃。
pub fn render_html_report(json_path: &Path, template_path: &Path, output_path: &Path) -> bool {
    match try_render_html_report(json_path, template_path, output_path) {
        Ok(()) => {
            tracing::info!("Final HTML report generated at: {}", output_path.display());
            true
        }
        Err(RenderError::NotFound(missing)) => {
            tracing::error!(
                "File not found: '{}'. Check the paths: JSON '{}', HTML template '{}'",
                missing.display(),
                json_path.display(),
                template_path.display()
            );
            false
        }
        Err(RenderError::InvalidJson { path, source }) => {
            tracing::error!("The file '{}' is not valid JSON: {}", path.display(), source);
            false
        }
        Err(e) => {
            tracing::error!("An unexpected error occurred: {}", e);
            false
        }
    }
}

pub fn try_render_html_report(
    json_path: &Path,
    template_path: &Path,
    output_path: &Path,
) -> Result<(), RenderError> {
    let raw = read_input(json_path)?;
    let template = read_input(template_path)?;

    let document: ScanDocument =
        serde_json::from_str(&raw).map_err(|source| RenderError::InvalidJson {
            path: json_path.to_path_buf(),
            source,
        })?;

    let html = render_report(&document, &template);

    fs::write(output_path, html).map_err(|source| RenderError::Io {
        path: output_path.to_path_buf(),
        source,
    })
}

fn read_input(path: &Path) -> Result<String, RenderError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => RenderError::NotFound(path.to_path_buf()),
        _ => RenderError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// 将三个片段替换进模板
pub fn render_report(document: &ScanDocument, template: &str) -> String {
    let alerts = document.alerts();
    let stats = classify(alerts);
    let scan_date = html_escape(&scan_date(document.generated.as_deref(), Local::now()));

    // 告警文本已转义，不可能再包含占位符，所以告警列表最后替换
    template
        .replace(DATE_PLACEHOLDER, &scan_date)
        .replace(STATS_PLACEHOLDER, &stats_fragment(&stats))
        .replace(ALERTS_PLACEHOLDER, &alerts_fragment(alerts))
}

/// 解析成功则重新格式化，解析失败原样返回，缺失则使用当前时间
pub fn scan_date(generated: Option<&str>, now: DateTime<Local>) -> String {
    match generated.filter(|raw| !raw.is_empty()) {
        Some(raw) => match DateTime::parse_from_str(raw, ZAP_DATE_FORMAT) {
            Ok(parsed) => parsed.format(REPORT_DATE_FORMAT).to_string(),
            Err(_) => raw.to_string(),
        },
        None => now.format(REPORT_DATE_FORMAT).to_string(),
    }
}

pub fn stats_fragment(stats: &SeverityStats) -> String {
    format!(
        r#"
            <div class="stat-card">
                <h3>Total Alerts</h3>
                <p>{total}</p>
            </div>
            <div class="stat-card">
                <h3>High Risk</h3>
                <p class="high">{high}</p>
            </div>
            <div class="stat-card">
                <h3>Medium Risk</h3>
                <p class="medium">{medium}</p>
            </div>
            <div class="stat-card">
                <h3>Low Risk</h3>
                <p class="low">{low}</p>
            </div>
            <div class="stat-card">
                <h3>Informational</h3>
                <p class="info">{info}</p>
            </div>
        "#,
        total = stats.total,
        high = stats.high,
        medium = stats.medium,
        low = stats.low,
        info = stats.info,
    )
}

pub fn alerts_fragment(alerts: &[ScanAlert]) -> String {
    if alerts.is_empty() {
        return r#"
                <div class="empty-state" id="empty-message-no-alerts">
                    <h3>No vulnerabilities found</h3>
                    <p>The scan did not identify any security issues.</p>
                </div>
            "#
        .to_string();
    }

    alerts.iter().map(alert_fragment).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskBadge {
    pub level: RiskLevel,
    pub label: &'static str,
}

impl RiskBadge {
    fn lookup(key: &str) -> Option<Self> {
        let (level, label) = match key {
            "3" | "High" => (RiskLevel::High, "High"),
            "2" | "Medium" => (RiskLevel::Medium, "Medium"),
            "1" | "Low" => (RiskLevel::Low, "Low"),
            "0" | "Informational" => (RiskLevel::Info, "Informational"),
            _ => return None,
        };
        Some(Self { level, label })
    }

    /// 先查 riskcode，再查 riskdesc 的第一个单词，都不认识时显示 Unknown
    pub fn resolve(alert: &ScanAlert) -> Self {
        Self::lookup(alert.risk_code())
            .or_else(|| {
                let desc = alert.riskdesc.as_deref().unwrap_or("");
                Self::lookup(desc.split(' ').next().unwrap_or(""))
            })
            .unwrap_or(Self {
                level: RiskLevel::Info,
                label: "Unknown",
            })
    }
}

fn alert_fragment(alert: &ScanAlert) -> String {
    let badge = RiskBadge::resolve(alert);
    let class = badge.level.as_str();

    let mut instances_html: String = alert
        .instances
        .iter()
        .map(|instance| {
            let uri = instance.uri.as_deref().unwrap_or("#");
            let method = instance.method.as_deref().unwrap_or("GET");
            format!(
                r#"
                        <li><strong>URI:</strong> {} ({})</li>
                    "#,
                link(uri),
                html_escape(method)
            )
        })
        .collect();
    if instances_html.is_empty() {
        instances_html = NO_INSTANCES_ITEM.to_string();
    }

    let reference_html = match alert.reference.as_deref().filter(|r| !r.is_empty()) {
        Some(reference) => format!(
            r#"
                    <div class="alert-section">
                        <h4>Reference</h4>
                        <p>{}</p>
                    </div>
                "#,
            link(reference)
        ),
        None => String::new(),
    };

    format!(
        r#"
                    <div class="alert alert-{class}" data-riskcode="{class}">
                        <div class="alert-header">
                            <h3 class="alert-title">{name}</h3>
                            <span class="alert-risk risk-{class}">{label}</span>
                        </div>
                        <div class="alert-body">
                            <div class="alert-section">
                                <h4>Description</h4>
                                <p>{description}</p>
                            </div>
                            <div class="alert-extra" style="display:none">
                                <div class="alert-section">
                                    <h4>Solution</h4>
                                    <p>{solution}</p>
                                </div>
                                <div class="alert-section">
                                    <h4>CWE ID:</h4>
                                    <p>{cweid}</p>
                                </div>
                                <div class="alert-section">
                                    <h4>WASC ID:</h4>
                                    <p>{wascid}</p>
                                </div>
                                <div class="alert-section">
                                    <h4>Affected URLs ({count})</h4>
                                    <ul class="url-list">
                                        {instances_html}
                                    </ul>
                                </div>
                                {reference_html}
                            </div>
                            <button class="ver-mais-btn">Show more ▼</button>
                        </div>
                    </div>
                "#,
        class = class,
        label = badge.label,
        name = html_escape(alert.name.as_deref().unwrap_or("Unnamed alert")),
        description = html_escape(
            alert
                .description
                .as_deref()
                .unwrap_or("No description available.")
        ),
        solution = html_escape(
            alert
                .solution
                .as_deref()
                .unwrap_or("No recommended solution available.")
        ),
        cweid = html_escape(alert.cweid.as_deref().unwrap_or("N/A")),
        wascid = html_escape(alert.wascid.as_deref().unwrap_or("N/A")),
        count = alert.instances.len(),
        instances_html = instances_html,
        reference_html = reference_html,
    )
}

/// 只有 http/https 才生成可点击链接，其余协议按纯文本输出
fn link(url: &str) -> String {
    let escaped = html_escape(url);
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        format!(r#"<a href="{0}" target="_blank">{0}</a>"#, escaped)
    } else {
        escaped
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
