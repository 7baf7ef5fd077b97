// Alerts module - ZAP 扫描结果模型与告警分级

use serde::{Deserialize, Deserializer, Serialize};

/// ZAP JSON 报告（只读取渲染需要的字段）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanDocument {
    #[serde(rename = "@generated", default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<String>,
    #[serde(default)]
    pub site: Vec<Site>,
}

impl ScanDocument {
    /// 第一个 site 的告警列表，没有 site 时为空
    pub fn alerts(&self) -> &[ScanAlert] {
        self.site
            .first()
            .map(|site| site.alerts.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Site {
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub alerts: Vec<ScanAlert>,
}

/// 单条告警
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanAlert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub cweid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub wascid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub riskcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub riskdesc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl ScanAlert {
    /// riskcode 缺失时按 "0" 处理
    pub fn risk_code(&self) -> &str {
        self.riskcode.as_deref().unwrap_or("0")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// ZAP 对这些字段有时输出字符串，有时输出数字
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::String(s)) => Some(s),
        Some(StringOrNumber::Number(n)) => Some(n.to_string()),
        None => None,
    })
}

/// 四个风险等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Info,
}

impl RiskLevel {
    /// 只认 "3"/"2"/"1"，其余（包括 "0" 和文本值）一律归为 info
    pub fn from_code(code: &str) -> Self {
        match code {
            "3" => RiskLevel::High,
            "2" => RiskLevel::Medium,
            "1" => RiskLevel::Low,
            _ => RiskLevel::Info,
        }
    }

    /// CSS class 与前端过滤用的名字
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
            RiskLevel::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityStats {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub total: usize,
}

impl SeverityStats {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
            RiskLevel::Info => self.info += 1,
        }
        self.total += 1;
    }
}

/// 统计各风险等级的告警数量
pub fn classify(alerts: &[ScanAlert]) -> SeverityStats {
    alerts.iter().fold(SeverityStats::default(), |mut stats, alert| {
        stats.record(RiskLevel::from_code(alert.risk_code()));
        stats
    })
}
