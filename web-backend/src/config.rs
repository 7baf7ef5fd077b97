use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 5000;
const REPORTS_JSON: &str = "reports/relatory-reports.json";
const SCAN_SCRIPT: &str = "run-zap.sh";
const DASHBOARD: &str = "dashboard.html";

/// 服务配置，启动时从环境变量（以及 .env）读取一次
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// 报告记录中相对 HTML 路径的基准目录
    pub base_dir: PathBuf,
    pub reports_json: PathBuf,
    pub scan_script: PathBuf,
    pub dashboard: PathBuf,
    /// 为空时使用宽松 CORS
    pub cors_origins: Vec<String>,
    /// 不设置则不限制扫描时长
    pub scan_timeout: Option<Duration>,
}

impl Config {
    /// 以 `base_dir` 为根的默认配置
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            reports_json: base_dir.join(REPORTS_JSON),
            scan_script: base_dir.join(SCAN_SCRIPT),
            dashboard: base_dir.join(DASHBOARD),
            base_dir,
            cors_origins: Vec::new(),
            scan_timeout: None,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_dir = match var("ZAPJOB_BASE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir().context("Failed to resolve current directory")?,
        };
        let mut config = Self::with_base_dir(base_dir);

        if let Some(bind) = var("ZAPJOB_BIND") {
            config.bind_address = bind
                .parse()
                .with_context(|| format!("Invalid ZAPJOB_BIND: {}", bind))?;
        }
        if let Some(path) = var("ZAPJOB_REPORTS_JSON") {
            config.reports_json = PathBuf::from(path);
        }
        if let Some(path) = var("ZAPJOB_SCAN_SCRIPT") {
            config.scan_script = PathBuf::from(path);
        }
        if let Some(path) = var("ZAPJOB_DASHBOARD") {
            config.dashboard = PathBuf::from(path);
        }
        if let Some(origins) = var("ZAPJOB_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(secs) = var("ZAPJOB_SCAN_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid ZAPJOB_SCAN_TIMEOUT_SECS: {}", secs))?;
            config.scan_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}
