use std::path::PathBuf;

use zapjob_core::{ReportStore, ScanScript};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub store: ReportStore,
    pub script: ScanScript,
    pub dashboard: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            store: ReportStore::new(&config.reports_json, &config.base_dir),
            script: ScanScript::new(&config.scan_script).with_timeout(config.scan_timeout),
            dashboard: config.dashboard.clone(),
        }
    }
}
