// ZAP-Job Web API
// 触发扫描脚本、读取/删除报告记录、提供仪表盘页面

pub mod api;
pub mod config;
pub mod state;

pub use config::Config;
pub use state::AppState;
