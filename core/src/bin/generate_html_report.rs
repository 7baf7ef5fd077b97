use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// 将 ZAP JSON 扫描结果渲染为 HTML 报告（由扫描脚本调用）
#[derive(Parser, Debug)]
#[command(name = "generate-html-report", version)]
struct Cli {
    /// ZAP JSON 报告路径
    json_path: PathBuf,
    /// 带占位符的 HTML 模板路径
    template_path: PathBuf,
    /// 输出 HTML 路径
    output_path: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zapjob_core=info".into()),
        )
        .with_target(false)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help / --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    if zapjob_core::render_html_report(&cli.json_path, &cli.template_path, &cli.output_path) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
