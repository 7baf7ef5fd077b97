use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zapjob_web::{api, AppState, Config};

fn cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        return Cors::permissive();
    }
    origins.iter().fold(
        Cors::default().allow_any_method().allow_any_header(),
        |cors, origin| cors.allowed_origin(origin),
    )
}

#[actix_web::main]
async fn main() -> Result<()> {
    // .env 不存在时忽略
    dotenv::dotenv().ok();

    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zapjob_web=debug,zapjob_core=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::debug!("Loaded configuration: {:?}", config);

    // 初始化状态
    let state = AppState::new(&config);
    state.store.ensure_exists().await?;
    if !state.script.is_available().await {
        tracing::warn!("Scan script not found at {}", state.script.path().display());
    }

    // 启动服务器
    tracing::info!("ZAP-Job API listening on {}", config.bind_address);

    let origins = config.cors_origins.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors(&origins))
            .wrap(TracingLogger::default())
            .configure(api::configure)
    })
    .bind(config.bind_address)?
    .run()
    .await?;

    Ok(())
}
