use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

use agency_desk::config::Config;
use agency_desk::db::init_db;
use agency_desk::docs::ApiDoc;
use agency_desk::documents::AgentDocumentService;
use agency_desk::routes::{self, RateLimits};
use agency_desk::scheduling::ScheduleService;
use agency_desk::store::MySqlStore;

use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Agency Desk"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let pool = init_db(&config.database_url, config.run_migrations).await?;
    let limits = RateLimits::from_config(&config)?;

    let store = Arc::new(MySqlStore::new(pool.clone()));
    let schedules = Data::new(
        ScheduleService::new(store.clone(), store.clone())
            .with_report_window(config.report_window_days),
    );
    let agents = Data::new(AgentDocumentService::new(store.clone(), store.clone()));
    let store_data = Data::from(store);

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(config_data.clone())
            .app_data(store_data.clone())
            .app_data(schedules.clone())
            .app_data(agents.clone())
            .service(index)
            // auth + protected routes with rate limiting
            .configure(|cfg| routes::configure::<MySqlStore>(cfg, &config_data, &limits))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
