use actix_web::{web, App, HttpServer};
use clap::Parser;
use maxcrm::ai::processor::TurnProcessor;
use maxcrm::api::middleware::TenantContext;
use maxcrm::cli::{
    commands::{Cli, Commands},
    run_cli,
};
use maxcrm::config::AppConfig;
use maxcrm::db;
use maxcrm::llm::ProviderFactory;
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        run_cli(cli.command, cli.config).await;
        return Ok(());
    }

    info!("Starting Max CRM Server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let db_pool = match db::get_connection(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let llm_provider = match ProviderFactory::create_default(&config) {
        Some(p) => p,
        None => {
            error!("Failed to initialize LLM provider from config.yaml mapping");
            std::process::exit(1);
        }
    };

    let processor = web::Data::new(TurnProcessor::from_config(
        &config,
        db_pool.clone(),
        llm_provider.clone(),
    ));

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(llm_provider.clone()))
            .app_data(processor.clone())
            .wrap(TenantContext)
            .configure(maxcrm::api::routes::configure)
            .configure(maxcrm::api::routes_ai::configure)
            .configure(maxcrm::api::routes_tts::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
