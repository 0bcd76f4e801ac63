mod config;
mod database;
mod filter_query;
mod openapi;
mod query_sanitizer;
mod request_logging;
mod text_sanitizer;
mod validation;

use clap::{Parser, Subcommand};
use config::ApiConfig;
use database::Database;
use poem::{
    handler, listener::TcpListener, middleware::Cors, web::Redirect, Endpoint, EndpointExt,
    Route, Server,
};
use poem_openapi::OpenApiService;
use request_logging::RequestLogging;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "api-server")]
#[command(about = "Botfleet API Server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[handler]
fn index() -> Redirect {
    Redirect::temporary("/api/v1/docs")
}

fn create_app(database: Arc<Database>, config: Arc<ApiConfig>) -> impl Endpoint {
    let api_service = OpenApiService::new(
        openapi::create_combined_api(),
        "Botfleet API",
        env!("CARGO_PKG_VERSION"),
    )
    .server("/api/v1");
    let swagger = api_service.swagger_ui();

    Route::new()
        .at("/", poem::get(index))
        .nest("/api/v1/docs", swagger)
        .nest("/api/v1", api_service)
        .data(database)
        .data(config)
        .with(RequestLogging)
        .with(Cors::new())
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let cli = Cli::parse();

    // Load .env file if it exists
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    match cli.command {
        Commands::Serve => serve_command(config).await,
        Commands::Migrate => migrate_command(config).await,
    }
}

async fn open_database(config: &ApiConfig) -> Result<Database, std::io::Error> {
    match Database::new(&config.database_url).await {
        Ok(db) => {
            tracing::info!("Database initialized at {}", config.database_url);
            Ok(db)
        }
        Err(e) => {
            tracing::error!(
                "Failed to initialize database at {}: {:#}",
                config.database_url,
                e
            );
            Err(std::io::Error::other(format!(
                "Database initialization failed: {:#}",
                e
            )))
        }
    }
}

async fn serve_command(config: ApiConfig) -> Result<(), std::io::Error> {
    let addr = format!("0.0.0.0:{}", config.port);
    let database = Arc::new(open_database(&config).await?);

    tracing::info!(
        environment = %config.environment,
        filter_max_depth = config.filter_max_depth,
        "Starting Botfleet API server on {}",
        addr
    );

    let app = create_app(database, Arc::new(config));
    Server::new(TcpListener::bind(&addr)).run(app).await
}

async fn migrate_command(config: ApiConfig) -> Result<(), std::io::Error> {
    open_database(&config).await?;
    tracing::info!("Migrations applied");
    Ok(())
}
