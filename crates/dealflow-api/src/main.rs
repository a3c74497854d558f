use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dealflow_api::{build_router, config::Config, state::AppState};
use dealflow_persist::MongoStoreBuilder;
use dealflow_session::{SessionService, WindowedContinuity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Dealflow assistant session API");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Initialize persistence (MongoDB)
    tracing::info!("Connecting to MongoDB");
    let store = Arc::new(
        MongoStoreBuilder::new()
            .mongodb_uri(config.mongodb_uri.clone())
            .database(config.mongodb.database.clone())
            .threads_collection(config.mongodb.threads_collection.clone())
            .users_collection(config.mongodb.users_collection.clone())
            .build()
            .await?,
    );
    tracing::info!("MongoDB connected");

    let sessions = SessionService::new(store.clone(), store)
        .with_strategy(Arc::new(WindowedContinuity::from_hours(config.session.window_hours)));
    tracing::info!("Session window: {}h", config.session.window_hours);

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), sessions));

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("OpenAPI: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
