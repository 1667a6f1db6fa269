use anyhow::Context;
use axum::http::{HeaderValue, Method, header};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use teamtrack::config::Config;
use teamtrack::db::{AppState, create_pool, queries};
use teamtrack::feed::ChangeFeed;
use teamtrack::models::CreateProfile;

#[derive(Parser)]
#[command(name = "teamtrack", version, about = "Project and hackathon team tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a user and print a fresh API key for it
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("teamtrack=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateUser { email, name } => create_user(&config, email, name),
    }
}

fn create_user(config: &Config, email: String, full_name: String) -> anyhow::Result<()> {
    let input = CreateProfile { email, full_name };
    input.validate().map_err(anyhow::Error::msg)?;

    let pool = create_pool(&config.database_path).context("opening database")?;
    let conn = pool.get()?;
    let profile = queries::create_profile(&conn, &input)?;
    let api_key = queries::create_api_key(&conn, &profile.id)?;

    tracing::info!(user_id = %profile.id, email = %profile.email, "User created");
    println!("{}", api_key);
    Ok(())
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);

    if config.cors_origins.is_empty() {
        if config.dev_mode {
            return Ok(layer.allow_origin(Any));
        }
        // Same-origin only
        return Ok(layer);
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin {}", o)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(origins))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = create_pool(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path))?;
    let state = AppState::new(pool, ChangeFeed::new(config.change_feed_capacity));

    let app = teamtrack::app(state)
        .layer(cors_layer(&config)?)
        .layer(TraceLayer::new_for_http());

    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!(
        addr = %addr,
        database = %config.database_path,
        dev_mode = config.dev_mode,
        "TeamTrack listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
