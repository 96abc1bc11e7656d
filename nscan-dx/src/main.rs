//! nscan-dx (Diagnosis Service) - Brain-scan classification and history
//!
//! Accepts scan submissions, stores the image, invokes the external
//! classification endpoint, persists the diagnosis record, and serves
//! feedback and history operations over the same store.

use anyhow::{bail, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use nscan_common::config;
use nscan_common::db::init_database;
use nscan_common::signing::load_shared_secret;
use nscan_dx::services::image_store::ImageStore;
use nscan_dx::services::inference::HttpInferenceClient;
use nscan_dx::{build_router, AppState};

/// Diagnosis service command-line arguments
#[derive(Parser, Debug)]
#[command(name = "nscan-dx", version, about = "NeuroScan diagnosis service")]
struct Args {
    /// Root folder for database and image storage
    #[arg(long)]
    root_folder: Option<String>,

    /// Classification endpoint URL
    #[arg(long, env = "NSCAN_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// HTTP listen port
    #[arg(long, env = "NSCAN_PORT", default_value_t = 5810)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting NeuroScan Diagnosis Service (nscan-dx) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    // Root folder resolution: CLI > env > config file > OS default
    let root_folder =
        config::resolve_root_folder(args.root_folder.as_deref(), "NSCAN_ROOT_FOLDER")?;
    config::ensure_root_folder(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let db_path = config::database_path(&root_folder);
    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    // Shared secret signs time-limited image display URLs
    let shared_secret = load_shared_secret(&pool).await?;
    info!("✓ Loaded shared secret for display-URL signing");

    let images = ImageStore::new(config::images_dir(&root_folder), shared_secret)?;

    let Some(endpoint_url) = args.endpoint_url else {
        bail!("No classification endpoint configured (set --endpoint-url or NSCAN_ENDPOINT_URL)");
    };
    let inference = HttpInferenceClient::new(endpoint_url.clone())?;
    info!("Classification endpoint: {}", endpoint_url);

    // Create application state and router
    let state = AppState::new(pool, images, Arc::new(inference));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("nscan-dx listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
