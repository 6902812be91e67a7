//! auditdesk - internal audit management backend

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auditdesk::{
    auth::CredentialHasher,
    config::{Args, LogFormat, StoreKind},
    db::{DocumentStore, MemoryStore, MongoStore},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("auditdesk={},info", log_level).into());
    match args.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  auditdesk - Internal Audit Backend");
    info!("  version {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_COMMIT_SHORT"));
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Store: {:?}", args.store);
    info!("CORS origin: {}", args.cors_origin);
    info!("Token lifetime: {}s", args.jwt_expiry_seconds);
    info!("======================================");

    let tokens = args.signing_codec()?;

    let store: Arc<dyn DocumentStore> = match args.store {
        StoreKind::Memory => {
            warn!("Using the in-memory store: records are lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreKind::Mongo => match MongoStore::connect(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(store) => {
                info!("MongoDB connected successfully");
                Arc::new(store)
            }
            Err(e) => {
                if args.dev_mode {
                    warn!("MongoDB connection failed (dev mode, falling back to memory store): {}", e);
                    Arc::new(MemoryStore::new())
                } else {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        },
    };

    let state = Arc::new(AppState::new(args, store, tokens, CredentialHasher::default()));

    if let Some((email, password)) = state.args.bootstrap_director() {
        if state.auth.ensure_director(email, password).await? {
            info!(email, "Bootstrap director account created");
        } else {
            info!(email, "Bootstrap director account already present");
        }
    }

    server::run(state).await?;
    Ok(())
}
