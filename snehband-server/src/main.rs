//! snehband-server - registration and check-in service for Snehband Pandharpur 2025

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use snehband_common::config::AppConfig;
use snehband_common::db::init_database;
use snehband_common::export::FontSources;
use snehband_server::services::{
    CdnImageStore, DisabledImageStore, DisabledMailer, ImageStore, Mailer, SmtpMailer,
};
use snehband_server::{build_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for snehband-server
#[derive(Parser, Debug)]
#[command(name = "snehband-server")]
#[command(about = "Registration, profile administration and check-in for Snehband")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "SNEHBAND_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:5780
    #[arg(short, long, env = "SNEHBAND_BIND")]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "SNEHBAND_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snehband_server=info,snehband_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting snehband-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(database) = args.database {
        config.database = Some(database);
    }

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let mailer: Arc<dyn Mailer> = if config.smtp.is_configured() {
        info!("SMTP delivery enabled");
        Arc::new(SmtpMailer::from_config(&config.smtp)?)
    } else {
        warn!("SMTP not configured; e-mail endpoints will answer 503");
        Arc::new(DisabledMailer)
    };

    let images: Arc<dyn ImageStore> = if config.cdn.is_configured() {
        info!("Image CDN uploads enabled");
        Arc::new(CdnImageStore::from_config(&config.cdn)?)
    } else {
        warn!("Image CDN not configured; photo uploads will answer 503");
        Arc::new(DisabledImageStore)
    };

    let fonts = FontSources::load(&config.pdf)?;

    if config.auth.proxy_secret.is_none() {
        warn!("No proxy secret configured; identity headers are trusted as-is");
    }

    let bind = config.server.bind.clone();
    let state = AppState::new(pool, config, mailer, images, fonts);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("snehband-server listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
