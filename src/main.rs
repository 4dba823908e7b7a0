//! Canje Backend - session/identity service for the rewards catalog
//! Mission: Register accounts, gate access by role, manage token lifecycle

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use canje_backend::{
    auth::{AuthState, JwtHandler},
    build_app,
    mail::Mailer,
    store::Store,
};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("🚀 Canje backend starting");

    let produccion = env::var("APP_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let db_path = resolve_data_path(env::var("DB_PATH").ok(), "canje.db");
    let jwt_secret = env::var("JWT_SECRET")
        .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());
    if produccion && jwt_secret.starts_with("dev-secret") {
        warn!("⚠️  JWT_SECRET not set while running in production mode");
    }

    let frontend_origin =
        env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

    let store = Arc::new(Store::new(&db_path)?);
    let jwt = Arc::new(JwtHandler::new(jwt_secret));

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    let mailer = Mailer::desde_env(http_client);
    if mailer.is_none() {
        warn!("📭 Mail transport not configured; password resets will return debugToken");
    }

    let state = AuthState::new(store, jwt, mailer, frontend_origin.clone(), produccion);

    info!("💾 Database initialized at: {}", db_path);

    let cors = CorsLayer::new()
        .allow_origin(
            frontend_origin
                .parse::<HeaderValue>()
                .context("Invalid FRONTEND_ORIGIN")?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = build_app(state).layer(cors);

    let puerto = env::var("PORT").unwrap_or_else(|_| "4000".to_string());
    let addr = format!("0.0.0.0:{puerto}");
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filter overrides
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canje_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the manifest directory, common when running from elsewhere.
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidato = manifest_dir.join(".env");
    if candidato.exists() {
        let _ = dotenv::from_path(&candidato);
    }
}

/// Relative DB paths resolve against the manifest directory, not the
/// caller's cwd, so running from elsewhere can't create a stray empty DB.
fn resolve_data_path(env_value: Option<String>, default_filename: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let Some(raw) = env_value.filter(|v| !v.trim().is_empty()) else {
        return base.join(default_filename).to_string_lossy().to_string();
    };

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    base.join(p).to_string_lossy().to_string()
}
