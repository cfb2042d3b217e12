use std::{net::SocketAddr, sync::Arc};

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use configs::{AppConfig, CorsConfig};
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth};
use service::auth::{repo::seaorm::SeaOrmAuthRepository, AuthConfig, AuthService};

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// One credentialed origin; wildcards are not allowed together with credentials.
pub fn build_cors(cfg: &CorsConfig) -> Result<CorsLayer, StartupError> {
    let origin = HeaderValue::from_str(&cfg.allowed_origin)
        .map_err(|e| StartupError::InvalidConfig(format!("cors.allowed_origin: {e}")))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

fn auth_config(cfg: &AppConfig) -> Result<AuthConfig, StartupError> {
    // Empty secret in config.toml: fall back to JWT_SECRET, then the dev default
    let secret = if cfg.auth.jwt_secret.trim().is_empty() {
        common::env::var_or_default("JWT_SECRET", DEV_JWT_SECRET)
    } else {
        cfg.auth.jwt_secret.clone()
    };
    let token_ttl = chrono::Duration::try_hours(cfg.auth.token_ttl_hours)
        .ok_or_else(|| StartupError::InvalidConfig("auth.token_ttl_hours out of range".into()))?;
    Ok(AuthConfig {
        jwt_secret: Some(secret),
        password_algorithm: cfg.auth.password_algorithm.clone(),
        token_ttl,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

/// Public entry: build the app and run the HTTP server until Ctrl+C.
pub async fn run() -> Result<(), StartupError> {
    // Load .env so DATABASE_URL / JWT_SECRET / CORS_ALLOWED_ORIGIN can come from it
    dotenv().ok();

    // config.toml (or defaults) + env overrides, validated
    let cfg = AppConfig::load_and_validate()
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    // Database pool from [database]
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    // Apply schema unless disabled in config or via SKIP_MIGRATIONS
    if cfg.database.run_migrations && !common::env::flag("SKIP_MIGRATIONS") {
        migration::Migrator::up(&db, None)
            .await
            .map_err(|e| StartupError::Database(format!("migrations failed: {e}")))?;
        info!("migrations applied");
    }

    // Auth service over the Postgres repository
    let repo = Arc::new(SeaOrmAuthRepository { db });
    let authenticator = Arc::new(AuthService::new(repo, auth_config(&cfg)?));
    let state = auth::ServerState {
        authenticator,
        cookie_secure: cfg.auth.cookie_secure,
    };

    // Router with the single credentialed CORS origin
    let cors = build_cors(&cfg.cors)?;
    let app: Router = routes::build_router(state, cors);

    let addr: SocketAddr = cfg
        .server
        .bind_addr()
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))?;
    info!(%addr, origin = %cfg.cors.allowed_origin, "starting storefront auth server");
    // Serve until Ctrl+C
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)?;
    info!("server stopped");
    Ok(())
}
