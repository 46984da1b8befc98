//! # Micks API
//!
//! HTTP server for the plan calculator and the sales records.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Micks API Server                               │
//! │                                                                         │
//! │  Intake form / Admin view ───► HTTP (8000) ───► SalesService ───► SQLite│
//! │                                                      │                  │
//! │                                                      ▼                  │
//! │                                               SMTP (MailHog)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use micks_api::auth::{hash_password, JwtManager};
use micks_api::notify::{LogNotifier, Notifier, SmtpNotifier};
use micks_api::{router, AdminAuth, ApiConfig, AppState, SalesService};
use micks_db::{Database, DbConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,micks=debug,sqlx=warn,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Micks API server...");

    // Load configuration
    let config = ApiConfig::load().context("Failed to load configuration")?;
    let addr = config.socket_addr()?;
    info!(
        %addr,
        database = %config.database_path.display(),
        smtp_enabled = config.smtp_enabled,
        "Configuration loaded"
    );

    if config.uses_dev_secret() {
        warn!("MICKS_JWT_SECRET is not set, using the development secret");
    }

    // Connect to database (runs migrations)
    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await
    .context("Failed to open database")?;

    // Admin credentials
    let password_hash = match (&config.admin_password_hash, &config.admin_password) {
        (Some(hash), _) if !hash.trim().is_empty() => hash.clone(),
        (_, Some(password)) => {
            warn!("Using MICKS_ADMIN_PASSWORD in clear text; set MICKS_ADMIN_PASSWORD_HASH instead");
            hash_password(password)?
        }
        _ => anyhow::bail!("No admin password configured"),
    };
    let auth = AdminAuth::new(
        config.admin_username.clone(),
        password_hash,
        JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs),
    )?;

    // Notifications
    let notifier: Arc<dyn Notifier> = if config.smtp_enabled {
        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            "Sending notifications through SMTP"
        );
        Arc::new(SmtpNotifier::new(
            config.smtp_host.clone(),
            config.smtp_port,
            config.mail_from.clone(),
            config.operations_email.clone(),
            config.smtp_timeout(),
        ))
    } else {
        Arc::new(LogNotifier)
    };

    // Create shared state
    let state = AppState {
        sales: Arc::new(SalesService::new(db.sale_store(), notifier)),
        auth: Arc::new(auth),
        db: db.clone(),
    };

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
