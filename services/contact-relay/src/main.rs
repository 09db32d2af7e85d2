// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Accepts contact form submissions from the site frontend and relays them
//! by email: a notification to the site owner and an auto-reply to the
//! sender.
//!
//! ## Endpoints
//!
//! - `GET /health`: liveness and server time
//! - `POST /api/contact`: submit the contact form
//! - `GET /metrics`: Prometheus metrics (when enabled)
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables, optionally seeded
//! from a `.env` file:
//!
//! - `PORT`: Server port (default: 4000)
//! - `FRONTEND_URL`: Allowed CORS origin and auto-reply link (default: http://localhost:5173)
//! - `GMAIL_USER`, `GMAIL_APP_PASSWORD`: SMTP sender account (required)
//! - `RECEIVER_EMAIL`: Notification recipient (required)
//! - `RATE_LIMIT_MAX`, `RATE_LIMIT_WINDOW_SECS`: Submissions per window (default: 5 per 900s)
//! - `TRUSTED_PROXIES`: CIDRs allowed to set X-Forwarded-For

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{
    config::Config,
    handlers::{router, AppState},
    mailer::{Mailer, SmtpMailer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set
    let dotenv = dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr(),
        frontend_url = %config.frontend_url,
        recipient = %config.mail.recipient,
        smtp_host = %config.mail.smtp_host,
        max_submissions = config.rate_limit.max_submissions,
        window_secs = config.rate_limit.window_secs,
        trusted_proxies = config.trusted_proxies.len(),
        "Starting contact relay"
    );

    let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(&config.mail)?);

    // Verify the mail transport without blocking startup
    let verify_mailer = mailer.clone();
    let sender = config.mail.username.clone();
    tokio::spawn(async move {
        match verify_mailer.verify().await {
            Ok(()) => info!(sender = %sender, "Mail transport ready"),
            Err(e) => error!(
                error = %e,
                "Mail transport verification failed; check GMAIL_USER and GMAIL_APP_PASSWORD"
            ),
        }
    });

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), mailer)?);

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let cleanup = tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_state.config.rate_limit.cleanup_interval());
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup().await;
        }
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
