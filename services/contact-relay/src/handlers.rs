// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact relay service.
//!
//! A submission moves through rate limiting, validation, composition and
//! dispatch, stopping at the first failure. Each request gets exactly one
//! JSON response.

use crate::client_ip::ClientIpResolver;
use crate::composer::MessageComposer;
use crate::config::Config;
use crate::error::AppError;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::mailer::{self, Mailer};
use crate::metrics::{ContactMetrics, Outcome};
use crate::validator::{ContactValidator, FieldError, SubmissionRequest};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub const SUCCESS_MESSAGE: &str = "Message sent successfully.";

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub limiter: RateLimiter,
    pub validator: ContactValidator,
    pub composer: MessageComposer,
    pub mailer: Arc<dyn Mailer>,
    pub client_ip: ClientIpResolver,
    pub metrics: ContactMetrics,
    cors_origin: HeaderValue,
}

impl AppState {
    /// Wire every component from configuration around a mail capability.
    pub fn new(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let cors_origin = HeaderValue::from_str(&config.frontend_origin()?)?;

        Ok(Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            validator: ContactValidator::new(config.validation.clone()),
            composer: MessageComposer::from_config(&config),
            client_ip: ClientIpResolver::new(config.trusted_proxies.clone()),
            metrics: ContactMetrics::new()?,
            mailer,
            cors_origin,
            config,
        })
    }
}

/// Body of every contact endpoint response.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Contact form submission.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ip = state.client_ip.resolve(&headers, peer.ip());
    let rate = state.limiter.check(ip).await;

    let result = submit(&state, ip, rate, body).await;
    state.metrics.record(match &result {
        Ok(()) => Outcome::Accepted,
        Err(AppError::RateLimited { .. }) => Outcome::RateLimited,
        Err(AppError::Dispatch(_)) => Outcome::DispatchFailed,
        Err(_) => Outcome::Invalid,
    });

    let mut response = match result {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::success(SUCCESS_MESSAGE))).into_response(),
        Err(e) => e.into_response(),
    };
    rate_limit_headers(response.headers_mut(), &state.limiter, &rate);
    response
}

async fn submit(
    state: &AppState,
    ip: IpAddr,
    rate: RateLimitResult,
    body: Bytes,
) -> Result<(), AppError> {
    if let RateLimitResult::Limited { retry_after } = rate {
        return Err(AppError::RateLimited {
            retry_after,
            window: state.limiter.window(),
        });
    }

    // parsed only once the limiter has admitted the request
    let request: SubmissionRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::InvalidBody(e.to_string()))?;
    let submission = state
        .validator
        .validate(&request)
        .map_err(AppError::Validation)?;

    let messages = state.composer.compose(&submission, Utc::now());

    let started = Instant::now();
    let outcome = mailer::dispatch(state.mailer.as_ref(), &messages).await;
    state.metrics.observe_dispatch(started.elapsed().as_secs_f64());
    outcome.into_result()?;

    info!(
        %ip,
        name = %submission.name(),
        email = %submission.email(),
        recipient = %state.config.mail.recipient,
        "Contact forwarded"
    );
    Ok(())
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// Fallback for unknown paths and methods.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

fn rate_limit_headers(headers: &mut HeaderMap, limiter: &RateLimiter, rate: &RateLimitResult) {
    let policy = format!("{};w={}", limiter.limit(), limiter.window().as_secs());
    let reset = ceil_secs(rate.reset_in());

    let entries = [
        ("ratelimit-policy", HeaderValue::from_str(&policy).ok()),
        ("ratelimit-limit", Some(HeaderValue::from(limiter.limit()))),
        ("ratelimit-remaining", Some(HeaderValue::from(rate.remaining()))),
        ("ratelimit-reset", Some(HeaderValue::from(reset))),
    ];
    for (name, value) in entries {
        if let Some(value) = value {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let mut router = Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/api/contact", post(contact).fallback(not_found));

    if state.config.metrics.enabled {
        debug!(path = %state.config.metrics.path, "Metrics endpoint enabled");
        router = router.route(&state.config.metrics.path, get(metrics).fallback(not_found));
    }

    router
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
