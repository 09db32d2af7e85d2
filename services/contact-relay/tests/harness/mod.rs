// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for driving the contact relay router in-process.
//!
//! Requests go through the real router with a recording mailer in place of
//! the SMTP transport, and a peer address injected the way the server's
//! connect-info layer would.

#![allow(dead_code)]

pub mod generators;
pub mod metrics;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use contact_relay::{
    composer::OutboundMessage,
    config::Config,
    handlers::{router, AppState},
    mailer::{build_message, MailError, Mailer},
};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const OWNER: &str = "owner@primeledger.io";
pub const SENDER: &str = "relay@gmail.com";
pub const FRONTEND: &str = "http://localhost:5173";

/// Configuration as the service would load it from a minimal environment.
pub fn test_config() -> Config {
    test_config_with(&[])
}

/// [`test_config`] with environment overrides applied.
pub fn test_config_with(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("GMAIL_USER", SENDER),
        ("GMAIL_APP_PASSWORD", "abcd efgh ijkl mnop"),
        ("RECEIVER_EMAIL", OWNER),
        ("FRONTEND_URL", FRONTEND),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config should load")
}

/// Mailer that records accepted messages and fails for chosen recipients.
///
/// Every message is built into MIME first, so anything the SMTP transport
/// could not construct fails here too.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundMessage>>,
    attempts: Mutex<usize>,
    fail_to: Vec<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message addressed to one of `recipients`.
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            fail_to: recipients.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Option<OutboundMessage> {
        self.sent().into_iter().find(|m| m.to == recipient)
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<(), MailError> {
        *self.attempts.lock().unwrap() += 1;
        build_message(message)?;
        tokio::task::yield_now().await;

        if self.fail_to.iter().any(|r| r == &message.to) {
            return Err(MailError::Rejected(format!(
                "535-5.7.8 Username and Password not accepted for {}",
                message.to
            )));
        }

        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// A response with its body collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).expect("response body should be JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The router under test plus handles to its collaborators.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(test_config(), RecordingMailer::new())
    }

    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        Self::with(test_config(), mailer)
    }

    pub fn with(config: Config, mailer: RecordingMailer) -> Self {
        let mailer = Arc::new(mailer);
        let state = Arc::new(
            AppState::new(config, mailer.clone() as Arc<dyn Mailer>)
                .expect("app state should build"),
        );
        let router = router(state.clone());
        Self {
            state,
            mailer,
            router,
        }
    }

    /// Send a request as if it arrived from `peer`.
    pub async fn send(&self, mut request: Request<Body>, peer: &str) -> TestResponse {
        let peer: SocketAddr = format!("{peer}:50000").parse().expect("peer address");
        request.extensions_mut().insert(ConnectInfo(peer));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");

        TestResponse {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// POST a JSON body to the contact endpoint.
    pub async fn submit(&self, peer: &str, body: &Value) -> TestResponse {
        self.send(contact_request(body.to_string(), &[]), peer).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.send(request, "127.0.0.1").await
    }
}

/// A contact endpoint request with a raw body and extra headers.
pub fn contact_request(body: String, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body)).expect("request")
}
