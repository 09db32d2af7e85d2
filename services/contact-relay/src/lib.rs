// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! Backend for the site's contact form. A submission is accepted from the
//! frontend, checked and relayed by email:
//!
//! - Per-IP fixed-window rate limiting (5 submissions per 15 minutes)
//! - Field validation and email normalization
//! - Owner notification and sender auto-reply, sent concurrently
//! - Structured JSON responses with no transport detail leaked

pub mod client_ip;
pub mod composer;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod validator;

pub use config::Config;
pub use error::AppError;
pub use handlers::{router, AppState};
pub use limiter::{RateLimitResult, RateLimiter};
pub use mailer::{Mailer, SmtpMailer};
pub use validator::{ContactValidator, NormalizedSubmission, SubmissionRequest};
