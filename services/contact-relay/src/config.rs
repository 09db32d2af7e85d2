// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay.
//!
//! Values are read from the environment (optionally seeded from a `.env`
//! file by the binary). Defaults match the public contact form: five
//! submissions per address per fifteen minutes, relayed through Gmail SMTP.

use ipnetwork::IpNetwork;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors, reported before the listener binds.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Configuration for the contact relay service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind host (default: 0.0.0.0)
    pub host: String,

    /// Bind port (default: 4000)
    pub port: u16,

    /// Frontend URL: CORS allow-list origin and auto-reply link target
    pub frontend_url: String,

    /// CIDRs whose X-Forwarded-For header is trusted
    pub trusted_proxies: Vec<IpNetwork>,

    /// Outbound mail configuration
    pub mail: MailConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Field validation limits
    pub validation: ValidationConfig,

    /// Branding used in outbound messages
    pub site: SiteConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// SMTP relay settings and the notification recipient.
#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,

    pub smtp_port: u16,

    /// Per-send transport timeout in seconds (default: 30)
    pub smtp_timeout_secs: u64,

    /// Sender account; also the From address of both messages
    pub username: String,

    pub password: String,

    /// Where admin notifications go
    pub recipient: String,
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Admitted submissions per identity per window (default: 5)
    pub max_submissions: u32,

    /// Window length in seconds (default: 900)
    pub window_secs: u64,

    /// Interval between eviction sweeps in seconds (default: 60)
    pub cleanup_interval_secs: u64,
}

/// Field length limits, counted in characters after trimming.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub max_name_chars: usize,

    pub max_company_chars: usize,

    pub max_reason_chars: usize,

    pub min_message_chars: usize,

    pub max_message_chars: usize,
}

/// Branding used in sender names, bodies and footers.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub name: String,

    pub domain: String,
}

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    pub path: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_smtp_timeout_secs() -> u64 {
    30
}

fn default_max_submissions() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_max_short_field() -> usize {
    100
}

fn default_min_message_chars() -> usize {
    10
}

fn default_max_message_chars() -> usize {
    2000
}

fn default_site_name() -> String {
    "Prime Ledger".to_string()
}

fn default_site_domain() -> String {
    "primeledger.io".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_submissions: default_max_submissions(),
            window_secs: default_window_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_name_chars: default_max_short_field(),
            max_company_chars: default_max_short_field(),
            max_reason_chars: default_max_short_field(),
            min_message_chars: default_min_message_chars(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            domain: default_site_domain(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_timeout_secs", &self.smtp_timeout_secs)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the eviction sweep interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl MailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout_secs)
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let config = Config {
            host: get("HOST").unwrap_or_else(default_host),
            port: parse_or(&get, "PORT", default_port())?,
            frontend_url: get("FRONTEND_URL").unwrap_or_else(default_frontend_url),
            trusted_proxies: parse_proxies(get("TRUSTED_PROXIES"))?,
            mail: MailConfig {
                smtp_host: get("SMTP_HOST").unwrap_or_else(default_smtp_host),
                smtp_port: parse_or(&get, "SMTP_PORT", default_smtp_port())?,
                smtp_timeout_secs: parse_or(
                    &get,
                    "SMTP_TIMEOUT_SECS",
                    default_smtp_timeout_secs(),
                )?,
                username: get("GMAIL_USER").ok_or(ConfigError::Missing("GMAIL_USER"))?,
                password: get("GMAIL_APP_PASSWORD")
                    .ok_or(ConfigError::Missing("GMAIL_APP_PASSWORD"))?,
                recipient: get("RECEIVER_EMAIL").ok_or(ConfigError::Missing("RECEIVER_EMAIL"))?,
            },
            rate_limit: RateLimitConfig {
                max_submissions: parse_or(&get, "RATE_LIMIT_MAX", default_max_submissions())?,
                window_secs: parse_or(&get, "RATE_LIMIT_WINDOW_SECS", default_window_secs())?,
                cleanup_interval_secs: parse_or(
                    &get,
                    "RATE_LIMIT_CLEANUP_SECS",
                    default_cleanup_interval_secs(),
                )?,
            },
            validation: ValidationConfig::default(),
            site: SiteConfig {
                name: get("SITE_NAME").unwrap_or_else(default_site_name),
                domain: get("SITE_DOMAIN").unwrap_or_else(default_site_domain),
            },
            metrics: MetricsConfig {
                enabled: parse_or(&get, "METRICS_ENABLED", default_true())?,
                ..Default::default()
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that per-variable parsing cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.frontend_origin()?;

        for (key, address) in [
            ("GMAIL_USER", &self.mail.username),
            ("RECEIVER_EMAIL", &self.mail.recipient),
        ] {
            if !email_address::EmailAddress::is_valid(address) {
                return Err(ConfigError::Invalid {
                    key,
                    value: address.clone(),
                    reason: "not an email address".to_string(),
                });
            }
        }

        if self.rate_limit.max_submissions == 0 || self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_MAX",
                value: format!(
                    "{} per {}s",
                    self.rate_limit.max_submissions, self.rate_limit.window_secs
                ),
                reason: "limit and window must be positive".to_string(),
            });
        }

        Ok(())
    }

    /// Server bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The origin (scheme, host, port) of the frontend URL, as sent by
    /// browsers in the `Origin` header.
    pub fn frontend_origin(&self) -> Result<String, ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            key: "FRONTEND_URL",
            value: self.frontend_url.clone(),
            reason,
        };

        let url = Url::parse(&self.frontend_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid("expected an http(s) URL with a host".to_string()));
        }

        Ok(url.origin().ascii_serialization())
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_proxies(raw: Option<String>) -> Result<Vec<IpNetwork>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|cidr| {
            cidr.parse().map_err(|e: ipnetwork::IpNetworkError| ConfigError::Invalid {
                key: "TRUSTED_PROXIES",
                value: cidr.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}
