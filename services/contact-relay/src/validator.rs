// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Contact form validator.
//!
//! Fields are checked in form order (name, email, company, reason, message)
//! and every failing rule is reported, in rule order within each field.
//! The first error in the list is therefore deterministic.

use crate::config::ValidationConfig;
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Shown in place of a missing company.
pub const COMPANY_NOT_PROVIDED: &str = "Not provided";

/// Shown in place of a missing reason.
pub const REASON_NOT_SELECTED: &str = "Not selected";

/// Untrusted contact form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A submission that passed every field check.
///
/// Only [`ContactValidator::validate`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSubmission {
    name: String,
    email: String,
    company: String,
    reason: String,
    message: String,
}

impl NormalizedSubmission {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Company, or [`COMPANY_NOT_PROVIDED`].
    pub fn company(&self) -> &str {
        &self.company
    }

    /// Reason, or [`REASON_NOT_SELECTED`].
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// First whitespace-delimited token of the name.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Contact form validator.
#[derive(Debug, Clone)]
pub struct ContactValidator {
    config: ValidationConfig,
}

impl ContactValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate and normalize a submission.
    pub fn validate(
        &self,
        request: &SubmissionRequest,
    ) -> Result<NormalizedSubmission, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = trimmed(&request.name);
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name is required."));
        }
        if char_len(name) > self.config.max_name_chars {
            errors.push(FieldError::new("name", "Name too long."));
        }

        let raw_email = trimmed(&request.email);
        if raw_email.is_empty() {
            errors.push(FieldError::new("email", "Email is required."));
        }
        let email = is_valid_email(raw_email)
            .then(|| normalize_email(raw_email))
            .flatten()
            .filter(|email| is_valid_email(email));
        if email.is_none() {
            errors.push(FieldError::new(
                "email",
                "Please enter a valid email address.",
            ));
        }

        let company = trimmed(&request.company);
        if char_len(company) > self.config.max_company_chars {
            errors.push(FieldError::new("company", "Company name too long."));
        }

        let reason = trimmed(&request.reason);
        if char_len(reason) > self.config.max_reason_chars {
            errors.push(FieldError::new("reason", "Reason too long."));
        }

        let message = trimmed(&request.message);
        if message.is_empty() {
            errors.push(FieldError::new("message", "Message is required."));
        }
        let len = char_len(message);
        if len < self.config.min_message_chars || len > self.config.max_message_chars {
            errors.push(FieldError::new(
                "message",
                format!(
                    "Message must be between {} and {} characters.",
                    self.config.min_message_chars, self.config.max_message_chars
                ),
            ));
        }

        match email {
            Some(email) if errors.is_empty() => Ok(NormalizedSubmission {
                name: name.to_string(),
                email,
                company: or_sentinel(company, COMPANY_NOT_PROVIDED),
                reason: or_sentinel(reason, REASON_NOT_SELECTED),
                message: message.to_string(),
            }),
            _ => {
                debug!(
                    fields = ?errors.iter().map(|e| e.field).collect::<Vec<_>>(),
                    "Submission failed validation"
                );
                Err(errors)
            }
        }
    }
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn or_sentinel(value: &str, sentinel: &str) -> String {
    if value.is_empty() {
        sentinel.to_string()
    } else {
        value.to_string()
    }
}

/// Check address syntax.
///
/// Beyond RFC 5322 syntax, the domain must be a dotted hostname with an
/// alphabetic (or punycode) top-level label; IP literals are rejected.
/// The address must also be one the mail transport can put in an envelope,
/// which excludes quoted local parts.
pub fn is_valid_email(address: &str) -> bool {
    if !EmailAddress::is_valid(address) || address.parse::<lettre::Address>().is_err() {
        return false;
    }

    let Some((local, domain)) = address.rsplit_once('@') else {
        return false;
    };
    if local.starts_with('"') {
        return false;
    }
    if domain.starts_with('[') || domain.ends_with('.') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((rest, tld)) if !rest.is_empty() => {
            let tld = tld.to_lowercase();
            (tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic))
                || (tld.starts_with("xn--") && tld.len() > 4)
        }
        _ => false,
    }
}

const GMAIL_DOMAINS: &[&str] = &["gmail.com", "googlemail.com"];

const ICLOUD_DOMAINS: &[&str] = &["icloud.com", "me.com"];

const OUTLOOK_DOMAINS: &[&str] = &[
    "hotmail.at", "hotmail.be", "hotmail.ca", "hotmail.co.uk", "hotmail.com",
    "hotmail.com.au", "hotmail.de", "hotmail.es", "hotmail.fr", "hotmail.it",
    "live.be", "live.co.uk", "live.com", "live.de", "live.fr", "live.nl",
    "msn.com", "outlook.at", "outlook.be", "outlook.com", "outlook.de",
    "outlook.es", "outlook.fr", "outlook.in", "outlook.it", "passport.com",
];

const YAHOO_DOMAINS: &[&str] = &[
    "rocketmail.com", "yahoo.ca", "yahoo.co.uk", "yahoo.com", "yahoo.de",
    "yahoo.fr", "yahoo.in", "yahoo.it", "ymail.com",
];

const YANDEX_DOMAINS: &[&str] = &[
    "yandex.ru", "yandex.ua", "yandex.kz", "yandex.com", "yandex.by", "ya.ru",
];

/// Canonicalize an email address so that equivalent spellings compare equal.
///
/// The whole address is lower-cased. Provider-specific rules strip
/// sub-addresses (`+tag`, or `-tag` for Yahoo), Gmail dots and alias
/// domains. Returns `None` when nothing of the local part survives.
/// Applying it to its own output is a no-op.
pub fn normalize_email(address: &str) -> Option<String> {
    let (local, domain) = address.trim().rsplit_once('@')?;
    let mut local = local.to_lowercase();
    let mut domain = domain.to_lowercase();

    if GMAIL_DOMAINS.contains(&domain.as_str()) {
        local = strip_subaddress(&local, '+').replace('.', "");
        domain = "gmail.com".to_string();
    } else if ICLOUD_DOMAINS.contains(&domain.as_str())
        || OUTLOOK_DOMAINS.contains(&domain.as_str())
    {
        local = strip_subaddress(&local, '+');
    } else if YAHOO_DOMAINS.contains(&domain.as_str()) {
        local = strip_subaddress(&local, '-');
    } else if YANDEX_DOMAINS.contains(&domain.as_str()) {
        domain = "yandex.ru".to_string();
    }

    if local.is_empty() {
        return None;
    }

    Some(format!("{local}@{domain}"))
}

fn strip_subaddress(local: &str, separator: char) -> String {
    local.split(separator).next().unwrap_or_default().to_string()
}
