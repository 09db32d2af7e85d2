// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound mail.
//!
//! [`Mailer`] is the sending capability; [`SmtpMailer`] implements it over an
//! authenticated SMTP relay. [`dispatch`] sends both messages of a submission
//! concurrently and waits for both before reporting.

use crate::composer::{ComposedMessages, OutboundMessage};
use crate::config::MailConfig;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Mail sending errors.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Mail transport rejected the message: {0}")]
    Rejected(String),
}

/// A capability that hands messages to a mail transport.
///
/// Success means the transport accepted the message, not that it was
/// delivered.
#[async_trait]
pub trait Mailer: Send + Sync + fmt::Debug {
    async fn send(&self, message: &OutboundMessage) -> Result<(), MailError>;

    /// Check connectivity and credentials without sending anything.
    async fn verify(&self) -> Result<(), MailError> {
        Ok(())
    }
}

/// SMTP relay with implicit TLS and credentials.
///
/// The underlying transport pools connections and is shared by all requests.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer").field("host", &self.host).finish()
    }
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout()))
            .build();

        Ok(Self {
            transport,
            host: config.smtp_host.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<(), MailError> {
        let email = build_message(message)?;
        let response = self.transport.send(email).await?;
        if !response.is_positive() {
            return Err(MailError::Rejected(response.code().to_string()));
        }
        debug!(to = %message.to, host = %self.host, "Message accepted by SMTP relay");
        Ok(())
    }

    async fn verify(&self) -> Result<(), MailError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(MailError::Rejected(format!(
                "connection test to {} failed",
                self.host
            )))
        }
    }
}

fn parse_address(address: &str) -> Result<Address, MailError> {
    address
        .parse::<Address>()
        .map_err(|e| MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Convert an [`OutboundMessage`] into a MIME message.
pub fn build_message(message: &OutboundMessage) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(Mailbox::new(
            Some(message.from_name.clone()),
            parse_address(&message.from)?,
        ))
        .to(Mailbox::new(None, parse_address(&message.to)?))
        .subject(message.subject.clone())
        .header(ContentType::TEXT_HTML);

    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(Mailbox::new(None, parse_address(reply_to)?));
    }

    Ok(builder.body(message.html.clone())?)
}

/// Which of the two messages a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Notification,
    AutoReply,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notification => write!(f, "notification"),
            Self::AutoReply => write!(f, "auto-reply"),
        }
    }
}

/// A failed dispatch: the first failing message (in send order) and its cause.
#[derive(Debug, Error)]
#[error("Failed to send {kind}: {source}")]
pub struct DispatchError {
    pub kind: MessageKind,
    #[source]
    pub source: MailError,
    /// Whether the other message was accepted
    pub other_succeeded: bool,
}

/// Outcome of sending both messages of a submission.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub notification: Result<(), MailError>,
    pub auto_reply: Result<(), MailError>,
}

impl DispatchOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.notification.is_ok() && self.auto_reply.is_ok()
    }

    /// Collapse into overall success or the first error.
    pub fn into_result(self) -> Result<(), DispatchError> {
        match (self.notification, self.auto_reply) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(source), other) => Err(DispatchError {
                kind: MessageKind::Notification,
                source,
                other_succeeded: other.is_ok(),
            }),
            (Ok(()), Err(source)) => Err(DispatchError {
                kind: MessageKind::AutoReply,
                source,
                other_succeeded: true,
            }),
        }
    }
}

/// Send both messages concurrently and wait for both to settle.
///
/// There is no retry and no partial success: either both were accepted or
/// the submission failed.
pub async fn dispatch(mailer: &dyn Mailer, messages: &ComposedMessages) -> DispatchOutcome {
    let (notification, auto_reply) = tokio::join!(
        mailer.send(&messages.notification),
        mailer.send(&messages.auto_reply),
    );

    let outcome = DispatchOutcome {
        notification,
        auto_reply,
    };

    debug!(
        notification_sent = outcome.notification.is_ok(),
        auto_reply_sent = outcome.auto_reply.is_ok(),
        "Dispatch settled"
    );

    outcome
}
