// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Builds the two outbound messages for an accepted submission: the
//! notification to the site owner and the auto-reply to the submitter.
//!
//! Rendering is pure. Submitter text is HTML-escaped before it is embedded.

use crate::config::{Config, SiteConfig};
use crate::validator::NormalizedSubmission;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

/// India Standard Time, UTC+05:30 with no daylight saving.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// A composed email, ready for the mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Display name of the sender
    pub from_name: String,
    /// Sender address
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

/// Both messages produced for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessages {
    pub notification: OutboundMessage,
    pub auto_reply: OutboundMessage,
}

/// Renders outbound messages for accepted submissions.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    site: SiteConfig,
    sender: String,
    recipient: String,
    frontend_url: String,
}

impl MessageComposer {
    pub fn new(site: SiteConfig, sender: String, recipient: String, frontend_url: String) -> Self {
        Self {
            site,
            sender,
            recipient,
            frontend_url,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.site.clone(),
            config.mail.username.clone(),
            config.mail.recipient.clone(),
            config.frontend_url.clone(),
        )
    }

    /// Compose both messages for a submission received at `submitted_at`.
    pub fn compose(
        &self,
        submission: &NormalizedSubmission,
        submitted_at: DateTime<Utc>,
    ) -> ComposedMessages {
        let stamp = format_submitted_at(submitted_at);
        ComposedMessages {
            notification: self.notification(submission, &stamp),
            auto_reply: self.auto_reply(submission, &stamp),
        }
    }

    /// Notification to the site owner; replies go straight to the submitter.
    pub fn notification(&self, submission: &NormalizedSubmission, stamp: &str) -> OutboundMessage {
        OutboundMessage {
            from_name: format!("{} Contact", self.site.name),
            from: self.sender.clone(),
            to: self.recipient.clone(),
            reply_to: Some(submission.email().to_string()),
            subject: single_line(&format!(
                "New Contact: {} — {}",
                submission.name(),
                submission.reason()
            )),
            html: render_notification(&self.site, submission, stamp),
        }
    }

    /// Receipt confirmation to the submitter.
    pub fn auto_reply(&self, submission: &NormalizedSubmission, stamp: &str) -> OutboundMessage {
        OutboundMessage {
            from_name: self.site.name.clone(),
            from: self.sender.clone(),
            to: submission.email().to_string(),
            reply_to: None,
            subject: single_line(&format!(
                "We received your message, {}.",
                submission.first_name()
            )),
            html: render_auto_reply(&self.site, &self.frontend_url, submission, stamp),
        }
    }
}

/// Render a timestamp in India Standard Time, en-IN style:
/// `Friday, 16 October 2026 at 3:45 pm`.
pub fn format_submitted_at(at: DateTime<Utc>) -> String {
    let ist = FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    at.with_timezone(&ist)
        .format("%A, %-d %B %Y at %-I:%M %P")
        .to_string()
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape and turn line breaks into `<br/>`.
fn multiline_html(value: &str) -> String {
    text(&value.replace("\r\n", "\n")).replace('\n', "<br/>")
}

const NOTIFICATION_STYLE: &str = "\
body { margin: 0; padding: 0; background: #080808; font-family: 'DM Sans', Arial, sans-serif; }
.wrapper { max-width: 600px; margin: 0 auto; background: #111111; border-radius: 12px; overflow: hidden; }
.header { background: linear-gradient(135deg, #7B61FF 0%, #4f46e5 100%); padding: 32px 36px; }
.header h1 { margin: 0; color: #ffffff; font-size: 20px; font-weight: 700; }
.header p { margin: 6px 0 0; color: rgba(255,255,255,0.65); font-size: 13px; }
.body { padding: 36px; }
.field { margin-bottom: 22px; }
.label { font-size: 10px; font-weight: 600; letter-spacing: 0.14em; text-transform: uppercase; color: #555; margin-bottom: 6px; }
.value { font-size: 15px; color: #ffffff; line-height: 1.6; }
.value a { color: #9d87ff; text-decoration: none; }
.message-box { background: #1a1a1a; border-left: 3px solid #7B61FF; border-radius: 8px; padding: 18px 20px; margin-top: 24px; }
.message-box .label { color: #7B61FF; }
.message-box .value { color: #cccccc; font-size: 14px; }
.footer { padding: 20px 36px; border-top: 1px solid #1e1e1e; }
.footer p { margin: 0; font-size: 11px; color: #444; }
.badge { display: inline-block; background: #7B61FF22; color: #9d87ff; border: 1px solid #7B61FF44; border-radius: 99px; padding: 3px 12px; font-size: 11px; font-weight: 600; text-transform: uppercase; }";

const AUTO_REPLY_STYLE: &str = "\
body { margin: 0; padding: 0; background: #f4f4f4; font-family: Arial, sans-serif; }
.wrapper { max-width: 560px; margin: 32px auto; background: #111111; border-radius: 12px; overflow: hidden; }
.header { background: linear-gradient(135deg, #7B61FF 0%, #4f46e5 100%); padding: 32px 36px; }
.header h1 { margin: 0; color: #fff; font-size: 22px; font-weight: 700; }
.body { padding: 36px; color: #cccccc; font-size: 15px; line-height: 1.8; }
.body strong { color: #ffffff; }
.cta { display: inline-block; margin-top: 24px; padding: 13px 28px; background: #7B61FF; color: #fff; border-radius: 99px; font-size: 14px; font-weight: 600; text-decoration: none; }
.footer { padding: 20px 36px; border-top: 1px solid #1e1e1e; font-size: 11px; color: #444; }";

fn render_notification(site: &SiteConfig, submission: &NormalizedSubmission, stamp: &str) -> String {
    let email_text = text(submission.email());
    let mailto = attr(submission.email());

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<style>
{style}
</style>
</head>
<body>
<div style="padding: 24px 0; background: #080808;">
<div class="wrapper">
<div class="header">
<h1>New Contact Form Submission</h1>
<p>Received {stamp} IST</p>
</div>
<div class="body">
<div class="field">
<div class="label">Name</div>
<div class="value">{name}</div>
</div>
<div class="field">
<div class="label">Email</div>
<div class="value"><a href="mailto:{mailto}">{email_text}</a></div>
</div>
<div class="field">
<div class="label">Company</div>
<div class="value">{company}</div>
</div>
<div class="field">
<div class="label">Service Interest</div>
<div class="value"><span class="badge">{reason}</span></div>
</div>
<div class="message-box">
<div class="label">Their Message</div>
<div class="value">{message}</div>
</div>
</div>
<div class="footer">
<p>Sent from the {domain} contact form &middot; Reply directly to <a href="mailto:{mailto}" style="color:#7B61FF;">{email_text}</a></p>
</div>
</div>
</div>
</body>
</html>
"#,
        style = NOTIFICATION_STYLE,
        stamp = text(stamp),
        name = text(submission.name()),
        company = text(submission.company()),
        reason = text(submission.reason()),
        message = multiline_html(submission.message()),
        domain = text(&site.domain),
    )
}

fn render_auto_reply(
    site: &SiteConfig,
    frontend_url: &str,
    submission: &NormalizedSubmission,
    stamp: &str,
) -> String {
    let first_name = text(submission.first_name());
    let site_name = text(&site.name);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<style>
{style}
</style>
</head>
<body>
<div class="wrapper">
<div class="header">
<h1>Got it, {first_name}.</h1>
</div>
<div class="body">
<p>Thanks for reaching out to <strong>{site_name}</strong>. We've received your message and someone from our team will be in touch within <strong>one business day</strong>.</p>
<p>In the meantime, feel free to browse our work:</p>
<a class="cta" href="{link}">View Case Studies &rarr;</a>
</div>
<div class="footer">
<p>You're receiving this because you submitted a form at {domain} on {stamp} IST. This is an automated confirmation, please do not reply to this email.</p>
</div>
</div>
</body>
</html>
"#,
        style = AUTO_REPLY_STYLE,
        link = attr(&format!("{frontend_url}#case-studies")),
        domain = text(&site.domain),
        stamp = text(stamp),
    )
}
