// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for submission floods and hostile input.

use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// The minimal valid submission: no company, no reason.
pub fn valid_submission() -> Value {
    json!({
        "name": "Jane Smith",
        "email": "jane@company.com",
        "message": "We need help scaling our ops team."
    })
}

/// A fully populated submission.
pub fn full_submission() -> Value {
    json!({
        "name": "Jane Smith",
        "email": "Jane@Company.com",
        "company": "Acme Logistics",
        "reason": "Operations audit",
        "message": "Our month-end close takes two weeks.\nCan you help?"
    })
}

/// Numbered valid submissions, one per flood request.
pub fn generate_submissions(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "name": format!("Sender {i}"),
                "email": format!("sender{i}@company.com"),
                "message": format!("Submission number {i} asking about bookkeeping."),
            })
        })
        .collect()
}

/// Markup and header-injection payloads paired with a marker that must
/// never appear verbatim in rendered HTML.
pub fn generate_injection_payloads() -> Vec<(&'static str, &'static str)> {
    vec![
        ("<script>alert(1)</script>", "<script>"),
        ("<img src=x onerror=alert(1)>", "<img"),
        ("\"><svg onload=alert(1)>", "<svg"),
        ("<a href=\"javascript:alert(1)\">click</a>", "<a href=\"javascript"),
        ("</td></tr></table><h1>owned</h1>", "<h1>owned"),
    ]
}

/// Addresses the service must refuse.
pub fn generate_invalid_emails() -> Vec<&'static str> {
    vec![
        "plainaddress",
        "@no-local-part.com",
        "jane@",
        "jane@localhost",
        "jane@@company.com",
        "jane smith@company.com",
        "\"jane smith\"@company.com",
        "jane@company",
        "jane@[127.0.0.1]",
        "jane@company.c0m",
    ]
}

/// Bodies that are not a JSON object of strings.
pub fn generate_malformed_bodies() -> Vec<&'static str> {
    vec![
        "",
        "not json",
        "{\"name\": \"Jane\"",
        "[1, 2, 3]",
        "{\"name\": 42, \"email\": \"jane@company.com\"}",
    ]
}
