// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for contact submissions.

use std::fmt;

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

/// Terminal outcome of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Invalid,
    RateLimited,
    DispatchFailed,
}

impl Outcome {
    fn label(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Invalid => "invalid",
            Self::RateLimited => "rate_limited",
            Self::DispatchFailed => "dispatch_failed",
        }
    }
}

/// Service-owned metrics registry.
#[derive(Clone)]
pub struct ContactMetrics {
    registry: Registry,
    submissions: IntCounterVec,
    dispatch_duration: Histogram,
}

impl fmt::Debug for ContactMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactMetrics").finish_non_exhaustive()
    }
}

impl ContactMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_submissions_total",
                "Contact form submissions by outcome",
            ),
            &["outcome"],
        )?;
        let dispatch_duration = Histogram::with_opts(HistogramOpts::new(
            "contact_dispatch_duration_seconds",
            "Time to hand both messages to the mail transport",
        ))?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(dispatch_duration.clone()))?;

        Ok(Self {
            registry,
            submissions,
            dispatch_duration,
        })
    }

    pub fn record(&self, outcome: Outcome) {
        self.submissions.with_label_values(&[outcome.label()]).inc();
    }

    pub fn observe_dispatch(&self, seconds: f64) {
        self.dispatch_duration.observe(seconds);
    }

    /// Count recorded for an outcome.
    pub fn count(&self, outcome: Outcome) -> u64 {
        self.submissions.with_label_values(&[outcome.label()]).get()
    }

    /// Render the registry in the text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
