// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome collection for submission floods.

use axum::http::StatusCode;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Collects outcomes during a flood.
#[derive(Debug, Default)]
pub struct FloodMetrics {
    start_time: Option<Instant>,
    end_time: Option<Instant>,
    /// Count of responses by status
    outcomes: HashMap<StatusCode, usize>,
    /// Count of requests by IP
    requests_per_ip: HashMap<String, usize>,
    /// Latency samples (microseconds)
    latencies: Vec<u64>,
}

impl FloodMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Record a response status.
    pub fn record(&mut self, status: StatusCode, ip: &str, latency: Duration) {
        *self.outcomes.entry(status).or_insert(0) += 1;
        *self.requests_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        self.latencies.push(latency.as_micros() as u64);
    }

    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    pub fn count(&self, status: StatusCode) -> usize {
        self.outcomes.get(&status).copied().unwrap_or(0)
    }

    pub fn duration(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Ratio of throttled responses to all responses.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        self.count(StatusCode::TOO_MANY_REQUESTS) as f64 / total as f64
    }

    pub fn median_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        sorted[sorted.len() / 2]
    }

    pub fn unique_ips(&self) -> usize {
        self.requests_per_ip.len()
    }

    pub fn report(&self) -> FloodReport {
        FloodReport {
            total_requests: self.total_requests(),
            accepted: self.count(StatusCode::OK),
            rate_limited: self.count(StatusCode::TOO_MANY_REQUESTS),
            rejected: self.count(StatusCode::BAD_REQUEST),
            duration_ms: self.duration().as_millis() as u64,
            block_rate: self.block_rate(),
            median_latency_us: self.median_latency_us(),
            unique_ips: self.unique_ips(),
        }
    }
}

/// Summary of a flood.
#[derive(Debug, Clone)]
pub struct FloodReport {
    pub total_requests: usize,
    pub accepted: usize,
    pub rate_limited: usize,
    pub rejected: usize,
    pub duration_ms: u64,
    pub block_rate: f64,
    pub median_latency_us: u64,
    pub unique_ips: usize,
}

impl std::fmt::Display for FloodReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Flood Report ===")?;
        writeln!(f, "Duration:          {} ms", self.duration_ms)?;
        writeln!(f, "Total Requests:    {}", self.total_requests)?;
        writeln!(f, "Accepted:          {}", self.accepted)?;
        writeln!(f, "Rate Limited:      {}", self.rate_limited)?;
        writeln!(f, "Rejected:          {}", self.rejected)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f, "Median Latency:    {} us", self.median_latency_us)?;
        writeln!(f, "Unique IPs:        {}", self.unique_ips)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let mut metrics = FloodMetrics::new();
        metrics.start();

        metrics.record(StatusCode::OK, "10.0.0.1", Duration::from_micros(100));
        metrics.record(StatusCode::OK, "10.0.0.2", Duration::from_micros(150));
        metrics.record(StatusCode::TOO_MANY_REQUESTS, "10.0.0.1", Duration::from_micros(50));

        metrics.finish();

        assert_eq!(metrics.total_requests(), 3);
        assert_eq!(metrics.count(StatusCode::OK), 2);
        assert_eq!(metrics.unique_ips(), 2);
        assert!((metrics.block_rate() - 1.0 / 3.0).abs() < 0.01);
    }
}
