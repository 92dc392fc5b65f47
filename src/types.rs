use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Targets
// ============================================================================

/// One request to issue: produced fresh per tick by a `Targeter`.
#[derive(Debug, Clone)]
pub struct Target {
    pub method: reqwest::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl Target {
    pub fn get(url: String) -> Self {
        Self {
            method: reqwest::Method::GET,
            url,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// ============================================================================
// Hit results
// ============================================================================

/// Outcome of a single hit. `latency` is the server-reported render time
/// from the profiler header, not client round-trip time; when the header is
/// absent or unparseable, `latency` stays zero and `profile_missing` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitResult {
    pub timestamp: DateTime<Utc>,
    pub latency: Duration,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub status_code: u16,
    pub error: Option<String>,
    pub profile_missing: bool,
}

impl HitResult {
    /// A result carrying only its tick time; the hit executor fills in the
    /// rest as far as the request gets.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            latency: Duration::ZERO,
            bytes_in: 0,
            bytes_out: 0,
            status_code: 0,
            error: None,
            profile_missing: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// How the transport treats HTTP redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RedirectPolicy {
    /// Follow up to reqwest's default hop limit.
    #[default]
    Follow,
    /// Keep following for as long as the server keeps redirecting.
    FollowAll,
    /// Stop at the first redirect response; the stop is not an error.
    NoFollow,
}
