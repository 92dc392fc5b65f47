use crate::target::Targeter;
use crate::types::{HitResult, RedirectPolicy, Target};
use chrono::{DateTime, Utc};
use reqwest::{Client, Request, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Response header the tile server uses to report its own render time.
pub const PROFILE_HEADER: &str = "X-Tiler-Profiler";

#[derive(Debug, Deserialize)]
struct TilerProfile {
    #[serde(rename = "Render")]
    render: u64,
}

fn build_request(client: &Client, target: &Target) -> reqwest::Result<Request> {
    let mut builder = client.request(target.method.clone(), &target.url);
    for (name, value) in &target.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.build()
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Runs one full request/response cycle for a tick. Every failure is
/// captured into the returned result; nothing escapes this boundary.
pub async fn execute_hit(
    client: &Client,
    redirects: RedirectPolicy,
    targeter: &dyn Targeter,
    tick: DateTime<Utc>,
) -> HitResult {
    let mut res = HitResult::new(tick);

    let target = match targeter.next_target() {
        Ok(target) => target,
        Err(err) => {
            res.error = Some(err.to_string());
            return res;
        }
    };

    let request = match build_request(client, &target) {
        Ok(request) => request,
        Err(err) => {
            res.error = Some(err.to_string());
            return res;
        }
    };

    let bytes_out = request
        .body()
        .and_then(|body| body.as_bytes())
        .map(|bytes| bytes.len() as u64)
        .unwrap_or(0);

    let mut response = match client.execute(request).await {
        Ok(response) => response,
        Err(err) => {
            // Under NoFollow a redirect stop is the policy working, not a
            // transport failure.
            if !(redirects == RedirectPolicy::NoFollow && err.is_redirect()) {
                res.error = Some(err.to_string());
            }
            return res;
        }
    };

    let mut bytes_in = 0u64;
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => bytes_in += chunk.len() as u64,
            Ok(None) => break,
            Err(err) => {
                res.error = Some(err.to_string());
                return res;
            }
        }
    }

    res.bytes_in = bytes_in;
    res.bytes_out = bytes_out;

    let status = response.status();
    res.status_code = status.as_u16();
    if !(200u16..400).contains(&res.status_code) {
        res.error = Some(status_line(status));
    }

    // The render time comes from the server, so hits that never completed a
    // response keep latency zero. Absent or unparseable profiles are
    // tolerated but flagged.
    match response
        .headers()
        .get(PROFILE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| serde_json::from_str::<TilerProfile>(value).ok())
    {
        Some(profile) => res.latency = Duration::from_millis(profile.render),
        None => res.profile_missing = true,
    }

    res
}
