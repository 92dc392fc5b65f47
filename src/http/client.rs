use crate::types::RedirectPolicy;
use reqwest::Client;
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("stopped after first response: redirects disabled")]
struct RedirectsDisabled;

fn redirect_policy(redirects: RedirectPolicy) -> Policy {
    match redirects {
        RedirectPolicy::Follow => Policy::default(),
        RedirectPolicy::FollowAll => Policy::limited(usize::MAX),
        // Surfaces every redirect as a policy error; the hit executor
        // reclassifies it as a non-error.
        RedirectPolicy::NoFollow => Policy::custom(|attempt| attempt.error(RedirectsDisabled)),
    }
}

pub fn create_client(
    workers: usize,
    timeout: Duration,
    connect_timeout: Duration,
    redirects: RedirectPolicy,
) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(timeout)
        .tcp_nodelay(true)
        .gzip(true)
        .brotli(true)
        .user_agent(format!(
            "tilebench/{} (tile-load-benchmark)",
            env!("CARGO_PKG_VERSION")
        ))
        .pool_max_idle_per_host(workers)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .redirect(redirect_policy(redirects))
        .build()
}
