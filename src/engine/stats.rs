use crate::types::HitResult;
use chrono::{DateTime, Utc};
use hdrhistogram::Histogram;
use std::collections::HashMap;

/// Aggregates a result stream for the end-of-run and `report` summaries.
/// Latencies are the server-reported render times; hits without a profiler
/// header are counted separately and kept out of the histogram.
pub struct AttackStats {
    render_ms: Histogram<u64>,
    pub hits: u64,
    pub failures: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub missing_profiles: u64,
    pub status_codes: HashMap<u16, u64>,
    pub errors: HashMap<String, u64>,
    first_tick: Option<DateTime<Utc>>,
    last_tick: Option<DateTime<Utc>>,
}

const MAX_RENDER_MS: u64 = 3_600_000;

impl AttackStats {
    pub fn new() -> Self {
        let render_ms = Histogram::<u64>::new_with_bounds(1, MAX_RENDER_MS, 3)
            .expect("Failed to create histogram");

        Self {
            render_ms,
            hits: 0,
            failures: 0,
            bytes_in: 0,
            bytes_out: 0,
            missing_profiles: 0,
            status_codes: HashMap::new(),
            errors: HashMap::new(),
            first_tick: None,
            last_tick: None,
        }
    }

    pub fn record(&mut self, hit: &HitResult) {
        self.hits += 1;
        self.bytes_in += hit.bytes_in;
        self.bytes_out += hit.bytes_out;

        if hit.status_code > 0 {
            *self.status_codes.entry(hit.status_code).or_insert(0) += 1;
        }

        if !hit.is_success() {
            self.failures += 1;
        }
        if let Some(error) = &hit.error {
            *self.errors.entry(error.clone()).or_insert(0) += 1;
        }

        if hit.profile_missing {
            self.missing_profiles += 1;
        } else {
            let ms = (hit.latency.as_millis() as u64).min(MAX_RENDER_MS);
            let _ = self.render_ms.record(ms);
        }

        self.first_tick = Some(match self.first_tick {
            Some(first) => first.min(hit.timestamp),
            None => hit.timestamp,
        });
        self.last_tick = Some(match self.last_tick {
            Some(last) => last.max(hit.timestamp),
            None => hit.timestamp,
        });
    }

    /// Number of hits that carried a parseable profiler header.
    pub fn profiled(&self) -> u64 {
        self.render_ms.len()
    }

    pub fn success_ratio(&self) -> f64 {
        if self.hits > 0 {
            (self.hits - self.failures) as f64 / self.hits as f64
        } else {
            1.0
        }
    }

    /// Hit rate over the tick timestamps actually observed.
    pub fn achieved_rate(&self) -> f64 {
        match (self.first_tick, self.last_tick) {
            (Some(first), Some(last)) if last > first => {
                let span = (last - first).num_milliseconds() as f64 / 1000.0;
                (self.hits.saturating_sub(1)) as f64 / span
            }
            _ => 0.0,
        }
    }

    pub fn render_min(&self) -> u64 {
        self.render_ms.min()
    }

    pub fn render_max(&self) -> u64 {
        self.render_ms.max()
    }

    pub fn render_mean(&self) -> f64 {
        self.render_ms.mean()
    }

    pub fn render_percentile(&self, p: f64) -> u64 {
        self.render_ms.value_at_percentile(p)
    }
}

impl Default for AttackStats {
    fn default() -> Self {
        Self::new()
    }
}
