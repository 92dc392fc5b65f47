use super::{TargetError, Targeter};
use crate::types::Target;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::{Mutex, PoisonError};

/// Targets the map endpoint with a random fractional cache-buster per hit.
/// The seed is supplied by the caller; the CLI defaults it to wall-clock
/// nanos, so two uniform runs normally diverge.
pub struct UniformTargeter {
    base: String,
    rng: Mutex<StdRng>,
}

impl UniformTargeter {
    pub fn new(base: impl Into<String>, seed: u64) -> Self {
        Self {
            base: base.into(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Targeter for UniformTargeter {
    fn next_target(&self) -> Result<Target, TargetError> {
        let bust: f64 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random();
        Ok(Target::get(format!("{}/api/v1/map/{}", self.base, bust)))
    }
}
