mod tiles;
mod uniform;

pub use tiles::{Bbox, BboxError, TileTargeter};
pub use uniform::UniformTargeter;

use crate::types::Target;
use thiserror::Error;

/// Produces the next request to issue. One targeter instance is shared by
/// every worker in an attack, so `next_target` takes `&self`; implementations
/// keep their RNG behind a lock.
pub trait Targeter: Send + Sync {
    fn next_target(&self) -> Result<Target, TargetError>;
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("target generation failed: {0}")]
    Generation(String),
}
