mod attacker;
mod stats;
mod worker;

pub use attacker::{AttackError, Attacker, AttackerConfig};
pub use stats::AttackStats;
