mod client;
mod hit;

pub use client::create_client;
pub use hit::{PROFILE_HEADER, execute_hit};
