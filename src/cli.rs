use crate::types::RedirectPolicy;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s)
}

/// Default seed for runs that don't ask for a reproducible walk.
fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

#[derive(Parser, Debug)]
#[command(
    name = "tilebench",
    author,
    version,
    about = "Rate-paced load benchmark for map-tile rendering backends",
    long_about = "tilebench fires paced GET requests at a tile server and streams one\n\
                  length-framed result record per hit. Latency is the render time the\n\
                  server reports about itself, not client round-trip time."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Request random tiles of a layergroup at one zoom level
    Tiles(TilesArgs),

    /// Request the map endpoint with random cache-busted URLs
    Uniform(UniformArgs),

    /// Summarize a recorded result stream
    Report(ReportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
pub struct AttackArgs {
    /// Base URL of the server under test
    #[arg(short = 'b', long, default_value = "http://127.0.0.1:8181")]
    pub base: String,

    /// Host header value, for virtual-host routing at the target
    #[arg(short = 'H', long, default_value = "devuser.localhost.lan")]
    pub hostname: String,

    /// Attack duration (e.g. 30s, 2m)
    #[arg(short = 'd', long, default_value = "30s", value_parser = parse_duration)]
    pub duration: Duration,

    /// Requests per second
    #[arg(short = 'r', long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    pub rate: u64,

    /// Initial worker pool size
    #[arg(short = 'w', long, default_value = "10")]
    pub workers: usize,

    /// Ceiling for dynamic worker growth when the backend stalls
    #[arg(long, default_value = "4096")]
    pub max_workers: usize,

    /// Request timeout (e.g. 30s)
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Connection timeout (e.g. 5s)
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub connect_timeout: Duration,

    /// Redirect-following policy
    #[arg(long, value_enum, default_value_t = RedirectPolicy::Follow)]
    pub redirects: RedirectPolicy,

    /// Record sink: "stdout" or a file path
    #[arg(short = 'o', long, default_value = "stdout")]
    pub output: String,
}

#[derive(Parser, Debug)]
pub struct TilesArgs {
    #[command(flatten)]
    pub attack: AttackArgs,

    /// Zoom level to request tiles at
    #[arg(short = 'z', long, default_value = "10", value_parser = clap::value_parser!(u32).range(0..=30))]
    pub zoom: u32,

    /// RNG seed; a fixed seed replays the identical tile walk
    #[arg(short = 's', long, default_value_t = wall_clock_seed())]
    pub seed: u64,

    /// Layergroup identifier
    #[arg(short = 'l', long, default_value = "0:0")]
    pub layergroup: String,

    /// Bounding box min_x,min_y,max_x,max_y[,zoom]; -1 means the grid edge
    #[arg(short = 'x', long, default_value = "0,0,-1,-1")]
    pub bbox: String,
}

#[derive(Parser, Debug)]
pub struct UniformArgs {
    #[command(flatten)]
    pub attack: AttackArgs,

    /// RNG seed for the cache-buster stream
    #[arg(short = 's', long, default_value_t = wall_clock_seed())]
    pub seed: u64,
}

#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Record stream to summarize: "stdin" or a file path
    #[arg(default_value = "stdin")]
    pub input: String,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
