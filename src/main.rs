mod cli;
mod engine;
mod http;
mod output;
mod target;
mod types;

use clap::Parser;
use cli::{AttackArgs, Cli, Commands, ReportArgs, TilesArgs, UniformArgs};
use engine::{AttackStats, Attacker, AttackerConfig};
use output::{RecordReader, RecordWriter, write_summary};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::sync::Arc;
use target::{Bbox, Targeter, TileTargeter, UniformTargeter};

#[tokio::main]
async fn main() {
    // Records stream to stdout; logs stay on stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32, String> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tiles(args) => run_tiles(args).await,
        Commands::Uniform(args) => run_uniform(args).await,
        Commands::Report(args) => run_report(&args),
        Commands::Completions(args) => {
            cli::generate_completions(args.shell);
            Ok(0)
        }
    }
}

async fn run_tiles(args: TilesArgs) -> Result<i32, String> {
    let bbox = Bbox::parse(&args.bbox, args.zoom).map_err(|e| e.to_string())?;
    let targeter = TileTargeter::new(
        args.attack.base.clone(),
        args.attack.hostname.clone(),
        args.layergroup.clone(),
        args.zoom,
        args.seed,
        bbox,
    )
    .map_err(|e| e.to_string())?;

    run_attack(&args.attack, Arc::new(targeter)).await
}

async fn run_uniform(args: UniformArgs) -> Result<i32, String> {
    let targeter = UniformTargeter::new(args.attack.base.clone(), args.seed);
    run_attack(&args.attack, Arc::new(targeter)).await
}

async fn run_attack(args: &AttackArgs, targeter: Arc<dyn Targeter>) -> Result<i32, String> {
    let attacker = Arc::new(
        Attacker::new(AttackerConfig {
            workers: args.workers,
            max_workers: args.max_workers,
            timeout: args.timeout,
            connect_timeout: args.connect_timeout,
            redirects: args.redirects,
        })
        .map_err(|e| e.to_string())?,
    );

    {
        let attacker = attacker.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping attack");
                attacker.stop();
            }
        });
    }

    let mut results = attacker.attack(targeter, args.rate, args.duration);

    let sink =
        open_sink(&args.output).map_err(|e| format!("failed to open {}: {}", args.output, e))?;
    let mut writer = RecordWriter::new(BufWriter::new(sink));
    let mut stats = AttackStats::new();

    while let Some(hit) = results.recv().await {
        stats.record(&hit);
        writer
            .write(&hit)
            .map_err(|e| format!("failed to write record: {}", e))?;
    }
    writer
        .flush()
        .map_err(|e| format!("failed to flush records: {}", e))?;

    write_summary(&mut io::stderr(), &stats).map_err(|e| e.to_string())?;
    Ok(0)
}

fn run_report(args: &ReportArgs) -> Result<i32, String> {
    let source =
        open_source(&args.input).map_err(|e| format!("failed to open {}: {}", args.input, e))?;
    let mut reader = RecordReader::new(BufReader::new(source));
    let mut stats = AttackStats::new();

    loop {
        match reader.read() {
            Ok(Some(hit)) => stats.record(&hit),
            Ok(None) => break,
            Err(e) => return Err(format!("failed to decode {}: {}", args.input, e)),
        }
    }

    write_summary(&mut io::stdout(), &stats).map_err(|e| e.to_string())?;
    Ok(0)
}

fn open_sink(name: &str) -> io::Result<Box<dyn Write>> {
    match name {
        "stdout" | "-" => Ok(Box::new(io::stdout())),
        path => Ok(Box::new(File::create(path)?)),
    }
}

fn open_source(name: &str) -> io::Result<Box<dyn Read>> {
    match name {
        "stdin" | "-" => Ok(Box::new(io::stdin())),
        path => Ok(Box::new(File::open(path)?)),
    }
}
