//! hackjudge-viewer - terminal viewer for a hackjudge-api server
//!
//! Keeps a local snapshot in sync by polling or by following the SSE
//! stream, and prints a summary line after every refresh. When sync halts
//! after repeated failures, pressing Enter retries.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hackjudge_common::results;
use hackjudge_viewer::viewer::DEFAULT_MAX_FAILURES;
use hackjudge_viewer::{run_polling, run_push, HttpSource, Viewer, ViewerError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Re-fetch the snapshot on a fixed interval
    Poll,
    /// Follow the server's event stream
    Push,
}

/// Command-line arguments for hackjudge-viewer
#[derive(Parser, Debug)]
#[command(name = "hackjudge-viewer")]
#[command(about = "Follow live hackathon judging state")]
#[command(version)]
struct Args {
    /// Base URL of the hackjudge-api server
    #[arg(short, long, env = "HACKJUDGE_SERVER", default_value = "http://localhost:3001")]
    server: String,

    /// Synchronization mode
    #[arg(short, long, value_enum, default_value_t = Mode::Poll)]
    mode: Mode,

    /// Poll interval in seconds
    #[arg(long, default_value_t = 5)]
    interval_secs: u64,

    /// Seconds to wait before reconnecting the event stream
    #[arg(long, default_value_t = 2)]
    reconnect_secs: u64,

    /// Consecutive failures before sync halts
    #[arg(long, default_value_t = DEFAULT_MAX_FAILURES)]
    max_failures: u32,

    /// Also print the leading project of each track
    #[arg(long)]
    results: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hackjudge_viewer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Following {} ({:?} mode)", args.server, args.mode);

    let source = HttpSource::new(&args.server).context("Failed to build HTTP client")?;
    let mut viewer = Viewer::new(source, args.max_failures);

    tokio::select! {
        result = follow(&mut viewer, &args) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, exiting");
            Ok(())
        }
    }
}

/// Sync until halted, then wait for Enter and start over
async fn follow(viewer: &mut Viewer<HttpSource>, args: &Args) -> Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let show_results = args.results;
    let print = move |v: &Viewer<HttpSource>| print_update(v, show_results);

    loop {
        let halted: ViewerError = match args.mode {
            Mode::Poll => {
                run_polling(viewer, Duration::from_secs(args.interval_secs), print).await
            }
            Mode::Push => {
                run_push(viewer, Duration::from_secs(args.reconnect_secs), print).await
            }
        };
        error!("{}", halted);
        println!("Sync halted. Press Enter to retry.");

        if stdin.next_line().await.context("Failed to read stdin")?.is_none() {
            return Err(halted.into());
        }
        match viewer.retry().await {
            Ok(snapshot) => println!("[retry] {}", snapshot.summary()),
            Err(e) => println!("[retry failed] {}", e),
        }
    }
}

fn print_update(viewer: &Viewer<HttpSource>, show_results: bool) {
    let snapshot = viewer.snapshot();
    match viewer.revision() {
        Some(revision) => println!("[{} r{}] {}", viewer.state(), revision, snapshot.summary()),
        None => println!("[{}] {}", viewer.state(), snapshot.summary()),
    }

    if show_results && viewer.state().has_data() {
        for track in results::aggregate(snapshot) {
            if let Some(leader) = track.projects.first() {
                println!(
                    "  {}: {} ({:.2} over {} score(s))",
                    track.track, leader.name, leader.average, leader.score_count
                );
            }
        }
    }
}
