#![forbid(unsafe_code)]

mod output;

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use futures::stream;
use nameline_core::delta::{DeltaComputer, StaticResolver};
use nameline_core::event::RawEvent;
use nameline_core::model::Snapshot;
use nameline_core::session::{EventStream, replay};
use nameline_core::timeline::Timeline;
use output::OutputMode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "nameline: time-travel history for decentralized names",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Replay an event file into a history timeline",
        after_help = "EXAMPLES:\n    # Replay a captured event stream\n    nml replay --events history.json\n\n    # With offline lookup tables for quotes and manifests\n    nml replay --events history.json --lookups lookups.json\n\n    # Machine-readable output\n    nml replay --events history.json --json"
    )]
    Replay(InputArgs),

    #[command(
        about = "Show only the final reconstructed state",
        after_help = "EXAMPLES:\n    # Final state after the whole event file\n    nml snapshot --events history.json"
    )]
    Snapshot(InputArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// JSON file holding the raw event array, in arrival order.
    #[arg(long)]
    events: PathBuf,

    /// Optional JSON file with offline lookup tables
    /// (price quotes and record manifests).
    #[arg(long)]
    lookups: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "debug"
        } else {
            "warn"
        })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn load_events(path: &Path) -> anyhow::Result<Vec<RawEvent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading events file {}", path.display()))?;
    let events: Vec<RawEvent> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing events file {}", path.display()))?;
    tracing::debug!(path = %path.display(), count = events.len(), "events loaded");
    Ok(events)
}

fn load_resolver(path: Option<&Path>) -> anyhow::Result<StaticResolver> {
    let Some(path) = path else {
        return Ok(StaticResolver::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading lookups file {}", path.display()))?;
    let resolver: StaticResolver = serde_json::from_str(&raw)
        .with_context(|| format!("parsing lookups file {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        prices = resolver.prices.len(),
        manifests = resolver.manifests.len(),
        "lookup tables loaded"
    );
    Ok(resolver)
}

async fn load_timeline(args: &InputArgs) -> anyhow::Result<Timeline> {
    let events = load_events(&args.events)?;
    let resolver = load_resolver(args.lookups.as_deref())?;
    let stream: EventStream = Box::pin(stream::iter(events.into_iter().map(Ok)));
    let computer = DeltaComputer::new(resolver);
    let (timeline, err) = replay(stream, &computer).await;
    if let Some(err) = err {
        anyhow::bail!("event stream failed after {} events: {err}", timeline.len());
    }
    Ok(timeline)
}

async fn run_replay(args: &InputArgs, mode: OutputMode) -> anyhow::Result<()> {
    let timeline = load_timeline(args).await?;
    let stdout = std::io::stdout();
    let mut w = stdout.lock();

    match mode {
        OutputMode::Json => {
            let rows: Vec<serde_json::Value> = timeline
                .presented()
                .into_iter()
                .map(|(event, snapshot)| {
                    serde_json::json!({
                        "tx_id": event.tx_id,
                        "ts": event.ts,
                        "actor": event.actor,
                        "action": event.action,
                        "category": event.category,
                        "snapshot": snapshot,
                    })
                })
                .collect();
            serde_json::to_writer_pretty(&mut w, &rows)?;
            writeln!(w)?;
        }
        OutputMode::Human => {
            for (event, _snapshot) in timeline.presented() {
                writeln!(
                    w,
                    "{:>12}  {:<28} {:<16} {:<16} {}",
                    event.ts, event.action, event.category, event.actor, event.tx_id
                )?;
            }
            if let Some(snapshot) = timeline.latest() {
                writeln!(w)?;
                print_snapshot(&mut w, snapshot)?;
            }
        }
    }
    Ok(())
}

async fn run_snapshot(args: &InputArgs, mode: OutputMode) -> anyhow::Result<()> {
    let timeline = load_timeline(args).await?;
    let snapshot = timeline.latest().cloned().unwrap_or_default();
    let stdout = std::io::stdout();
    let mut w = stdout.lock();

    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut w, &snapshot)?;
            writeln!(w)?;
        }
        OutputMode::Human => print_snapshot(&mut w, &snapshot)?,
    }
    Ok(())
}

fn print_snapshot(w: &mut dyn Write, snap: &Snapshot) -> std::io::Result<()> {
    output::kv_opt(w, "owner", snap.owner.as_deref())?;
    output::kv_list(w, "controllers", &snap.controllers)?;
    output::kv_opt(w, "expiry", snap.expiry_ts.map(|v| v.to_string()))?;
    output::kv_opt(w, "ttl", snap.ttl_secs.map(|v| v.to_string()))?;
    output::kv_opt(w, "process", snap.process_id.as_deref())?;
    output::kv_opt(w, "target", snap.target_id.as_deref())?;
    output::kv_opt(w, "undername limit", snap.undername_limit.map(|v| v.to_string()))?;
    output::kv_list(w, "undernames", &snap.undernames)?;
    for (label, content) in &snap.content_hashes {
        output::kv(w, "record", format!("{label} -> {content}"))?;
    }
    output::kv_opt(w, "ticker", snap.ticker.as_deref())?;
    output::kv_opt(w, "description", snap.description.as_deref())?;
    output::kv_list(w, "keywords", &snap.keywords)?;
    output::kv_opt(w, "price", snap.purchase_price.map(|v| v.to_string()))?;
    output::kv_opt(w, "start", snap.start_ts.map(|v| v.to_string()))?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mode = OutputMode::from_flag(cli.json);

    match &cli.command {
        Commands::Replay(args) => run_replay(args, mode).await,
        Commands::Snapshot(args) => run_snapshot(args, mode).await,
    }
}
