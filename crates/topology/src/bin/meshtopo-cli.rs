//! meshtopo CLI Tool
//!
//! Replays a recorded log of parent advertisements into a fresh parent table
//! and prints the resulting topology graph or a source route.

use anyhow::{anyhow, bail, Context};
use meshtopo_core::{logging, Config, NodeAddress, Timestamp};
use meshtopo_topology::{
    resolve_source_route, AdvertisedParent, ManualClock, ParentTable, ParentTableStore,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// One advertisement as stored in the replay file
#[derive(Debug, Deserialize)]
struct AdvertisementRecord {
    owner: NodeAddress,
    #[serde(default)]
    parents: Vec<AdvertisedParent>,
}

/// JSON output for route command
#[derive(Debug, Serialize)]
struct RouteOutput {
    destination: NodeAddress,
    now: Timestamp,
    hops: Vec<NodeAddress>,
}

/// Options shared by every command
struct ReplayOptions {
    input: PathBuf,
    now: Option<Timestamp>,
    config: Option<PathBuf>,
    json: bool,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(Config::from_env()?),
    }
}

/// Replay the input file and return the snapshot at the requested instant
fn replay(options: &ReplayOptions, config: &Config) -> anyhow::Result<(ParentTable, Timestamp)> {
    let content = fs::read_to_string(&options.input)
        .with_context(|| format!("Failed to read input {}", options.input.display()))?;
    let records: Vec<AdvertisementRecord> =
        serde_json::from_str(&content).context("Failed to parse advertisements")?;

    let clock = Arc::new(ManualClock::new(0));
    let store = ParentTableStore::with_clock(&config.topology, clock.clone());

    // Replay with the clock following the log so ingest-time sweeps see log time.
    let mut latest = 0;
    for (index, record) in records.into_iter().enumerate() {
        let advertised_at = record.parents.iter().map(|p| p.timestamp).max().unwrap_or(latest);
        latest = latest.max(advertised_at);
        clock.set(latest);

        if let Err(e) = store.record_parent_advertisement(record.owner, record.parents) {
            tracing::warn!(index, error = %e, "Skipping advertisement");
        }
    }

    let now = options.now.unwrap_or(latest);
    clock.set(now);
    Ok((store.snapshot_parents()?, now))
}

fn cmd_graph(options: ReplayOptions, config: &Config, dag: bool) -> anyhow::Result<()> {
    let (table, now) = replay(&options, config)?;
    let view = table.graph_view();

    if options.json {
        let rendered = if dag {
            serde_json::to_string_pretty(&view.to_dag())?
        } else {
            serde_json::to_string_pretty(&view)?
        };
        println!("{}", rendered);
    } else {
        println!("Topology at t={} (ttl {}s)", now, config.topology.parent_ttl_secs);
        println!("Nodes: {}", view.nodes.len());
        for edge in &view.edges {
            println!("  {} -> {}", edge.from, edge.to);
        }
    }

    Ok(())
}

fn cmd_route(options: ReplayOptions, config: &Config, dest: NodeAddress) -> anyhow::Result<()> {
    let (table, now) = replay(&options, config)?;
    let hops = resolve_source_route(&dest, &table);

    if options.json {
        let output = RouteOutput {
            destination: dest,
            now,
            hops,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if hops.is_empty() {
        println!("No route to {} at t={}", dest, now);
    } else {
        let rendered: Vec<String> = hops.iter().map(ToString::to_string).collect();
        println!("{}", rendered.join(" -> "));
    }

    Ok(())
}

fn print_usage() {
    println!("meshtopo-cli - replay parent advertisements and inspect the topology");
    println!();
    println!("USAGE:");
    println!("    meshtopo-cli graph --input <FILE> [--now <SECS>] [--config <TOML>] [--json] [--dag]");
    println!("    meshtopo-cli route --input <FILE> --dest <ADDR> [--now <SECS>] [--config <TOML>] [--json]");
    println!();
    println!("INPUT:");
    println!("    JSON array of {{\"owner\": ADDR, \"parents\": [{{\"address\": ADDR, \"timestamp\": SECS}}]}}");
    println!();
    println!("ENVIRONMENT:");
    println!("    MESHTOPO_PARENT_TTL_SECS   parent entry lifetime (default 70)");
    println!("    MESHTOPO_LOG_JSON          emit JSON logs when set to 1/true");
    println!("    RUST_LOG                   log filter (default info)");
}

fn run(command: &str, args: &[String]) -> anyhow::Result<()> {
    let mut input = None;
    let mut now = None;
    let mut config_path = None;
    let mut dest = None;
    let mut json = false;
    let mut dag = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" | "-i" => {
                i += 1;
                input = args.get(i).map(PathBuf::from);
            }
            "--now" | "-n" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| anyhow!("Missing value for --now"))?;
                now = Some(value.parse().with_context(|| format!("Invalid --now {:?}", value))?);
            }
            "--config" | "-c" => {
                i += 1;
                config_path = args.get(i).map(PathBuf::from);
            }
            "--dest" | "-d" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| anyhow!("Missing value for --dest"))?;
                dest = Some(value.parse::<NodeAddress>()?);
            }
            "--json" => json = true,
            "--dag" => dag = true,
            other => bail!("Unknown argument: {}", other),
        }
        i += 1;
    }

    let config = load_config(config_path.as_ref())?;
    logging::init_from_config(&config.logging);

    let options = ReplayOptions {
        input: input.ok_or_else(|| anyhow!("Missing --input argument"))?,
        now,
        config: config_path,
        json,
    };
    tracing::debug!(config = ?options.config, "Starting replay");

    match command {
        "graph" => cmd_graph(options, &config, dag),
        "route" => {
            let dest = dest.ok_or_else(|| anyhow!("Missing --dest argument"))?;
            cmd_route(options, &config, dest)
        }
        other => bail!("Unknown command: {}", other),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some((command, rest)) = args.split_first() else {
        print_usage();
        process::exit(1);
    };

    if command == "help" || command == "--help" || command == "-h" {
        print_usage();
        return;
    }

    if let Err(e) = run(command, rest) {
        eprintln!("Error: {:#}", e);
        println!();
        print_usage();
        process::exit(1);
    }
}
