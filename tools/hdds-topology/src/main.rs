// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! hdds-topology - Replay a discovery capture through the topology monitor
//!
//! Feeds a JSON-lines capture of builtin discovery samples into the
//! loopback backend, prints every topology notification as it fires and
//! dumps the final topics, endpoints and QoS mismatches per domain.
//!
//! Usage:
//!   hdds-topology capture.jsonl
//!   hdds-topology capture.jsonl --format json
//!   hdds-topology capture.jsonl --config topology.toml --quiet

use clap::Parser;
use colored::Colorize;
use hdds_topology::discovery::capture::{load_capture, CaptureRecord};
use hdds_topology::registry::{DomainSnapshot, TopicSnapshot};
use hdds_topology::{
    Endpoint, LoopbackDiscovery, TopologyConfig, TopologyEvent, TopologyListener, TopologyMonitor,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Upper bound on waiting for the observers to drain the capture.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "hdds-topology")]
#[command(version, about = "Replay a discovery capture and dump the DDS topology")]
struct Args {
    /// JSON-lines capture of builtin discovery samples
    capture: PathBuf,

    /// Monitor configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format: pretty, json
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Only print the final topology, not each notification
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Pretty,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "p" => Ok(OutputFormat::Pretty),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use: pretty, json", s)),
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(log_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        return Ok(());
    }

    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&args.log_level)?;

    let config = match &args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            TopologyConfig::from_file(path)?
        }
        None => TopologyConfig::builder()
            .idle_interval(Duration::from_millis(50))
            .build(),
    };
    let settle = config.dispatcher.idle_interval() * 2 + Duration::from_millis(50);

    let records = load_capture(&args.capture)?;
    info!("Loaded {} records from {:?}", records.len(), args.capture);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    if args.format == OutputFormat::Pretty {
        println!(
            "{} Replaying {} ({} records)",
            ">>>".green().bold(),
            args.capture.display(),
            records.len()
        );
        println!("{}", "Press Ctrl+C to stop the replay early".dimmed());
        println!();
    }

    let listener: Option<Arc<dyn TopologyListener>> = if args.quiet {
        None
    } else {
        let format = args.format;
        Some(Arc::new(move |event: &TopologyEvent| print_event(event, format)))
    };

    let backend = LoopbackDiscovery::new();
    let mut monitor =
        TopologyMonitor::start_with_listener(config, Arc::new(backend.clone()), listener)?;

    replay(&records, &monitor, &backend, &running)?;
    settle_observers(&monitor, &backend, settle);

    let snapshots: Vec<DomainSnapshot> = monitor
        .table()
        .domains()
        .into_iter()
        .filter_map(|domain_id| monitor.table().snapshot(domain_id))
        .collect();

    match args.format {
        OutputFormat::Pretty => print_pretty(&snapshots),
        OutputFormat::Json => print_json(&snapshots)?,
    }

    monitor.shutdown();
    Ok(())
}

fn replay(
    records: &[CaptureRecord],
    monitor: &TopologyMonitor,
    backend: &LoopbackDiscovery,
    running: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    for (index, record) in records.iter().enumerate() {
        if !sleep_while_running(record.delay(), running) {
            warn!("Replay interrupted after {} of {} records", index, records.len());
            break;
        }
        if monitor.add_domain(record.domain)? {
            debug!("Observing domain {} on first record", record.domain);
        }
        backend.push(record.domain, record.to_sample());
    }
    Ok(())
}

/// Sleep in short slices; returns false once Ctrl+C was pressed.
fn sleep_while_running(total: Duration, running: &AtomicBool) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return true;
        }
        thread::sleep(remaining.min(Duration::from_millis(50)));
    }
}

/// Wait until every observed domain consumed its samples, then give the
/// dispatcher time for its last cycle.
fn settle_observers(monitor: &TopologyMonitor, backend: &LoopbackDiscovery, settle: Duration) {
    let deadline = Instant::now() + SETTLE_TIMEOUT;
    let domains = monitor.table().domains();
    while domains.iter().any(|d| backend.pending(*d) > 0) {
        if Instant::now() >= deadline {
            warn!("Some domains did not drain their discovery samples");
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    thread::sleep(settle);
}

fn print_event(event: &TopologyEvent, format: OutputFormat) {
    if format == OutputFormat::Json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Cannot encode {} event: {}", event.kind(), e),
        }
        return;
    }

    let domain = format!("[{}]", event.domain_id()).dimmed();
    match event {
        TopologyEvent::DomainAdded { .. } => println!("{} {}", domain, "+ domain".green()),
        TopologyEvent::DomainRemoved { .. } => println!("{} {}", domain, "- domain".red()),
        TopologyEvent::TopicCreated { topic_name, .. } => {
            println!("{} {} {}", domain, "+ topic".green(), topic_name.cyan().bold())
        }
        TopologyEvent::TopicRemoved { topic_name, .. } => {
            println!("{} {} {}", domain, "- topic".red(), topic_name.cyan())
        }
        TopologyEvent::EndpointAdded { endpoint, .. } => println!(
            "{} {} {} {} on {}",
            domain,
            "+".green(),
            direction_tag(endpoint),
            endpoint.key,
            endpoint.topic_name.cyan()
        ),
        TopologyEvent::EndpointRemoved { key, .. } => {
            println!("{} {} endpoint {}", domain, "-".red(), key)
        }
        TopologyEvent::MismatchChanged {
            topic_name, keys, ..
        } => {
            println!(
                "{} {} {} ({} endpoints)",
                domain,
                "! mismatch".yellow().bold(),
                topic_name.cyan(),
                keys.len()
            );
            for key in keys {
                println!("      {}", key.to_string().yellow());
            }
        }
        TopologyEvent::MismatchCleared { topic_name, .. } => {
            println!("{} {} {}", domain, "~ mismatch cleared".green(), topic_name.cyan())
        }
        TopologyEvent::ParticipantAdded { participant, .. } => {
            println!("{} {} {}", domain, "+ participant".green(), participant.label())
        }
        TopologyEvent::ParticipantUpdated { participant, .. } => {
            println!("{} {} {}", domain, "~ participant".blue(), participant.label())
        }
        TopologyEvent::ParticipantRemoved { key, .. } => {
            println!("{} {} {}", domain, "- participant".red(), key)
        }
    }
}

fn direction_tag(endpoint: &Endpoint) -> colored::ColoredString {
    if endpoint.is_reader() {
        "R".blue().bold()
    } else {
        "W".green().bold()
    }
}

fn print_pretty(snapshots: &[DomainSnapshot]) {
    println!();
    if snapshots.is_empty() {
        println!("{}", "No domains observed".dimmed());
        return;
    }

    let mut total_topics = 0;
    let mut total_endpoints = 0;
    let mut total_mismatches = 0;

    for snapshot in snapshots {
        println!(
            "{}",
            format!("=== Domain {} ===", snapshot.domain_id).bold()
        );

        if !snapshot.participants.is_empty() {
            println!("  {}", "Participants:".bold());
            for participant in &snapshot.participants {
                println!("    {} {}", participant.key.to_string().dimmed(), participant.label());
            }
        }

        for topic in &snapshot.topics {
            print_topic(topic);
            total_endpoints += topic.readers.len() + topic.writers.len();
            total_mismatches += topic.mismatches.len();
        }
        total_topics += snapshot.topics.len();
        println!();
    }

    println!("{}", "--- Summary ---".bold());
    println!("  Domains:    {}", snapshots.len());
    println!("  Topics:     {}", total_topics);
    println!("  Endpoints:  {}", total_endpoints);
    if total_mismatches > 0 {
        println!("  Mismatches: {}", total_mismatches.to_string().yellow().bold());
    } else {
        println!("  Mismatches: {}", "0".green());
    }
}

fn print_topic(topic: &TopicSnapshot) {
    println!("  {} {}", "Topic:".bold(), topic.name.cyan().bold());
    for endpoint in topic.writers.iter().chain(topic.readers.iter()) {
        let owner = endpoint
            .participant
            .as_ref()
            .map(|p| p.label())
            .unwrap_or_else(|| endpoint.participant_key.to_string());
        println!(
            "    {} {} {} {}",
            direction_tag(endpoint),
            endpoint.key,
            endpoint.type_name.dimmed(),
            format!("({})", owner).dimmed()
        );
    }
    for mismatch in &topic.mismatches {
        let policies: Vec<String> = mismatch.policies.iter().map(ToString::to_string).collect();
        println!(
            "    {} R {} x W {}: {}",
            "!".yellow().bold(),
            mismatch.reader,
            mismatch.writer,
            policies.join(", ").yellow()
        );
    }
}

fn print_json(snapshots: &[DomainSnapshot]) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(snapshots)?);
    Ok(())
}
