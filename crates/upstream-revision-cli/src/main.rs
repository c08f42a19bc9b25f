//! upstream-revision - offline evaluation of upstream revision decisions
//!
//! ## Commands
//!
//! - `resolve`: run the resolver for one run of a host snapshot and print a
//!   JSON decision report
//! - `describe`: print the customization descriptor and precedence

mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, Level};
use upstream_revision::fakes::{HostSnapshot, MemoryHost, RecordingListener};
use upstream_revision::{
    init_tracing, ResolverConfig, RunId, TraitDescriptor, UpstreamRevisionResolver,
    CONTEXT_LABEL_ENV, DEFAULT_PRECEDENCE,
};

use crate::report::DecisionReport;

#[derive(Parser)]
#[command(name = "upstream-revision")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Decide whether a downstream build reuses its upstream revision", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the revision of one run in a host snapshot
    Resolve {
        /// Path to the host snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Run to resolve
        #[arg(short, long)]
        run: String,

        /// Label identifying this configuration in reports
        #[arg(long, env = CONTEXT_LABEL_ENV)]
        context_label: Option<String>,
    },

    /// Show the customization descriptor
    Describe,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Resolve {
            snapshot,
            run,
            context_label,
        } => cmd_resolve(&snapshot, RunId::new(run), context_label),
        Commands::Describe => cmd_describe(),
    }
}

fn cmd_resolve(path: &Path, run: RunId, context_label: Option<String>) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot = HostSnapshot::from_json(&raw)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    let build = snapshot.run(&run)?.build.clone();

    let host = MemoryHost::new(snapshot);
    let config = match context_label {
        Some(label) => ResolverConfig::new(label),
        None => ResolverConfig::default(),
    };
    let resolver = UpstreamRevisionResolver::new(config, &host, &host, &host);
    let listener = RecordingListener::new();

    let resolution = resolver
        .resolve_with_reason(&build, &listener)
        .with_context(|| format!("Failed to resolve revision for {run}"))?;

    let report = DecisionReport::new(
        run.clone(),
        resolver.config().context_label.clone(),
        resolution,
        listener.lines(),
        host.parameters_for(&run),
    );
    info!("{}", report.summary());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_describe() -> Result<()> {
    let config = ResolverConfig::from_env();
    let out = json!({
        "descriptor": TraitDescriptor::upstream_revision(),
        "precedence": DEFAULT_PRECEDENCE,
        "context_label": config.context_label(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
