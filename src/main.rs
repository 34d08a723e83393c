//! nameres - run one entity-resolution job from files.
//!
//! ```text
//! nameres job.yaml queries.json candidates.json --audit audit.jsonl
//! ```
//!
//! Query and candidate files are JSON arrays of `{"id", "name", "context"?}`.
//! Tiers 2 and 3 call HTTP adjudicators when `escalation.tier2.endpoint` /
//! `escalation.tier3.endpoint` are set. The job report is written to stdout
//! as JSON; logs go to stderr.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use adjudicator::HttpAdjudicator;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use nameres::{
    Adjudicators, EscalationConfig, JobConfig, JsonlAuditLog, NameRecord, ParallelCoordinator,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nameres", version, about = "Resolve query names against a candidate roster")]
struct Args {
    /// Job configuration (YAML).
    config: PathBuf,
    /// Query records (JSON array).
    queries: PathBuf,
    /// Candidate records (JSON array).
    candidates: PathBuf,
    /// Append audit records to this JSON Lines file.
    #[arg(long)]
    audit: Option<PathBuf>,
    #[arg(long, env = "NAMERES_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn read_records(path: &Path) -> anyhow::Result<Vec<NameRecord>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn http_adjudicators(cfg: &EscalationConfig) -> anyhow::Result<Adjudicators> {
    let mut adjudicators = Adjudicators::none();
    if let Some(endpoint) = &cfg.tier2.endpoint {
        let http = HttpAdjudicator::new("reasoning", endpoint.clone(), cfg.tier2.auth_header.clone())?;
        adjudicators = adjudicators.with_tier2(Arc::new(http));
    }
    if let Some(endpoint) = &cfg.tier3.endpoint {
        let http = HttpAdjudicator::new("evidence", endpoint.clone(), cfg.tier3.auth_header.clone())?;
        adjudicators = adjudicators.with_tier3(Arc::new(http));
    }
    Ok(adjudicators)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let job = JobConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?
        .prepare()?;
    let adjudicators = http_adjudicators(job.escalation())?;
    let queries = read_records(&args.queries)?;
    let candidates = read_records(&args.candidates)?;

    let mut coordinator = ParallelCoordinator::new(job, adjudicators)?;
    if let Some(path) = &args.audit {
        let log = JsonlAuditLog::open(path)
            .with_context(|| format!("opening audit log {}", path.display()))?;
        coordinator = coordinator.with_audit_sink(Arc::new(log));
    }

    let cancel = coordinator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt_received");
            cancel.cancel();
        }
    });

    let report = coordinator.run(queries, candidates).await?;

    let mut stdout = io::stdout().lock();
    if args.pretty {
        serde_json::to_writer_pretty(&mut stdout, &report)?;
    } else {
        serde_json::to_writer(&mut stdout, &report)?;
    }
    writeln!(stdout)?;
    Ok(())
}
