//! `apisnap` - keep a committed API schema snapshot in sync with a live service
//!
//! Exits 0 when the snapshot is current and every document is valid, 1 when
//! files changed or a document is invalid, and 2 when the run aborted.

mod cli;
mod config;
mod logging;

use anyhow::Context;
use apisnap_core::{ReconciliationEngine, ReconciliationReport, ValidationGate, EXIT_FATAL};
use apisnap_http::AttachedService;
use apisnap_store::SchemaStore;
use clap::Parser;
use cli::Cli;
use config::Settings;
use serde::Serialize;
use std::process::ExitCode;

/// Report as printed by `--json`
#[derive(Serialize)]
struct JsonReport<'a> {
    package: &'a str,
    passed: bool,
    #[serde(flatten)]
    report: &'a ReconciliationReport,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    match run(&cli).await {
        Ok(report) => ExitCode::from(report.exit_code()),
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<ReconciliationReport> {
    let settings = Settings::resolve(cli).context("invalid configuration")?;
    let list_all = settings.sync.list_all;

    let store = SchemaStore::open(&settings.sync.schema_dir)?;
    let engine = ReconciliationEngine::new(store, ValidationGate::openapi(), settings.sync);
    tracing::info!(
        "Synchronizing {} schema into {}",
        cli.package,
        engine.store().root().display()
    );

    let report = {
        let service = AttachedService::attach(&settings.service, engine.config().roles())
            .with_context(|| format!("failed to attach to {}", settings.service.node_url))?;
        engine.run(service.fetcher()).await?
    };

    report.log_outcome(list_all);

    if cli.json {
        let output = JsonReport {
            package: &cli.package,
            passed: report.passed(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", report.generate_text());
    }

    Ok(report)
}
