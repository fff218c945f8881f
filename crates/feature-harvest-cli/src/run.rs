//! The `run` subcommand: wire config, store, summary log and progress together.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Local};

use feature_harvest::{
    default_layer_name, default_summary_path, progress, read_terms_from_path, resolve_base_url,
    HarvestConfig, HarvestReport, HarvestSession, Harvester, SqliteSink, SummaryLog,
};

use crate::args::HarvestArgs;
use crate::render::spawn_progress_bar;

/// Resolved locations and settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub config: HarvestConfig,
    pub input: PathBuf,
    pub store: PathBuf,
    pub layer: String,
    pub summary: PathBuf,
}

impl RunPlan {
    pub fn resolve(args: &HarvestArgs, started: DateTime<Local>) -> Self {
        let config = HarvestConfig {
            base_url: resolve_base_url(args.url.as_deref()),
            concurrency: args.concurrency,
            contains: Some(!args.no_contains),
            timeout_ms: args.timeout_ms,
            layers: args.layers.clone(),
            search_fields: args.search_fields.clone(),
            out_sr: args.out_sr,
            srid: args.srid,
            ..HarvestConfig::default()
        };

        let layer = args
            .table
            .clone()
            .unwrap_or_else(|| default_layer_name(&args.input, started));
        let summary = args
            .summary
            .clone()
            .unwrap_or_else(|| default_summary_path(&args.input, &layer));
        let store = args
            .output
            .clone()
            .unwrap_or_else(|| args.input.with_extension("sqlite"));

        Self {
            config,
            input: args.input.clone(),
            store,
            layer,
            summary,
        }
    }
}

/// Execute a harvest and return its report.
pub async fn run_harvest(args: &HarvestArgs) -> anyhow::Result<HarvestReport> {
    let plan = RunPlan::resolve(args, Local::now());
    tracing::info!(
        "harvesting {} into {} (layer {}), summary {}",
        plan.input.display(),
        plan.store.display(),
        plan.layer,
        plan.summary.display()
    );

    let harvester =
        Harvester::from_config(plan.config.clone()).context("invalid harvest configuration")?;

    // Terms first: an unreadable input creates no outputs.
    let terms = read_terms_from_path(&plan.input)?;
    tracing::info!("{} search terms", terms.len());

    let sink = SqliteSink::open(&plan.store, &plan.layer, plan.config.srid)
        .with_context(|| format!("cannot open output store {}", plan.store.display()))?
        .with_identity_field(&plan.config.schema.reserved_field);
    let summary = SummaryLog::create(&plan.summary)
        .with_context(|| format!("cannot create summary log {}", plan.summary.display()))?;

    let mut session = HarvestSession::new(sink, summary, plan.config.schema.clone());
    let renderer = if args.quiet {
        None
    } else {
        let (tx, rx) = progress::channel();
        session = session.with_progress(tx);
        Some(spawn_progress_bar(rx))
    };

    harvester.run(&terms, &mut session).await;

    let (report, sink, summary) = session.finish();
    drop(sink);
    summary
        .into_inner()
        .with_context(|| format!("cannot flush summary log {}", plan.summary.display()))?;

    if let Some(handle) = renderer {
        if let Err(e) = handle.await {
            tracing::debug!("progress renderer stopped: {e}");
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{Cli, Commands};
    use chrono::TimeZone;
    use clap::Parser;
    use std::path::Path;

    fn args(extra: &[&str]) -> HarvestArgs {
        let mut argv = vec!["feature-harvest", "run", "/data/parks.csv"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            Commands::Completions { .. } => unreachable!(),
        }
    }

    fn started() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_default_plan() {
        let plan = RunPlan::resolve(&args(&["--url", "http://svc.test/find"]), started());
        assert_eq!(plan.layer, "parks_20240309_140507");
        assert_eq!(plan.summary, Path::new("/data/parks_20240309_140507.csv"));
        assert_eq!(plan.store, Path::new("/data/parks.sqlite"));
        assert_eq!(plan.config.base_url, "http://svc.test/find");
        assert_eq!(plan.config.contains, Some(true));
    }

    #[test]
    fn test_explicit_plan() {
        let plan = RunPlan::resolve(
            &args(&[
                "--url",
                "http://svc.test/find",
                "-o",
                "/out/store.sqlite",
                "--table",
                "protected",
                "--summary",
                "/out/counts.csv",
                "--no-contains",
                "--srid",
                "4326",
            ]),
            started(),
        );
        assert_eq!(plan.layer, "protected");
        assert_eq!(plan.summary, Path::new("/out/counts.csv"));
        assert_eq!(plan.store, Path::new("/out/store.sqlite"));
        assert_eq!(plan.config.contains, Some(false));
        assert_eq!(plan.config.srid, 4326);
    }
}
