//! Run orchestration: terms → queries → dispatcher → session.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::HarvestConfig;
use crate::dispatcher::{Dispatch, Dispatcher};
use crate::error::{HarvestError, HarvestResult};
use crate::progress::ProgressEventKind;
use crate::query::QueryBuilder;
use crate::session::HarvestSession;
use crate::sink::FeatureSink;
use crate::terms::read_terms_from_path;
use crate::transport::{HttpTransport, Transport};
use crate::types::SearchTerm;

/// Drives one harvest pass over a list of search terms.
pub struct Harvester<T: Transport + 'static> {
    config: HarvestConfig,
    queries: QueryBuilder,
    transport: Arc<T>,
}

impl Harvester<HttpTransport> {
    /// Harvester over the real HTTP transport.
    pub fn from_config(config: HarvestConfig) -> HarvestResult<Self> {
        let transport = HttpTransport::new(config.timeout_ms, &config.user_agent)
            .map_err(|e| HarvestError::Config(format!("cannot build HTTP client: {e}")))?;
        Self::new(config, Arc::new(transport))
    }
}

impl<T: Transport + 'static> Harvester<T> {
    pub fn new(config: HarvestConfig, transport: Arc<T>) -> HarvestResult<Self> {
        config.validate()?;
        let queries = QueryBuilder::new(&config)?;
        tracing::info!("base search url: {}", queries.prefix());
        Ok(Self {
            config,
            queries,
            transport,
        })
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Read terms from `input`, then harvest them.
    ///
    /// An unreadable input fails before any request is issued.
    pub async fn run_from_path<S: FeatureSink, W: Write>(
        &self,
        input: &Path,
        session: &mut HarvestSession<S, W>,
    ) -> HarvestResult<()> {
        let terms = read_terms_from_path(input)?;
        self.run(&terms, session).await;
        Ok(())
    }

    /// Issue one request per term and feed every completion to `session`.
    ///
    /// Per-request, per-response and per-feature failures are handled by the
    /// session; this never fails.
    pub async fn run<S: FeatureSink, W: Write>(
        &self,
        terms: &[SearchTerm],
        session: &mut HarvestSession<S, W>,
    ) {
        let started = Instant::now();
        let queries = self.queries.build_all(terms);
        let total = queries.len();

        session.report_mut().terms += terms.len();
        session.emit(ProgressEventKind::Started {
            total_terms: total,
            concurrency: self.config.concurrency,
        });

        let dispatcher = Dispatcher::new(self.transport.clone(), self.config.concurrency);
        let Dispatch {
            mut responses,
            task,
        } = dispatcher.dispatch(queries);

        while let Some(response) = responses.recv().await {
            session.handle(response);
        }

        let completed = match task.await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!("dispatch task failed: {e}");
                0
            }
        };
        if completed != total {
            tracing::warn!("{completed} of {total} requests completed");
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let report = session.report_mut();
        report.dispatched += completed;
        report.elapsed_ms += elapsed_ms;
        let (records_written, summary_lines) = (report.records_written, report.summary_lines);

        tracing::info!(
            "harvest finished: {summary_lines} summary lines, {records_written} records in {:.1}s",
            elapsed_ms as f64 / 1000.0
        );
        session.emit(ProgressEventKind::Finished {
            records_written,
            summary_lines,
            elapsed_ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaOptions;
    use crate::sink::MemorySink;
    use crate::summary::SummaryLog;

    fn session() -> HarvestSession<MemorySink, Vec<u8>> {
        HarvestSession::new(
            MemorySink::new(),
            SummaryLog::new(Vec::new()),
            SchemaOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_missing_input_aborts_before_dispatch() {
        let harvester = Harvester::from_config(HarvestConfig {
            base_url: "http://127.0.0.1:9/find".to_string(),
            ..HarvestConfig::default()
        })
        .unwrap();
        let mut s = session();
        let dir = tempfile::TempDir::new().unwrap();

        let err = harvester
            .run_from_path(&dir.path().join("missing.csv"), &mut s)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(s.report().dispatched, 0);
        assert_eq!(s.report().terms, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Harvester::from_config(HarvestConfig {
            concurrency: 0,
            ..HarvestConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, HarvestError::Config(_)));
    }
}
