//! The harvest session: the single consumer of completed responses.
//!
//! Owns the run's schema, the output store and the summary log. Every
//! failure below the run level is logged, counted and skipped here; nothing
//! handled by the session aborts sibling work.

use serde_json::Value;
use std::io::Write;

use crate::error::{FeatureError, HarvestError};
use crate::geometry::build_polygon;
use crate::progress::{self, ProgressEventKind, ProgressSender};
use crate::report::HarvestReport;
use crate::response::parse_results;
use crate::schema::{OutputSchema, SchemaOptions, SchemaUnifier};
use crate::sink::FeatureSink;
use crate::summary::SummaryLog;
use crate::types::{FeatureResult, ServiceResponse, SummaryEntry};
use crate::writer::RecordWriter;

/// Mutable state for one run, touched from one task only.
pub struct HarvestSession<S: FeatureSink, W: Write> {
    unifier: SchemaUnifier,
    writer: RecordWriter<S>,
    summary: SummaryLog<W>,
    report: HarvestReport,
    progress: Option<ProgressSender>,
    run_id: String,
    seq: u64,
}

impl<S: FeatureSink, W: Write> HarvestSession<S, W> {
    pub fn new(sink: S, summary: SummaryLog<W>, options: SchemaOptions) -> Self {
        Self {
            unifier: SchemaUnifier::new(options),
            writer: RecordWriter::new(sink),
            summary,
            report: HarvestReport::default(),
            progress: None,
            run_id: uuid::Uuid::new_v4().to_string(),
            seq: 0,
        }
    }

    /// Attach a progress channel.
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn schema(&self) -> Option<&OutputSchema> {
        self.unifier.schema()
    }

    pub fn report(&self) -> &HarvestReport {
        &self.report
    }

    pub(crate) fn report_mut(&mut self) -> &mut HarvestReport {
        &mut self.report
    }

    pub fn sink(&self) -> &S {
        self.writer.sink()
    }

    /// Commit the store and hand back the sink and summary log.
    pub fn finish(mut self) -> (HarvestReport, S, SummaryLog<W>) {
        if let Err(e) = self.writer.finish() {
            tracing::error!("failed to finalize output store: {e}");
        }
        self.report.schema = self
            .unifier
            .schema()
            .map(|s| s.field_names().into_iter().map(String::from).collect());
        (self.report, self.writer.into_sink(), self.summary)
    }

    pub(crate) fn emit(&mut self, event: ProgressEventKind) {
        progress::emit(&self.progress, &self.run_id, &mut self.seq, event);
    }

    /// Handle one completed request.
    pub fn handle(&mut self, response: ServiceResponse) {
        let ServiceResponse { query, outcome } = response;

        let http = match outcome {
            Ok(http) => http,
            Err(failure) => {
                let err = HarvestError::Transport {
                    url: query.url.to_string(),
                    source: failure,
                };
                tracing::warn!(term = %query.term, "{err}");
                self.report.transport_failures += 1;
                self.term_failed(&query.term, &err);
                return;
            }
        };

        let results = match parse_results(&query, &http) {
            Ok(results) => results,
            Err(err) => {
                if matches!(err, HarvestError::Service { .. }) {
                    tracing::warn!(term = %query.term, "error in 200 response: {err}");
                    self.report.service_errors += 1;
                } else {
                    tracing::warn!(term = %query.term, "{err}");
                    self.report.parse_failures += 1;
                }
                self.term_failed(&query.term, &err);
                return;
            }
        };

        let term = query.term;
        let count = results.len();
        tracing::info!("Response [{count}]: {term}");
        self.report.responses_parsed += 1;

        match self.summary.record(&SummaryEntry {
            term: term.clone(),
            count,
        }) {
            Ok(()) => self.report.summary_lines += 1,
            Err(e) => {
                tracing::error!(term = %term, "failed to write summary line: {e}");
                self.report.summary_failures += 1;
            }
        }
        self.emit(ProgressEventKind::TermCompleted {
            term: term.clone(),
            count,
        });

        for raw in results {
            if let Err(err) = self.accept_feature(&term, raw) {
                match &err {
                    HarvestError::Write { .. } => self.report.write_failures += 1,
                    _ => self.report.feature_errors += 1,
                }
                tracing::warn!("{err}");
                self.emit(ProgressEventKind::FeatureSkipped {
                    term: term.clone(),
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    /// Schema → geometry → record for one result entry.
    fn accept_feature(&mut self, term: &str, raw: Value) -> Result<(), HarvestError> {
        let feature_err = |source| HarvestError::Feature {
            term: term.to_string(),
            source,
        };
        let write_err = |source| HarvestError::Write {
            term: term.to_string(),
            source,
        };

        let feature = FeatureResult::from_value(raw).map_err(feature_err)?;

        let schema = self
            .unifier
            .observe(&feature)
            .ok_or_else(|| feature_err(FeatureError::NoAttributes))?;

        match self.writer.declare(schema) {
            Ok(true) => {
                let fields = schema.field_names().into_iter().map(String::from).collect();
                progress::emit(
                    &self.progress,
                    &self.run_id,
                    &mut self.seq,
                    ProgressEventKind::SchemaDeclared { fields },
                );
            }
            Ok(false) => {}
            Err(e) => {
                if self.report.declare_failures == 0 {
                    tracing::error!(
                        "output store refused schema {:?}: {e}; records are skipped until it is accepted",
                        schema.field_names()
                    );
                }
                self.report.declare_failures += 1;
                return Err(write_err(e));
            }
        }

        let polygon = build_polygon(feature.geometry.as_ref()).map_err(feature_err)?;

        self.writer
            .write(schema, term, &feature, polygon)
            .map_err(write_err)?;
        self.report.records_written += 1;
        Ok(())
    }

    fn term_failed(&mut self, term: &str, err: &HarvestError) {
        self.emit(ProgressEventKind::TermFailed {
            term: term.to_string(),
            kind: err.kind().to_string(),
            message: err.to_string(),
        });
    }
}
