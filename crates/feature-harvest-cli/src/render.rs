//! Terminal rendering of progress events.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use feature_harvest::progress::{ProgressEventKind, ProgressReceiver};

/// Drive a progress bar from `rx` until every sender is dropped.
pub fn spawn_progress_bar(mut rx: ProgressReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());

        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(n)) => {
                    tracing::debug!("progress renderer skipped {n} events");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            match event.event {
                ProgressEventKind::Started { total_terms, .. } => {
                    bar.set_length(total_terms as u64);
                    bar.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.cyan} [{bar:30}] {pos}/{len} {msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_bar()),
                    );
                    bar.set_draw_target(ProgressDrawTarget::stderr());
                }
                ProgressEventKind::TermCompleted { term, count } => {
                    bar.inc(1);
                    bar.set_message(format!("{term} ({count})"));
                }
                ProgressEventKind::TermFailed { term, kind, .. } => {
                    bar.inc(1);
                    bar.set_message(format!("{term} [{kind}]"));
                }
                ProgressEventKind::Finished { records_written, .. } => {
                    bar.finish_with_message(format!("{records_written} records"));
                }
                ProgressEventKind::SchemaDeclared { .. }
                | ProgressEventKind::FeatureSkipped { .. } => {}
            }
        }

        if !bar.is_finished() {
            bar.abandon();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_harvest::progress;

    #[tokio::test]
    async fn test_renderer_exits_when_senders_drop() {
        let (tx, rx) = progress::channel();
        let handle = spawn_progress_bar(rx);
        let mut seq = 0;
        let tx = Some(tx);
        progress::emit(
            &tx,
            "run",
            &mut seq,
            ProgressEventKind::TermCompleted {
                term: "Kruger".into(),
                count: 0,
            },
        );
        drop(tx);
        handle.await.unwrap();
    }
}
