//! Bounded-concurrency request dispatch.
//!
//! Requests run on a spawned task through `buffer_unordered`, so at most
//! `concurrency` are outstanding at once. Completed responses, successful or
//! not, are posted in completion order to a single-consumer channel; all
//! schema and store work happens on the consumer side.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::transport::Transport;
use crate::types::{Query, ServiceResponse};

/// Issues every query exactly once with a fixed ceiling on outstanding requests.
pub struct Dispatcher<T: Transport + 'static> {
    transport: Arc<T>,
    concurrency: usize,
}

/// Receiving end of a dispatch plus the task driving it.
pub struct Dispatch {
    pub responses: mpsc::Receiver<ServiceResponse>,
    pub task: JoinHandle<usize>,
}

impl<T: Transport + 'static> Dispatcher<T> {
    /// A ceiling of zero is treated as one.
    pub fn new(transport: Arc<T>, concurrency: usize) -> Self {
        Self {
            transport,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Start issuing `queries`. The task resolves to the number of completed requests.
    ///
    /// Dropping the receiver stops further requests from being started.
    pub fn dispatch(&self, queries: Vec<Query>) -> Dispatch {
        let (tx, rx) = mpsc::channel(self.concurrency);
        let transport = self.transport.clone();
        let concurrency = self.concurrency;

        let task = tokio::spawn(async move {
            let mut completed = 0usize;
            let mut in_flight = stream::iter(queries)
                .map(|query| {
                    let transport = transport.clone();
                    async move {
                        tracing::debug!("requesting {}", query.url);
                        let outcome = transport.get(&query.url).await;
                        ServiceResponse { query, outcome }
                    }
                })
                .buffer_unordered(concurrency);

            while let Some(response) = in_flight.next().await {
                completed += 1;
                if tx.send(response).await.is_err() {
                    tracing::warn!("response consumer went away after {completed} responses");
                    break;
                }
            }
            completed
        });

        Dispatch {
            responses: rx,
            task,
        }
    }
}
