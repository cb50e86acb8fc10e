//! Runs [`Command`]s as tokio tasks and reports back as [`Message`]s.
//!
//! One task per slot is in flight at a time. Dispatching a new command for a
//! slot aborts the task it supersedes; the request tokens in
//! [`crate::state`] remain the authority on which result gets applied.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::api::StatsSource;
use crate::history::build_chart_data;
use crate::state::{Command, Message, Slot};

pub struct Fetcher<S: StatsSource> {
    source: Arc<S>,
    runtime: Handle,
    tx: UnboundedSender<Message>,
    in_flight: HashMap<Slot, JoinHandle<()>>,
}

impl<S: StatsSource> Fetcher<S> {
    pub fn new(source: Arc<S>, runtime: Handle, tx: UnboundedSender<Message>) -> Self {
        Self {
            source,
            runtime,
            tx,
            in_flight: HashMap::new(),
        }
    }

    pub fn dispatch_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.dispatch(command);
        }
    }

    pub fn dispatch(&mut self, command: Command) {
        let slot = command.slot();
        if let Some(previous) = self.in_flight.remove(&slot) {
            if !previous.is_finished() {
                tracing::debug!(?slot, "aborting superseded fetch");
                previous.abort();
            }
        }

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let handle = self.runtime.spawn(async move {
            let message = run(source.as_ref(), command).await;
            // Receiver gone means the UI is shutting down
            let _ = tx.send(message);
        });
        self.in_flight.insert(slot, handle);
    }

    /// Abort everything still running
    pub fn shutdown(&mut self) {
        for (_, handle) in self.in_flight.drain() {
            handle.abort();
        }
    }
}

impl<S: StatsSource> Drop for Fetcher<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run<S: StatsSource>(source: &S, command: Command) -> Message {
    match command {
        Command::FetchCountries { token } => Message::CountriesLoaded {
            token,
            result: source.fetch_countries().await,
        },
        Command::FetchSnapshot {
            token,
            selection,
            origin,
        } => {
            let result = source.fetch(selection.endpoint()).await;
            Message::SnapshotLoaded {
                token,
                selection,
                origin,
                result,
            }
        }
        Command::FetchHistory {
            token,
            metric,
            last_days,
        } => {
            let result = source
                .fetch_timeline(last_days)
                .await
                .map(|timeline| build_chart_data(&timeline, metric));
            Message::HistoryLoaded {
                token,
                metric,
                result,
            }
        }
    }
}
