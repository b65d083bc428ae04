//! Ordered history writer.
//!
//! Published states are queued on an unbounded channel and written by a single
//! task, so rows land in the `visits` table in publication order. States still
//! carrying one-shot flags are skipped: the model replaces them immediately, and
//! reopening one would fire the flag again.

use std::sync::Arc;

use revnav_core::{create_change_view_url, db, ChangeViewState};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_rusqlite::Connection;

use crate::event::AppEvent;

/// Handle to the writer task. Call [`HistoryWriter::finish`] before exit so queued
/// visits are flushed.
pub struct HistoryWriter {
    tx: mpsc::UnboundedSender<(String, Arc<ChangeViewState>)>,
    base_url: String,
    task: JoinHandle<usize>,
}

impl HistoryWriter {
    /// Spawns the writer for `session_id`. Write failures are logged and reported
    /// on `status` as [`AppEvent::Status`].
    pub fn spawn(
        conn: Connection,
        session_id: String,
        base_url: String,
        status: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(String, Arc<ChangeViewState>)>();
        let task = tokio::spawn(async move {
            let mut written = 0;
            while let Some((url, state)) = rx.recv().await {
                match db::record_visit(&conn, &session_id, &url, &state).await {
                    Ok(_) => written += 1,
                    Err(e) => {
                        tracing::warn!(error = %e, %url, "could not record visit");
                        let _ = status.send(AppEvent::Status(format!("history: {e}")));
                    }
                }
            }
            written
        });
        Self { tx, base_url, task }
    }

    /// Queues `state`. Returns `false` when it is not recorded.
    pub fn record(&self, state: &Arc<ChangeViewState>) -> bool {
        if state.has_one_shot_flags() {
            return false;
        }
        let url = create_change_view_url(&self.base_url, state);
        self.tx.send((url, Arc::clone(state))).is_ok()
    }

    /// Closes the queue and waits for every queued visit to be written. Returns how
    /// many were written.
    pub async fn finish(self) -> usize {
        drop(self.tx);
        match self.task.await {
            Ok(written) => written,
            Err(e) => {
                tracing::warn!(error = %e, "history writer task failed");
                0
            }
        }
    }
}
