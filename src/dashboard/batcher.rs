//! Refresh batcher for debouncing bursts of incident notifications

use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{interval_at, Instant};

/// One coalesced request to re-fetch dashboard data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Incidents that triggered the refresh, in arrival order, deduplicated
    pub incident_ids: Vec<i64>,
    /// Monotonically increasing batch number
    pub sequence_id: u64,
}

impl RefreshRequest {
    /// A refresh not triggered by any incident (startup, manual)
    pub fn manual() -> Self {
        Self {
            incident_ids: Vec::new(),
            sequence_id: 0,
        }
    }
}

/// Collects incident ids and emits them as batched refresh requests
pub struct RefreshBatcher {
    /// Pending incident ids
    buffer: Vec<i64>,

    /// Flush interval (debounce time)
    flush_interval: Duration,

    /// Maximum ids before a forced flush
    max_batch_size: usize,

    tx: mpsc::Sender<RefreshRequest>,

    sequence_counter: u64,
}

impl RefreshBatcher {
    /// Create a batcher with a 250ms window and 100 id limit
    pub fn new(tx: mpsc::Sender<RefreshRequest>) -> Self {
        Self::with_config(tx, Duration::from_millis(250), 100)
    }

    pub fn with_config(
        tx: mpsc::Sender<RefreshRequest>,
        flush_interval: Duration,
        max_batch_size: usize,
    ) -> Self {
        Self {
            buffer: Vec::new(),
            flush_interval: flush_interval.max(Duration::from_millis(1)),
            max_batch_size: max_batch_size.max(1),
            tx,
            sequence_counter: 0,
        }
    }

    /// Queue an incident id
    pub fn push(&mut self, incident_id: i64) {
        if !self.buffer.contains(&incident_id) {
            self.buffer.push(incident_id);
        }

        if self.buffer.len() >= self.max_batch_size {
            self.flush();
        }
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Emit buffered ids as one request
    ///
    /// If the consumer still has a request queued the ids stay buffered and go
    /// out with the next flush.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        self.sequence_counter += 1;
        let request = RefreshRequest {
            incident_ids: std::mem::take(&mut self.buffer),
            sequence_id: self.sequence_counter,
        };

        match self.tx.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(request)) => {
                self.sequence_counter -= 1;
                self.buffer = request.incident_ids;
            }
            // Consumer gone
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Run the batcher as an async task
    ///
    /// Receives incident ids from the channel and flushes on timer or when
    /// the batch is full. Exits once the id channel closes.
    pub async fn run(mut self, mut rx: mpsc::Receiver<i64>) {
        let start = Instant::now() + self.flush_interval;
        let mut timer = interval_at(start, self.flush_interval);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.flush();
                }

                id = rx.recv() => {
                    match id {
                        Some(id) => self.push(id),
                        None => {
                            self.flush();
                            break;
                        }
                    }
                }
            }
        }
    }
}
