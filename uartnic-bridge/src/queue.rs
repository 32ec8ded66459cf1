//! Bounded frame queues between the radio and serial domains.
//!
//! The producing side never waits: [`FrameSender::offer`] drops the frame
//! when the queue is full and counts the drop. The consuming side is drained
//! by a single task.

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Queue counters.
#[derive(Debug, Default)]
pub struct QueueStats {
    pub enqueued: AtomicU64,
    pub dequeued: AtomicU64,
    pub dropped: AtomicU64,
}

impl QueueStats {
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Creates a queue holding at most `capacity` frames.
pub fn frame_queue(name: &'static str, capacity: usize) -> (FrameSender, FrameQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    let stats = Arc::new(QueueStats::default());
    (
        FrameSender {
            name,
            tx,
            stats: stats.clone(),
        },
        FrameQueue { name, rx, stats },
    )
}

/// Producer half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FrameSender {
    name: &'static str,
    tx: mpsc::Sender<Bytes>,
    stats: Arc<QueueStats>,
}

impl FrameSender {
    /// Enqueues without waiting. Returns false when the frame was dropped.
    pub fn offer(&self, frame: Bytes) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(frame)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(queue = self.name, len = frame.len(), "queue full, dropping frame");
                false
            }
            Err(TrySendError::Closed(frame)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(queue = self.name, len = frame.len(), "queue closed, dropping frame");
                false
            }
        }
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct FrameQueue {
    name: &'static str,
    rx: mpsc::Receiver<Bytes>,
    stats: Arc<QueueStats>,
}

impl FrameQueue {
    /// Waits for the next frame. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Bytes> {
        let frame = self.rx.recv().await;
        if frame.is_some() {
            self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        }
        frame
    }

    pub fn try_recv(&mut self) -> Option<Bytes> {
        let frame = self.rx.try_recv().ok();
        if frame.is_some() {
            self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        }
        frame
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}
