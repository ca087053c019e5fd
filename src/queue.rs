//! Per-source sample queues connecting the dispatcher to writers.
//!
//! Each queue is a crossbeam channel pair. The sender half lives in the
//! dispatcher's routing table; the receiver half is owned by exactly one
//! writer. Dropping the sender is the writer's termination signal: the
//! receiver keeps yielding everything buffered before the drop and only
//! then reports the queue closed, so nothing accepted is ever lost.

use crate::source::Sample;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Create a connected queue pair for one source.
///
/// The queue is unbounded: sensor arrival rates are low relative to disk
/// throughput, and the delivery path must never block.
pub fn sample_queue() -> (SampleSender, SampleReceiver) {
    let (tx, rx) = unbounded();
    (SampleSender { tx }, SampleReceiver { rx })
}

/// Producer half, held by the dispatcher.
pub struct SampleSender {
    tx: Sender<Sample>,
}

impl SampleSender {
    /// Enqueue a sample. Never blocks.
    ///
    /// Fails only if the consuming writer is gone, which means the sample
    /// has nowhere to go anyway; the loss is logged and swallowed.
    pub fn push(&self, sample: Sample) {
        if self.tx.send(sample).is_err() {
            debug!("sample queue has no consumer; sample dropped");
        }
    }
}

/// Consumer half, owned by one writer.
pub struct SampleReceiver {
    rx: Receiver<Sample>,
}

impl SampleReceiver {
    /// Block until a sample is available.
    ///
    /// Returns `None` once the queue is closed *and* empty — every sample
    /// pushed before the close is still delivered first.
    pub fn pop_blocking(&self) -> Option<Sample> {
        self.rx.recv().ok()
    }

    /// Take everything currently queued without blocking.
    pub fn drain_remaining(&self) -> Vec<Sample> {
        self.rx.try_iter().collect()
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
