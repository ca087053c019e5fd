//! Routes incoming samples to the queue of the matching source.
//!
//! The dispatcher runs on the sensor hub's delivery thread, so it must
//! never block or touch the filesystem: it does a map lookup and a
//! non-blocking queue push, nothing else.

use crate::hub::SampleListener;
use crate::queue::SampleSender;
use crate::source::Sample;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::trace;

/// Fan-out from the hub's delivery callback to per-source queues.
///
/// The routing table is built once at capture start and only ever mutated
/// again by [`Dispatcher::disconnect`] at stop, which drops every queue
/// sender and thereby signals the writers to drain and terminate.
pub struct Dispatcher {
    routes: RwLock<HashMap<i32, SampleSender>>,
    ignored: AtomicU64,
}

impl Dispatcher {
    pub(crate) fn new(routes: HashMap<i32, SampleSender>) -> Self {
        Self {
            routes: RwLock::new(routes),
            ignored: AtomicU64::new(0),
        }
    }

    /// Drop all queue senders, closing every writer's queue.
    ///
    /// Any delivery arriving after this point finds no route and is
    /// silently ignored, which is exactly what a stale listener racing
    /// with unregistration should see.
    pub(crate) fn disconnect(&self) {
        if let Ok(mut routes) = self.routes.write() {
            routes.clear();
        }
    }

    /// Number of samples that arrived for a source with no active binding.
    pub fn ignored_samples(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }
}

impl SampleListener for Dispatcher {
    fn on_sample(&self, type_code: i32, sample: Sample) {
        let Ok(routes) = self.routes.read() else {
            return;
        };
        match routes.get(&type_code) {
            Some(queue) => queue.push(sample),
            None => {
                // Defined no-op: the hub may deliver for a sensor whose
                // binding is already gone during the shutdown race.
                self.ignored.fetch_add(1, Ordering::Relaxed);
                trace!(type_code, "sample for unregistered source ignored");
            }
        }
    }
}
