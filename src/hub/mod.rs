//! Sensor subsystem seam.
//!
//! The capture pipeline does not talk to sensor hardware directly; it
//! consumes an event stream from a [`SensorHub`] and hands it a
//! [`SampleListener`] to deliver into. Two hubs ship with the crate: a
//! self-clocked [`SyntheticHub`] so the CLI works on machines without
//! sensor hardware, and a [`MockHub`] for driving tests by hand.

pub mod mock;
pub mod synthetic;

pub use mock::MockHub;
pub use synthetic::{default_catalog, SyntheticHub};

use crate::source::{Sample, Source};
use std::sync::Arc;

/// Delivery callback handed to a hub at registration.
///
/// Invoked on a thread owned by the hub, zero or more times between
/// `register` and the completion of `unregister`. Implementations must
/// not block.
pub trait SampleListener: Send + Sync {
    fn on_sample(&self, type_code: i32, sample: Sample);
}

/// The external sensor subsystem as the pipeline sees it.
pub trait SensorHub: Send + Sync {
    /// Look up a source by its stable key.
    fn resolve(&self, key: &str) -> Option<Source>;

    /// Begin delivering the source's samples to the listener.
    fn register(&self, source: &Source, listener: Arc<dyn SampleListener>);

    /// Stop all deliveries to the listener.
    ///
    /// Deliveries may race briefly with this call; once it returns, the
    /// hub makes no further calls into the listener.
    fn unregister(&self, listener: &Arc<dyn SampleListener>);

    /// Every source this hub can resolve.
    fn catalog(&self) -> Vec<Source>;
}
