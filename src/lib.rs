//! sensorlog - capture-and-persist pipeline for multi-sensor sample streams.
//!
//! Samples delivered asynchronously by a sensor subsystem are routed per
//! source into dedicated queues, each drained by its own writer thread into
//! an append-only CSV file. Shutdown is coordinated so that every sample
//! accepted into a queue reaches disk before resources are released.
//!
//! # Architecture
//!
//! ```text
//!  sensor hub ──▶ Dispatcher ──▶ SampleQueue ──▶ SampleWriter ──▶ name_<stamp>.csv
//!  (delivery       (route by       (one per         (one thread      (one file
//!   thread)        type code)       source)          per source)      per source)
//! ```
//!
//! The [`Recorder`] supervises the whole thing: `start` resolves sources,
//! opens files and spawns writers before the hub sees a listener; `stop`
//! unregisters the listener first, then closes every queue and joins every
//! writer, so nothing queued is ever lost and nothing is written after
//! `stop` returns.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sensorlog::{hub::SyntheticHub, Recorder};
//!
//! let hub = Arc::new(SyntheticHub::default());
//! let recorder = Recorder::new(hub, "/tmp/captures".into());
//!
//! recorder.start(&["accel".to_string()]).expect("start capture");
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! recorder.stop();
//! ```

pub mod config;
pub mod dispatcher;
pub mod hub;
pub mod queue;
pub mod recorder;
pub mod session;
pub mod source;
pub mod writer;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use dispatcher::Dispatcher;
pub use hub::{MockHub, SampleListener, SensorHub, SyntheticHub};
pub use queue::{sample_queue, SampleReceiver, SampleSender};
pub use recorder::{Recorder, StartError};
pub use session::{ManifestSource, SessionManifest};
pub use source::{Sample, Source};
pub use writer::SampleWriter;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
