//! Manually driven hub for tests.
//!
//! Deliveries happen only when the test calls [`MockHub::emit`]. The hub
//! retains the listener after `unregister` so tests can simulate the
//! stale-listener race: a delivery arriving after capture has stopped.

use crate::hub::{SampleListener, SensorHub};
use crate::source::{Sample, Source};
use std::sync::{Arc, Mutex};

/// A hub that delivers only what a test tells it to.
pub struct MockHub {
    catalog: Vec<Source>,
    active: Mutex<Option<Arc<dyn SampleListener>>>,
    stale: Mutex<Option<Arc<dyn SampleListener>>>,
    registered: Mutex<Vec<i32>>,
}

impl MockHub {
    pub fn new(catalog: Vec<Source>) -> Self {
        Self {
            catalog,
            active: Mutex::new(None),
            stale: Mutex::new(None),
            registered: Mutex::new(Vec::new()),
        }
    }

    /// Deliver a sample to the currently registered listener, if any.
    pub fn emit(&self, type_code: i32, sample: Sample) {
        if let Some(listener) = self.active.lock().unwrap().as_ref() {
            listener.on_sample(type_code, sample);
        }
    }

    /// Deliver a sample to the most recently *unregistered* listener,
    /// simulating a delivery racing with shutdown.
    pub fn emit_stale(&self, type_code: i32, sample: Sample) {
        if let Some(listener) = self.stale.lock().unwrap().as_ref() {
            listener.on_sample(type_code, sample);
        }
    }

    pub fn has_listener(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    /// Type codes registered so far, in registration order.
    pub fn registered_codes(&self) -> Vec<i32> {
        self.registered.lock().unwrap().clone()
    }
}

impl SensorHub for MockHub {
    fn resolve(&self, key: &str) -> Option<Source> {
        self.catalog.iter().find(|s| s.key == key).cloned()
    }

    fn register(&self, source: &Source, listener: Arc<dyn SampleListener>) {
        *self.active.lock().unwrap() = Some(listener);
        self.registered.lock().unwrap().push(source.type_code);
    }

    fn unregister(&self, listener: &Arc<dyn SampleListener>) {
        let mut active = self.active.lock().unwrap();
        if let Some(current) = active.take() {
            let same = std::ptr::eq(
                Arc::as_ptr(&current) as *const (),
                Arc::as_ptr(listener) as *const (),
            );
            if !same {
                // Not ours; put it back.
                *active = Some(current);
                return;
            }
            *self.stale.lock().unwrap() = Some(current);
        }
        self.registered.lock().unwrap().clear();
    }

    fn catalog(&self) -> Vec<Source> {
        self.catalog.clone()
    }
}
