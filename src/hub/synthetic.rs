//! Self-clocked hub generating synthetic sensor data.
//!
//! One emitter thread per registered source, producing smooth sinusoid
//! readings at a fixed rate. This is what the CLI records on hosts that
//! have no real sensor subsystem.

use crate::hub::{SampleListener, SensorHub};
use crate::source::{Sample, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default emission rate per source.
pub const DEFAULT_RATE_HZ: u32 = 50;

/// The built-in source catalog, with platform sensor-type codes.
pub fn default_catalog() -> Vec<Source> {
    vec![
        Source::new("accel", 10, "linear_acceleration", 3),
        Source::new("gravity", 9, "gravity", 3),
        Source::new("gyro", 4, "gyroscope", 3),
        Source::new("magnet", 2, "magnetic_field", 3),
        Source::new("pressure", 6, "pressure", 1),
    ]
}

struct Emitter {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// A hub whose sources emit generated samples on their own clock.
pub struct SyntheticHub {
    catalog: Vec<Source>,
    rate_hz: u32,
    emitters: Mutex<Vec<Emitter>>,
}

impl SyntheticHub {
    pub fn new(rate_hz: u32) -> Self {
        Self::with_catalog(default_catalog(), rate_hz)
    }

    pub fn with_catalog(catalog: Vec<Source>, rate_hz: u32) -> Self {
        Self {
            catalog,
            rate_hz: rate_hz.max(1),
            emitters: Mutex::new(Vec::new()),
        }
    }
}

impl Default for SyntheticHub {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_HZ)
    }
}

impl SensorHub for SyntheticHub {
    fn resolve(&self, key: &str) -> Option<Source> {
        self.catalog.iter().find(|s| s.key == key).cloned()
    }

    fn register(&self, source: &Source, listener: Arc<dyn SampleListener>) {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let src = source.clone();
        let period = Duration::from_secs_f64(1.0 / f64::from(self.rate_hz));

        let handle = thread::spawn(move || emit_loop(&src, listener.as_ref(), &flag, period));

        if let Ok(mut emitters) = self.emitters.lock() {
            emitters.push(Emitter { running, handle });
        }
    }

    fn unregister(&self, _listener: &Arc<dyn SampleListener>) {
        let emitters = match self.emitters.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return,
        };
        for emitter in emitters {
            emitter.running.store(false, Ordering::SeqCst);
            let _ = emitter.handle.join();
        }
    }

    fn catalog(&self) -> Vec<Source> {
        self.catalog.clone()
    }
}

fn emit_loop(
    source: &Source,
    listener: &dyn SampleListener,
    running: &AtomicBool,
    period: Duration,
) {
    let start = Instant::now();
    let mut tick: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let timestamp = start.elapsed().as_nanos() as i64;
        let phase = tick as f64 * period.as_secs_f64();
        let values = (0..source.arity)
            .map(|axis| ((phase + axis as f64 * std::f64::consts::FRAC_PI_3).sin() * 9.81 * 100.0).round() / 100.0)
            .collect();

        listener.on_sample(source.type_code, Sample::new(timestamp, values));
        tick += 1;
        thread::sleep(period);
    }
}
