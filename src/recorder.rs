//! Capture pipeline supervisor.
//!
//! The [`Recorder`] owns the registry of active bindings (source → queue →
//! writer thread → file) and is the only thing that mutates it. `start`
//! builds every binding before the hub sees a listener; `stop` unregisters
//! the listener first, then closes the queues, then joins every writer —
//! so once `stop` returns there is no further file activity anywhere.

use crate::dispatcher::Dispatcher;
use crate::hub::{SampleListener, SensorHub};
use crate::queue::{sample_queue, SampleSender};
use crate::session::SessionManifest;
use crate::source::Source;
use crate::writer::SampleWriter;
use chrono::Utc;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Errors that can abort a capture start. The pipeline is left idle.
#[derive(Debug)]
pub enum StartError {
    /// A capture session is already running
    AlreadyRunning,
    /// The hub could not resolve the requested key
    SourceNotFound(String),
    /// The same source was requested twice
    DuplicateSource(String),
    /// Creating the output directory, opening a file or spawning a writer failed
    Io { what: String, error: io::Error },
}

impl std::fmt::Display for StartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartError::AlreadyRunning => write!(f, "capture is already running"),
            StartError::SourceNotFound(key) => write!(f, "unknown source: {key}"),
            StartError::DuplicateSource(key) => write!(f, "source requested twice: {key}"),
            StartError::Io { what, error } => write!(f, "I/O error while {what}: {error}"),
        }
    }
}

impl std::error::Error for StartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartError::Io { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// One active (source, queue, writer thread, file) binding.
struct Binding {
    source: Source,
    path: PathBuf,
    handle: JoinHandle<u64>,
}

struct Session {
    dispatcher: Arc<Dispatcher>,
    bindings: Vec<Binding>,
    manifest: SessionManifest,
    manifest_path: PathBuf,
}

enum State {
    Idle,
    Running(Session),
}

/// Owns the capture lifecycle: IDLE → RUNNING → IDLE.
///
/// `start` and `stop` serialize on an internal lock; neither ever runs on
/// (or blocks) the hub's delivery thread.
pub struct Recorder {
    hub: Arc<dyn SensorHub>,
    output_dir: PathBuf,
    state: Mutex<State>,
}

impl Recorder {
    pub fn new(hub: Arc<dyn SensorHub>, output_dir: PathBuf) -> Self {
        Self {
            hub,
            output_dir,
            state: Mutex::new(State::Idle),
        }
    }

    /// Whether a capture session is currently running.
    pub fn is_running(&self) -> bool {
        matches!(*self.lock_state(), State::Running(_))
    }

    /// The sources of the running session and their output files.
    pub fn active_sources(&self) -> Vec<(Source, PathBuf)> {
        match &*self.lock_state() {
            State::Running(session) => session
                .bindings
                .iter()
                .map(|b| (b.source.clone(), b.path.clone()))
                .collect(),
            State::Idle => Vec::new(),
        }
    }

    /// The session id of the running session, if any.
    pub fn session_id(&self) -> Option<uuid::Uuid> {
        match &*self.lock_state() {
            State::Running(session) => Some(session.manifest.session_id),
            State::Idle => None,
        }
    }

    /// Start capturing the given sources.
    ///
    /// Each source gets a fresh queue, a dedicated writer thread and a
    /// freshly named output file; the dispatcher is registered with the
    /// hub only once every writer is ready. Any failure tears down
    /// everything already built and leaves the pipeline idle.
    pub fn start(&self, keys: &[String]) -> Result<(), StartError> {
        let mut state = self.lock_state();
        if matches!(*state, State::Running(_)) {
            return Err(StartError::AlreadyRunning);
        }

        std::fs::create_dir_all(&self.output_dir).map_err(|error| StartError::Io {
            what: format!("creating output directory {}", self.output_dir.display()),
            error,
        })?;

        let started_at = Utc::now();
        let stamp = started_at.format("%Y%m%d_%H%M%S").to_string();

        let mut routes: HashMap<i32, SampleSender> = HashMap::new();
        let mut bindings: Vec<Binding> = Vec::new();

        for key in keys {
            match self.bind_source(key, &stamp, &mut routes) {
                Ok(binding) => bindings.push(binding),
                Err(e) => {
                    Self::teardown(routes, bindings);
                    return Err(e);
                }
            }
        }

        let dispatcher = Arc::new(Dispatcher::new(routes));
        let listener: Arc<dyn SampleListener> = dispatcher.clone();
        for binding in &bindings {
            self.hub.register(&binding.source, listener.clone());
        }

        let manifest = SessionManifest::new(
            started_at,
            bindings
                .iter()
                .map(|b| (b.source.clone(), b.path.clone()))
                .collect(),
        );
        let manifest_path = self.output_dir.join(format!("session_{stamp}.json"));
        if let Err(e) = manifest.save(&manifest_path) {
            warn!(error = %e, "could not write session manifest");
        }

        info!(
            session = %manifest.session_id,
            sources = bindings.len(),
            dir = %self.output_dir.display(),
            "capture started"
        );

        *state = State::Running(Session {
            dispatcher,
            bindings,
            manifest,
            manifest_path,
        });
        Ok(())
    }

    /// Stop the running session, if any, and wait for every writer to
    /// finish flushing. Idempotent; when this returns, no output file is
    /// touched again.
    pub fn stop(&self) {
        let mut state = self.lock_state();
        let State::Running(mut session) = std::mem::replace(&mut *state, State::Idle) else {
            return;
        };

        // Order matters: no new samples may arrive once draining begins.
        let listener: Arc<dyn SampleListener> = session.dispatcher.clone();
        self.hub.unregister(&listener);
        session.dispatcher.disconnect();

        let mut counts = Vec::with_capacity(session.bindings.len());
        for binding in session.bindings {
            match binding.handle.join() {
                Ok(written) => counts.push(written),
                Err(_) => {
                    warn!(sensor = %binding.source.key, "writer thread panicked");
                    counts.push(0);
                }
            }
        }

        let ignored = session.dispatcher.ignored_samples();
        if ignored > 0 {
            debug!(ignored, "samples ignored for unregistered sources");
        }

        session.manifest.finish(Utc::now(), &counts);
        if let Err(e) = session.manifest.save(&session.manifest_path) {
            warn!(error = %e, "could not finalize session manifest");
        }

        info!(
            session = %session.manifest.session_id,
            samples = counts.iter().sum::<u64>(),
            "capture stopped"
        );
    }

    fn bind_source(
        &self,
        key: &str,
        stamp: &str,
        routes: &mut HashMap<i32, SampleSender>,
    ) -> Result<Binding, StartError> {
        let source = self
            .hub
            .resolve(key)
            .ok_or_else(|| StartError::SourceNotFound(key.to_string()))?;
        if routes.contains_key(&source.type_code) {
            return Err(StartError::DuplicateSource(key.to_string()));
        }

        let path = self.output_dir.join(format!("{}_{stamp}.csv", source.name));
        let (tx, rx) = sample_queue();

        let writer = SampleWriter::create(source.clone(), rx, path.clone()).map_err(|error| {
            StartError::Io {
                what: format!("opening {}", path.display()),
                error,
            }
        })?;

        let handle = thread::Builder::new()
            .name(format!("writer-{}", source.key))
            .spawn(move || writer.run())
            .map_err(|error| StartError::Io {
                what: format!("spawning writer for {key}"),
                error,
            })?;

        routes.insert(source.type_code, tx);
        Ok(Binding {
            source,
            path,
            handle,
        })
    }

    /// Undo a partially built session: close the queues, join the writers
    /// that already started and remove their (empty) output files. Nothing
    /// was registered with the hub yet, so there is nothing to unregister.
    fn teardown(routes: HashMap<i32, SampleSender>, bindings: Vec<Binding>) {
        drop(routes);
        for binding in bindings {
            let _ = binding.handle.join();
            if let Err(e) = std::fs::remove_file(&binding.path) {
                debug!(file = %binding.path.display(), error = %e, "could not remove aborted output file");
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::MockHub;
    use crate::source::Sample;

    fn catalog() -> Vec<Source> {
        vec![
            Source::new("accel", 10, "linear_acceleration", 3),
            Source::new("gravity", 9, "gravity", 3),
        ]
    }

    fn recorder(dir: &std::path::Path) -> (Arc<MockHub>, Recorder) {
        let hub = Arc::new(MockHub::new(catalog()));
        let recorder = Recorder::new(hub.clone(), dir.to_path_buf());
        (hub, recorder)
    }

    #[test]
    fn test_start_rejects_unknown_source() {
        let dir = tempfile::tempdir().unwrap();
        let (_hub, recorder) = recorder(dir.path());

        let err = recorder
            .start(&["accel".to_string(), "bogus".to_string()])
            .unwrap_err();
        assert!(matches!(err, StartError::SourceNotFound(k) if k == "bogus"));
        assert!(!recorder.is_running());

        // The aborted start left no residue behind.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_file_open_failure_aborts_whole_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        // The second source's name points into a directory that does not
        // exist, so its file open fails after the accel binding is built.
        let hub = Arc::new(MockHub::new(vec![
            Source::new("accel", 10, "linear_acceleration", 3),
            Source::new("broken", 7, "missing_dir/broken", 1),
        ]));
        let recorder = Recorder::new(hub.clone(), dir.path().to_path_buf());

        let err = recorder
            .start(&["accel".to_string(), "broken".to_string()])
            .unwrap_err();
        assert!(matches!(err, StartError::Io { .. }));
        assert!(!recorder.is_running());
        assert!(!hub.has_listener());

        // The accel writer was joined and its empty file removed.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_start_rejects_duplicate_source() {
        let dir = tempfile::tempdir().unwrap();
        let (_hub, recorder) = recorder(dir.path());

        let err = recorder
            .start(&["accel".to_string(), "accel".to_string()])
            .unwrap_err();
        assert!(matches!(err, StartError::DuplicateSource(_)));
        assert!(!recorder.is_running());
    }

    #[test]
    fn test_start_after_failed_start_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let (hub, recorder) = recorder(dir.path());

        assert!(recorder.start(&["bogus".to_string()]).is_err());
        recorder.start(&["accel".to_string()]).unwrap();
        assert!(recorder.is_running());
        assert!(hub.has_listener());
        recorder.stop();
    }

    #[test]
    fn test_reentrant_start_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (_hub, recorder) = recorder(dir.path());

        recorder.start(&["accel".to_string()]).unwrap();
        let err = recorder.start(&["gravity".to_string()]).unwrap_err();
        assert!(matches!(err, StartError::AlreadyRunning));
        recorder.stop();
    }

    #[test]
    fn test_session_id_reflects_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let (_hub, recorder) = recorder(dir.path());

        assert!(recorder.session_id().is_none());
        recorder.start(&["accel".to_string()]).unwrap();
        let id = recorder.session_id().expect("running session has an id");
        recorder.stop();
        assert!(recorder.session_id().is_none());

        // A new session gets a new id.
        recorder.start(&["accel".to_string()]).unwrap();
        assert_ne!(recorder.session_id(), Some(id));
        recorder.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (_hub, recorder) = recorder(dir.path());

        recorder.stop(); // idle: no-op
        recorder.start(&["accel".to_string()]).unwrap();
        recorder.stop();
        recorder.stop();
        assert!(!recorder.is_running());
    }

    #[test]
    fn test_stop_finalizes_manifest_with_counts() {
        let dir = tempfile::tempdir().unwrap();
        let (hub, recorder) = recorder(dir.path());

        recorder.start(&["accel".to_string()]).unwrap();
        hub.emit(10, Sample::new(1, vec![0.1, 0.2, 0.3]));
        hub.emit(10, Sample::new(2, vec![0.4, 0.5, 0.6]));
        recorder.stop();

        let manifest_path = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .expect("manifest written");
        let manifest: crate::session::SessionManifest =
            serde_json::from_str(&std::fs::read_to_string(manifest_path).unwrap()).unwrap();
        assert!(manifest.ended_at.is_some());
        assert_eq!(manifest.sources[0].samples_written, Some(2));
    }

    #[test]
    fn test_start_fails_when_output_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("not_a_dir");
        std::fs::write(&blocked, b"x").unwrap();

        let hub = Arc::new(MockHub::new(catalog()));
        let recorder = Recorder::new(hub, blocked);
        let err = recorder.start(&["accel".to_string()]).unwrap_err();
        assert!(matches!(err, StartError::Io { .. }));
        assert!(!recorder.is_running());
    }
}
