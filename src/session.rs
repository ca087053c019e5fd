//! Capture-session manifests.
//!
//! Each capture session drops a small JSON manifest next to its CSV files:
//! who recorded, when, which sources, into which files. The manifest is
//! written when capture starts and rewritten with sample counts and the
//! end time when it stops, so even an interrupted session leaves a record.

use crate::source::Source;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One source's entry in a manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSource {
    pub key: String,
    pub name: String,
    pub type_code: i32,
    /// Output file name (relative to the manifest's directory)
    pub file: String,
    /// Filled in when the session ends
    pub samples_written: Option<u64>,
}

/// Metadata for one capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManifest {
    pub session_id: Uuid,
    pub hostname: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub sources: Vec<ManifestSource>,
}

impl SessionManifest {
    pub fn new(started_at: DateTime<Utc>, sources: Vec<(Source, PathBuf)>) -> Self {
        let hostname = hostname::get()
            .ok()
            .map(|h| h.to_string_lossy().into_owned());

        Self {
            session_id: Uuid::new_v4(),
            hostname,
            started_at,
            ended_at: None,
            sources: sources
                .into_iter()
                .map(|(source, path)| ManifestSource {
                    key: source.key,
                    name: source.name,
                    type_code: source.type_code,
                    file: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    samples_written: None,
                })
                .collect(),
        }
    }

    /// Record the end of the session and the per-source written counts,
    /// given in the same order as `sources`.
    pub fn finish(&mut self, ended_at: DateTime<Utc>, counts: &[u64]) {
        self.ended_at = Some(ended_at);
        for (entry, count) in self.sources.iter_mut().zip(counts) {
            entry.samples_written = Some(*count);
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, json)
    }
}
