//! Dedicated per-source consumer that persists samples to one CSV file.

use crate::queue::SampleReceiver;
use crate::source::{Sample, Source};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Owns one source's queue and its open output file.
///
/// Created (and the file opened) before the source is registered with the
/// hub, so no sample can arrive into a binding that cannot drain. Runs on
/// its own thread until the queue is closed, then drains whatever is left,
/// flushes and lets the file close.
pub struct SampleWriter {
    source: Source,
    queue: SampleReceiver,
    out: BufWriter<File>,
    path: PathBuf,
    written: u64,
}

impl SampleWriter {
    /// Open (create) the destination file for appending.
    ///
    /// An open failure here is fatal to the whole capture start.
    pub fn create(source: Source, queue: SampleReceiver, path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            source,
            queue,
            out: BufWriter::new(file),
            path,
            written: 0,
        })
    }

    /// Consume the queue until it is closed, then drain and flush.
    ///
    /// Returns the number of records written. A single failed write is
    /// logged and skipped; it never terminates the loop, and the final
    /// flush happens unconditionally.
    pub fn run(mut self) -> u64 {
        while let Some(sample) = self.queue.pop_blocking() {
            self.write_sample(&sample);
        }

        // Queue closed: final sweep of anything still buffered, then flush.
        for sample in self.queue.drain_remaining() {
            self.write_sample(&sample);
        }
        if let Err(e) = self.out.flush() {
            warn!(sensor = %self.source.key, error = %e, "final flush failed");
        }

        info!(
            sensor = %self.source.key,
            samples = self.written,
            file = %self.path.display(),
            "writer finished"
        );
        self.written
    }

    fn write_sample(&mut self, sample: &Sample) {
        let record = encode_record(sample);
        match self.out.write_all(record.as_bytes()) {
            Ok(()) => self.written += 1,
            Err(e) => {
                warn!(sensor = %self.source.key, error = %e, "sample write failed");
            }
        }
    }
}

/// Encode one sample as a CSV line: `timestamp,value0, value1,value2\n`.
///
/// The second value field carries a leading space; existing consumers of
/// the format expect it, so it is kept.
pub fn encode_record(sample: &Sample) -> String {
    use std::fmt::Write as _;

    let mut line = String::with_capacity(16 + sample.values.len() * 8);
    let _ = write!(line, "{}", sample.timestamp);
    for (i, value) in sample.values.iter().enumerate() {
        let sep = if i == 1 { ", " } else { "," };
        let _ = write!(line, "{sep}{value}");
    }
    line.push('\n');
    line
}
