//! Sensor stream identities and the samples they emit.

use serde::{Deserialize, Serialize};

/// One physical or logical sensor stream.
///
/// Resolved from the sensor hub at capture start and immutable afterwards.
/// The `name` is what output filenames are derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Stable key used to request this source (e.g. "accel")
    pub key: String,
    /// Platform sensor-type code, the routing key for deliveries
    pub type_code: i32,
    /// Human-readable name, used to derive the output filename
    pub name: String,
    /// Number of values per sample (3 for motion sensors, 1 for scalar ones)
    pub arity: usize,
}

impl Source {
    pub fn new(key: impl Into<String>, type_code: i32, name: impl Into<String>, arity: usize) -> Self {
        Self {
            key: key.into(),
            type_code,
            name: name.into(),
            arity,
        }
    }
}

/// One captured reading: a source-clock timestamp plus a fixed-arity
/// vector of values. Samples have no identity beyond arrival order
/// within their source's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Raw source-clock timestamp (monotonic on most platforms)
    pub timestamp: i64,
    /// Sensor values, in the order the platform reports them
    pub values: Vec<f64>,
}

impl Sample {
    pub fn new(timestamp: i64, values: Vec<f64>) -> Self {
        Self { timestamp, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_construction() {
        let source = Source::new("accel", 10, "linear_acceleration", 3);
        assert_eq!(source.key, "accel");
        assert_eq!(source.type_code, 10);
        assert_eq!(source.arity, 3);
    }

    #[test]
    fn test_sample_roundtrip() {
        let sample = Sample::new(42, vec![0.1, 0.2, 0.3]);
        let json = serde_json::to_string(&sample).unwrap();
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }
}
