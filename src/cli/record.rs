//! JSON input records for the command-line encoder.

use crate::core::{LineError, Result};
use crate::protocol::{Point, TimeUnit};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One metric observation as read from the input stream.
///
/// ```json
/// {"measurement": "cpu", "tags": {"host": "a"}, "fields": {"load": 3}, "timestamp": 1509428908609, "precision": "ms"}
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRecord {
    pub measurement: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub precision: Option<TimeUnit>,
}

impl JsonRecord {
    /// Parse a single JSON line.
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Write this record into `point`, which should be freshly acquired.
    pub fn encode_into(&self, point: &mut Point, default_precision: TimeUnit) -> Result<()> {
        point.measurement(&self.measurement);

        for (key, value) in &self.tags {
            point.tag(key, value);
        }

        for (key, value) in &self.fields {
            match value {
                Value::String(s) => point.field(key, s.as_str()),
                Value::Bool(b) => point.field(key, *b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => point.field(key, i),
                    None => {
                        return Err(LineError::parse(format!(
                            "field '{}': only 64-bit integer numbers are supported, got {}",
                            key, n
                        )))
                    },
                },
                _ => {
                    return Err(LineError::parse(format!(
                        "field '{}': unsupported value {}",
                        key, value
                    )))
                },
            };
        }

        if let Some(timestamp) = self.timestamp {
            point.timestamp(timestamp, self.precision.unwrap_or(default_precision));
        }

        Ok(())
    }
}
