//! Timestamp precision handling.

use crate::core::{LineError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unit a caller-supplied timestamp is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    #[default]
    #[serde(rename = "ns")]
    Nanoseconds,
    #[serde(rename = "us", alias = "u")]
    Microseconds,
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "m")]
    Minutes,
    #[serde(rename = "h")]
    Hours,
    #[serde(rename = "d")]
    Days,
}

impl TimeUnit {
    /// Nanoseconds in one unit
    pub const fn nanos_per_unit(self) -> i64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60_000_000_000,
            TimeUnit::Hours => 3_600_000_000_000,
            TimeUnit::Days => 86_400_000_000_000,
        }
    }

    /// Convert `value` to nanoseconds, saturating at the `i64` bounds.
    #[inline]
    pub const fn to_nanos(self, value: i64) -> i64 {
        value.saturating_mul(self.nanos_per_unit())
    }

    /// Short precision name
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = LineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ns" | "n" => Ok(TimeUnit::Nanoseconds),
            "us" | "u" => Ok(TimeUnit::Microseconds),
            "ms" => Ok(TimeUnit::Milliseconds),
            "s" => Ok(TimeUnit::Seconds),
            "m" => Ok(TimeUnit::Minutes),
            "h" => Ok(TimeUnit::Hours),
            "d" => Ok(TimeUnit::Days),
            other => Err(LineError::parse(format!("unknown timestamp precision '{}'", other))),
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
