//! Human duration parsing (`"30s"`, `"5m"`, `"1h30m"`, `"756h"`, `"2d"`)

use anyhow::{anyhow, Result};
use std::time::Duration;

/// Parses a human duration.
///
/// A bare number is a number of seconds, anything else goes through
/// [`humantime::parse_duration`] (`"1h 30m"`, `"250ms"`, `"2days"`, ...).
/// `"0"` parses to [`Duration::ZERO`], which callers treat as "disabled".
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("empty duration"));
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(input).map_err(|e| anyhow!("invalid duration '{}': {}", input, e))
}
