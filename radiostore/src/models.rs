//! Observation and time-range types

use crate::error::StorageError;
use chrono::{DateTime, Duration, Utc};
use radioscraper::Song;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One song seen on a station at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(flatten)]
    pub song: Song,
    #[serde(rename = "timestamp")]
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(song: Song, observed_at: DateTime<Utc>) -> Self {
        Self { song, observed_at }
    }
}

/// Window of history used to build a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    LastHour,
    LastDay,
    LastWeek,
}

impl TimeRange {
    pub fn duration(&self) -> Duration {
        match self {
            TimeRange::LastHour => Duration::hours(1),
            TimeRange::LastDay => Duration::days(1),
            TimeRange::LastWeek => Duration::weeks(1),
        }
    }

    /// Start of the window ending at `now`
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

impl FromStr for TimeRange {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "lasthour" => Ok(TimeRange::LastHour),
            "lastday" => Ok(TimeRange::LastDay),
            "lastweek" => Ok(TimeRange::LastWeek),
            _ => Err(StorageError::UnknownRange(s.to_string())),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeRange::LastHour => "lasthour",
            TimeRange::LastDay => "lastday",
            TimeRange::LastWeek => "lastweek",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_tokens() {
        assert_eq!("lasthour".parse::<TimeRange>().unwrap(), TimeRange::LastHour);
        assert_eq!("last-day".parse::<TimeRange>().unwrap(), TimeRange::LastDay);
        assert_eq!("Last_Week".parse::<TimeRange>().unwrap(), TimeRange::LastWeek);
        assert!(matches!(
            "lastmonth".parse::<TimeRange>(),
            Err(StorageError::UnknownRange(_))
        ));
        assert_eq!(TimeRange::LastDay.to_string(), "lastday");
    }

    #[test]
    fn test_window_start() {
        let now = Utc::now();
        assert_eq!(TimeRange::LastHour.since(now), now - Duration::hours(1));
        assert_eq!(TimeRange::LastWeek.since(now), now - Duration::days(7));
    }

    #[test]
    fn test_observation_record_format() {
        let line = r#"{"artist":"Muse","title":"Uprising","timestamp":"2024-05-01T10:00:00Z"}"#;
        let obs: Observation = serde_json::from_str(line).unwrap();
        assert_eq!(obs.song, Song::new("Muse", "Uprising").unwrap());
        assert_eq!(obs.observed_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }
}
