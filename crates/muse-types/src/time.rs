//! Second-precision UTC timestamps (`time_point_sec`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypesError;
use crate::pack::Pack;

/// Wire format used by the node for timestamps (UTC, no zone suffix).
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Seconds since the Unix epoch, packed as a u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimePointSec(pub u32);

impl TimePointSec {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Now plus `secs` seconds.
    pub fn from_now(secs: u32) -> Self {
        Self(Self::now().0.saturating_add(secs))
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp().clamp(0, i64::from(u32::MAX)) as u32)
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(i64::from(self.0), 0).unwrap_or_default()
    }

    pub fn secs(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format(TIME_FORMAT))
    }
}

impl FromStr for TimePointSec {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_end_matches('Z');
        let naive = NaiveDateTime::parse_from_str(trimmed, TIME_FORMAT)
            .map_err(|e| TypesError::InvalidTime(format!("{}: {}", s, e)))?;
        Ok(Self::from_datetime(naive.and_utc()))
    }
}

impl Pack for TimePointSec {
    fn pack(&self, buf: &mut Vec<u8>) {
        self.0.pack(buf);
    }
}

impl Serialize for TimePointSec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimePointSec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_and_parse() {
        let t = TimePointSec(1_451_606_400);
        assert_eq!(t.to_string(), "2016-01-01T00:00:00");
        assert_eq!("2016-01-01T00:00:00".parse::<TimePointSec>().unwrap(), t);
        assert_eq!("2016-01-01T00:00:00Z".parse::<TimePointSec>().unwrap(), t);
    }

    #[test]
    fn test_from_now_is_ahead() {
        let now = TimePointSec::now();
        let later = TimePointSec::from_now(30);
        assert!(later.secs() >= now.secs() + 30);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("yesterday".parse::<TimePointSec>().is_err());
    }
}
