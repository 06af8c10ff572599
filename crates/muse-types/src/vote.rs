//! Vote ids (`type:instance`).

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypesError;
use crate::pack::Pack;

/// Vote type for committee members.
pub const VOTE_COMMITTEE: u8 = 0;
/// Vote type for witnesses.
pub const VOTE_WITNESS: u8 = 1;

/// A vote for a committee member or witness.
///
/// Packed as a single u32 `instance << 8 | type`; that value is also the
/// sort key of vote sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteId {
    pub vote_type: u8,
    pub instance: u32,
}

impl VoteId {
    pub fn new(vote_type: u8, instance: u32) -> Self {
        Self { vote_type, instance }
    }

    pub fn content(&self) -> u32 {
        (self.instance << 8) | u32::from(self.vote_type)
    }
}

impl PartialOrd for VoteId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VoteId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.content().cmp(&other.content())
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vote_type, self.instance)
    }
}

impl FromStr for VoteId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || TypesError::InvalidVoteId(s.to_string());
        let (t, i) = s.split_once(':').ok_or_else(bad)?;
        let vote_type = t.parse::<u8>().map_err(|_| bad())?;
        let instance = i.parse::<u32>().map_err(|_| bad())?;
        if instance >= 1 << 24 {
            return Err(bad());
        }
        Ok(Self::new(vote_type, instance))
    }
}

impl Pack for VoteId {
    fn pack(&self, buf: &mut Vec<u8>) {
        self.content().pack(buf);
    }
}

impl Serialize for VoteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
