//! Object identifiers (`space.type.instance`).
//!
//! Typed ids (`AccountId`, `AssetId`, ...) pack as a varint instance, since
//! the field type already fixes space and type. The generic `ObjectId`
//! packs as the full 64-bit id so it can carry relative ids (`0.0.x`) that
//! refer to objects created earlier in the same proposal.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{object_type, space};
use crate::error::TypesError;
use crate::pack::{write_varint, Pack};

fn split_id(s: &str) -> Result<(u8, u8, u64), TypesError> {
    let mut parts = s.split('.');
    let (Some(a), Some(b), Some(c), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TypesError::InvalidObjectId(s.to_string()));
    };
    let bad = |_| TypesError::InvalidObjectId(s.to_string());
    Ok((
        a.parse::<u8>().map_err(bad)?,
        b.parse::<u8>().map_err(bad)?,
        c.parse::<u64>().map_err(bad)?,
    ))
}

/// A generic object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    pub space: u8,
    pub type_id: u8,
    pub instance: u64,
}

impl ObjectId {
    pub const fn new(space: u8, type_id: u8, instance: u64) -> Self {
        Self { space, type_id, instance }
    }

    /// A relative id (`0.0.n`), referring to the n-th object created by the
    /// enclosing proposal.
    pub const fn relative(instance: u64) -> Self {
        Self::new(space::RELATIVE, 0, instance)
    }

    pub fn is_relative(&self) -> bool {
        self.space == space::RELATIVE && self.type_id == 0
    }

    /// The full 64-bit encoding: `space << 56 | type << 48 | instance`.
    pub fn packed(&self) -> u64 {
        (u64::from(self.space) << 56) | (u64::from(self.type_id) << 48) | (self.instance & 0xFFFF_FFFF_FFFF)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.space, self.type_id, self.instance)
    }
}

impl FromStr for ObjectId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (space, type_id, instance) = split_id(s)?;
        Ok(Self::new(space, type_id, instance))
    }
}

impl Pack for ObjectId {
    fn pack(&self, buf: &mut Vec<u8>) {
        self.packed().pack(buf);
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $type_id:expr, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl $name {
            pub const SPACE: u8 = space::PROTOCOL;
            pub const TYPE: u8 = $type_id;

            pub fn instance(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}.{}", Self::SPACE, Self::TYPE, self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (sp, ty, instance) = split_id(s)?;
                if sp != Self::SPACE || ty != Self::TYPE {
                    return Err(TypesError::WrongObjectType {
                        expected: $label,
                        got: s.to_string(),
                    });
                }
                Ok(Self(instance))
            }
        }

        impl From<$name> for ObjectId {
            fn from(id: $name) -> Self {
                ObjectId::new($name::SPACE, $name::TYPE, id.0)
            }
        }

        impl Pack for $name {
            fn pack(&self, buf: &mut Vec<u8>) {
                write_varint(buf, self.0);
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

typed_id!(
    /// Account id (`1.2.x`).
    AccountId, object_type::ACCOUNT, "account"
);
typed_id!(
    /// Asset id (`1.3.x`).
    AssetId, object_type::ASSET, "asset"
);
typed_id!(
    /// Committee member id (`1.5.x`).
    CommitteeMemberId, object_type::COMMITTEE_MEMBER, "committee member"
);
typed_id!(
    /// Witness id (`1.6.x`).
    WitnessId, object_type::WITNESS, "witness"
);
typed_id!(
    /// Limit order id (`1.7.x`).
    LimitOrderId, object_type::LIMIT_ORDER, "limit order"
);
typed_id!(
    /// Proposal id (`1.10.x`).
    ProposalId, object_type::PROPOSAL, "proposal"
);

impl AssetId {
    /// The core asset (`1.3.0`).
    pub const CORE: AssetId = AssetId(0);
}
