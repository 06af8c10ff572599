//! Canonical binary encoding.
//!
//! Signatures are computed over this encoding, so field order and integer
//! widths must match the node's own serializer exactly: little-endian fixed
//! integers, LEB128 varints for lengths and tags, a presence byte for
//! optionals, and length-prefixed sequences.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Types with a canonical binary form.
pub trait Pack {
    /// Append the canonical encoding of `self` to `buf`.
    fn pack(&self, buf: &mut Vec<u8>);

    /// Encode `self` into a fresh buffer.
    fn to_packed(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.pack(&mut buf);
        buf
    }
}

/// Append an unsigned LEB128 varint.
pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

macro_rules! pack_le {
    ($($t:ty),*) => {
        $(
            impl Pack for $t {
                fn pack(&self, buf: &mut Vec<u8>) {
                    buf.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

pack_le!(u8, u16, u32, u64, i16, i32, i64);

impl Pack for bool {
    fn pack(&self, buf: &mut Vec<u8>) {
        buf.push(u8::from(*self));
    }
}

impl Pack for str {
    fn pack(&self, buf: &mut Vec<u8>) {
        write_varint(buf, self.len() as u64);
        buf.extend_from_slice(self.as_bytes());
    }
}

impl Pack for String {
    fn pack(&self, buf: &mut Vec<u8>) {
        self.as_str().pack(buf);
    }
}

impl<T: Pack> Pack for Option<T> {
    fn pack(&self, buf: &mut Vec<u8>) {
        match self {
            Some(v) => {
                buf.push(1);
                v.pack(buf);
            }
            None => buf.push(0),
        }
    }
}

impl<T: Pack> Pack for Vec<T> {
    fn pack(&self, buf: &mut Vec<u8>) {
        write_varint(buf, self.len() as u64);
        for item in self {
            item.pack(buf);
        }
    }
}

impl<A: Pack, B: Pack> Pack for (A, B) {
    fn pack(&self, buf: &mut Vec<u8>) {
        self.0.pack(buf);
        self.1.pack(buf);
    }
}

impl<T: Pack + ?Sized> Pack for &T {
    fn pack(&self, buf: &mut Vec<u8>) {
        (**self).pack(buf);
    }
}

/// Pack a raw byte vector (length-prefixed).
pub fn pack_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Pack a map or set whose entries must appear in key order.
///
/// Entries are sorted by `key` before writing; the input order is not
/// significant to the node.
pub fn pack_sorted<T, K, F>(buf: &mut Vec<u8>, items: &[T], key: F)
where
    T: Pack,
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| key(*item));
    write_varint(buf, sorted.len() as u64);
    for item in sorted {
        item.pack(buf);
    }
}

// ─── Extensions ─────────────────────────────────────────────────────────────

/// Empty extension set carried by every operation.
///
/// Serialized as `[]` and packed as a zero-length set. Any incoming JSON
/// value (`[]` or `{}`) is accepted and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extensions;

impl Pack for Extensions {
    fn pack(&self, buf: &mut Vec<u8>) {
        write_varint(buf, 0);
    }
}

impl Serialize for Extensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(std::iter::empty::<()>())
    }
}

impl<'de> Deserialize<'de> for Extensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Extensions)
    }
}
