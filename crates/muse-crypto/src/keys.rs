//! secp256k1 keys in the formats the Muse chain uses.
//!
//! - Private keys travel as WIF: `base58(0x80 ‖ key ‖ sha256d(0x80 ‖ key)[..4])`.
//! - Public keys are compressed points written as
//!   `PREFIX ‖ base58(key ‖ ripemd160(key)[..4])`.
//! - Addresses are `ripemd160(sha512(key))`, written with the same
//!   checksum scheme as public keys.

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use muse_types::constants::DEFAULT_PREFIX;
use muse_types::Pack;

use crate::error::CryptoError;
use crate::hash::{ripemd160, sha256, sha256d, sha512};

/// WIF version byte.
const WIF_VERSION: u8 = 0x80;

/// Compressed SEC1 public key length.
pub const PUBLIC_KEY_LEN: usize = 33;

// ─── Private Key ────────────────────────────────────────────────────────────

/// A secp256k1 private key.
///
/// The underlying scalar is zeroized when the key is dropped.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a new random key from the OS RNG.
    pub fn random() -> Self {
        Self {
            inner: SigningKey::random(&mut OsRng),
        }
    }

    /// Create a key from a raw 32-byte scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidPrivateKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Decode a WIF string, verifying version byte and checksum.
    pub fn from_wif(wif: &str) -> Result<Self, CryptoError> {
        let decoded = bs58::decode(wif.trim())
            .into_vec()
            .map_err(|e| CryptoError::InvalidWif(e.to_string()))?;
        if decoded.len() != 37 {
            return Err(CryptoError::InvalidWif(format!(
                "expected 37 decoded bytes, got {}",
                decoded.len()
            )));
        }
        if decoded[0] != WIF_VERSION {
            return Err(CryptoError::InvalidWif(format!(
                "unexpected version byte 0x{:02x}",
                decoded[0]
            )));
        }
        let (payload, checksum) = decoded.split_at(33);
        if sha256d(payload)[..4] != *checksum {
            return Err(CryptoError::ChecksumMismatch);
        }
        Self::from_bytes(&payload[1..])
            .map_err(|e| CryptoError::InvalidWif(e.to_string()))
    }

    /// Encode as WIF.
    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(37);
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.to_bytes());
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    /// Derive a key as `sha256(seed)`.
    pub fn from_seed(seed: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&sha256(seed.as_bytes()))
    }

    /// Derive the key for `role` (`owner`, `active`, `memo`) of `account`
    /// from a password: `sha256(account ‖ role ‖ password)`.
    pub fn from_password(account: &str, role: &str, password: &str) -> Result<Self, CryptoError> {
        Self::from_seed(&format!("{}{}{}", account, role, password))
    }

    /// The raw 32-byte scalar.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.inner.verifying_key())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.public_key())
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for PrivateKey {}

impl FromStr for PrivateKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wif(s)
    }
}

// ─── Public Key ─────────────────────────────────────────────────────────────

/// A compressed secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Create from 33 compressed SEC1 bytes, checking the point is on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(CryptoError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_LEN,
                bytes.len()
            )));
        }
        VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        let mut key = [0u8; PUBLIC_KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn from_verifying_key(vk: &VerifyingKey) -> Self {
        let point = vk.to_encoded_point(true);
        let mut key = [0u8; PUBLIC_KEY_LEN];
        key.copy_from_slice(point.as_bytes());
        Self(key)
    }

    pub fn to_verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        VerifyingKey::from_sec1_bytes(&self.0).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Parse `PREFIX ‖ base58(key ‖ checksum)`.
    pub fn from_str_with_prefix(s: &str, prefix: &str) -> Result<Self, CryptoError> {
        let body = s.strip_prefix(prefix).ok_or_else(|| {
            CryptoError::InvalidPublicKey(format!("{} does not start with {}", s, prefix))
        })?;
        let payload = decode_checked(body)?;
        Self::from_bytes(&payload)
    }

    pub fn to_string_with_prefix(&self, prefix: &str) -> String {
        format!("{}{}", prefix, encode_checked(&self.0))
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with_prefix(DEFAULT_PREFIX))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_with_prefix(s, DEFAULT_PREFIX)
    }
}

impl Pack for PublicKey {
    fn pack(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0);
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ─── Address ────────────────────────────────────────────────────────────────

/// A key address: `ripemd160(sha512(compressed_key))`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self(ripemd160(&sha512(key.as_bytes())))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn from_str_with_prefix(s: &str, prefix: &str) -> Result<Self, CryptoError> {
        let body = s.strip_prefix(prefix).ok_or_else(|| {
            CryptoError::InvalidAddress(format!("{} does not start with {}", s, prefix))
        })?;
        let payload = decode_checked(body)?;
        if payload.len() != 20 {
            return Err(CryptoError::InvalidAddress(format!(
                "expected 20 bytes, got {}",
                payload.len()
            )));
        }
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&payload);
        Ok(Self(addr))
    }

    pub fn to_string_with_prefix(&self, prefix: &str) -> String {
        format!("{}{}", prefix, encode_checked(&self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with_prefix(DEFAULT_PREFIX))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_with_prefix(s, DEFAULT_PREFIX)
    }
}

impl Pack for Address {
    fn pack(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0);
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ─── Checksummed base58 ─────────────────────────────────────────────────────

fn encode_checked(data: &[u8]) -> String {
    let checksum = ripemd160(data);
    let mut payload = data.to_vec();
    payload.extend_from_slice(&checksum[..4]);
    bs58::encode(payload).into_string()
}

fn decode_checked(s: &str) -> Result<Vec<u8>, CryptoError> {
    let decoded = bs58::decode(s)
        .into_vec()
        .map_err(|e| CryptoError::InvalidBase58(e.to_string()))?;
    if decoded.len() < 5 {
        return Err(CryptoError::InvalidBase58("payload too short".to_string()));
    }
    let (data, checksum) = decoded.split_at(decoded.len() - 4);
    if ripemd160(data)[..4] != *checksum {
        return Err(CryptoError::ChecksumMismatch);
    }
    Ok(data.to_vec())
}
