//! Cryptographic primitives for Muse.
//!
//! secp256k1 private keys (WIF), prefixed base58 public keys and addresses,
//! password-derived keys, and the canonical compact recoverable signatures
//! the chain accepts.

pub mod error;
pub mod hash;
pub mod keys;
pub mod signature;

pub use error::CryptoError;
pub use keys::{Address, PrivateKey, PublicKey};
pub use signature::{recover_public_key, sign_digest_canonical, verify, CompactSignature};
