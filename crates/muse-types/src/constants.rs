//! Muse chain constants and client defaults.

/// Public key prefix used by the Muse chain.
pub const DEFAULT_PREFIX: &str = "MUSE";

/// Core asset id as a string (`1.3.0`).
pub const CORE_ASSET: &str = "1.3.0";

/// Default transaction expiration window, in seconds.
pub const DEFAULT_EXPIRATION_SECS: u32 = 30;

/// Default proposal expiration window (one day), in seconds.
pub const DEFAULT_PROPOSAL_EXPIRATION_SECS: u32 = 60 * 60 * 24;

/// Number of co-signing levels explored below the root account when
/// collecting keys for an authority.
pub const DEFAULT_AUTHORITY_DEPTH: usize = 2;

/// 100% expressed in the chain's fixed-point percentage unit.
pub const HUNDRED_PERCENT: u16 = 10_000;

/// Object spaces.
pub mod space {
    /// Relative ids inside a proposal (`0.0.x`).
    pub const RELATIVE: u8 = 0;
    /// Protocol objects (`1.x.x`).
    pub const PROTOCOL: u8 = 1;
    /// Implementation objects (`2.x.x`).
    pub const IMPLEMENTATION: u8 = 2;
}

/// Object types within the protocol space.
pub mod object_type {
    pub const ACCOUNT: u8 = 2;
    pub const ASSET: u8 = 3;
    pub const COMMITTEE_MEMBER: u8 = 5;
    pub const WITNESS: u8 = 6;
    pub const LIMIT_ORDER: u8 = 7;
    pub const PROPOSAL: u8 = 10;
}
