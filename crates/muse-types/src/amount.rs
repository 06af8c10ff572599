//! Asset amounts.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::TypesError;
use crate::object_id::AssetId;
use crate::pack::Pack;

/// An integer amount of a given asset, in the asset's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    #[serde(deserialize_with = "de_int")]
    pub amount: i64,
    pub asset_id: AssetId,
}

impl AssetAmount {
    pub fn new(amount: i64, asset_id: AssetId) -> Self {
        Self { amount, asset_id }
    }

    /// Zero amount of `asset_id`; the placeholder for unset fees.
    pub fn zero(asset_id: AssetId) -> Self {
        Self::new(0, asset_id)
    }

    /// Amount of the core asset.
    pub fn core(amount: i64) -> Self {
        Self::new(amount, AssetId::CORE)
    }
}

impl Default for AssetAmount {
    fn default() -> Self {
        Self::zero(AssetId::CORE)
    }
}

impl Pack for AssetAmount {
    fn pack(&self, buf: &mut Vec<u8>) {
        self.amount.pack(buf);
        self.asset_id.pack(buf);
    }
}

/// Nodes emit 64-bit amounts either as JSON numbers or as strings.
fn de_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("amount is not an integer: {}", n))),
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("amount is not an integer: {:?}", s))),
        other => Err(de::Error::custom(format!("amount is not an integer: {}", other))),
    }
}

/// Convert a decimal string (`"1.5"`) into integer units for an asset with
/// `precision` decimal places.
///
/// Rejects more fractional digits than the precision allows rather than
/// rounding.
pub fn parse_decimal_amount(s: &str, precision: u8) -> Result<i64, TypesError> {
    let bad = || TypesError::InvalidAmount(s.to_string());
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(bad());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad());
    }
    if frac.len() > precision as usize {
        return Err(bad());
    }

    let scale = 10i64.checked_pow(u32::from(precision)).ok_or_else(bad)?;
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| bad())? };
    let mut frac_units: i64 = if frac.is_empty() { 0 } else { frac.parse().map_err(|_| bad())? };
    for _ in frac.len()..precision as usize {
        frac_units = frac_units.checked_mul(10).ok_or_else(bad)?;
    }

    let total = whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(bad)?;
    Ok(if negative { -total } else { total })
}
