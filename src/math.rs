//! Fixed-point math utilities
//!
//! All ledger quantities are unsigned integers. Prices, rates, ratios and the
//! accrual index are carried as [`Wad`] values (18 decimals). Every division in
//! this module rounds down unless the function name says otherwise.

use core::fmt;
use core::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{LedgerError, Result};

/// Fixed-point precision (18 decimals)
pub const WAD_DECIMALS: u32 = 18;
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Basis points denominator (10_000 = 100%)
pub const BPS: u128 = 10_000;

/// Seconds in a 365-day year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// 18-decimal fixed-point number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wad(pub u128);

impl Wad {
    pub const ZERO: Wad = Wad(0);
    pub const ONE: Wad = Wad(WAD);

    /// Whole units (e.g. `Wad::from_int(10)` is 10.0)
    pub fn from_int(value: u128) -> Result<Wad> {
        value.checked_mul(WAD).map(Wad).ok_or(LedgerError::Overflow)
    }

    /// Basis points to fixed point (15_000 bps = 1.5)
    pub fn from_bps(bps: u64) -> Wad {
        // bps < 2^64 so bps * 1e14 always fits
        Wad(bps as u128 * (WAD / BPS))
    }

    /// `num / den` as fixed point, rounded down
    pub fn from_ratio(num: u128, den: u128) -> Result<Wad> {
        mul_div_floor(num, WAD, den).map(Wad)
    }

    pub fn raw(self) -> u128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self * other`, rounded down
    pub fn mul(self, other: Wad) -> Result<Wad> {
        mul_div_floor(self.0, other.0, WAD).map(Wad)
    }

    /// Scale a raw integer amount by this factor, rounded down
    pub fn apply_floor(self, amount: u128) -> Result<u128> {
        mul_div_floor(amount, self.0, WAD)
    }

    pub fn checked_add(self, other: Wad) -> Result<Wad> {
        self.0.checked_add(other.0).map(Wad).ok_or(LedgerError::Overflow)
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / WAD;
        let frac = self.0 % WAD;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:018}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

/// Parse error for decimal fixed-point strings
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid fixed-point number {0:?}")]
pub struct ParseWadError(String);

impl FromStr for Wad {
    type Err = ParseWadError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let err = || ParseWadError(s.to_string());
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if frac.len() > WAD_DECIMALS as usize {
            return Err(err());
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(frac) {
            return Err(err());
        }

        let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| err())? };
        let mut frac_value: u128 = if frac.is_empty() { 0 } else { frac.parse().map_err(|_| err())? };
        frac_value *= 10u128.pow(WAD_DECIMALS - frac.len() as u32);

        whole
            .checked_mul(WAD)
            .and_then(|w| w.checked_add(frac_value))
            .map(Wad)
            .ok_or_else(err)
    }
}

impl Serialize for Wad {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Wad {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ============================================================================
// Checked multiply-divide
// ============================================================================

/// `floor(a * b / d)`, exact whenever the result fits in u128
///
/// Products that overflow u128 are carried as a 256-bit (hi, lo) pair and
/// divided bit by bit.
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Result<u128> {
    if d == 0 {
        return Err(LedgerError::Overflow);
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / d);
    }
    wide_div(wide_mul(a, b), d)
        .map(|(q, _)| q)
        .ok_or(LedgerError::Overflow)
}

/// `ceil(a * b / d)`
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> Result<u128> {
    if d == 0 {
        return Err(LedgerError::Overflow);
    }
    let (q, rem) = match a.checked_mul(b) {
        Some(product) => (product / d, product % d),
        None => wide_div(wide_mul(a, b), d).ok_or(LedgerError::Overflow)?,
    };
    if rem == 0 {
        Ok(q)
    } else {
        q.checked_add(1).ok_or(LedgerError::Overflow)
    }
}

const LOW_64: u128 = u64::MAX as u128;

/// Full 256-bit product as (hi, lo)
fn wide_mul(a: u128, b: u128) -> (u128, u128) {
    let (a1, a0) = (a >> 64, a & LOW_64);
    let (b1, b0) = (b >> 64, b & LOW_64);

    let ll = a0 * b0;
    let lh = a0 * b1;
    let hl = a1 * b0;
    let hh = a1 * b1;

    // At most 3 * (2^64 - 1): no overflow
    let mid = (ll >> 64) + (lh & LOW_64) + (hl & LOW_64);
    let lo = (ll & LOW_64) | (mid << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// (quotient, remainder) of a 256-bit value by `d`, or `None` if the
/// quotient does not fit in u128
fn wide_div((hi, lo): (u128, u128), d: u128) -> Option<(u128, u128)> {
    if hi >= d {
        return None;
    }
    // Restoring long division; `rem < d` holds at the top of every round
    let mut rem = hi;
    let mut q: u128 = 0;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> bit) & 1);
        q <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            q |= 1;
        }
    }
    Some((q, rem))
}

#[inline]
pub(crate) fn add_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(LedgerError::Overflow)
}

#[inline]
pub(crate) fn sub_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(LedgerError::Overflow)
}
