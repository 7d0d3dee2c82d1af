//! Integer helpers for stake and revenue arithmetic.

use dualnet_types::params::BPS_DENOMINATOR;

/// `floor(amount × bps / 10 000)` without intermediate overflow.
pub fn apply_bps(amount: u128, bps: u32) -> u128 {
    let bps = u128::from(bps);
    (amount / BPS_DENOMINATOR) * bps + (amount % BPS_DENOMINATOR) * bps / BPS_DENOMINATOR
}

/// `floor(pool × weight / total)`, never more.
///
/// Exact while `pool × weight` fits in 128 bits; beyond that the pool is
/// scaled down first, which can only under-allocate. Callers route the
/// shortfall to a residual beneficiary.
pub fn pro_rata(pool: u128, weight: u128, total: u128) -> u128 {
    if total == 0 {
        return 0;
    }
    let weight = weight.min(total);
    let mut shift = 0u32;
    loop {
        let scaled = pool >> shift;
        if let Some(product) = scaled.checked_mul(weight) {
            return (product / total) << shift;
        }
        shift += 1;
    }
}

/// Full 256-bit product of a 64-bit score and a 128-bit stake, as `(hi, lo)`.
/// Tuples compare lexicographically, so `(hi, lo)` orders like the product.
pub fn wide_mul(score: u64, stake: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let s = u128::from(score);
    let low = s * (stake & MASK);
    let high = s * (stake >> 64);
    let (lo, carry) = low.overflowing_add(high << 64);
    let hi = (high >> 64) + u128::from(carry);
    (hi, lo)
}
