//! Conversion between a token's native precision and the fixed 8 decimals of the wire.
//!
//! Normalizing divides by `10^(decimals - 8)` and truncates. The digits dropped that way are
//! never carried forward; denormalizing multiplies by the same factor.

use primitive_types::U256;

/// Decimals of every amount on the wire.
pub const WIRE_DECIMALS: u8 = 8;

/// `10^(decimals - 8)`, 1 for tokens with 8 decimals or fewer. `None` when the factor itself does
/// not fit in 256 bits.
fn multiplier(decimals: u8) -> Option<U256> {
    let exp = decimals.saturating_sub(WIRE_DECIMALS);
    U256::from(10u8).checked_pow(U256::from(exp))
}

/// Decimals a token is advertised with on the wire.
pub fn wire_decimals(decimals: u8) -> u8 {
    decimals.min(WIRE_DECIMALS)
}

pub fn normalize_amount(amount: U256, decimals: u8) -> U256 {
    match multiplier(decimals) {
        Some(m) => amount / m,
        // Any 256 bit amount divided by a factor larger than 2^256 truncates to zero.
        None => U256::zero(),
    }
}

/// `None` if the result does not fit in 256 bits.
pub fn denormalize_amount(amount: U256, decimals: u8) -> Option<U256> {
    if amount.is_zero() {
        return Some(U256::zero());
    }
    multiplier(decimals)?.checked_mul(amount)
}
