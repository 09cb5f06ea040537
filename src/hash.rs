//! Identifier encoding and the per-identifier random colour
//!
//! Identifiers travel through float image channels, so a 32-bit name hash is
//! packed into an IEEE-754 float whose exponent is kept away from the
//! zero/subnormal and inf/NaN encodings. The result is always a finite,
//! non-zero, normal float with stable equality, usable as a map key.

/// Offset between the two seeds that make up an identifier's random colour
pub const RANDOM_SEED_OFFSET: u32 = 2345;

const MANTISSA_MASK: u32 = (1 << 23) - 1;
const EXPONENT_MASK: u32 = (1 << 8) - 1;

/// Pack a 32-bit hash into a normal float (exponent clamped into [1, 254])
#[inline]
pub fn hash_to_float(hash: u32) -> f32 {
    let mantissa = hash & MANTISSA_MASK;
    let exponent = ((hash >> 23) & EXPONENT_MASK).clamp(1, 254);
    let sign = hash >> 31;
    f32::from_bits((sign << 31) | (exponent << 23) | mantissa)
}

/// Recover the (clamped) hash from an encoded identifier
#[inline]
pub fn float_to_hash(id: f32) -> u32 {
    id.to_bits()
}

/// Fast deterministic random number in [0, 1)
///
/// One LCG step (Numerical Recipes constants); the low 23 bits of the new
/// state become the mantissa of a float in [1, 2), which is then shifted down.
#[inline]
pub fn fast_random(seed: u32) -> f32 {
    let state = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    f32::from_bits(0x3f80_0000 | (state & MANTISSA_MASK)) - 1.0
}

/// Seed used for an identifier's random colour.
///
/// This is a numeric cast, not a bit reinterpretation: saturating at 0 for
/// negative or NaN identifiers and at `u32::MAX` for huge ones.
#[inline]
pub fn identifier_seed(id: f32) -> u32 {
    id as u32
}

/// Stable pseudo-random colour pair for an identifier
#[inline]
pub fn random_color_pair(id: f32) -> (f32, f32) {
    let seed = identifier_seed(id);
    (fast_random(seed), fast_random(seed.wrapping_add(RANDOM_SEED_OFFSET)))
}
