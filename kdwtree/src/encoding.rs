//! Order-preserving, bit-exact mapping between `f64` and `u64`.
//!
//! IEEE-754 doubles do not compare correctly as raw bit patterns: negative
//! numbers sort backwards (a more negative value has a numerically larger
//! sign-and-magnitude bit pattern) and the negative range sorts above the
//! positive range entirely. Flipping the sign bit of non-negative numbers and
//! flipping every bit of negative numbers fixes both problems and is a
//! bijection, so `a < b` (as `f64`, under the usual total order extended to
//! treat `-0.0 < 0.0`) if and only if `encode(a) < encode(b)`.

const SIGN_BIT: u64 = 1 << 63;

/// Maps `value` to a `u64` such that the mapping is order-preserving and
/// bit-exact (distinct inputs, including `-0.0` and `0.0`, map to distinct
/// outputs). `value` must be finite; callers are expected to have rejected
/// `NaN` and the infinities before reaching this function.
pub fn encode(value: f64) -> u64 {
    let bits = value.to_bits();
    if bits & SIGN_BIT != 0 {
        !bits
    } else {
        bits | SIGN_BIT
    }
}

/// Inverse of [`encode`].
pub fn decode(code: u64) -> f64 {
    let bits = if code & SIGN_BIT != 0 {
        code & !SIGN_BIT
    } else {
        !code
    };
    f64::from_bits(bits)
}
