//! Overflow-safe integer arithmetic for balance-like quantities.

use crate::error::StateError;

pub fn add_u64(a: u64, b: u64) -> Result<u64, StateError> {
    a.checked_add(b).ok_or(StateError::Overflow)
}

pub fn sub_u64(a: u64, b: u64) -> Result<u64, StateError> {
    a.checked_sub(b).ok_or(StateError::Underflow)
}

pub fn mul_u64(a: u64, b: u64) -> Result<u64, StateError> {
    a.checked_mul(b).ok_or(StateError::Overflow)
}

/// `a * b / den` with a 128-bit intermediate.
///
/// Fails on a zero denominator or a quotient outside `u64`.
pub fn mul_div(a: u64, b: u64, den: u64) -> Result<u64, StateError> {
    if den == 0 {
        return Err(StateError::DivideByZero);
    }
    let q = (a as u128) * (b as u128) / (den as u128);
    u64::try_from(q).map_err(|_| StateError::Overflow)
}

/// Integer square root via Newton's method.
pub fn int_sqrt(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_sub() {
        assert_eq!(add_u64(1, 2).unwrap(), 3);
        assert_eq!(add_u64(u64::MAX, 1), Err(StateError::Overflow));
        assert_eq!(sub_u64(3, 2).unwrap(), 1);
        assert_eq!(sub_u64(2, 3), Err(StateError::Underflow));
    }

    #[test]
    fn mul_div_widens() {
        // Would overflow u64 in the intermediate product.
        assert_eq!(mul_div(u64::MAX, 2, 4).unwrap(), u64::MAX / 2);
        assert_eq!(mul_div(1, 1, 0), Err(StateError::DivideByZero));
        assert_eq!(mul_div(u64::MAX, 2, 1), Err(StateError::Overflow));
        assert_eq!(mul_div(100, 9_970, 10_000).unwrap(), 99);
    }

    #[test]
    fn sqrt_edges() {
        assert_eq!(int_sqrt(0), 0);
        assert_eq!(int_sqrt(1), 1);
        assert_eq!(int_sqrt(3), 1);
        assert_eq!(int_sqrt(4), 2);
        assert_eq!(int_sqrt(100_000_000), 10_000);
        assert_eq!(int_sqrt(u64::MAX), 4_294_967_295);
    }

    #[test]
    fn sqrt_is_floor() {
        for n in [2u64, 8, 15, 24, 99, 10_001] {
            let r = int_sqrt(n);
            assert!(r * r <= n);
            assert!((r + 1) * (r + 1) > n);
        }
    }
}
