// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A 26.6 fixed-point metric.
///
/// All widths, advances, ascents and positions in a layout are stored as `Fixed` so that running
/// sums over thousands of glyphs do not drift the way `f32` accumulation does. Addition and
/// subtraction saturate at [`Fixed::MAX`] / [`Fixed::MIN`] instead of wrapping, so a pathological
/// paragraph can never produce a small or negative width.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Fixed(i32);

impl Fixed {
    /// Number of fractional bits
    pub const SHIFT: u32 = 6;
    /// One unit (64 in raw form)
    pub const ONE: Self = Self(1 << Self::SHIFT);
    pub const ZERO: Self = Self(0);
    /// Largest representable metric, used as the "unlimited width" sentinel
    pub const MAX: Self = Self(i32::MAX);
    pub const MIN: Self = Self(-i32::MAX);

    /// Create from a raw 26.6 value
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Create from whole units, saturating
    pub const fn from_int(value: i32) -> Self {
        Self(value.saturating_mul(1 << Self::SHIFT))
    }

    /// Create from a float, rounding to the nearest 1/64th and clamping into range
    pub fn from_f32(value: f32) -> Self {
        let raw = (value as f64 * 64.0).round();
        if raw.is_nan() {
            Self::ZERO
        } else if raw >= i32::MAX as f64 {
            Self::MAX
        } else if raw <= -(i32::MAX as f64) {
            Self::MIN
        } else {
            Self(raw as i32)
        }
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 64.0
    }

    /// Whole units, rounding towards negative infinity
    pub const fn floor(self) -> i32 {
        self.0 >> Self::SHIFT
    }

    /// Whole units, rounding towards positive infinity
    pub const fn ceil(self) -> i32 {
        let whole = self.0 >> Self::SHIFT;
        if self.0 & 63 != 0 {
            whole + 1
        } else {
            whole
        }
    }

    /// Whole units, rounding half away from zero
    pub fn round(self) -> i32 {
        let half = 32i64;
        let raw = self.0 as i64;
        if raw >= 0 {
            ((raw + half) >> Self::SHIFT) as i32
        } else {
            -(((-raw) + half) >> Self::SHIFT) as i32
        }
    }

    /// Whole units, rounding towards zero
    pub const fn truncate(self) -> i32 {
        self.0 / 64
    }

    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `self * numerator / denominator` computed in 64 bits, clamped into range
    pub fn mul_div(self, numerator: i64, denominator: i64) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        Self::clamp_raw(self.0 as i64 * numerator / denominator)
    }

    /// Ratio of two metrics truncated to an integer, zero when `other` is zero
    pub fn ratio(self, other: Self) -> i64 {
        if other.0 == 0 {
            0
        } else {
            self.0 as i64 / other.0 as i64
        }
    }

    fn clamp_raw(raw: i64) -> Self {
        Self(raw.clamp(-(i32::MAX as i64), i32::MAX as i64) as i32)
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({})", self.to_f32())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f32(), f)
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::clamp_raw(self.0 as i64 + rhs.0 as i64)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::clamp_raw(self.0 as i64 - rhs.0 as i64)
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Fixed {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Mul<i32> for Fixed {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self::clamp_raw(self.0 as i64 * rhs as i64)
    }
}

impl Mul for Fixed {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::clamp_raw((self.0 as i64 * rhs.0 as i64) >> Self::SHIFT)
    }
}

impl Div<i32> for Fixed {
    type Output = Self;

    fn div(self, rhs: i32) -> Self {
        Self(self.0.checked_div(rhs).unwrap_or(0))
    }
}

impl Div for Fixed {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        if rhs.0 == 0 {
            return Self::ZERO;
        }
        Self::clamp_raw(((self.0 as i64) << Self::SHIFT) / rhs.0 as i64)
    }
}

impl From<i32> for Fixed {
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

#[cfg(test)]
mod test {
    use super::Fixed;

    #[test]
    fn test_saturating_add() {
        let big = Fixed::MAX - Fixed::from_int(1);
        assert_eq!(big + Fixed::from_int(10), Fixed::MAX);
        assert_eq!(Fixed::MIN - Fixed::from_int(10), Fixed::MIN);
        let mut acc = Fixed::ZERO;
        for _ in 0..10 {
            acc += Fixed::MAX;
        }
        assert_eq!(acc, Fixed::MAX);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Fixed::from_int(3).raw(), 192);
        assert_eq!(Fixed::from_f32(1.5).raw(), 96);
        assert_eq!(Fixed::from_f32(1.5).to_f32(), 1.5);
        assert_eq!(Fixed::from_f32(f32::MAX), Fixed::MAX);
        assert_eq!(Fixed::from_f32(f32::NAN), Fixed::ZERO);
        assert_eq!(Fixed::from_raw(65).floor(), 1);
        assert_eq!(Fixed::from_raw(65).ceil(), 2);
        assert_eq!(Fixed::from_raw(96).round(), 2);
        assert_eq!(Fixed::from_raw(-96).round(), -2);
        assert_eq!(Fixed::from_raw(-65).truncate(), -1);
    }

    #[test]
    fn test_mul_div() {
        let ten = Fixed::from_int(10);
        assert_eq!(ten * 3, Fixed::from_int(30));
        assert_eq!(ten / 4, Fixed::from_f32(2.5));
        assert_eq!(ten / Fixed::from_int(4), Fixed::from_f32(2.5));
        assert_eq!(ten * Fixed::from_f32(0.5), Fixed::from_int(5));
        assert_eq!(ten.mul_div(1, 3), Fixed::from_raw(640 / 3));
        assert_eq!(ten / 0, Fixed::ZERO);
        assert_eq!(ten.ratio(Fixed::from_int(3)), 3);
    }
}
