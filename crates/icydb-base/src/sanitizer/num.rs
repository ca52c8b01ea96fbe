use crate::{
    core::traits::{NumCast, Sanitizer},
    prelude::*,
};

///
/// Clamp
///

#[sanitizer]
pub struct Clamp {
    min: Decimal,
    max: Decimal,
}

impl Clamp {
    pub fn new<N: NumCast>(min: N, max: N) -> Self {
        let min = <Decimal as NumCast>::from(min).unwrap();
        let max = <Decimal as NumCast>::from(max).unwrap();
        assert!(min <= max, "clamp requires min <= max");

        Self { min, max }
    }
}

impl<T: NumCast + Clone> Sanitizer<T> for Clamp {
    fn sanitize(&self, value: T) -> T {
        let v = <Decimal as NumCast>::from(value).unwrap();

        let clamped = if v < self.min {
            self.min
        } else if v > self.max {
            self.max
        } else {
            v
        };

        // Convert clamped Decimal back into original type N
        <T as NumCast>::from(clamped).expect("clamped value must fit into target type")
    }
}

///
/// RoundDecimalPlaces
///
/// Rounds a `Decimal` to a fixed number of decimal places.
/// Defaults to midpoint-away-from-zero rounding, which is friendlier for
/// currency-style values than bankers rounding.
///

#[sanitizer]
pub struct RoundDecimalPlaces {
    scale: u32,
}

impl RoundDecimalPlaces {
    pub fn new(scale: u32) -> Self {
        Self { scale }
    }
}

impl Sanitizer<Decimal> for RoundDecimalPlaces {
    fn sanitize(&self, value: Decimal) -> Decimal {
        value.round_dp(self.scale)
    }
}

///
/// TESTS
///
