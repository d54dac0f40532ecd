use alloy::primitives::U256;
use fastnum::{
    UD256, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

use crate::error::{Result, SnapshotError};

/// Fixed-point to decimal converter.
///
/// On-chain token amounts are integers in the token's smallest unit,
/// `decimals` tells how many of the trailing digits are fractional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Converter {
    decimals: u8,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self { decimals }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Scales a raw amount down by `10^decimals`, exactly.
    pub fn from_unsigned(&self, value: U256) -> UD256 {
        // 256-bit coefficient holds any U256 without loss
        let unscaled = bint::UInt::<4>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<4>");
        UnsignedDecimal::<4>::from_parts(
            unscaled,
            -(self.decimals as i32),
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    /// Scales a decimal value up by `10^decimals` back to a raw amount.
    ///
    /// Fails if the value has more fractional digits than the token
    /// supports or does not fit into [`U256`], instead of rounding.
    pub fn to_unsigned(&self, value: UD256) -> Result<U256> {
        let rescaled = value.rescale(self.decimals as i16);
        // rescale stops short of the target scale when the coefficient overflows
        if rescaled != value || rescaled.fractional_digits_count() != self.decimals as i16 {
            return Err(self.precision_error(value));
        }
        U256::try_from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
            .ok_or_else(|| self.precision_error(value))
    }

    fn precision_error(&self, value: UD256) -> SnapshotError {
        SnapshotError::Precision {
            value: value.to_string(),
            decimals: self.decimals,
        }
    }
}

/// Ratio of two decimal amounts, zero when the divisor is zero.
pub fn price(numerator: UD256, denominator: UD256) -> UD256 {
    if denominator.is_zero() {
        UD256::ZERO
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec256;

    use super::*;

    #[test]
    fn test_numeric_converter_from_unsigned() {
        assert_eq!(
            Converter::new(0).from_unsigned(U256::from(1234567890)),
            udec256!(1234567890)
        );
        assert_eq!(
            Converter::new(6).from_unsigned(U256::from(1234567890)),
            udec256!(1234.56789)
        );
        assert_eq!(
            Converter::new(18).from_unsigned(U256::from(1234567890)),
            udec256!(0.00000000123456789)
        );
    }

    #[test]
    fn test_numeric_converter_to_unsigned() {
        assert_eq!(
            Converter::new(0).to_unsigned(udec256!(1234567890)).unwrap(),
            U256::from(1234567890)
        );
        assert_eq!(
            Converter::new(6).to_unsigned(udec256!(1234.56789)).unwrap(),
            U256::from(1234567890)
        );
        assert_eq!(
            Converter::new(18).to_unsigned(udec256!(0.00000000123456789)).unwrap(),
            U256::from(1234567890)
        );
    }

    #[test]
    fn test_numeric_converter_rejects_excess_precision() {
        assert!(matches!(
            Converter::new(2).to_unsigned(udec256!(1.234)),
            Err(SnapshotError::Precision { decimals: 2, .. })
        ));
        assert!(matches!(
            Converter::new(0).to_unsigned(udec256!(0.5)),
            Err(SnapshotError::Precision { decimals: 0, .. })
        ));
    }

    #[test]
    fn test_numeric_converter_rejects_overflow() {
        let max = Converter::new(0).from_unsigned(U256::MAX);
        assert!(matches!(
            Converter::new(18).to_unsigned(max),
            Err(SnapshotError::Precision { decimals: 18, .. })
        ));
        assert!(matches!(
            Converter::new(1).to_unsigned(max),
            Err(SnapshotError::Precision { decimals: 1, .. })
        ));

        let huge = Converter::new(0).from_unsigned(U256::from(10).pow(U256::from(60)));
        assert!(matches!(
            Converter::new(18).to_unsigned(huge),
            Err(SnapshotError::Precision { decimals: 18, .. })
        ));
        assert_eq!(
            Converter::new(17).to_unsigned(huge).unwrap(),
            U256::from(10).pow(U256::from(77))
        );
    }

    #[test]
    fn test_numeric_converter_round_trip() {
        let values = [
            U256::ZERO,
            U256::from(1),
            U256::from(999_999_999u64),
            U256::from(10).pow(U256::from(18)),
            U256::from(u128::MAX),
            U256::MAX,
        ];
        for decimals in 0..=18u8 {
            let converter = Converter::new(decimals);
            for value in values {
                let display = converter.from_unsigned(value);
                assert_eq!(
                    converter.to_unsigned(display).unwrap(),
                    value,
                    "decimals: {decimals}"
                );
            }
        }
    }

    #[test]
    fn test_price() {
        assert_eq!(price(udec256!(2.2), udec256!(1.1)), udec256!(2));
        assert_eq!(price(udec256!(5), UD256::ZERO), UD256::ZERO);
        assert_eq!(price(UD256::ZERO, udec256!(5)), UD256::ZERO);
    }
}
