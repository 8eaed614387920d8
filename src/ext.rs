use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive, num_bigint::BigInt};

use crate::types::SwapError;

/// Conversion between smallest-unit integers and decimal display strings.
///
/// Amounts only become decimals at the display boundary; arithmetic stays on integers.
pub trait AmountExt: Sized {
    fn from_display(value: &str, decimals: u32) -> Result<Self, SwapError>;

    /// Render with exactly `places` fractional digits, truncating the rest
    fn to_display(&self, decimals: u32, places: u32) -> String;
}

fn parse_units(value: &str, decimals: u32) -> Result<BigDecimal, SwapError> {
    let parsed = BigDecimal::from_str(value.trim())
        .map_err(|e| SwapError::InvalidAmount(format!("{value}: {e}")))?;

    let units = parsed * unit_scale(decimals);
    if !units.is_integer() {
        return Err(SwapError::InvalidAmount(format!(
            "{value} has more than {decimals} decimal places"
        )));
    }
    Ok(units)
}

fn unit_scale(decimals: u32) -> BigDecimal {
    BigDecimal::new(BigInt::from(1u8), -i64::from(decimals))
}

fn render_units(units: BigInt, decimals: u32, places: u32) -> String {
    let divisor = BigInt::from(10u8).pow(decimals);
    let whole = &units / &divisor;
    let mut fraction = format!(
        "{:0>width$}",
        (&units % &divisor).to_string(),
        width = decimals as usize
    );
    fraction.truncate(places as usize);
    while fraction.len() < places as usize {
        fraction.push('0');
    }

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

impl AmountExt for u64 {
    fn from_display(value: &str, decimals: u32) -> Result<Self, SwapError> {
        parse_units(value, decimals)?
            .to_u64()
            .ok_or_else(|| SwapError::InvalidAmount(format!("{value} is out of range")))
    }

    fn to_display(&self, decimals: u32, places: u32) -> String {
        render_units(BigInt::from(*self), decimals, places)
    }
}

impl AmountExt for u128 {
    fn from_display(value: &str, decimals: u32) -> Result<Self, SwapError> {
        parse_units(value, decimals)?
            .to_u128()
            .ok_or_else(|| SwapError::InvalidAmount(format!("{value} is out of range")))
    }

    fn to_display(&self, decimals: u32, places: u32) -> String {
        render_units(BigInt::from(*self), decimals, places)
    }
}

pub trait AddressExt {
    /// `first6...last4`, the way connected wallets are shown to the user
    fn shorten(&self) -> String;
}

impl AddressExt for str {
    fn shorten(&self) -> String {
        let chars: Vec<char> = self.chars().collect();
        if chars.len() <= 10 {
            return self.to_string();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_amounts_convert_to_smallest_units_exactly() {
        assert_eq!(u64::from_display("0.0001", 8).unwrap(), 10_000);
        assert_eq!(u64::from_display("1", 8).unwrap(), 100_000_000);
        assert_eq!(
            u128::from_display("1.5", 18).unwrap(),
            1_500_000_000_000_000_000
        );
    }

    #[test]
    fn sub_unit_and_negative_amounts_are_rejected() {
        assert!(u64::from_display("0.000000001", 8).is_err());
        assert!(u64::from_display("-1", 8).is_err());
        assert!(u64::from_display("", 8).is_err());
    }

    #[test]
    fn amounts_render_with_fixed_places() {
        assert_eq!(10_000u64.to_display(8, 8), "0.00010000");
        assert_eq!(1_234_567_890_000_000_000u128.to_display(18, 4), "1.2345");
    }

    #[test]
    fn addresses_are_shortened_for_display() {
        assert_eq!(
            "tb1q8eamvjqvq4fdaqmzxfs6936ec96flp90unc7cm".shorten(),
            "tb1q8e...c7cm"
        );
        assert_eq!("0xabc".shorten(), "0xabc");
    }
}
