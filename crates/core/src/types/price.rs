//! Type-safe course price using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A non-negative course price in the platform currency.
///
/// Prices come from free-form editor input, so construction is lenient:
/// anything that does not parse as a decimal becomes zero, and negative
/// values are clamped to zero. Stored values are never rounded - an input
/// of `19.999` is persisted as `19.999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

// Deserialization goes through `new` so a negative wire value cannot
// bypass the clamp.
impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self::new)
    }
}

impl Price {
    /// A free course.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal, clamping negatives to zero.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        if amount.is_sign_negative() {
            Self(Decimal::ZERO)
        } else {
            Self(amount)
        }
    }

    /// Parse a price from editor input.
    ///
    /// Non-numeric input coerces to zero rather than failing, matching the
    /// forgiving behaviour expected of the course form.
    #[must_use]
    pub fn parse_lenient(input: &str) -> Self {
        input
            .trim()
            .parse::<Decimal>()
            .map_or(Self::ZERO, Self::new)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the course is free.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_valid() {
        let price = Price::parse_lenient("19.99");
        assert_eq!(price.amount(), "19.99".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_parse_lenient_preserves_precision() {
        // No rounding: three decimal places survive as entered.
        let price = Price::parse_lenient("19.999");
        assert_eq!(price.to_string(), "19.999");
    }

    #[test]
    fn test_parse_lenient_non_numeric_coerces_to_zero() {
        assert_eq!(Price::parse_lenient("abc"), Price::ZERO);
        assert_eq!(Price::parse_lenient(""), Price::ZERO);
        assert_eq!(Price::parse_lenient("$19.99"), Price::ZERO);
    }

    #[test]
    fn test_negative_clamped_to_zero() {
        assert_eq!(Price::parse_lenient("-5"), Price::ZERO);
        assert_eq!(Price::new("-0.01".parse().unwrap()), Price::ZERO);
    }

    #[test]
    fn test_deserialize_clamps_negative_wire_value() {
        let price: Price = serde_json::from_str("-5.25").unwrap();
        assert_eq!(price, Price::ZERO);

        let price: Price = serde_json::from_str("19.999").unwrap();
        assert_eq!(price.to_string(), "19.999");
    }

    #[test]
    fn test_is_free() {
        assert!(Price::ZERO.is_free());
        assert!(!Price::parse_lenient("1").is_free());
    }
}
