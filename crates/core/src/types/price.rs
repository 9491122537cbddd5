//! Listing prices and checkout totals using decimal arithmetic.
//!
//! All money in Pixelport is a plain decimal amount in the store currency.
//! Floats are never used: the checkout totals must be exact (a 99.00 cart
//! yields 15.84 tax and a 114.84 total, to the cent).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat sales tax rate applied at checkout (16%).
#[must_use]
pub fn tax_rate() -> Decimal {
    Decimal::new(16, 2)
}

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is negative.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative listing price.
///
/// Zero means the game is free. Amounts are normalized to two decimal
/// places on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// The zero (free) price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount.round_dp(2)))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this price is zero (the game is free).
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.0.is_zero()
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// The priced breakdown of a checkout: subtotal, tax, and grand total.
///
/// Tax is the flat [`tax_rate`] applied to the subtotal and rounded to the
/// cent; the total is their exact sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutTotals {
    /// Sum of the listing prices in the cart.
    pub subtotal: Decimal,
    /// Tax on the subtotal, rounded to two decimal places.
    pub tax: Decimal,
    /// `subtotal + tax`.
    pub total: Decimal,
}

impl CheckoutTotals {
    /// Compute totals over the prices in a cart.
    #[must_use]
    pub fn from_prices<I>(prices: I) -> Self
    where
        I: IntoIterator<Item = Price>,
    {
        let subtotal: Decimal = prices.into_iter().map(|p| p.amount()).sum();
        Self::from_subtotal(subtotal)
    }

    /// Compute totals from an already-summed subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let tax = (subtotal * tax_rate()).round_dp(2);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

// SQLx support (with postgres feature): stored as NUMERIC
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are constrained non-negative by a CHECK
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_rejects_negative() {
        assert!(matches!(
            Price::new(dec("-0.01")),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_new_accepts_zero_and_positive() {
        assert!(Price::new(Decimal::ZERO).unwrap().is_free());
        assert!(!Price::new(dec("9.99")).unwrap().is_free());
    }

    #[test]
    fn test_new_normalizes_scale() {
        let price = Price::new(dec("10.999")).unwrap();
        assert_eq!(price.amount(), dec("11.00"));
    }

    #[test]
    fn test_totals_for_single_item() {
        // The canonical scenario: 99.00 -> 15.84 tax -> 114.84 total.
        let totals = CheckoutTotals::from_prices([Price::new(dec("99.00")).unwrap()]);
        assert_eq!(totals.subtotal, dec("99.00"));
        assert_eq!(totals.tax, dec("15.84"));
        assert_eq!(totals.total, dec("114.84"));
    }

    #[test]
    fn test_totals_for_multiple_items() {
        let totals = CheckoutTotals::from_prices([
            Price::new(dec("19.99")).unwrap(),
            Price::new(dec("4.50")).unwrap(),
            Price::ZERO,
        ]);
        assert_eq!(totals.subtotal, dec("24.49"));
        assert_eq!(totals.tax, dec("3.92")); // 3.9184 rounded
        assert_eq!(totals.total, dec("28.41"));
    }

    #[test]
    fn test_totals_for_empty_cart() {
        let totals = CheckoutTotals::from_prices([]);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Price::new(dec("5")).unwrap();
        assert_eq!(price.to_string(), "5.00");
    }
}
