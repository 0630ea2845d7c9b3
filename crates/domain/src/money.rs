//! Fixed-point monetary values.
//!
//! Amounts are stored as integer minor units (paisa/cents) to avoid
//! floating-point drift; display conversion uses exactly 2 decimal places.
//! Every operation returns a new value and checks the currency of both
//! operands.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Currency tag carried by every monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    /// Bangladeshi taka (minor unit: paisa).
    #[default]
    Bdt,
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
}

impl Currency {
    /// Returns the ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Bdt => "BDT",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    /// Parses an ISO 4217 code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "BDT" => Some(Currency::Bdt),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors produced by monetary arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The amount is negative or a subtraction would go below zero.
    #[error("Invalid amount: {minor} minor units (amounts must be non-negative)")]
    InvalidAmount { minor: i64 },

    /// Two amounts with different currencies were combined.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    /// The arithmetic overflowed the i64 minor-unit range.
    #[error("Monetary overflow")]
    Overflow,
}

/// A tax or duty rate in basis points (1/100th of a percent).
///
/// 15% VAT is `TaxRate::from_basis_points(1500)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a rate from basis points.
    pub fn from_basis_points(basis_points: u32) -> Self {
        Self(basis_points)
    }

    /// Returns the rate in basis points.
    pub fn basis_points(&self) -> u32 {
        self.0
    }

    /// Returns true for a 0% rate.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for TaxRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// An immutable monetary amount: integer minor units plus a currency tag.
///
/// Amounts are never negative; operations that would produce a negative
/// amount fail with `InvalidAmount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (e.g., 1000 paisa = 10.00 BDT).
    minor: i64,
    currency: Currency,
}

impl Money {
    /// Creates a new amount from minor units.
    ///
    /// Fails with `InvalidAmount` for negative values.
    pub fn new(minor: i64, currency: Currency) -> Result<Self, MoneyError> {
        if minor < 0 {
            return Err(MoneyError::InvalidAmount { minor });
        }
        Ok(Self { minor, currency })
    }

    /// Creates an amount from major units (e.g., whole taka).
    pub fn from_major(major: i64, currency: Currency) -> Result<Self, MoneyError> {
        let minor = major.checked_mul(100).ok_or(MoneyError::Overflow)?;
        Self::new(minor, currency)
    }

    /// Creates a BDT amount from paisa.
    pub fn bdt(minor: i64) -> Result<Self, MoneyError> {
        Self::new(minor, Currency::Bdt)
    }

    /// Returns a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns the currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }

    /// Adds another amount of the same currency.
    pub fn add(&self, other: Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(&other)?;
        let minor = self
            .minor
            .checked_add(other.minor)
            .ok_or(MoneyError::Overflow)?;
        Money::new(minor, self.currency)
    }

    /// Subtracts another amount of the same currency.
    ///
    /// Fails with `InvalidAmount` if the result would be negative.
    pub fn subtract(&self, other: Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(&other)?;
        let minor = self
            .minor
            .checked_sub(other.minor)
            .ok_or(MoneyError::Overflow)?;
        Money::new(minor, self.currency)
    }

    /// Multiplies by a quantity. Exact integer scaling, no rounding.
    pub fn multiply(&self, quantity: u32) -> Result<Money, MoneyError> {
        let minor = self
            .minor
            .checked_mul(i64::from(quantity))
            .ok_or(MoneyError::Overflow)?;
        Money::new(minor, self.currency)
    }

    /// Applies a basis-point rate, rounding half-up to the nearest minor
    /// unit.
    ///
    /// This is the single place monetary rounding happens: 999.99 at 15%
    /// is 149.9985, which rounds to exactly 150.00. Results are not
    /// re-rounded downstream.
    pub fn apply_rate(&self, rate: TaxRate) -> Result<Money, MoneyError> {
        let scaled = i128::from(self.minor) * i128::from(rate.basis_points());
        let rounded = (scaled + 5_000) / 10_000;
        let minor = i64::try_from(rounded).map_err(|_| MoneyError::Overflow)?;
        Money::new(minor, self.currency)
    }

    /// Returns true if this amount is strictly greater than `other`.
    pub fn is_greater_than(&self, other: Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(&other)?;
        Ok(self.minor > other.minor)
    }

    /// Returns true if this amount is strictly less than `other`.
    pub fn is_less_than(&self, other: Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(&other)?;
        Ok(self.minor < other.minor)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero(Currency::Bdt)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02} {}",
            self.minor / 100,
            self.minor % 100,
            self.currency
        )
    }
}
