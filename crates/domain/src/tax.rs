//! Bangladesh NBR tax calculation and fiscal-year helpers.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::invoice::LineItem;
use crate::money::{Currency, Money, MoneyError, TaxRate};

/// VAT category per NBR rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VatCategory {
    /// Standard rate, 15%.
    #[default]
    Standard,
    /// Reduced rate, 7.5%.
    Reduced,
    /// Zero-rated.
    Zero,
}

impl VatCategory {
    /// Returns the category's rate in basis points.
    pub fn rate(&self) -> TaxRate {
        match self {
            VatCategory::Standard => TaxRate::from_basis_points(1_500),
            VatCategory::Reduced => TaxRate::from_basis_points(750),
            VatCategory::Zero => TaxRate::from_basis_points(0),
        }
    }

    /// Returns the category name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VatCategory::Standard => "Standard",
            VatCategory::Reduced => "Reduced",
            VatCategory::Zero => "Zero",
        }
    }
}

impl std::fmt::Display for VatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The result of running line items through the tax calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Sum of line amounts before tax.
    pub subtotal: Money,
    /// VAT across all line items.
    pub vat_amount: Money,
    /// Supplementary duty, zero unless configured.
    pub supplementary_duty: Money,
    /// subtotal + vat + supplementary duty.
    pub grand_total: Money,
}

impl TaxBreakdown {
    /// Returns an all-zero breakdown in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            subtotal: Money::zero(currency),
            vat_amount: Money::zero(currency),
            supplementary_duty: Money::zero(currency),
            grand_total: Money::zero(currency),
        }
    }
}

/// Computes VAT and supplementary duty from invoice line items.
///
/// VAT is computed per line item (line amount x category rate, rounded
/// half-up) and summed. Supplementary duty, when configured, is computed
/// on subtotal + VAT, not on the subtotal alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxCalculator {
    supplementary_duty_rate: Option<TaxRate>,
}

impl TaxCalculator {
    /// Creates a calculator with VAT only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a calculator that also levies supplementary duty.
    pub fn with_supplementary_duty(rate: TaxRate) -> Self {
        Self {
            supplementary_duty_rate: Some(rate),
        }
    }

    /// Calculates the tax breakdown for a set of line items.
    ///
    /// All line items must share `currency`; an empty set yields a zero
    /// breakdown.
    pub fn calculate(
        &self,
        line_items: &[LineItem],
        currency: Currency,
    ) -> Result<TaxBreakdown, MoneyError> {
        let mut subtotal = Money::zero(currency);
        let mut vat_amount = Money::zero(currency);

        for item in line_items {
            let line_amount = item.amount()?;
            subtotal = subtotal.add(line_amount)?;
            vat_amount = vat_amount.add(line_amount.apply_rate(item.vat_category.rate())?)?;
        }

        let supplementary_duty = match self.supplementary_duty_rate {
            Some(rate) => subtotal.add(vat_amount)?.apply_rate(rate)?,
            None => Money::zero(currency),
        };

        let grand_total = subtotal.add(vat_amount)?.add(supplementary_duty)?;

        Ok(TaxBreakdown {
            subtotal,
            vat_amount,
            supplementary_duty,
            grand_total,
        })
    }
}

/// Returns the Bangladesh fiscal year (July 1 - June 30) containing `date`,
/// formatted as `"YYYY-YYYY"`.
pub fn fiscal_year(date: NaiveDate) -> String {
    let year = date.year();
    if date.month() >= 7 {
        format!("{}-{}", year, year + 1)
    } else {
        format!("{}-{}", year - 1, year)
    }
}

/// Issues a Mushak-6.3 invoice number for the given fiscal year.
///
/// The serial is generated once, at approval time, and persisted in the
/// `InvoiceApproved` event, so replaying history never re-issues it.
pub fn mushak_number(fiscal_year: &str) -> String {
    let bytes = *Uuid::new_v4().as_bytes();
    let serial = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    format!("MUS-6.3-{fiscal_year}-{serial:08X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: u32, unit_price_minor: i64, category: VatCategory) -> LineItem {
        LineItem::new(
            "Test item",
            quantity,
            Money::bdt(unit_price_minor).unwrap(),
            category,
        )
    }

    #[test]
    fn vat_category_rates() {
        assert_eq!(VatCategory::Standard.rate().basis_points(), 1_500);
        assert_eq!(VatCategory::Reduced.rate().basis_points(), 750);
        assert!(VatCategory::Zero.rate().is_zero());
    }

    #[test]
    fn standard_vat_on_round_subtotal() {
        // qty=100 x 100.00 BDT -> subtotal 10000.00, VAT 1500.00, total 11500.00
        let items = vec![line(100, 10_000, VatCategory::Standard)];
        let breakdown = TaxCalculator::new()
            .calculate(&items, Currency::Bdt)
            .unwrap();

        assert_eq!(breakdown.subtotal.minor(), 1_000_000);
        assert_eq!(breakdown.vat_amount.minor(), 150_000);
        assert!(breakdown.supplementary_duty.is_zero());
        assert_eq!(breakdown.grand_total.minor(), 1_150_000);
    }

    #[test]
    fn fractional_subtotal_rounds_half_up_once() {
        // qty=3 x 333.33 -> 999.99; VAT 149.9985 -> 150.00; total 1149.99
        let items = vec![line(3, 33_333, VatCategory::Standard)];
        let breakdown = TaxCalculator::new()
            .calculate(&items, Currency::Bdt)
            .unwrap();

        assert_eq!(breakdown.subtotal.minor(), 99_999);
        assert_eq!(breakdown.vat_amount.minor(), 15_000);
        assert_eq!(breakdown.grand_total.minor(), 114_999);
    }

    #[test]
    fn vat_is_computed_per_line_item() {
        let items = vec![
            line(1, 99_999, VatCategory::Standard), // VAT 150.00 after rounding
            line(1, 10_000, VatCategory::Reduced),  // VAT 7.50
            line(1, 50_000, VatCategory::Zero),     // VAT 0
        ];
        let breakdown = TaxCalculator::new()
            .calculate(&items, Currency::Bdt)
            .unwrap();

        assert_eq!(breakdown.subtotal.minor(), 159_999);
        assert_eq!(breakdown.vat_amount.minor(), 15_750);
        assert_eq!(breakdown.grand_total.minor(), 175_749);
    }

    #[test]
    fn supplementary_duty_applies_to_subtotal_plus_vat() {
        // subtotal 100.00, VAT 15.00, duty 10% of 115.00 = 11.50
        let items = vec![line(1, 10_000, VatCategory::Standard)];
        let breakdown = TaxCalculator::with_supplementary_duty(TaxRate::from_basis_points(1_000))
            .calculate(&items, Currency::Bdt)
            .unwrap();

        assert_eq!(breakdown.subtotal.minor(), 10_000);
        assert_eq!(breakdown.vat_amount.minor(), 1_500);
        assert_eq!(breakdown.supplementary_duty.minor(), 1_150);
        assert_eq!(breakdown.grand_total.minor(), 12_650);
    }

    #[test]
    fn empty_line_items_yield_zero_breakdown() {
        let breakdown = TaxCalculator::new().calculate(&[], Currency::Bdt).unwrap();
        assert_eq!(breakdown, TaxBreakdown::zero(Currency::Bdt));
    }

    #[test]
    fn mixed_currencies_are_rejected() {
        let items = vec![
            line(1, 10_000, VatCategory::Standard),
            LineItem::new(
                "Imported",
                1,
                Money::new(10_000, Currency::Usd).unwrap(),
                VatCategory::Standard,
            ),
        ];
        let result = TaxCalculator::new().calculate(&items, Currency::Bdt);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch { .. })));
    }

    #[test]
    fn fiscal_year_july_onwards_is_current_to_next() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert_eq!(fiscal_year(date), "2025-2026");

        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(fiscal_year(date), "2025-2026");
    }

    #[test]
    fn fiscal_year_before_july_is_previous_to_current() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        assert_eq!(fiscal_year(date), "2025-2026");

        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(fiscal_year(date), "2025-2026");
    }

    #[test]
    fn mushak_number_format() {
        let number = mushak_number("2025-2026");
        assert!(number.starts_with("MUS-6.3-2025-2026-"));
        let serial = number.rsplit('-').next().unwrap();
        assert_eq!(serial.len(), 8);
        assert!(serial.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn mushak_numbers_are_unique() {
        let a = mushak_number("2025-2026");
        let b = mushak_number("2025-2026");
        assert_ne!(a, b);
    }
}
