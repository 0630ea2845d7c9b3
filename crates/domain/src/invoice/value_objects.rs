//! Value objects for the invoice domain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::{Money, MoneyError};
use crate::tax::VatCategory;

/// Unique identifier for a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Creates a new random customer ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a customer ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CustomerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<CustomerId> for Uuid {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

/// Unique identifier for a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(Uuid);

impl VendorId {
    /// Creates a new random vendor ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a vendor ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for VendorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for VendorId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<VendorId> for Uuid {
    fn from(id: VendorId) -> Self {
        id.0
    }
}

/// A line on an invoice.
///
/// Line items are child values of the invoice, not separately identified;
/// they are addressed by position and locked once the invoice leaves Draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// What is being billed.
    pub description: String,

    /// Quantity billed; must be positive.
    pub quantity: u32,

    /// Price per unit.
    pub unit_price: Money,

    /// VAT category applied to this line.
    pub vat_category: VatCategory,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(
        description: impl Into<String>,
        quantity: u32,
        unit_price: Money,
        vat_category: VatCategory,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            vat_category,
        }
    }

    /// Returns the line amount (quantity x unit price), exact.
    pub fn amount(&self) -> Result<Money, MoneyError> {
        self.unit_price.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn customer_id_new_creates_unique_ids() {
        let id1 = CustomerId::new();
        let id2 = CustomerId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn vendor_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = VendorId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn line_item_amount_is_exact() {
        let item = LineItem::new(
            "Cement bags",
            3,
            Money::bdt(33_333).unwrap(),
            VatCategory::Standard,
        );
        assert_eq!(item.amount().unwrap().minor(), 99_999);
    }

    #[test]
    fn line_item_amount_keeps_currency() {
        let item = LineItem::new(
            "Imported steel",
            2,
            Money::new(5_000, Currency::Usd).unwrap(),
            VatCategory::Zero,
        );
        assert_eq!(item.amount().unwrap().currency(), Currency::Usd);
    }

    #[test]
    fn line_item_serialization_roundtrip() {
        let item = LineItem::new(
            "Bricks",
            100,
            Money::bdt(1_500).unwrap(),
            VatCategory::Reduced,
        );
        let json = serde_json::to_string(&item).unwrap();
        let deserialized: LineItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, deserialized);
    }
}
