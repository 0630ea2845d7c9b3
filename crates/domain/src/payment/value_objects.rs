//! Value objects for the payment domain.

use serde::{Deserialize, Serialize};

/// Mobile financial service providers common in Bangladesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletProvider {
    Bkash,
    Nagad,
    Rocket,
    Upay,
}

impl WalletProvider {
    /// Returns the provider name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletProvider::Bkash => "bKash",
            WalletProvider::Nagad => "Nagad",
            WalletProvider::Rocket => "Rocket",
            WalletProvider::Upay => "Upay",
        }
    }
}

impl std::fmt::Display for WalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a payment is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum PaymentMethod {
    /// Direct bank transfer.
    BankTransfer,

    /// Mobile wallet payment via a named provider.
    MobileWallet { provider: WalletProvider },

    /// Paper cheque.
    Cheque,

    /// Cash.
    Cash,
}

impl PaymentMethod {
    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "BankTransfer",
            PaymentMethod::MobileWallet { .. } => "MobileWallet",
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::Cash => "Cash",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::MobileWallet { provider } => write!(f, "MobileWallet({provider})"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
