use serde::{Deserialize, Serialize};

/// An invoice for an OMEGA booking. Owned by the store; the refund flow
/// only ever references it by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    /// Total in minor units (cents)
    pub amount_cents: i64,
    /// ISO 4217 currency code, lowercase (e.g. "usd")
    pub currency: String,
    pub status: InvoiceStatus,
    pub created_at: i64,
}

/// Data required to create a new invoice
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoice {
    pub customer_name: String,
    pub customer_email: String,
    pub amount_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Open,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Paid => "paid",
            Self::Void => "void",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "paid" => Some(Self::Paid),
            "void" => Some(Self::Void),
            _ => None,
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
