use serde::{Deserialize, Serialize, Serializer};

use crate::id::{CHARGE_PREFIX, INTENT_PREFIX};

/// Locally stored row linking an invoice to a processor reference.
///
/// One row per payment attempt. Older rows carry only the payment intent
/// reference; newer ones store the charge reference directly. The refund
/// flow must tolerate both without a data migration.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRecord {
    pub id: String,
    pub invoice_id: String,
    pub reference: ProcessorReference,
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub created_at: i64,
}

/// How a stored payment references the processor's objects.
///
/// The prefix-sniffing rule lives in [`ProcessorReference::parse`], applied
/// once at the row-mapping boundary. Everything downstream dispatches on the
/// variant, never on the raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorReference {
    /// Direct charge reference (`ch_...`) - resolvable in one lookup.
    Charge(String),
    /// Payment intent reference (`pi_...`) - the charge is resolved by
    /// retrieving the intent with its latest charge expanded.
    Intent(String),
}

impl ProcessorReference {
    /// Disambiguate a stored reference by its processor prefix.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.starts_with(CHARGE_PREFIX) {
            Some(Self::Charge(raw.to_string()))
        } else if raw.starts_with(INTENT_PREFIX) {
            Some(Self::Intent(raw.to_string()))
        } else {
            None
        }
    }

    /// The stored string form.
    pub fn raw(&self) -> &str {
        match self {
            Self::Charge(s) | Self::Intent(s) => s,
        }
    }
}

impl Serialize for ProcessorReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.raw())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_refs_parse_to_charge_variant() {
        let parsed = ProcessorReference::parse("ch_3OqX1z2abc").unwrap();
        assert_eq!(parsed, ProcessorReference::Charge("ch_3OqX1z2abc".into()));
        assert_eq!(parsed.raw(), "ch_3OqX1z2abc");
    }

    #[test]
    fn test_intent_refs_parse_to_intent_variant() {
        let parsed = ProcessorReference::parse("pi_3OqX1z2abc").unwrap();
        assert_eq!(parsed, ProcessorReference::Intent("pi_3OqX1z2abc".into()));
    }

    #[test]
    fn test_unknown_prefixes_rejected() {
        assert!(ProcessorReference::parse("re_3OqX1z2abc").is_none());
        assert!(ProcessorReference::parse("om_pay_abc").is_none());
        assert!(ProcessorReference::parse("").is_none());
    }
}
