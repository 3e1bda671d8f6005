//! Prefixed ID generation for OMEGA entities.
//!
//! All locally generated IDs use an `om_` brand prefix so they can never
//! collide with processor-assigned identifiers (`pi_`, `ch_`, `re_`, ...).
//!
//! Format: `om_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// Processor-side payment intent prefix.
pub const INTENT_PREFIX: &str = "pi_";
/// Processor-side charge prefix.
pub const CHARGE_PREFIX: &str = "ch_";
/// Processor-side refund prefix.
pub const REFUND_PREFIX: &str = "re_";

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &[
    "om_usr_",
    "om_prof_",
    "om_key_",
    "om_inv_",
    "om_pay_",
    "om_ref_",
];

/// Validate that a string is a valid OMEGA prefixed ID.
///
/// Cheap format check to reject garbage before hitting the database.
/// Validates format: `om_{entity}_{32_hex_chars}`
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// True if `s` looks like a processor payment intent id.
pub fn is_intent_ref(s: &str) -> bool {
    s.starts_with(INTENT_PREFIX)
}

/// True if `s` looks like a processor charge id.
pub fn is_charge_ref(s: &str) -> bool {
    s.starts_with(CHARGE_PREFIX)
}

/// Entity types that have prefixed IDs.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    User,
    Profile,
    ApiKey,
    Invoice,
    PaymentRecord,
    Refund,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::User => "om_usr",
            Self::Profile => "om_prof",
            Self::ApiKey => "om_key",
            Self::Invoice => "om_inv",
            Self::PaymentRecord => "om_pay",
            Self::Refund => "om_ref",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}
