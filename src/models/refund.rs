use serde::{Deserialize, Serialize};

/// Locally stored row documenting a processor-side refund after the fact.
///
/// Written once per successful processor refund, never updated or deleted.
/// The write is best-effort: if it fails, the processor-side refund is the
/// sole record of truth and the caller is told so with a degraded-success
/// response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub invoice_id: String,
    /// Processor refund id (`re_...`)
    pub processor_refund_id: String,
    /// Resolved payment intent id, when the payment record carried one.
    pub payment_intent_id: Option<String>,
    pub amount_cents: i64,
    /// Caller-supplied reason for the refund
    pub reason: String,
    pub admin_notes: Option<String>,
    /// Status mirrored from the processor's response
    pub status: String,
    /// Identity of the operator who triggered the refund
    pub refunded_by: String,
    pub created_at: i64,
}

/// Data required to record a completed refund
#[derive(Debug, Clone)]
pub struct CreateRefund {
    pub invoice_id: String,
    pub processor_refund_id: String,
    pub payment_intent_id: Option<String>,
    pub amount_cents: i64,
    pub reason: String,
    pub admin_notes: Option<String>,
    pub status: String,
    pub refunded_by: String,
}
