use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::Json;
use crate::middleware::AuthContext;
use crate::models::{CreateRefund, ProcessorReference};
use crate::money;
use crate::payments::CreateRefundParams;

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub invoice_id: String,
    /// Major-unit decimal amount (e.g. 61.00)
    pub amount: f64,
    pub reason: String,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub message: String,
    pub refund_id: String,
    /// Major-unit amount actually refunded
    pub amount: f64,
}

/// Degraded-success body: the processor-side refund went through but the
/// local ledger write did not.
#[derive(Debug, Serialize)]
pub struct PartialRefundResponse {
    pub message: String,
    pub refund_id: String,
    pub amount: f64,
    pub ledger_error: String,
}

/// POST /payments/refunds
///
/// Issues a processor-side refund for the most recent succeeded payment
/// against an invoice, then records it in the local ledger.
///
/// Side-effect order is fixed: exactly one processor mutation, then at
/// most one local write, never reversed. A ledger-write failure is
/// reported as 207 with the refunded amount; the processor-side refund is
/// never compensated or retried.
///
/// The ceiling check and the refund-create are not atomic as a pair, so
/// two concurrent requests can both pass the check; the processor's own
/// per-charge ceiling is the backstop for that race.
pub async fn create_refund(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<RefundRequest>,
) -> Result<Response> {
    if request.invoice_id.trim().is_empty() || request.reason.trim().is_empty() {
        return Err(AppError::BadRequest(msg::MISSING_REQUIRED_FIELDS.into()));
    }
    if !(request.amount > 0.0) {
        return Err(AppError::BadRequest(msg::AMOUNT_NOT_POSITIVE.into()));
    }

    // Newest succeeded payment for the invoice decides how the charge is
    // resolved; no record means nothing refundable.
    let record = {
        let conn = state.db.get()?;
        queries::latest_succeeded_payment_record(&conn, &request.invoice_id)?
    }
    .or_not_found(msg::CHARGE_NOT_FOUND)?;

    // Two-path resolution: older records carry only the intent reference,
    // newer ones the charge reference. Either way the charge's refund
    // counters are re-fetched from the processor on every attempt.
    let (charge, payment_intent_id) = match &record.reference {
        ProcessorReference::Charge(charge_id) => {
            (state.processor.retrieve_charge(charge_id).await?, None)
        }
        ProcessorReference::Intent(intent_id) => {
            let intent = state.processor.retrieve_intent(intent_id).await?;
            let charge = intent
                .latest_charge
                .or_not_found(msg::CHARGE_NOT_FOUND)?;
            (charge, Some(intent.id))
        }
    };

    let requested_minor = money::to_minor_units(request.amount);
    let available_minor = charge.refundable_minor();
    if requested_minor > available_minor {
        return Err(AppError::BadRequest(format!(
            "{} (available: {:.2})",
            msg::AMOUNT_EXCEEDS_AVAILABLE,
            money::to_major_units(available_minor)
        )));
    }

    let refund = state
        .processor
        .create_refund(&CreateRefundParams {
            charge_id: &charge.id,
            amount: requested_minor,
            invoice_id: &request.invoice_id,
            reason: &request.reason,
            refunded_by: &ctx.user.id,
            admin_notes: request.admin_notes.as_deref(),
        })
        .await?;

    let refunded_major = money::to_major_units(refund.amount);
    let message = format!(
        "Refund of {:.2} issued for invoice {}",
        refunded_major, request.invoice_id
    );

    // Ledger write is best-effort: the money has already moved, so a
    // failure here must not surface as a request failure.
    let ledger_result = (|| -> Result<_> {
        let conn = state.db.get()?;
        queries::create_refund(
            &conn,
            &CreateRefund {
                invoice_id: request.invoice_id.clone(),
                processor_refund_id: refund.id.clone(),
                payment_intent_id,
                amount_cents: refund.amount,
                reason: request.reason.clone(),
                admin_notes: request.admin_notes.clone(),
                status: refund.status.clone(),
                refunded_by: ctx.user.id.clone(),
            },
        )
    })();

    match ledger_result {
        Ok(_) => Ok((
            StatusCode::OK,
            Json(RefundResponse {
                message,
                refund_id: refund.id,
                amount: refunded_major,
            }),
        )
            .into_response()),
        Err(e) => {
            tracing::error!(
                invoice_id = %request.invoice_id,
                refund_id = %refund.id,
                "refund ledger write failed after processor refund: {}",
                e
            );
            Ok((
                StatusCode::MULTI_STATUS,
                Json(PartialRefundResponse {
                    message,
                    refund_id: refund.id,
                    amount: refunded_major,
                    ledger_error: e.to_string(),
                }),
            )
                .into_response())
        }
    }
}
