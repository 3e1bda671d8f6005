use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::Json;
use crate::models::PaymentStatus;
use crate::money;

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub invoice_id: String,
    /// Major-unit decimal amount
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    pub intent_id: String,
    pub client_secret: Option<String>,
}

/// POST /payments/intents
///
/// Create a processor payment intent for an invoice and store the pending
/// payment record carrying the intent reference. This is the writer of
/// the rows the refund flow later resolves charges from.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(request): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>> {
    if request.invoice_id.trim().is_empty() {
        return Err(AppError::BadRequest("invoice_id is required".into()));
    }
    if !(request.amount > 0.0) {
        return Err(AppError::BadRequest(msg::AMOUNT_NOT_POSITIVE.into()));
    }

    let invoice = {
        let conn = state.db.get()?;
        queries::get_invoice_by_id(&conn, &request.invoice_id)?
    }
    .or_not_found(msg::INVOICE_NOT_FOUND)?;

    let amount_minor = money::to_minor_units(request.amount);
    let intent = state
        .processor
        .create_payment_intent(amount_minor, &invoice.currency, &invoice.id)
        .await?;

    {
        let conn = state.db.get()?;
        queries::create_payment_record(
            &conn,
            &invoice.id,
            &intent.id,
            PaymentStatus::Pending,
            amount_minor,
        )?;
    }

    Ok(Json(CreateIntentResponse {
        intent_id: intent.id,
        client_secret: intent.client_secret,
    }))
}
