use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::Json;
use crate::id;

#[derive(Debug, Deserialize)]
pub struct ChargeLookupRequest {
    pub intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChargeLookupResponse {
    pub charge_id: String,
}

/// POST /payments/charge-lookup
///
/// Resolve a payment intent to its latest charge id. Used by older
/// tooling that stored only the intent reference.
pub async fn lookup_charge_id(
    State(state): State<AppState>,
    Json(request): Json<ChargeLookupRequest>,
) -> Result<Json<ChargeLookupResponse>> {
    if !id::is_intent_ref(&request.intent_id) {
        return Err(AppError::BadRequest(msg::INVALID_INTENT_ID.into()));
    }

    let intent = state.processor.retrieve_intent(&request.intent_id).await?;
    let charge = intent.latest_charge.or_not_found(msg::CHARGE_NOT_FOUND)?;

    Ok(Json(ChargeLookupResponse {
        charge_id: charge.id,
    }))
}
