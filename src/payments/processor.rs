//! Payment processor API client.
//!
//! Thin reqwest client over the processor's REST API: form-encoded
//! requests, JSON responses, basic-auth with the secret key. All amounts
//! on this boundary are integer minor units.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// The processor's record of a captured payment.
#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
    /// Total amount in minor units
    pub amount: i64,
    /// Amount already refunded in minor units
    #[serde(default)]
    pub amount_refunded: i64,
    #[serde(default)]
    pub status: Option<String>,
}

impl Charge {
    /// Remaining refundable balance in minor units.
    ///
    /// This is the authoritative ceiling for a refund attempt; it is
    /// re-fetched on every request and never cached locally.
    pub fn refundable_minor(&self) -> i64 {
        self.amount - self.amount_refunded
    }
}

/// The processor's record of a payment attempt's lifecycle.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Present (as an object) when retrieved with `expand[]=latest_charge`
    #[serde(default)]
    pub latest_charge: Option<Charge>,
}

/// The processor's record of a refund.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorRefund {
    pub id: String,
    pub amount: i64,
    pub status: String,
}

/// Parameters for creating a refund against a resolved charge.
#[derive(Debug)]
pub struct CreateRefundParams<'a> {
    pub charge_id: &'a str,
    /// Amount in minor units
    pub amount: i64,
    pub invoice_id: &'a str,
    /// Caller-supplied reason, carried in metadata; the processor-facing
    /// reason code is always `requested_by_customer`.
    pub reason: &'a str,
    pub refunded_by: &'a str,
    pub admin_notes: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct ProcessorClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl ProcessorClient {
    pub fn new(secret_key: &str) -> Self {
        Self::with_base_url(secret_key, DEFAULT_BASE_URL)
    }

    /// Point the client at a non-default API host (dev/test).
    pub fn with_base_url(secret_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Retrieve a charge by id.
    pub async fn retrieve_charge(&self, charge_id: &str) -> Result<Charge> {
        let url = format!("{}/v1/charges/{}", self.base_url, charge_id);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("processor request failed: {}", e)))?;

        Self::parse_response(response, "charge").await
    }

    /// Retrieve a payment intent with its latest charge expanded.
    pub async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        let url = format!("{}/v1/payment_intents/{}", self.base_url, intent_id);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .query(&[("expand[]", "latest_charge")])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("processor request failed: {}", e)))?;

        Self::parse_response(response, "payment intent").await
    }

    /// Create a payment intent for an invoice.
    pub async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        invoice_id: &str,
    ) -> Result<PaymentIntent> {
        let amount = amount_minor.to_string();
        let params: Vec<(&str, &str)> = vec![
            ("amount", &amount),
            ("currency", currency),
            ("automatic_payment_methods[enabled]", "true"),
            ("metadata[invoice_id]", invoice_id),
        ];

        let url = format!("{}/v1/payment_intents", self.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("processor request failed: {}", e)))?;

        Self::parse_response(response, "payment intent").await
    }

    /// Create a refund for a charge.
    ///
    /// The amount is bounded by the charge's remaining refundable balance;
    /// the processor enforces its own ceiling atomically and is the
    /// backstop for concurrent refund requests.
    pub async fn create_refund(&self, params: &CreateRefundParams<'_>) -> Result<ProcessorRefund> {
        let amount = params.amount.to_string();
        let notes = params.admin_notes.unwrap_or("none");
        let form: Vec<(&str, &str)> = vec![
            ("charge", params.charge_id),
            ("amount", &amount),
            ("reason", "requested_by_customer"),
            ("metadata[invoice_id]", params.invoice_id),
            ("metadata[reason]", params.reason),
            ("metadata[refunded_by]", params.refunded_by),
            ("metadata[admin_notes]", notes),
        ];

        let url = format!("{}/v1/refunds", self.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("processor request failed: {}", e)))?;

        Self::parse_response(response, "refund").await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "processor returned {} for {}: {}",
                status, what, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to parse {} response: {}", what, e)))
    }
}
