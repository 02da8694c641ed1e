use crate::{modules::order::repository::Order, types::Context};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

pub enum Error {
    SessionNotFound,
    UnexpectedError,
}

#[derive(Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
}

/// The slice of the provider's session object that reconciliation reads.
#[derive(Deserialize)]
pub struct RetrievedSession {
    pub id: String,
    pub payment_status: String,
    pub payment_intent: Option<String>,
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub customer_details: Option<CustomerDetails>,
}

pub struct CreateCheckoutSessionPayload {
    pub order: Order,
    pub payer_email: String,
}

pub async fn create_checkout_session(
    ctx: Arc<Context>,
    payload: CreateCheckoutSessionPayload,
) -> Result<CheckoutSession, Error> {
    let params = [
        ("mode", "payment".to_string()),
        (
            "success_url",
            format!(
                "{}?session_id={{CHECKOUT_SESSION_ID}}",
                ctx.payment.success_url
            ),
        ),
        ("cancel_url", ctx.payment.cancel_url.clone()),
        ("customer_email", payload.payer_email),
        ("line_items[0][quantity]", "1".to_string()),
        ("line_items[0][price_data][currency]", "usd".to_string()),
        (
            "line_items[0][price_data][unit_amount]",
            payload.order.price.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            payload.order.meal_name.clone(),
        ),
        ("metadata[order_id]", payload.order.id.clone()),
    ];

    let res = reqwest::Client::new()
        .post(format!("{}/v1/checkout/sessions", ctx.payment.api_endpoint))
        .bearer_auth(ctx.payment.secret_key.clone())
        .form(&params)
        .send()
        .await
        .map_err(|err| {
            tracing::error!("Failed to create checkout session: {}", err);
            Error::UnexpectedError
        })?;

    if res.status() != StatusCode::OK {
        let data = res.text().await.unwrap_or_default();
        tracing::error!(
            "Failed to create checkout session for order {}: {}",
            payload.order.id,
            data
        );
        return Err(Error::UnexpectedError);
    }

    res.json::<CheckoutSession>().await.map_err(|err| {
        tracing::error!("Failed to parse checkout session response: {}", err);
        Error::UnexpectedError
    })
}

pub async fn retrieve_checkout_session(
    ctx: Arc<Context>,
    session_id: String,
) -> Result<RetrievedSession, Error> {
    let res = reqwest::Client::new()
        .get(format!(
            "{}/v1/checkout/sessions/{}",
            ctx.payment.api_endpoint, session_id
        ))
        .bearer_auth(ctx.payment.secret_key.clone())
        .send()
        .await
        .map_err(|err| {
            tracing::error!("Failed to retrieve checkout session {}: {}", session_id, err);
            Error::UnexpectedError
        })?;

    if res.status() == StatusCode::NOT_FOUND {
        return Err(Error::SessionNotFound);
    }

    if res.status() != StatusCode::OK {
        let data = res.text().await.unwrap_or_default();
        tracing::error!(
            "Failed to retrieve checkout session {}: {}",
            session_id,
            data
        );
        return Err(Error::UnexpectedError);
    }

    res.json::<RetrievedSession>().await.map_err(|err| {
        tracing::error!("Failed to parse checkout session {}: {}", session_id, err);
        Error::UnexpectedError
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieved_session_parses_a_paid_provider_payload() {
        let session: RetrievedSession = serde_json::from_value(serde_json::json!({
            "id": "cs_test_123",
            "object": "checkout.session",
            "payment_status": "paid",
            "payment_intent": "pi_456",
            "amount_total": 4200,
            "metadata": { "order_id": "01J0ABCDEF" },
            "customer_details": { "email": "buyer@example.com" }
        }))
        .unwrap();

        assert_eq!(session.payment_status, "paid");
        assert_eq!(session.payment_intent.as_deref(), Some("pi_456"));
        assert_eq!(session.metadata.get("order_id").map(String::as_str), Some("01J0ABCDEF"));
    }

    #[test]
    fn retrieved_session_tolerates_an_unpaid_minimal_payload() {
        let session: RetrievedSession = serde_json::from_value(serde_json::json!({
            "id": "cs_test_123",
            "payment_status": "unpaid",
            "payment_intent": null,
            "amount_total": null
        }))
        .unwrap();

        assert_eq!(session.payment_status, "unpaid");
        assert!(session.payment_intent.is_none());
        assert!(session.metadata.is_empty());
    }
}
