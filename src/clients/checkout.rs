use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{OrderType, PricingTier};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Payment provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Payment provider rejected checkout: {0}")]
    Rejected(String),
}

#[derive(Debug, Serialize)]
pub struct CreateCheckoutSessionRequest {
    pub client_reference_id: Uuid,
    pub business_id: Option<Uuid>,
    pub tier: PricingTier,
    pub order_type: OrderType,
    pub amount_cents: i32,
    pub currency: &'static str,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Clone)]
pub struct CheckoutClient {
    client: reqwest::Client,
    base_url: String,
}

impl CheckoutClient {
    pub fn new(base_url: String) -> Self {
        let normalized = normalize_base_url(&base_url);
        Self {
            client: reqwest::Client::new(),
            base_url: normalized,
        }
    }

    pub async fn create_session(
        &self,
        request: &CreateCheckoutSessionRequest,
    ) -> Result<CheckoutSessionResponse, CheckoutError> {
        let url = format!("{}/checkout/sessions", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CheckoutError::Rejected(text));
        }

        Ok(response.json::<CheckoutSessionResponse>().await?)
    }
}

/// Return URLs handed to the provider. The provider substitutes
/// `{CHECKOUT_SESSION_ID}` on redirect.
pub fn return_urls(site_url: &str, tier: PricingTier, order_type: OrderType) -> (String, String) {
    let site = site_url.trim_end_matches('/');
    let tier = query_value(&tier);
    let order_type = query_value(&order_type);
    (
        format!(
            "{site}/payment-success?tier={tier}&type={order_type}\
             &session_id={{CHECKOUT_SESSION_ID}}"
        ),
        format!("{site}/pricing"),
    )
}

fn query_value<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn normalize_base_url(value: &str) -> String {
    let trimmed = value.trim_end_matches('/');
    if trimmed.ends_with("/api/v1") {
        trimmed.to_string()
    } else {
        format!("{}/api/v1", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://pay:8090/"), "http://pay:8090/api/v1");
        assert_eq!(normalize_base_url("http://pay:8090/api/v1"), "http://pay:8090/api/v1");
    }

    #[test]
    fn test_return_urls_carry_tier_and_type() {
        let (success, cancel) =
            return_urls("https://acnearme.example/", PricingTier::Premium, OrderType::Advertising);
        assert_eq!(
            success,
            "https://acnearme.example/payment-success?tier=premium&type=advertising\
             &session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(cancel, "https://acnearme.example/pricing");
    }

    #[actix_rt::test]
    async fn test_unreachable_provider_is_transport_error() {
        let client = CheckoutClient::new("http://127.0.0.1:9".into());
        let request = CreateCheckoutSessionRequest {
            client_reference_id: Uuid::new_v4(),
            business_id: None,
            tier: PricingTier::Basic,
            order_type: OrderType::Subscription,
            amount_cents: 2900,
            currency: "usd",
            customer_email: None,
            success_url: "http://localhost/ok".into(),
            cancel_url: "http://localhost/cancel".into(),
        };
        let err = client.create_session(&request).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Transport(_)));
    }
}
