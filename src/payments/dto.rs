use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for starting a checkout.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub course_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub checkout_url: String,
}

/// Payload sent to the payment provider to open a hosted session.
#[derive(Debug, Serialize)]
pub struct CheckoutSessionRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub product_name: String,
    pub metadata: SessionMetadata,
}

#[derive(Debug, Serialize)]
pub struct SessionMetadata {
    pub user_id: Uuid,
    pub course_id: Uuid,
}

/// Hosted session as returned by the provider.
#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Webhook body: the provider wraps the event in a token signed with the
/// shared webhook secret.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
}

pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.completed";

/// Claims of a signed provider event.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub sub: String,    // checkout session id
    pub event: String,  // event kind
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_request_serializes_metadata() {
        let req = CheckoutSessionRequest {
            amount_cents: 4999,
            currency: "usd".into(),
            product_name: "Rust 101".into(),
            metadata: SessionMetadata {
                user_id: Uuid::new_v4(),
                course_id: Uuid::new_v4(),
            },
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("4999"));
        assert!(json.contains("user_id"));
        assert!(json.contains("course_id"));
    }
}
