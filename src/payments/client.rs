use anyhow::Context;
use async_trait::async_trait;
use axum::extract::FromRef;
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::debug;

use crate::payments::dto::{CheckoutSession, CheckoutSessionRequest, PaymentEvent};
use crate::state::AppState;

#[async_trait]
pub trait PaymentClient: Send + Sync {
    async fn create_checkout_session(
        &self,
        req: &CheckoutSessionRequest,
    ) -> anyhow::Result<CheckoutSession>;
}

/// Thin HTTP client for the hosted-checkout provider.
pub struct HttpPaymentClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl HttpPaymentClient {
    pub fn new(api_base: &str, secret_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }
}

#[async_trait]
impl PaymentClient for HttpPaymentClient {
    async fn create_checkout_session(
        &self,
        req: &CheckoutSessionRequest,
    ) -> anyhow::Result<CheckoutSession> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .json(req)
            .send()
            .await
            .context("create checkout session")?
            .error_for_status()
            .context("checkout session rejected")?;

        let session: CheckoutSession = response
            .json()
            .await
            .context("decode checkout session")?;
        debug!(session_id = %session.id, "checkout session created");
        Ok(session)
    }
}

/// Verifies provider webhook events signed with the shared webhook secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    decoding: DecodingKey,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<PaymentEvent> {
        let validation = Validation::default();
        let data = decode::<PaymentEvent>(token, &self.decoding, &validation)
            .context("verify webhook event")?;
        Ok(data.claims)
    }
}

impl FromRef<AppState> for WebhookVerifier {
    fn from_ref(state: &AppState) -> Self {
        WebhookVerifier::new(&state.config.payments.webhook_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::dto::EVENT_CHECKOUT_COMPLETED;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn sign_event(secret: &str, event: &str, exp_offset: i64) -> String {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = PaymentEvent {
            sub: "cs_test_123".into(),
            event: event.into(),
            user_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            iat: now as usize,
            exp: (now + exp_offset) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("sign event")
    }

    #[test]
    fn accepts_event_signed_with_shared_secret() {
        let verifier = WebhookVerifier::new("whsec_test");
        let token = sign_event("whsec_test", EVENT_CHECKOUT_COMPLETED, 300);
        let event = verifier.verify(&token).expect("verify");
        assert_eq!(event.event, EVENT_CHECKOUT_COMPLETED);
        assert_eq!(event.sub, "cs_test_123");
    }

    #[test]
    fn rejects_event_signed_with_wrong_secret() {
        let verifier = WebhookVerifier::new("whsec_test");
        let token = sign_event("whsec_other", EVENT_CHECKOUT_COMPLETED, 300);
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn rejects_expired_event() {
        let verifier = WebhookVerifier::new("whsec_test");
        // Past the default validation leeway.
        let token = sign_event("whsec_test", EVENT_CHECKOUT_COMPLETED, -300);
        assert!(verifier.verify(&token).is_err());
    }

    #[tokio::test]
    async fn fake_client_round_trip() {
        use crate::payments::dto::{CheckoutSessionRequest, SessionMetadata};
        use crate::state::AppState;

        let state = AppState::fake();
        let session = state
            .payments
            .create_checkout_session(&CheckoutSessionRequest {
                amount_cents: 100,
                currency: "usd".into(),
                product_name: "Test".into(),
                metadata: SessionMetadata {
                    user_id: Uuid::new_v4(),
                    course_id: Uuid::new_v4(),
                },
            })
            .await
            .expect("fake session");
        assert!(session.id.starts_with("cs_fake_"));
    }
}
