// End-to-end notification: validate, authenticate, deliver, check.
//
// Decision: Validation runs before the token is fetched so an invalid event
// type causes no network activity at all.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::engine::{Delivered, DeliveryEngine, DeliveryOptions};
use crate::error::{NotifyError, Result};
use crate::event::{Event, TargetId};
use crate::response;
use crate::retry::RetryPolicy;
use crate::token::TokenProvider;
use crate::transport::Transport;
use crate::variant::ApiVariant;

/// Caller inputs for one notification
#[derive(Debug, Clone)]
pub struct NotifyRequest {
    pub variant: ApiVariant,
    pub message: String,
    pub event_type: String,
    pub target_id: TargetId,
    pub options: DeliveryOptions,
}

pub struct Notifier {
    endpoint_base: Url,
    audience: String,
    tokens: Arc<dyn TokenProvider>,
    transport: Arc<dyn Transport>,
    base_delay: Duration,
}

impl Notifier {
    /// `endpoint_base` doubles as the token audience, verbatim.
    pub fn new(
        endpoint_base: &str,
        tokens: Arc<dyn TokenProvider>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let audience = endpoint_base.trim().to_string();
        let endpoint_base = Url::parse(&audience)
            .map_err(|e| NotifyError::invalid_url(format!("{audience}: {e}")))?;

        Ok(Self {
            endpoint_base,
            audience,
            tokens,
            transport,
            base_delay: RetryPolicy::DEFAULT_BASE_DELAY,
        })
    }

    /// Scale the backoff schedule. The attempt cap always comes from the
    /// API variant.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn endpoint_base(&self) -> &Url {
        &self.endpoint_base
    }

    pub async fn notify(&self, request: NotifyRequest) -> Result<Delivered> {
        let event = Event::build(
            request.variant,
            request.message,
            request.event_type,
            request.target_id,
        )?;

        let token = self.tokens.fetch(&self.audience).await?;

        let policy = RetryPolicy {
            base_delay: self.base_delay,
            ..RetryPolicy::for_variant(request.variant)
        };
        let engine = DeliveryEngine::new(self.transport.clone(), policy);

        let delivered = engine
            .send(&self.endpoint_base, &token, event, request.options)
            .await?;

        let response = response::check(delivered.response)?;
        Ok(Delivered {
            response,
            attempts: delivered.attempts,
            waited: delivered.waited,
        })
    }
}
