//! Delivery engine: serialize once, POST, back off, repeat.
//!
//! One [`DeliveryEngine::send`] call walks `Attempting(1) → Attempting(n) →
//! {Delivered | ExhaustedRetries}`. Only [`TransportError`]s move it to the next
//! attempt; any response that comes back, whatever its status, ends the loop.
//! Interpreting the status is left to [`crate::response::check`].

use std::{sync::Arc, time::Duration};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;

use crate::error::{NotifyError, Result};
use crate::event::Event;
use crate::retry::RetryPolicy;
use crate::transport::{DeliveryResponse, HttpRequest, Transport, TransportError};

/// Routing header steering the request to the canary deployment
pub const CANARY_HEADER: &str = "x-canary";
pub const CANARY_VALUE: &str = "always";

/// Per-send flags that do not belong to the event itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryOptions {
    pub canary: bool,
}

/// Successful outcome of a send
#[derive(Debug, Clone)]
pub struct Delivered {
    pub response: DeliveryResponse,
    /// Attempts used, including the one that succeeded
    pub attempts: u32,
    /// Total backoff slept before the successful attempt
    pub waited: Duration,
}

/// Retry bookkeeping for a single send
#[derive(Debug, Default)]
struct DeliveryAttempt {
    attempts: u32,
    waited: Duration,
    last_error: Option<TransportError>,
}

/// Sends events with bounded exponential backoff.
#[derive(Clone)]
pub struct DeliveryEngine {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl DeliveryEngine {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Deliver `event` to `endpoint_base`.
    ///
    /// The body is serialized once and the same bytes go out on every attempt.
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` if the endpoint cannot be built (no request is sent)
    /// - `TokenAcquisition` if the token cannot be used as a header value
    /// - `ExhaustedRetries` once every attempt failed at the transport level
    pub async fn send(
        &self,
        endpoint_base: &Url,
        token: &str,
        event: Event,
        options: DeliveryOptions,
    ) -> Result<Delivered> {
        let request = HttpRequest {
            url: endpoint_url(endpoint_base, &event)?,
            headers: build_headers(token, options)?,
            body: event.to_bytes()?,
        };

        let span = info_span!(
            "send_event",
            target_id = %event.target_id(),
            event_type = event.event_type(),
            url = %request.url,
        );

        self.run(&request).instrument(span).await
    }

    /// The retry loop. After the final failed attempt it returns
    /// `ExhaustedRetries` immediately; there is no trailing backoff sleep,
    /// since nothing follows it.
    async fn run(&self, request: &HttpRequest) -> Result<Delivered> {
        let max = self.policy.max_attempts;
        let mut state = DeliveryAttempt::default();

        loop {
            state.attempts += 1;
            debug!(attempt = state.attempts, max_attempts = max, "Posting event");

            match self.transport.post(request).await {
                Ok(response) => {
                    info!(
                        status = response.status,
                        attempts = state.attempts,
                        "Event delivered"
                    );
                    return Ok(Delivered {
                        response,
                        attempts: state.attempts,
                        waited: state.waited,
                    });
                }
                Err(e) => {
                    if !self.policy.has_attempts_remaining(state.attempts) {
                        warn!(attempts = state.attempts, error = %e, "Giving up on event delivery");
                        state.last_error = Some(e);
                        break;
                    }

                    let delay = self.policy.delay_after_failure(state.attempts);
                    info!(
                        attempt = state.attempts,
                        max_attempts = max,
                        delay_ms = delay.as_millis() as u64,
                        "Sending event failed: {}, retrying ({}/{})",
                        e,
                        state.attempts,
                        max
                    );
                    state.last_error = Some(e);
                    tokio::time::sleep(delay).await;
                    state.waited += delay;
                }
            }
        }

        Err(NotifyError::ExhaustedRetries {
            attempts: state.attempts,
            last_error: state
                .last_error
                .map(|e| e.to_string())
                .unwrap_or_default(),
        })
    }
}

/// Join the variant's path template onto `base`.
///
/// The target id is pushed as one percent-escaped segment; an empty trailing
/// segment on the base (`https://host/prod/`) is dropped first. Query and
/// fragment of the base are discarded.
pub fn endpoint_url(base: &Url, event: &Event) -> Result<Url> {
    let target = event.target_id().to_string();
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);

    url.path_segments_mut()
        .map_err(|_| NotifyError::invalid_url(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(event.variant().path_segments(&target));

    Ok(url)
}

/// Authorization, content type and optional canary header
pub fn build_headers(token: &str, options: DeliveryOptions) -> Result<HeaderMap> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| NotifyError::token("token contains characters not allowed in a header"))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if options.canary {
        headers.insert(
            HeaderName::from_static(CANARY_HEADER),
            HeaderValue::from_static(CANARY_VALUE),
        );
    }

    Ok(headers)
}
