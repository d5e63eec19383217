// Healthcheck event notifier
//
// Delivers a single deploy/incident event to the healthcheck ingestion API.
//
// Key design decisions:
// - Events are validated on construction; an invalid type never reaches the network
// - The transport returns Result<Response, TransportError>; only transport errors are retried
// - Backoff is 2^n seconds after the n-th failure, no jitter, capped per API variant
// - Any response that arrives is final; statuses above 299 become RemoteRejection
// - Token acquisition and transport sit behind traits so tests can count calls
// - All configuration is passed explicitly, nothing global

pub mod engine;
pub mod error;
pub mod event;
pub mod notifier;
pub mod response;
pub mod retry;
pub mod token;
pub mod transport;
pub mod variant;

pub use engine::{build_headers, endpoint_url, Delivered, DeliveryEngine, DeliveryOptions};
pub use error::{NotifyError, Result};
pub use event::{Event, EventBody, TargetId};
pub use notifier::{NotifyRequest, Notifier};
pub use response::{check, RemoteError};
pub use retry::RetryPolicy;
pub use token::{ActionsIdTokenProvider, StaticToken, TokenProvider};
pub use transport::{
    DeliveryResponse, HttpRequest, ReqwestTransport, Transport, TransportConfig, TransportError,
};
pub use variant::ApiVariant;
