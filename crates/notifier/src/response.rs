// Response interpretation
//
// Decision: A response that arrives is a final answer. Statuses above 299 are
// terminal rejections and never re-enter the retry loop.

use serde::Deserialize;

use crate::error::{NotifyError, Result};
use crate::transport::DeliveryResponse;

/// Error body returned by the healthcheck API
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RemoteError {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

/// Pass accepted responses through, turn rejections into an error.
pub fn check(response: DeliveryResponse) -> Result<DeliveryResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let (code, message) = match serde_json::from_str::<RemoteError>(&response.body) {
        Ok(remote) => (remote.code, remote.message),
        Err(_) if !response.body.trim().is_empty() => (None, response.body.trim().to_string()),
        Err(_) => (None, status_reason(response.status)),
    };

    tracing::error!(status = response.status, code = ?code, "Healthcheck API rejected the event");

    Err(NotifyError::RemoteRejection {
        status: response.status,
        code,
        message,
    })
}

fn status_reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unknown status")
        .to_string()
}
