// Process-level reporting for CI runners
//
// Under a workflow runner, failures are emitted as `::error::` annotations and
// fetched tokens are masked in the log. Elsewhere failures go to stderr.

use std::sync::Arc;

use async_trait::async_trait;
use healthcheck_notifier::TokenProvider;

pub fn in_ci() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Report a terminal error as the single failure message of the process.
///
/// Under a runner the annotation on stdout is the only copy, so the message
/// shows up once in the job log. Elsewhere it goes to stderr.
pub fn fail(err: &anyhow::Error) {
    let line = failure_line(&format!("{err:#}"), in_ci());
    if in_ci() {
        println!("{line}");
    } else {
        eprintln!("{line}");
    }
}

fn failure_line(message: &str, ci: bool) -> String {
    if ci {
        format!("::error::{}", escape_data(message))
    } else {
        format!("Error: {}", message)
    }
}

/// Workflow-command data escaping
fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Registers every fetched token as a secret with the runner
pub struct MaskingTokens {
    inner: Arc<dyn TokenProvider>,
}

impl MaskingTokens {
    pub fn new(inner: Arc<dyn TokenProvider>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl TokenProvider for MaskingTokens {
    async fn fetch(&self, audience: &str) -> healthcheck_notifier::Result<String> {
        let token = self.inner.fetch(audience).await?;
        if in_ci() {
            println!("::add-mask::{}", escape_data(&token));
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthcheck_notifier::StaticToken;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50% done\r\nnext"), "50%25 done%0D%0Anext");
        assert_eq!(escape_data("plain"), "plain");
    }

    #[test]
    fn test_failure_line() {
        assert_eq!(
            failure_line("Request failed\nafter retries", true),
            "::error::Request failed%0Aafter retries"
        );
        assert_eq!(failure_line("boom", false), "Error: boom");
    }

    #[tokio::test]
    async fn test_masking_passes_token_through() {
        let tokens = MaskingTokens::new(Arc::new(StaticToken::new("tok")));
        assert_eq!(tokens.fetch("aud").await.unwrap(), "tok");
    }
}
