// Caller inputs
//
// Every flag falls back to the CI input variable (INPUT_<NAME>), so the binary
// can run as a workflow step without arguments.

use anyhow::{bail, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use healthcheck_notifier::{ApiVariant, DeliveryOptions, NotifyRequest, TargetId};

/// Production ingestion endpoint, also the identity token audience
pub const DEFAULT_HEALTHCHECK_URL: &str =
    "https://mgrkm4ait3.execute-api.eu-central-1.amazonaws.com/prod/test";

#[derive(Parser, Debug)]
#[command(name = "healthcheck-event")]
#[command(about = "Report a deploy or incident event to the healthcheck API")]
#[command(version)]
pub struct Cli {
    /// Resource (or component) the event concerns
    #[arg(long, env = "INPUT_RESOURCEID")]
    pub resource_id: Option<String>,

    /// Event message
    #[arg(long, env = "INPUT_MESSAGE")]
    pub message: Option<String>,

    /// Event type, e.g. deploy or incident
    #[arg(long, env = "INPUT_EVENT")]
    pub event: Option<String>,

    /// Route the request to the canary deployment
    #[arg(
        long,
        env = "INPUT_CANARY",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub canary: bool,

    /// Healthcheck API base URL
    #[arg(long, env = "INPUT_URL", default_value = DEFAULT_HEALTHCHECK_URL)]
    pub url: String,

    /// API shape: resources, management or components
    #[arg(long, env = "INPUT_API", default_value = "resources")]
    pub api: ApiVariant,

    /// Pre-issued bearer token (skips the CI identity token exchange)
    #[arg(long, env = "HEALTHCHECK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds (no timeout by default)
    #[arg(long, env = "INPUT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

impl Cli {
    /// Check required inputs and turn them into a notify request
    pub fn to_request(&self) -> Result<NotifyRequest> {
        let resource_id = required("resourceid", self.resource_id.as_deref())?;
        let message = required("message", self.message.as_deref())?;
        let event = required("event", self.event.as_deref())?;

        Ok(NotifyRequest {
            variant: self.api,
            message,
            event_type: event,
            target_id: TargetId::parse(&resource_id),
            options: DeliveryOptions {
                canary: self.canary,
            },
        })
    }
}

fn required(name: &str, value: Option<&str>) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => bail!("Input required and not supplied: {}", name),
    }
}
