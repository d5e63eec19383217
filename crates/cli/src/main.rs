// Healthcheck event CLI
//
// Design Decision: Use clap derive with INPUT_* env fallbacks so the binary runs as a workflow step.
// Design Decision: Exit code 1 with a single failure message for every terminal error.
// Design Decision: Use reqwest for both the identity token exchange and event delivery (one client).

mod inputs;
mod report;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use healthcheck_notifier::{
    ActionsIdTokenProvider, Notifier, ReqwestTransport, StaticToken, TokenProvider,
    TransportConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::inputs::Cli;
use crate::report::MaskingTokens;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "healthcheck_event=info,healthcheck_notifier=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report::fail(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let request = cli.to_request()?;

    let transport = ReqwestTransport::new(TransportConfig {
        timeout: cli.timeout_secs.map(Duration::from_secs),
        ..Default::default()
    })?;

    let tokens: Arc<dyn TokenProvider> = match &cli.token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(ActionsIdTokenProvider::from_env(transport.client().clone())?),
    };
    let tokens = Arc::new(MaskingTokens::new(tokens));

    let notifier = Notifier::new(&cli.url, tokens, Arc::new(transport))?;

    tracing::info!(
        api = %request.variant,
        target_id = %request.target_id,
        event_type = %request.event_type,
        canary = request.options.canary,
        "Sending healthcheck event"
    );

    let delivered = notifier
        .notify(request)
        .await
        .context("Failed to send healthcheck event")?;

    tracing::info!(
        status = delivered.response.status,
        attempts = delivered.attempts,
        "Healthcheck event sent"
    );

    Ok(())
}
