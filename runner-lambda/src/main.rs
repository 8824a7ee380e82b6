use std::env;
use std::sync::Arc;

use advice_core::config::{CONFIG_PATH_ENV, load_config};
use advice_core::telemetry::init_tracing;
use advice_core::{AdviceHandler, CompletionClient, InvocationEvent, InvocationResponse};
use anyhow::Context;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use tracing::info;

/// The platform's request id becomes the `timestamp` of a successful answer.
pub async fn lambda_handler<C: CompletionClient>(
    handler: &AdviceHandler<C>,
    event: LambdaEvent<InvocationEvent>,
) -> Result<InvocationResponse, Error> {
    let request_id = event.context.request_id;
    Ok(handler.handle(event.payload, &request_id).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config_path = env::var(CONFIG_PATH_ENV).ok();
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    let handler = Arc::new(
        AdviceHandler::from_config(&config).context("Failed to initialize advice handler")?,
    );

    info!("Starting Lambda runtime");
    lambda_runtime::run(service_fn(move |event: LambdaEvent<InvocationEvent>| {
        let handler = Arc::clone(&handler);
        async move { lambda_handler(&*handler, event).await }
    }))
    .await
}
