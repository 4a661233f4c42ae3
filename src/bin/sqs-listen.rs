//! Listens to a queue and logs every message it receives.
//!
//! ```text
//! SQS_DEFAULT_POLL=5 RUST_LOG=info sqs-listen --queue orders [--ack]
//! ```
//!
//! The queue may also come from `SQS_QUEUE_NAME`. With `--ack` received
//! messages are deleted; otherwise they are left for redelivery.

use clap::Parser;
use rs_sqs_listener::{
    HandlerFn, ListenerConfig, QueuePoller, SqsBackend, SqsListenerError, TokioScheduler,
    client::create_sqs_client_for,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sqs-listen")]
#[command(about = "Log every message arriving on an SQS queue", long_about = None)]
struct Args {
    /// Name of the queue to listen to
    #[arg(long, env = "SQS_QUEUE_NAME")]
    queue: String,

    /// Delete messages once they have been logged
    #[arg(long)]
    ack: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_line_number(true)
        .init();

    let args = Args::parse();
    let acknowledge = args.ack;

    let config = ListenerConfig::from_env(args.queue)
        .map_err(SqsListenerError::from)?
        .with_listener_name("sqs-listen")
        .with_attribute_names(["All"])
        .with_message_attribute_names(["All"]);
    let backend = SqsBackend::new(create_sqs_client_for(&config).await);

    let mut poller = QueuePoller::new(config, backend, TokioScheduler::new()).with_handler(
        HandlerFn::new(move |body: String, attributes, message_attributes| async move {
            tracing::info!(
                %body,
                ?attributes,
                ?message_attributes,
                "message received"
            );
            acknowledge
        }),
    );

    poller.setup().await.map_err(SqsListenerError::from)?;
    poller.start().map_err(SqsListenerError::from)?;
    tracing::info!(queue = %poller.config().queue_name, acknowledge, "listening");

    tokio::signal::ctrl_c().await?;

    poller.destroy();
    tracing::info!("done");

    Ok(())
}
