//! # AWS SQS Listener
//!
//! A scheduler-driven AWS SQS listener. A [`QueuePoller`](listener::QueuePoller)
//! resolves a named queue, then on every tick of an injected scheduler receives a
//! batch of messages, hands each one to a handler and deletes the ones the
//! handler reports as handled.
//!
//! ## Features
//!
//! - Explicit lifecycle: `setup` → `start` → `stop`, with `destroy` safe in any state
//! - At-least-once delivery: unhandled messages stay on the queue for redelivery
//! - Pluggable queue backend ([`backend::QueueBackend`]) with an SQS implementation
//! - Pluggable scheduler ([`scheduler::Scheduler`]) with a tokio implementation
//! - Long polling, batch size and attribute filters from [`listener::config::ListenerConfig`]
//! - Backend hiccups are logged with `tracing` and never stop the schedule
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rs_sqs_listener::{
//!     backend::SqsBackend,
//!     client::create_sqs_client_for,
//!     listener::{QueuePoller, config::ListenerConfig, handler::HandlerFn},
//!     scheduler::TokioScheduler,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ListenerConfig::new("orders")
//!         .with_poll_interval(Duration::from_secs(5))
//!         .with_wait_time_seconds(10)
//!         .with_max_number_of_messages(10);
//!     let backend = SqsBackend::new(create_sqs_client_for(&config).await);
//!
//!     let mut poller = QueuePoller::new(config, backend, TokioScheduler::new())
//!         .with_handler(HandlerFn::new(|body: String, _, _| async move {
//!             println!("Processing message: {}", body);
//!             true
//!         }));
//!
//!     poller.setup().await?;
//!     poller.start()?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     poller.destroy();
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod errors;
pub mod listener;
pub mod scheduler;

pub use backend::{Message, QueueBackend, QueueHandle, SqsBackend};
pub use errors::{BackendError, ConfigError, SetupError, SqsListenerError, StateError};
pub use listener::config::ListenerConfig;
pub use listener::handler::{HandlerFn, MessageHandler};
pub use listener::{PollerState, QueuePoller};
pub use scheduler::{Scheduler, TickResult, TokioScheduler};
