use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use tokio::sync::Mutex;

use crate::backend::{Message, QueueBackend, QueueHandle, ReceiveOptions};
use crate::errors::{SetupError, StateError};
use crate::scheduler::{Scheduler, TickCallback, TickResult};

pub mod config;
pub mod handler;

use config::ListenerConfig;
use handler::{MessageHandler, UnhandledMessages};

/// Lifecycle of a [`QueuePoller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// The queue handle has not been resolved yet.
    Unconfigured,
    /// The queue handle is resolved and no tick is scheduled.
    Ready,
    /// A periodic tick is registered with the scheduler.
    Listening,
    /// Listening was stopped; `start` may be called again.
    Stopped,
}

/// Polls a queue on a schedule and hands each message to a [`MessageHandler`].
///
/// Messages are deleted only when the handler returns `true`, giving
/// at-least-once delivery. The poller owns its queue handle; scheduling is
/// delegated to the injected [`Scheduler`].
///
/// # Examples
///
/// ```rust,no_run
/// use rs_sqs_listener::{
///     backend::SqsBackend,
///     client::create_sqs_client_from_env,
///     listener::{QueuePoller, config::ListenerConfig, handler::HandlerFn},
///     scheduler::TokioScheduler,
/// };
///
/// #[tokio::main]
/// async fn main() -> Result<(), rs_sqs_listener::errors::SqsListenerError> {
///     let backend = SqsBackend::new(create_sqs_client_from_env().await);
///     let mut poller = QueuePoller::new(ListenerConfig::new("orders"), backend, TokioScheduler::new())
///         .with_handler(HandlerFn::new(|body: String, _, _| async move {
///             println!("got {body}");
///             true
///         }));
///
///     poller.setup().await?;
///     poller.start()?;
///     tokio::signal::ctrl_c().await.ok();
///     poller.destroy();
///     Ok(())
/// }
/// ```
pub struct QueuePoller<B, S>
where
    B: QueueBackend + 'static,
    S: Scheduler,
{
    shared: Arc<PollerShared<B>>,
    handler: Arc<dyn MessageHandler>,
    scheduler: S,
    task: Option<S::Handle>,
    stopped: bool,
}

/// State reachable from the scheduled tick.
struct PollerShared<B> {
    config: ListenerConfig,
    backend: B,
    queue: OnceLock<QueueHandle>,
    /// Held for the whole of a tick so that ticks never overlap, even when a
    /// restart registers a new task while the previous one is mid-poll.
    tick_lock: Mutex<()>,
}

impl<B, S> QueuePoller<B, S>
where
    B: QueueBackend + 'static,
    S: Scheduler,
{
    /// Creates an unconfigured poller that acknowledges nothing until a
    /// handler is installed with [`with_handler`](Self::with_handler).
    ///
    /// # Arguments
    ///
    /// * `config` - Queue name, polling cadence and receive filters
    /// * `backend` - The queueing service to consume from
    /// * `scheduler` - Runner for the periodic tick registered by [`start`](Self::start)
    pub fn new(config: ListenerConfig, backend: B, scheduler: S) -> Self {
        QueuePoller {
            shared: Arc::new(PollerShared {
                config,
                backend,
                queue: OnceLock::new(),
                tick_lock: Mutex::new(()),
            }),
            handler: Arc::new(UnhandledMessages),
            scheduler,
            task: None,
            stopped: false,
        }
    }

    /// Replaces the message handler.
    ///
    /// Takes effect on the next [`start`](Self::start); a registered tick keeps
    /// the handler it was started with.
    pub fn with_handler<H>(self, handler: H) -> Self
    where
        H: MessageHandler + 'static,
    {
        self.with_shared_handler(Arc::new(handler))
    }

    /// Like [`with_handler`](Self::with_handler), for a handler that is shared
    /// with other code.
    pub fn with_shared_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// The configuration this poller was built with.
    pub fn config(&self) -> &ListenerConfig {
        &self.shared.config
    }

    /// The resolved queue, once setup has succeeded.
    pub fn queue(&self) -> Option<&QueueHandle> {
        self.shared.queue.get()
    }

    /// Current lifecycle state.
    ///
    /// # Returns
    ///
    /// * [`PollerState::Listening`] while a tick is registered
    /// * [`PollerState::Unconfigured`] until setup succeeds
    /// * [`PollerState::Stopped`] after a stop, [`PollerState::Ready`] otherwise
    pub fn state(&self) -> PollerState {
        if self.task.is_some() {
            PollerState::Listening
        } else if !self.is_ready() {
            PollerState::Unconfigured
        } else if self.stopped {
            PollerState::Stopped
        } else {
            PollerState::Ready
        }
    }

    /// True once setup has resolved the queue handle.
    pub fn is_ready(&self) -> bool {
        self.shared.is_ready()
    }

    /// True while a periodic tick is registered.
    pub fn is_listening(&self) -> bool {
        self.task.is_some()
    }

    /// Resolves the queue handle. Does nothing if it is already resolved.
    pub async fn setup(&self) -> Result<(), SetupError> {
        self.shared.setup().await
    }

    /// Registers the periodic tick with the scheduler.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The tick is registered at the configured poll interval
    /// * `Err(StateError::AlreadyListening)` - A tick is already registered
    /// * `Err(StateError::NotReady)` - [`setup`](Self::setup) has not succeeded
    pub fn start(&mut self) -> Result<(), StateError> {
        if self.is_listening() {
            tracing::warn!(listener = %self.shared.config.listener_name, "failed to start listening: already listening");
            return Err(StateError::AlreadyListening);
        }
        if !self.is_ready() {
            tracing::warn!(listener = %self.shared.config.listener_name, "failed to start listening: listener not ready");
            return Err(StateError::NotReady);
        }

        let shared = Arc::clone(&self.shared);
        let handler = Arc::clone(&self.handler);
        let callback: TickCallback = Box::new(move || {
            let shared = Arc::clone(&shared);
            let handler = Arc::clone(&handler);
            async move { shared.tick(handler.as_ref()).await }.boxed()
        });

        let config = &self.shared.config;
        tracing::debug!(
            listener = %config.listener_name,
            queue = %config.queue_name,
            interval_secs = config.poll_interval.as_secs_f64(),
            "starting to listen"
        );
        let handle = self
            .scheduler
            .schedule_periodic(config.poll_interval, &config.task_name(), callback);
        self.task = Some(handle);
        self.stopped = false;
        Ok(())
    }

    /// Cancels the periodic tick. A tick already running is not interrupted.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - No further ticks will be started
    /// * `Err(StateError::NotListening)` - No tick was registered
    pub fn stop(&mut self) -> Result<(), StateError> {
        let Some(handle) = self.task.take() else {
            tracing::warn!(listener = %self.shared.config.listener_name, "failed to stop listening: not currently listening");
            return Err(StateError::NotListening);
        };

        tracing::debug!(listener = %self.shared.config.listener_name, "stopping listener");
        self.scheduler.cancel(handle);
        self.stopped = true;
        Ok(())
    }

    /// Runs one poll: receive, dispatch, acknowledge.
    ///
    /// Returns [`TickResult::Halt`] without touching the backend when setup has
    /// not completed. Backend failures are logged and never propagated. Waits
    /// for any tick already running on this poller to finish first.
    pub async fn tick(&self) -> TickResult {
        self.shared.tick(self.handler.as_ref()).await
    }

    /// Stops listening if needed. Safe to call in any state.
    pub fn destroy(&mut self) {
        tracing::debug!(listener = %self.shared.config.listener_name, "shutting down listener");
        if self.is_listening() {
            if let Err(e) = self.stop() {
                tracing::warn!(listener = %self.shared.config.listener_name, error = %e, "failed to stop listener during shutdown");
            }
        }
    }
}

impl<B> PollerShared<B>
where
    B: QueueBackend,
{
    fn is_ready(&self) -> bool {
        self.queue.get().is_some()
    }

    #[tracing::instrument(skip(self), fields(listener = %self.config.listener_name, queue = %self.config.queue_name))]
    async fn setup(&self) -> Result<(), SetupError> {
        if self.is_ready() {
            tracing::debug!("queue already resolved, skipping setup");
            return Ok(());
        }

        tracing::debug!("retrieving queue");
        let queue = self
            .backend
            .resolve_queue(&self.config.queue_name)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to locate queue");
                SetupError::QueueNotFound {
                    queue_name: self.config.queue_name.clone(),
                    reason: e.to_string(),
                }
            })?;

        // A concurrent setup may have won; both resolved the same queue.
        let _ = self.queue.set(queue);
        Ok(())
    }

    #[tracing::instrument(skip(self, handler), fields(listener = %self.config.listener_name))]
    async fn tick(&self, handler: &dyn MessageHandler) -> TickResult {
        let _running = self.tick_lock.lock().await;

        let Some(queue) = self.queue.get() else {
            tracing::warn!("failed to poll queue: listener not ready");
            return TickResult::Halt;
        };

        let options = ReceiveOptions {
            wait_time_seconds: self.config.wait_time_seconds,
            max_number_of_messages: self.config.max_number_of_messages,
            attribute_names: self.config.attribute_names.clone(),
            message_attribute_names: self.config.message_attribute_names.clone(),
        };

        let messages = match self.backend.receive(queue, &options).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(queue = %queue.name, error = %e, "error receiving messages");
                return TickResult::Continue;
            }
        };

        tracing::trace!(queue = %queue.name, count = messages.len(), "received messages");
        for message in &messages {
            self.dispatch(queue, handler, message).await;
        }

        TickResult::Continue
    }

    async fn dispatch(&self, queue: &QueueHandle, handler: &dyn MessageHandler, message: &Message) {
        tracing::debug!(queue = %queue.name, message_id = message.message_id.as_deref(), "received new message");

        let handled = handler
            .handle_message(&message.body, &message.attributes, &message.message_attributes)
            .await;
        if !handled {
            return;
        }

        if let Err(e) = self.backend.delete(queue, &message.receipt_handle).await {
            tracing::error!(
                queue = %queue.name,
                message_id = message.message_id.as_deref(),
                error = %e,
                "error deleting message"
            );
        }
    }
}
