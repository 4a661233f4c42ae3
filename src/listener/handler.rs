use std::future::Future;

use async_trait::async_trait;

use crate::backend::{MessageAttributes, SystemAttributes};

/// Decides what happens to each received message.
///
/// Returning `true` acknowledges the message, which deletes it from the queue.
/// Returning `false` leaves it in place; the queue redelivers it once its
/// visibility timeout expires, so handlers must tolerate duplicates.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handles one message.
    ///
    /// The default implementation acknowledges nothing.
    async fn handle_message(
        &self,
        body: &str,
        attributes: &SystemAttributes,
        message_attributes: &MessageAttributes,
    ) -> bool {
        let _ = (attributes, message_attributes);
        tracing::debug!(body_len = body.len(), "received message with no handler installed");
        false
    }
}

/// Handler that never acknowledges anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnhandledMessages;

impl MessageHandler for UnhandledMessages {}

/// Adapts an async closure into a [`MessageHandler`].
///
/// The closure receives owned copies of the body and both attribute maps.
///
/// # Examples
///
/// ```rust
/// use rs_sqs_listener::listener::handler::HandlerFn;
///
/// let handler = HandlerFn::new(|body: String, _attrs, _msg_attrs| async move {
///     !body.is_empty()
/// });
/// # let _ = handler;
/// ```
pub struct HandlerFn<F> {
    handler_fn: F,
}

impl<F, Fut> HandlerFn<F>
where
    F: Fn(String, SystemAttributes, MessageAttributes) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    /// Wraps `handler_fn` so it can be installed on a poller.
    ///
    /// # Arguments
    ///
    /// * `handler_fn` - Called with the body, system attributes and user
    ///   attributes of each message; resolves to `true` to acknowledge it
    pub fn new(handler_fn: F) -> Self {
        HandlerFn { handler_fn }
    }
}

#[async_trait]
impl<F, Fut> MessageHandler for HandlerFn<F>
where
    F: Fn(String, SystemAttributes, MessageAttributes) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    async fn handle_message(
        &self,
        body: &str,
        attributes: &SystemAttributes,
        message_attributes: &MessageAttributes,
    ) -> bool {
        (self.handler_fn)(body.to_string(), attributes.clone(), message_attributes.clone()).await
    }
}
