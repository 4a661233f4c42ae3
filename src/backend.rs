use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::MessageSystemAttributeName;

use crate::errors::BackendError;

/// System attributes attached to a message by the queueing service
/// (`SentTimestamp`, `ApproximateReceiveCount`, ...).
pub type SystemAttributes = HashMap<String, String>;

/// User-defined message attributes, keyed by attribute name.
pub type MessageAttributes = HashMap<String, MessageAttributeValue>;

/// A resolved queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueHandle {
    /// Name the queue was looked up by.
    pub name: String,
    /// Address used for every receive and delete call.
    pub url: String,
}

/// A user-defined message attribute value.
///
/// `data_type` keeps the full SQS label, including any custom suffix such as
/// `Number.int` or `String.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttributeValue {
    pub data_type: String,
    pub value: AttributeValue,
}

/// The typed payload of a [`MessageAttributeValue`].
///
/// Numbers are kept in their textual form, exactly as SQS transmits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    String(String),
    Number(String),
    Binary(Vec<u8>),
}

impl MessageAttributeValue {
    /// Creates a `String` attribute.
    pub fn string(value: impl Into<String>) -> Self {
        MessageAttributeValue {
            data_type: "String".to_string(),
            value: AttributeValue::String(value.into()),
        }
    }

    /// Creates a `Number` attribute from anything with a textual form.
    ///
    /// # Arguments
    ///
    /// * `value` - The number, e.g. `42` or `"3.14"`
    pub fn number(value: impl ToString) -> Self {
        MessageAttributeValue {
            data_type: "Number".to_string(),
            value: AttributeValue::Number(value.to_string()),
        }
    }

    /// Creates a `Binary` attribute.
    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        MessageAttributeValue {
            data_type: "Binary".to_string(),
            value: AttributeValue::Binary(value.into()),
        }
    }

    /// Textual value for `String` and `Number` attributes.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            AttributeValue::String(s) | AttributeValue::Number(s) => Some(s),
            AttributeValue::Binary(_) => None,
        }
    }
}

/// A message received from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identifier assigned by the queueing service, when it reports one.
    pub message_id: Option<String>,
    pub body: String,
    /// System attributes that were requested on receive.
    pub attributes: SystemAttributes,
    /// User attributes that were requested on receive.
    pub message_attributes: MessageAttributes,
    /// Token required to delete this particular delivery.
    pub receipt_handle: String,
}

/// Parameters of a single receive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveOptions {
    /// Long-poll wait; `0` returns immediately.
    pub wait_time_seconds: i32,
    /// Batch size upper bound.
    pub max_number_of_messages: i32,
    /// System attribute names to include on each message.
    pub attribute_names: Vec<String>,
    /// User attribute names to include on each message.
    pub message_attribute_names: Vec<String>,
}

/// The queueing service the listener consumes from.
///
/// Any service offering at-least-once delivery, named-queue lookup and a
/// per-delivery delete token can implement this.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Looks up a queue by name.
    async fn resolve_queue(&self, name: &str) -> Result<QueueHandle, BackendError>;

    /// Receives up to `options.max_number_of_messages` messages, waiting at
    /// most `options.wait_time_seconds` for them to arrive.
    async fn receive(
        &self,
        queue: &QueueHandle,
        options: &ReceiveOptions,
    ) -> Result<Vec<Message>, BackendError>;

    /// Removes a delivered message from the queue.
    async fn delete(&self, queue: &QueueHandle, receipt_handle: &str) -> Result<(), BackendError>;
}

/// [`QueueBackend`] backed by AWS SQS.
#[derive(Debug, Clone)]
pub struct SqsBackend {
    sqs_client: aws_sdk_sqs::Client,
}

impl SqsBackend {
    /// Wraps an SQS client.
    ///
    /// # Arguments
    ///
    /// * `sqs_client` - Client built with [`crate::client`] or by the caller
    pub fn new(sqs_client: aws_sdk_sqs::Client) -> Self {
        SqsBackend { sqs_client }
    }
}

#[async_trait]
impl QueueBackend for SqsBackend {
    async fn resolve_queue(&self, name: &str) -> Result<QueueHandle, BackendError> {
        let output = self
            .sqs_client
            .get_queue_url()
            .queue_name(name)
            .send()
            .await
            .map_err(|e| BackendError::QueueNotFound(format!("{name}: {}", DisplayErrorContext(&e))))?;

        let url = output
            .queue_url()
            .ok_or_else(|| BackendError::QueueNotFound(format!("{name}: no queue url returned")))?;

        Ok(QueueHandle {
            name: name.to_string(),
            url: url.to_string(),
        })
    }

    async fn receive(
        &self,
        queue: &QueueHandle,
        options: &ReceiveOptions,
    ) -> Result<Vec<Message>, BackendError> {
        let mut request = self
            .sqs_client
            .receive_message()
            .queue_url(&queue.url)
            .wait_time_seconds(options.wait_time_seconds)
            .max_number_of_messages(options.max_number_of_messages);

        if !options.attribute_names.is_empty() {
            let names = options
                .attribute_names
                .iter()
                .map(|name| MessageSystemAttributeName::from(name.as_str()))
                .collect();
            request = request.set_message_system_attribute_names(Some(names));
        }
        if !options.message_attribute_names.is_empty() {
            request = request.set_message_attribute_names(Some(options.message_attribute_names.clone()));
        }

        let output = request
            .send()
            .await
            .map_err(|e| BackendError::ReceiveFailure(DisplayErrorContext(&e).to_string()))?;

        Ok(output.messages().iter().filter_map(convert_message).collect())
    }

    async fn delete(&self, queue: &QueueHandle, receipt_handle: &str) -> Result<(), BackendError> {
        self.sqs_client
            .delete_message()
            .queue_url(&queue.url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| BackendError::DeleteFailure(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

/// Converts an SDK message, dropping deliveries that cannot be acknowledged.
fn convert_message(message: &aws_sdk_sqs::types::Message) -> Option<Message> {
    let Some(receipt_handle) = message.receipt_handle() else {
        tracing::warn!(
            message_id = message.message_id(),
            "received a message without a receipt handle, skipping"
        );
        return None;
    };

    let attributes = message
        .attributes()
        .map(|attrs| {
            attrs
                .iter()
                .map(|(name, value)| (name.as_str().to_string(), value.clone()))
                .collect()
        })
        .unwrap_or_default();

    let message_attributes = message
        .message_attributes()
        .map(|attrs| {
            attrs
                .iter()
                .filter_map(|(name, value)| convert_attribute(name, value).map(|v| (name.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    Some(Message {
        message_id: message.message_id().map(str::to_string),
        body: message.body().unwrap_or_default().to_string(),
        attributes,
        message_attributes,
        receipt_handle: receipt_handle.to_string(),
    })
}

fn convert_attribute(
    name: &str,
    value: &aws_sdk_sqs::types::MessageAttributeValue,
) -> Option<MessageAttributeValue> {
    let data_type = value.data_type();
    let converted = if data_type.starts_with("Binary") {
        value
            .binary_value()
            .map(|blob| AttributeValue::Binary(blob.as_ref().to_vec()))
    } else if data_type.starts_with("Number") {
        value.string_value().map(|s| AttributeValue::Number(s.to_string()))
    } else {
        value.string_value().map(|s| AttributeValue::String(s.to_string()))
    };

    if converted.is_none() {
        tracing::warn!(attribute = name, data_type, "message attribute has no value, dropping");
    }

    converted.map(|value| MessageAttributeValue {
        data_type: data_type.to_string(),
        value,
    })
}
