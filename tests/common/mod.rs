#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rs_sqs_listener::backend::{Message, MessageAttributes, QueueBackend, QueueHandle, ReceiveOptions};
use rs_sqs_listener::errors::BackendError;
use rs_sqs_listener::scheduler::{Scheduler, TickCallback, TickResult};

pub fn message(id: &str, body: &str) -> Message {
    Message {
        message_id: Some(id.to_string()),
        body: body.to_string(),
        attributes: HashMap::new(),
        message_attributes: MessageAttributes::new(),
        receipt_handle: format!("rh-{id}"),
    }
}

/// In-memory queue that records every call made against it.
///
/// Received messages are removed from `pending` and moved to `in_flight`
/// until deleted, mimicking the visibility timeout.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<BackendState>,
}

#[derive(Default)]
struct BackendState {
    queue_name: Mutex<Option<String>>,
    pending: Mutex<VecDeque<Message>>,
    in_flight: Mutex<Vec<Message>>,
    deleted: Mutex<Vec<String>>,
    receive_options: Mutex<Vec<ReceiveOptions>>,
    resolve_calls: AtomicUsize,
    receive_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_receive: Mutex<bool>,
    fail_delete_for: Mutex<Vec<String>>,
}

impl InMemoryBackend {
    pub fn new(queue_name: &str) -> Self {
        let backend = InMemoryBackend::default();
        *backend.inner.queue_name.lock().unwrap() = Some(queue_name.to_string());
        backend
    }

    /// A backend on which no queue exists.
    pub fn without_queue() -> Self {
        InMemoryBackend::default()
    }

    pub fn push(&self, message: Message) {
        self.inner.pending.lock().unwrap().push_back(message);
    }

    pub fn fail_receive(&self, fail: bool) {
        *self.inner.fail_receive.lock().unwrap() = fail;
    }

    pub fn fail_delete_for(&self, receipt_handle: &str) {
        self.inner
            .fail_delete_for
            .lock()
            .unwrap()
            .push(receipt_handle.to_string());
    }

    pub fn pending_len(&self) -> usize {
        self.inner.pending.lock().unwrap().len()
    }

    /// Messages received but never deleted.
    pub fn in_flight_ids(&self) -> Vec<String> {
        self.inner
            .in_flight
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| m.message_id.clone())
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.inner.deleted.lock().unwrap().clone()
    }

    pub fn receive_options(&self) -> Vec<ReceiveOptions> {
        self.inner.receive_options.lock().unwrap().clone()
    }

    pub fn resolve_calls(&self) -> usize {
        self.inner.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn receive_calls(&self) -> usize {
        self.inner.receive_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.inner.delete_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.resolve_calls() + self.receive_calls() + self.delete_calls()
    }
}

#[async_trait]
impl QueueBackend for InMemoryBackend {
    async fn resolve_queue(&self, name: &str) -> Result<QueueHandle, BackendError> {
        self.inner.resolve_calls.fetch_add(1, Ordering::SeqCst);
        match self.inner.queue_name.lock().unwrap().as_deref() {
            Some(existing) if existing == name => Ok(QueueHandle {
                name: name.to_string(),
                url: format!("memory://{name}"),
            }),
            _ => Err(BackendError::QueueNotFound(name.to_string())),
        }
    }

    async fn receive(
        &self,
        _queue: &QueueHandle,
        options: &ReceiveOptions,
    ) -> Result<Vec<Message>, BackendError> {
        self.inner.receive_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.receive_options.lock().unwrap().push(options.clone());

        if *self.inner.fail_receive.lock().unwrap() {
            return Err(BackendError::ReceiveFailure("connection reset".to_string()));
        }

        let mut pending = self.inner.pending.lock().unwrap();
        let count = (options.max_number_of_messages.max(0) as usize).min(pending.len());
        let batch: Vec<Message> = pending.drain(..count).collect();
        self.inner.in_flight.lock().unwrap().extend(batch.iter().cloned());
        Ok(batch)
    }

    async fn delete(&self, _queue: &QueueHandle, receipt_handle: &str) -> Result<(), BackendError> {
        self.inner.delete_calls.fetch_add(1, Ordering::SeqCst);

        if self
            .inner
            .fail_delete_for
            .lock()
            .unwrap()
            .iter()
            .any(|h| h == receipt_handle)
        {
            return Err(BackendError::DeleteFailure(format!("{receipt_handle} is invalid")));
        }

        let mut in_flight = self.inner.in_flight.lock().unwrap();
        let Some(index) = in_flight.iter().position(|m| m.receipt_handle == receipt_handle) else {
            return Err(BackendError::DeleteFailure(format!("{receipt_handle} not in flight")));
        };
        let removed = in_flight.remove(index);
        self.inner
            .deleted
            .lock()
            .unwrap()
            .push(removed.message_id.unwrap_or_default());
        Ok(())
    }
}

/// Scheduler that records registrations instead of running them.
///
/// Tests drive registered callbacks by hand with [`RecordingScheduler::fire`].
#[derive(Clone, Default)]
pub struct RecordingScheduler {
    inner: Arc<Mutex<SchedulerState>>,
}

#[derive(Default)]
struct SchedulerState {
    next_id: u64,
    tasks: Vec<Registration>,
    scheduled_total: usize,
    cancelled_total: usize,
}

struct Registration {
    id: u64,
    name: String,
    interval: Duration,
    callback: TickCallback,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        RecordingScheduler::default()
    }

    pub fn active(&self) -> usize {
        self.inner.lock().unwrap().tasks.len()
    }

    pub fn scheduled_total(&self) -> usize {
        self.inner.lock().unwrap().scheduled_total
    }

    pub fn cancelled_total(&self) -> usize {
        self.inner.lock().unwrap().cancelled_total
    }

    pub fn registrations(&self) -> Vec<(String, Duration)> {
        self.inner
            .lock()
            .unwrap()
            .tasks
            .iter()
            .map(|t| (t.name.clone(), t.interval))
            .collect()
    }

    /// Runs the first active registration once, dropping it on `Halt`.
    pub async fn fire(&self) -> Option<TickResult> {
        let (id, future) = {
            let mut state = self.inner.lock().unwrap();
            let task = state.tasks.first_mut()?;
            (task.id, (task.callback)())
        };

        let result = future.await;
        if result == TickResult::Halt {
            self.inner.lock().unwrap().tasks.retain(|t| t.id != id);
        }
        Some(result)
    }
}

impl Scheduler for RecordingScheduler {
    type Handle = u64;

    fn schedule_periodic(&self, interval: Duration, name: &str, callback: TickCallback) -> u64 {
        let mut state = self.inner.lock().unwrap();
        state.next_id += 1;
        state.scheduled_total += 1;
        let id = state.next_id;
        state.tasks.push(Registration {
            id,
            name: name.to_string(),
            interval,
            callback,
        });
        id
    }

    fn cancel(&self, handle: u64) {
        let mut state = self.inner.lock().unwrap();
        state.cancelled_total += 1;
        state.tasks.retain(|t| t.id != handle);
    }
}
