use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

/// Environment variable overriding the default poll interval, in seconds.
pub const ENV_DEFAULT_POLL: &str = "SQS_DEFAULT_POLL";
/// Environment variable overriding the default long-poll wait time, in seconds.
pub const ENV_DEFAULT_WAIT_TIME: &str = "SQS_DEFAULT_WAIT_TIME";
/// Environment variable overriding the default batch size.
pub const ENV_DEFAULT_MAX_MSG: &str = "SQS_DEFAULT_MAX_MSG";
/// Environment variable providing an endpoint override (e.g. a local SQS emulator).
pub const ENV_ENDPOINT_URL: &str = "SQS_ENDPOINT_URL";
/// Environment variable toggling TLS (`true`/`false`, `1`/`0`).
pub const ENV_USE_TLS: &str = "SQS_USE_TLS";

/// SQS rejects batches larger than this.
pub const MAX_BATCH_SIZE: i32 = 10;
/// SQS rejects long-poll waits longer than this.
pub const MAX_WAIT_TIME_SECONDS: i32 = 20;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_WAIT_TIME_SECONDS: i32 = 0;
const DEFAULT_MAX_NUMBER_OF_MESSAGES: i32 = 1;
const DEFAULT_LISTENER_NAME: &str = "SqsListener";

/// Configuration for a [`QueuePoller`](crate::listener::QueuePoller).
///
/// Built once and handed to the poller, which never mutates it.
///
/// # Examples
///
/// ```rust
/// use rs_sqs_listener::listener::config::ListenerConfig;
/// use std::time::Duration;
///
/// let config = ListenerConfig::new("orders")
///     .with_poll_interval(Duration::from_secs(5))
///     .with_wait_time_seconds(10)
///     .with_max_number_of_messages(10);
///
/// assert_eq!(config.queue_name, "orders");
/// assert_eq!(config.task_name(), "SqsListener-sqs-listener");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Name of the queue to resolve during setup.
    pub queue_name: String,

    /// Name used for the scheduled task and in log output.
    pub listener_name: String,

    /// How often the scheduler ticks the poller.
    pub poll_interval: Duration,

    /// Long-poll wait time passed to each receive call, in seconds.
    pub wait_time_seconds: i32,

    /// Upper bound on messages returned by one receive call.
    pub max_number_of_messages: i32,

    /// Endpoint override, typically for a local emulator.
    pub endpoint_url: Option<String>,

    /// AWS region; the AWS environment chain decides when unset.
    pub region: Option<String>,

    /// Whether requests go over TLS.
    pub use_tls: bool,

    /// System attribute names to request (e.g. `SentTimestamp`, `All`).
    pub attribute_names: Vec<String>,

    /// User message attribute names to request (e.g. `All`, `trace.*`).
    pub message_attribute_names: Vec<String>,
}

impl ListenerConfig {
    /// Creates a configuration with the built-in defaults: a 30 second poll
    /// interval, no long-poll wait, one message per poll and TLS enabled.
    ///
    /// # Arguments
    ///
    /// * `queue_name` - Name of the queue to resolve during setup
    pub fn new(queue_name: impl Into<String>) -> Self {
        ListenerConfig {
            queue_name: queue_name.into(),
            listener_name: DEFAULT_LISTENER_NAME.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            wait_time_seconds: DEFAULT_WAIT_TIME_SECONDS,
            max_number_of_messages: DEFAULT_MAX_NUMBER_OF_MESSAGES,
            endpoint_url: None,
            region: None,
            use_tls: true,
            attribute_names: Vec::new(),
            message_attribute_names: Vec::new(),
        }
    }

    /// Builds a configuration whose defaults may be overridden from the
    /// process environment.
    ///
    /// Reads [`ENV_DEFAULT_POLL`], [`ENV_DEFAULT_WAIT_TIME`],
    /// [`ENV_DEFAULT_MAX_MSG`], [`ENV_ENDPOINT_URL`] and [`ENV_USE_TLS`].
    /// Unset variables keep the built-in defaults; unparsable ones are an error.
    pub fn from_env(queue_name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(queue_name, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(queue_name: impl Into<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ListenerConfig::new(queue_name);

        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_DEFAULT_POLL)? {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(wait) = parse_var::<i32, _>(&lookup, ENV_DEFAULT_WAIT_TIME)? {
            config = config.with_wait_time_seconds(wait);
        }
        if let Some(max) = parse_var::<i32, _>(&lookup, ENV_DEFAULT_MAX_MSG)? {
            config = config.with_max_number_of_messages(max);
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_endpoint_url(endpoint.trim());
        }
        if let Some(raw) = lookup(ENV_USE_TLS) {
            config = config.with_tls(parse_bool(ENV_USE_TLS, &raw)?);
        }

        Ok(config)
    }

    /// Sets the name used for the scheduled task and in log output.
    pub fn with_listener_name(mut self, name: impl Into<String>) -> Self {
        self.listener_name = name.into();
        self
    }

    /// Sets how often the scheduler ticks the poller.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the long-poll wait, clamped to `0..=20` seconds.
    pub fn with_wait_time_seconds(mut self, seconds: i32) -> Self {
        let clamped = seconds.clamp(0, MAX_WAIT_TIME_SECONDS);
        if clamped != seconds {
            tracing::warn!(
                requested = seconds,
                applied = clamped,
                "wait time outside SQS limits, clamping"
            );
        }
        self.wait_time_seconds = clamped;
        self
    }

    /// Sets the batch size, clamped to `1..=10`.
    pub fn with_max_number_of_messages(mut self, max: i32) -> Self {
        let clamped = max.clamp(1, MAX_BATCH_SIZE);
        if clamped != max {
            tracing::warn!(
                requested = max,
                applied = clamped,
                "max number of messages outside SQS limits, clamping"
            );
        }
        self.max_number_of_messages = clamped;
        self
    }

    /// Sends requests to `endpoint` instead of the regional SQS endpoint.
    pub fn with_endpoint_url(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint.into());
        self
    }

    /// Pins the AWS region instead of taking it from the environment.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Enables or disables TLS; disabled means plain `http://` requests.
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Sets the system attribute names requested on every receive.
    ///
    /// # Arguments
    ///
    /// * `names` - Attribute names such as `SentTimestamp`, or `All`
    pub fn with_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the user message attribute names requested on every receive.
    ///
    /// # Arguments
    ///
    /// * `names` - Attribute names, `prefix.*` patterns, or `All`
    pub fn with_message_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.message_attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Name under which the periodic tick is registered with the scheduler.
    pub fn task_name(&self) -> String {
        format!("{}-sqs-listener", self.listener_name)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, &raw, e)),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected a boolean")),
    }
}
