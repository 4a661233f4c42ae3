use aws_config::{BehaviorVersion, Region};

use crate::listener::config::ListenerConfig;

/// Creates an AWS SQS client using credentials and configuration from the environment.
///
/// This function loads AWS configuration from environment variables such as:
/// - `AWS_ACCESS_KEY_ID`
/// - `AWS_SECRET_ACCESS_KEY`
/// - `AWS_REGION`
/// - `AWS_PROFILE`
///
/// # Example
///
/// ```rust,no_run
/// use rs_sqs_listener::client::create_sqs_client_from_env;
///
/// #[tokio::main]
/// async fn main() {
///     let client = create_sqs_client_from_env().await;
///     // Use the client...
/// }
/// ```
pub async fn create_sqs_client_from_env() -> aws_sdk_sqs::Client {
    let config = aws_config::load_from_env().await;
    aws_sdk_sqs::Client::new(&config)
}

/// Creates an AWS SQS client honouring the connection settings of a
/// [`ListenerConfig`].
///
/// Credentials still come from the environment chain. The configured region,
/// when present, takes precedence over `AWS_REGION`; the endpoint override and
/// TLS toggle are applied on top.
///
/// # Example
///
/// ```rust,no_run
/// use rs_sqs_listener::{client::create_sqs_client_for, listener::config::ListenerConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let config = ListenerConfig::new("jobs")
///         .with_region("us-east-1")
///         .with_endpoint_url("http://localhost:9324")
///         .with_tls(false);
///     let client = create_sqs_client_for(&config).await;
///     // Use the client...
/// }
/// ```
pub async fn create_sqs_client_for(config: &ListenerConfig) -> aws_sdk_sqs::Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    let sdk_config = loader.load().await;

    let region = sdk_config.region().map(|r| r.as_ref().to_string());
    let endpoint = resolve_endpoint(config.endpoint_url.as_deref(), region.as_deref(), config.use_tls);

    let mut builder = aws_sdk_sqs::config::Builder::from(&sdk_config);
    if let Some(endpoint) = endpoint {
        tracing::debug!(%endpoint, "using SQS endpoint override");
        builder = builder.endpoint_url(endpoint);
    }

    aws_sdk_sqs::Client::from_conf(builder.build())
}

/// Works out which endpoint, if any, should replace the SDK default.
///
/// With TLS enabled only an explicit override is used. With TLS disabled the
/// override (or the regional default) is forced onto plain `http://`.
fn resolve_endpoint(endpoint_url: Option<&str>, region: Option<&str>, use_tls: bool) -> Option<String> {
    if use_tls {
        return endpoint_url.map(str::to_string);
    }

    match endpoint_url {
        Some(url) => {
            let host = url
                .strip_prefix("https://")
                .or_else(|| url.strip_prefix("http://"))
                .unwrap_or(url);
            Some(format!("http://{host}"))
        }
        None => match region {
            Some(region) => Some(format!("http://sqs.{region}.amazonaws.com")),
            None => {
                tracing::warn!("TLS disabled but no region or endpoint is known, keeping SDK default endpoint");
                None
            }
        },
    }
}
