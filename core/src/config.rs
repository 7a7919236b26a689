//! Client configuration.
//!
//! The client consumes no environment variables; whatever embeds it decides
//! the base URL, deadline and default headers and passes them in here.

use std::time::Duration;

use crate::client::CerteusClient;
use crate::error::ApiError;
use crate::transport::UreqTransport;

/// Settings for the default ureq transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Whole-request deadline. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub user_agent: String,
    /// Sent with every request, e.g. `authorization`.
    pub headers: Vec<(String, String)>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: format!("certeus-client/{}", env!("CARGO_PKG_VERSION")),
            headers: Vec::new(),
        }
    }
}

/// Builder for a `CerteusClient` over the default transport.
///
/// ```no_run
/// use std::time::Duration;
/// use certeus_client::CerteusClient;
///
/// let client = CerteusClient::builder("https://certeus.example")
///     .timeout(Duration::from_secs(10))
///     .header("authorization", "Bearer secret")
///     .build()?;
/// let summary = client.queue_summary()?;
/// println!("{} jobs queued", summary.depth);
/// # Ok::<(), certeus_client::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: String,
    config: TransportConfig,
}

impl ClientBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            config: TransportConfig::default(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.config.user_agent = user_agent.to_string();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.config
            .headers
            .push((name.to_string(), value.to_string()));
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn build(self) -> Result<CerteusClient<UreqTransport>, ApiError> {
        CerteusClient::with_transport(&self.base_url, UreqTransport::from_config(&self.config))
    }
}
