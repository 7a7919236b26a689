//! Network execution of `HttpRequest` values.
//!
//! # Design
//! `Transport` is the only seam where I/O happens. It returns every response
//! the server produced, whatever its status, with the body fully read;
//! deciding what a status means is the client's job. Only failures that
//! leave no response behind are reported as `TransportError`.
//!
//! `UreqTransport` is the default: a blocking ureq agent with status-as-error
//! turned off and no cap on body size. The agent pools connections internally and is cheap to clone,
//! so one transport can serve many threads.

use std::sync::Arc;

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    default_headers: Vec<(String, String)>,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::from_config(&TransportConfig::default())
    }

    /// Build an agent honoring `config`. The user agent travels as a default
    /// header alongside any caller-supplied ones.
    pub fn from_config(config: &TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();

        let mut default_headers = Vec::with_capacity(config.headers.len() + 1);
        default_headers.push(("user-agent".to_string(), config.user_agent.clone()));
        default_headers.extend(config.headers.iter().cloned());

        Self {
            agent,
            default_headers,
        }
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let headers = self.default_headers.iter().chain(request.headers.iter());

        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // Read the whole body before anyone looks at the status. Once the
        // status line has arrived, neither the body size nor its encoding
        // may turn the reply into a transport error: undecodable bytes
        // become U+FFFD and are left to status mapping or JSON decoding.
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_transport_sends_user_agent() {
        let transport = UreqTransport::new();
        let (name, value) = &transport.default_headers()[0];
        assert_eq!(name, "user-agent");
        assert!(value.starts_with("certeus-client/"));
    }

    #[test]
    fn configured_headers_follow_user_agent() {
        let config = TransportConfig {
            timeout: Some(Duration::from_secs(5)),
            user_agent: "tests/1.0".to_string(),
            headers: vec![("authorization".to_string(), "Bearer t".to_string())],
        };
        let transport = UreqTransport::from_config(&config);
        assert_eq!(
            transport.default_headers(),
            &[
                ("user-agent".to_string(), "tests/1.0".to_string()),
                ("authorization".to_string(), "Bearer t".to_string()),
            ]
        );
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        // Port 9 on loopback (discard) is closed on test machines.
        let transport = UreqTransport::from_config(&TransportConfig {
            timeout: Some(Duration::from_secs(2)),
            ..TransportConfig::default()
        });
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:9/v1/p2p/queue".to_string(),
            headers: Vec::new(),
            body: None,
        };
        assert!(transport.send(&request).is_err());
    }
}
