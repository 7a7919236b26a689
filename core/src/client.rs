//! Request builder, response parser and executor for the CERTEUS API.
//!
//! # Design
//! `CerteusClient` holds the parsed base URL and a transport, nothing else;
//! calls share no mutable state and may run concurrently. Every endpoint is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! method of the endpoint's name that runs it through the transport and
//! decodes the reply. Callers doing their own I/O can use `build_*` with
//! `parse_json` / `check_status` and skip the transport entirely.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::ClientBuilder;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    EchoResult, EnqueueRequest, EnqueueResult, JobStatusResult, ListOptions, ListingResult,
    PublishRequest, PublishResult, QueueSummaryResult, XattrsResult,
};

/// Message sent by `transport_echo` when the caller passes an empty one.
pub const DEFAULT_ECHO_MESSAGE: &str = "synapse";

/// Client for the CERTEUS PFS, proofgate and P2P endpoints.
#[derive(Debug, Clone)]
pub struct CerteusClient<T = UreqTransport> {
    base_url: Url,
    transport: T,
}

impl CerteusClient<UreqTransport> {
    /// Client over a default ureq transport.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_transport(base_url, UreqTransport::default())
    }

    pub fn builder(base_url: &str) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }
}

impl<T> CerteusClient<T> {
    /// Client over a caller-supplied transport.
    ///
    /// Fails if `base_url` does not parse or cannot carry path segments.
    /// A path prefix on the base URL (`http://host/api/`) is kept and the
    /// endpoint path is appended after it.
    pub fn with_transport(base_url: &str, transport: T) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_list_files(&self, prefix: &str, options: &ListOptions) -> HttpRequest {
        let mut url = self.endpoint(&["v1", "pfs", "list"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("prefix", prefix);
            if options.recursive {
                query.append_pair("recursive", "true");
            }
            if let Some(limit) = options.limit.filter(|&l| l > 0) {
                query.append_pair("limit", &limit.to_string());
            }
            if let Some(mime) = options.mime.as_deref().filter(|m| !m.is_empty()) {
                query.append_pair("mime", mime);
            }
        }
        get(url)
    }

    pub fn build_get_xattrs(&self, uri: &str) -> HttpRequest {
        let mut url = self.endpoint(&["v1", "pfs", "xattrs"]);
        url.query_pairs_mut().append_pair("uri", uri);
        get(url)
    }

    pub fn build_publish(&self, input: &PublishRequest) -> Result<HttpRequest, ApiError> {
        post_json(self.endpoint(&["v1", "proofgate", "publish"]), input)
    }

    /// An empty `msg` is replaced by [`DEFAULT_ECHO_MESSAGE`].
    pub fn build_transport_echo(&self, msg: &str) -> HttpRequest {
        let msg = if msg.is_empty() { DEFAULT_ECHO_MESSAGE } else { msg };
        let mut url = self.endpoint(&["v1", "p2p", "transport", "echo"]);
        url.query_pairs_mut().append_pair("msg", msg);
        get(url)
    }

    pub fn build_enqueue(&self, input: &EnqueueRequest) -> Result<HttpRequest, ApiError> {
        post_json(self.endpoint(&["v1", "p2p", "enqueue"]), input)
    }

    /// `job_id` is escaped as a single path segment. Ids that URL path
    /// normalization would collapse (`""`, `"."`, `".."`) are rejected.
    pub fn build_job_status(&self, job_id: &str) -> Result<HttpRequest, ApiError> {
        if matches!(job_id, "" | "." | "..") {
            return Err(ApiError::InvalidPathSegment(job_id.to_string()));
        }
        Ok(get(self.endpoint(&["v1", "p2p", "jobs", job_id])))
    }

    pub fn build_queue_summary(&self) -> HttpRequest {
        get(self.endpoint(&["v1", "p2p", "queue"]))
    }

    pub fn build_dequeue_once(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(&["v1", "p2p", "dequeue_once"]).into(),
            headers: Vec::new(),
            body: None,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // parse_base_url rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl<T: Transport> CerteusClient<T> {
    /// Send `request` and decode a 2xx body as `R`.
    pub fn execute<R: DeserializeOwned>(&self, request: &HttpRequest) -> Result<R, ApiError> {
        parse_json(self.send(request)?)
    }

    /// Send `request` and only check the status; the body is discarded.
    pub fn execute_unit(&self, request: &HttpRequest) -> Result<(), ApiError> {
        check_status(&self.send(request)?)
    }

    /// `GET /v1/pfs/list`
    pub fn list_files(&self, prefix: &str, options: &ListOptions) -> Result<ListingResult, ApiError> {
        self.execute(&self.build_list_files(prefix, options))
    }

    /// `GET /v1/pfs/xattrs`
    pub fn get_xattrs(&self, uri: &str) -> Result<XattrsResult, ApiError> {
        self.execute(&self.build_get_xattrs(uri))
    }

    /// `POST /v1/proofgate/publish`
    pub fn publish(&self, input: &PublishRequest) -> Result<PublishResult, ApiError> {
        self.execute(&self.build_publish(input)?)
    }

    /// `GET /v1/p2p/transport/echo`
    pub fn transport_echo(&self, msg: &str) -> Result<EchoResult, ApiError> {
        self.execute(&self.build_transport_echo(msg))
    }

    /// `POST /v1/p2p/enqueue`
    pub fn enqueue(&self, input: &EnqueueRequest) -> Result<EnqueueResult, ApiError> {
        self.execute(&self.build_enqueue(input)?)
    }

    /// `GET /v1/p2p/jobs/{job_id}`
    pub fn job_status(&self, job_id: &str) -> Result<JobStatusResult, ApiError> {
        self.execute(&self.build_job_status(job_id)?)
    }

    /// `GET /v1/p2p/queue`
    pub fn queue_summary(&self) -> Result<QueueSummaryResult, ApiError> {
        self.execute(&self.build_queue_summary())
    }

    /// `POST /v1/p2p/dequeue_once`
    pub fn dequeue_once(&self) -> Result<JobStatusResult, ApiError> {
        self.execute(&self.build_dequeue_once())
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(request).map_err(ApiError::Transport)?;
        debug!(status = response.status, url = %request.url, "received response");
        Ok(response)
    }
}

/// Map any status outside 200..300 to `ApiError::Http`, keeping the body.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Check the status, then decode the body as JSON.
pub fn parse_json<R: DeserializeOwned>(response: HttpResponse) -> Result<R, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(ApiError::Decode)
}

fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason,
    };
    let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot carry path segments".to_string()));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn get(url: Url) -> HttpRequest {
    HttpRequest {
        method: HttpMethod::Get,
        url: url.into(),
        headers: Vec::new(),
        body: None,
    }
}

fn post_json<B: Serialize>(url: Url, input: &B) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(input).map_err(ApiError::Encode)?;
    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: url.into(),
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body),
    })
}
