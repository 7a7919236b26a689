//! Synchronous API client for the CERTEUS service.
//!
//! # Overview
//! Covers the PFS listing and xattrs endpoints, proofgate publishing and the
//! P2P job queue with its transport echo diagnostic. Each call builds one
//! `HttpRequest`, sends it through a `Transport`, checks the status and
//! decodes the JSON reply into a typed result.
//!
//! # Design
//! - `CerteusClient` holds only the base URL and a transport; it takes no
//!   locks and calls never depend on each other.
//! - Request building and response parsing are pure (`build_*`,
//!   `parse_json`, `check_status`), so the I/O boundary is explicit and the
//!   transport can be swapped for a test double.
//! - `UreqTransport` is the default transport; timeouts and default headers
//!   are configured through `ClientBuilder`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{check_status, parse_json, CerteusClient, DEFAULT_ECHO_MESSAGE};
pub use config::{ClientBuilder, TransportConfig};
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Device, EchoResult, EnqueueRequest, EnqueueResult, JobStatusResult, JsonObject, ListOptions,
    ListingEntry, ListingResult, PublishRequest, PublishResult, QueueSummaryResult, XattrsResult,
};
