//! Request and response DTOs for the CERTEUS API.
//!
//! # Design
//! These types mirror the service's JSON schema but are defined independently
//! of the mock-server crate; integration tests catch schema drift. Free-form
//! objects (proof objects, job payloads, xattrs, policies) stay as
//! `serde_json::Map` so unknown keys survive a round-trip untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arbitrary JSON object.
pub type JsonObject = Map<String, Value>;

/// One artifact in a PFS listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingEntry {
    pub uri: String,
    pub size: u64,
}

/// Response of `GET /v1/pfs/list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingResult {
    pub prefix: String,
    pub entries: Vec<ListingEntry>,
}

/// Optional filters for a PFS listing.
///
/// `limit: Some(0)` and an empty `mime` are treated as not supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub recursive: bool,
    pub limit: Option<u32>,
    pub mime: Option<String>,
}

impl ListOptions {
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// Response of `GET /v1/pfs/xattrs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XattrsResult {
    pub uri: String,
    pub xattrs: JsonObject,
}

/// Request payload for `POST /v1/proofgate/publish`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PublishRequest {
    pub pco: JsonObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<JsonObject>,
}

/// Response of `POST /v1/proofgate/publish`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishResult {
    pub status: String,
    #[serde(default)]
    pub pco: JsonObject,
    #[serde(default)]
    pub ledger_ref: Option<String>,
}

/// Devices known to the P2P queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Hde,
    Qoracle,
    Entangler,
    Chronosync,
}

impl Device {
    pub const ALL: [Device; 4] = [
        Device::Hde,
        Device::Qoracle,
        Device::Entangler,
        Device::Chronosync,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Device::Hde => "hde",
            Device::Qoracle => "qoracle",
            Device::Entangler => "entangler",
            Device::Chronosync => "chronosync",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload for `POST /v1/p2p/enqueue`.
///
/// `device` is a plain string so devices added to the service later can be
/// addressed without a client release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnqueueRequest {
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonObject>,
}

impl EnqueueRequest {
    pub fn for_device(device: Device) -> Self {
        Self {
            device: device.as_str().to_string(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: JsonObject) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Response of `POST /v1/p2p/enqueue`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnqueueResult {
    pub job_id: String,
    pub status: String,
    pub eta_hint: String,
}

/// Response of `GET /v1/p2p/jobs/{job_id}` and `POST /v1/p2p/dequeue_once`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStatusResult {
    pub job_id: String,
    pub status: String,
    pub device: String,
    #[serde(default)]
    pub payload: JsonObject,
}

/// Response of `GET /v1/p2p/queue`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueSummaryResult {
    pub depth: u64,
    pub by_device: BTreeMap<String, u64>,
}

/// Response of `GET /v1/p2p/transport/echo`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EchoResult {
    pub a: String,
    pub b: String,
    pub ok: bool,
    pub len: u64,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn publish_request_omits_unset_optionals() {
        let mut pco = JsonObject::new();
        pco.insert("case_id".to_string(), json!("C-1"));
        let req = PublishRequest {
            pco,
            budget_tokens: None,
            policy: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"pco": {"case_id": "C-1"}}));
    }

    #[test]
    fn publish_request_keeps_zero_budget() {
        let req = PublishRequest {
            budget_tokens: Some(0),
            ..PublishRequest::default()
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["budget_tokens"], 0);
        assert!(value.get("policy").is_none());
    }

    #[test]
    fn publish_result_tolerates_missing_pco_and_null_ledger_ref() {
        let result: PublishResult =
            serde_json::from_str(r#"{"status":"ABSTAIN","ledger_ref":null}"#).unwrap();
        assert_eq!(result.status, "ABSTAIN");
        assert!(result.pco.is_empty());
        assert!(result.ledger_ref.is_none());
    }

    #[test]
    fn job_status_uses_snake_case_wire_names() {
        let job: JobStatusResult = serde_json::from_str(
            r#"{"job_id":"j1","status":"queued","device":"d1","payload":{}}"#,
        )
        .unwrap();
        assert_eq!(job.job_id, "j1");
        assert_eq!(job.status, "queued");
        assert_eq!(job.device, "d1");
        assert!(job.payload.is_empty());
    }

    #[test]
    fn job_status_rejects_missing_job_id() {
        let result: Result<JobStatusResult, _> =
            serde_json::from_str(r#"{"status":"queued","device":"hde"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn enqueue_request_for_known_device() {
        let req = EnqueueRequest::for_device(Device::Qoracle);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"device": "qoracle"}));
    }

    #[test]
    fn xattrs_preserve_nested_values() {
        let raw = r#"{"uri":"pfs://a","xattrs":{"sha256":"ab","tags":[1,null,true],"meta":{"k":1.5}}}"#;
        let result: XattrsResult = serde_json::from_str(raw).unwrap();
        let back = serde_json::to_value(&result).unwrap();
        let expected: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(back, expected);
    }

    #[test]
    fn object_fields_keep_wire_key_order() {
        let raw = r#"{"status":"PUBLISH","pco":{"zeta":1,"alpha":{"y":true,"b":null},"mid":[3,2]},"ledger_ref":"ledger:1"}"#;
        let result: PublishResult = serde_json::from_str(raw).unwrap();
        let keys: Vec<_> = result.pco.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(serde_json::to_string(&result).unwrap(), raw);
    }

    #[test]
    fn device_names_are_distinct() {
        let names: Vec<_> = Device::ALL.iter().map(|d| d.as_str()).collect();
        assert_eq!(names, vec!["hde", "qoracle", "entangler", "chronosync"]);
        assert_eq!(Device::Entangler.to_string(), "entangler");
    }

    #[test]
    fn queue_summary_orders_devices() {
        let summary: QueueSummaryResult =
            serde_json::from_str(r#"{"depth":3,"by_device":{"qoracle":1,"hde":2}}"#).unwrap();
        let devices: Vec<_> = summary.by_device.keys().cloned().collect();
        assert_eq!(devices, vec!["hde", "qoracle"]);
    }

    #[test]
    fn list_options_builder() {
        let opts = ListOptions::default().recursive().limit(5).mime("text/plain");
        assert!(opts.recursive);
        assert_eq!(opts.limit, Some(5));
        assert_eq!(opts.mime.as_deref(), Some("text/plain"));
    }
}
