use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const KNOWN_DEVICES: [&str; 4] = ["hde", "qoracle", "entangler", "chronosync"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingEntry {
    pub uri: String,
    pub size: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Listing {
    pub prefix: String,
    pub entries: Vec<ListingEntry>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub prefix: String,
    #[serde(default)]
    pub recursive: bool,
    pub limit: Option<usize>,
    pub mime: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Xattrs {
    pub uri: String,
    pub xattrs: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct XattrsParams {
    pub uri: String,
}

#[derive(Deserialize)]
pub struct PublishRequest {
    pub pco: Map<String, Value>,
    pub budget_tokens: Option<u64>,
    pub policy: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    pub status: String,
    pub pco: Map<String, Value>,
    pub ledger_ref: Option<String>,
}

#[derive(Deserialize)]
pub struct EchoParams {
    pub msg: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub a: String,
    pub b: String,
    pub ok: bool,
    pub len: usize,
    pub message: String,
}

#[derive(Deserialize)]
pub struct EnqueueRequest {
    pub device: String,
    pub payload: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Enqueued {
    pub job_id: String,
    pub status: String,
    pub eta_hint: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub job_id: String,
    pub status: String,
    pub device: String,
    pub payload: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueSummary {
    pub depth: usize,
    pub by_device: BTreeMap<String, usize>,
}

struct Artifact {
    size: u64,
    xattrs: Map<String, Value>,
}

#[derive(Default)]
struct Queue {
    jobs: HashMap<String, Job>,
    pending: VecDeque<String>,
}

pub struct AppState {
    artifacts: BTreeMap<String, Artifact>,
    queue: RwLock<Queue>,
}

pub type Db = Arc<AppState>;

/// JSON error body `{"error": "..."}` with a status code.
pub struct ErrorResponse(StatusCode, &'static str);

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(AppState {
        artifacts: seed_artifacts(),
        queue: RwLock::new(Queue::default()),
    });
    Router::new()
        .route("/v1/pfs/list", get(list_files))
        .route("/v1/pfs/xattrs", get(get_xattrs))
        .route("/v1/proofgate/publish", post(publish))
        .route("/v1/p2p/transport/echo", get(transport_echo))
        .route("/v1/p2p/enqueue", post(enqueue))
        .route("/v1/p2p/jobs/{job_id}", get(job_status))
        .route("/v1/p2p/queue", get(queue_summary))
        .route("/v1/p2p/dequeue_once", post(dequeue_once))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn seed_artifacts() -> BTreeMap<String, Artifact> {
    [
        ("pfs://cases/C-1/evidence.pdf", 2048),
        ("pfs://cases/C-1/notes.txt", 312),
        ("pfs://cases/C-1/exhibits/photo.png", 40960),
        ("pfs://cases/C-2/summary.txt", 128),
        ("pfs://ledger/index.json", 64),
    ]
    .into_iter()
    .map(|(uri, size)| {
        let mut xattrs = Map::new();
        xattrs.insert("mime".to_string(), json!(mime_for(uri)));
        xattrs.insert("size".to_string(), json!(size));
        xattrs.insert("sealed".to_string(), json!(uri.ends_with(".pdf")));
        (uri.to_string(), Artifact { size, xattrs })
    })
    .collect()
}

pub fn mime_for(uri: &str) -> &'static str {
    match uri.rsplit_once('.').map(|(_, ext)| ext) {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

async fn list_files(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<Listing> {
    let trimmed = params.prefix.trim_matches('/');
    let root = if trimmed.is_empty() {
        "pfs://".to_string()
    } else {
        format!("pfs://{trimmed}/")
    };
    let mime = params.mime.as_deref().filter(|m| !m.is_empty());
    let limit = params.limit.filter(|&l| l > 0).unwrap_or(usize::MAX);

    let entries = db
        .artifacts
        .iter()
        .filter(|(uri, _)| match uri.strip_prefix(&root) {
            Some(rest) => params.recursive || !rest.contains('/'),
            None => false,
        })
        .filter(|(uri, _)| mime.is_none_or(|m| mime_for(uri) == m))
        .take(limit)
        .map(|(uri, artifact)| ListingEntry {
            uri: uri.clone(),
            size: artifact.size,
        })
        .collect();

    Json(Listing {
        prefix: params.prefix,
        entries,
    })
}

async fn get_xattrs(
    State(db): State<Db>,
    Query(params): Query<XattrsParams>,
) -> Result<Json<Xattrs>, ErrorResponse> {
    let artifact = db
        .artifacts
        .get(&params.uri)
        .ok_or(ErrorResponse(StatusCode::NOT_FOUND, "not found"))?;
    Ok(Json(Xattrs {
        uri: params.uri,
        xattrs: artifact.xattrs.clone(),
    }))
}

async fn publish(Json(input): Json<PublishRequest>) -> Json<PublishResponse> {
    let accepted = !input.pco.is_empty() && input.budget_tokens.is_none_or(|b| b > 0);
    let response = if accepted {
        PublishResponse {
            status: "PUBLISH".to_string(),
            pco: input.pco,
            ledger_ref: Some(format!("ledger:{}", Uuid::new_v4())),
        }
    } else {
        PublishResponse {
            status: "ABSTAIN".to_string(),
            pco: input.pco,
            ledger_ref: None,
        }
    };
    info!(status = %response.status, "publish");
    Json(response)
}

async fn transport_echo(Query(params): Query<EchoParams>) -> Json<Echo> {
    let msg = params
        .msg
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "synapse".to_string());
    let a = msg.clone();
    let b = msg.clone();
    Json(Echo {
        ok: a == b,
        len: msg.len(),
        a,
        b,
        message: msg,
    })
}

async fn enqueue(
    State(db): State<Db>,
    Json(input): Json<EnqueueRequest>,
) -> Result<(StatusCode, Json<Enqueued>), ErrorResponse> {
    if !KNOWN_DEVICES.contains(&input.device.as_str()) {
        return Err(ErrorResponse(StatusCode::BAD_REQUEST, "unknown device"));
    }
    let job = Job {
        job_id: Uuid::new_v4().to_string(),
        status: "queued".to_string(),
        device: input.device,
        payload: input.payload.unwrap_or_default(),
    };
    let mut queue = db.queue.write().await;
    queue.pending.push_back(job.job_id.clone());
    let position = queue.pending.len();
    info!(job_id = %job.job_id, device = %job.device, position, "enqueued");
    let response = Enqueued {
        job_id: job.job_id.clone(),
        status: job.status.clone(),
        eta_hint: format!("position {position}"),
    };
    queue.jobs.insert(job.job_id.clone(), job);
    Ok((StatusCode::ACCEPTED, Json(response)))
}

async fn job_status(
    State(db): State<Db>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ErrorResponse> {
    let queue = db.queue.read().await;
    queue
        .jobs
        .get(&job_id)
        .cloned()
        .map(Json)
        .ok_or(ErrorResponse(StatusCode::NOT_FOUND, "not found"))
}

async fn queue_summary(State(db): State<Db>) -> Json<QueueSummary> {
    let queue = db.queue.read().await;
    let mut by_device = BTreeMap::new();
    for job_id in &queue.pending {
        if let Some(job) = queue.jobs.get(job_id) {
            *by_device.entry(job.device.clone()).or_insert(0) += 1;
        }
    }
    Json(QueueSummary {
        depth: queue.pending.len(),
        by_device,
    })
}

async fn dequeue_once(State(db): State<Db>) -> Result<Json<Job>, ErrorResponse> {
    let mut queue = db.queue.write().await;
    let job_id = queue
        .pending
        .pop_front()
        .ok_or(ErrorResponse(StatusCode::NOT_FOUND, "queue empty"))?;
    let job = queue
        .jobs
        .get_mut(&job_id)
        .ok_or(ErrorResponse(StatusCode::NOT_FOUND, "not found"))?;
    job.status = "done".to_string();
    info!(job_id = %job.job_id, "dequeued");
    Ok(Json(job.clone()))
}
