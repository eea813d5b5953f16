//! Smart HTTP endpoints.
//!
//! - GET  /{repo}/info/refs?service=git-upload-pack|git-receive-pack
//! - POST /{repo}/git-upload-pack
//! - POST /{repo}/git-receive-pack
//!
//! No status line goes out until git has produced its first chunk or has
//! exited. A child that fails to spawn, or exits non-zero before writing
//! anything, therefore becomes a 500. Once streaming has started, failures
//! can only end the body early and are logged here.

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap},
    response::Response,
    routing::{get, post},
    Router,
};
use futures::{stream, StreamExt};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tower_http::decompression::RequestDecompressionLayer;

use crate::error::{AppError, Result};
use crate::git::smart_http::{service_header, GitProcess, Service};
use crate::AppState;

/// Buffer between the child's stdout and the response body.
const PIPE_CAPACITY: usize = 64 * 1024;

pub fn routes(state: AppState) -> Router {
    let body_limit = state.config.git.max_request_body;

    Router::new()
        .route("/{repo}/info/refs", get(info_refs))
        .route("/{repo}/git-upload-pack", post(upload_pack))
        .route("/{repo}/git-receive-pack", post(receive_pack))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestDecompressionLayer::new())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct InfoRefsQuery {
    service: Option<String>,
}

async fn info_refs(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<InfoRefsQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let service = Service::from_query(query.service.as_deref().unwrap_or_default())?;
    let handle = state.registry.find(&slug)?;

    let process = GitProcess::spawn(
        &state.config.git.binary,
        service,
        handle.path(),
        true,
        git_protocol(&headers),
    )?;

    stream_response(
        process,
        Some(service_header(service)),
        Bytes::new(),
        service.advertisement_content_type(),
    )
    .await
}

async fn upload_pack(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    stateless_rpc(&state, &slug, Service::UploadPack, &headers, body).await
}

async fn receive_pack(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    stateless_rpc(&state, &slug, Service::ReceivePack, &headers, body).await
}

async fn stateless_rpc(
    state: &AppState,
    slug: &str,
    service: Service,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let handle = state.registry.find(slug)?;

    let process = GitProcess::spawn(
        &state.config.git.binary,
        service,
        handle.path(),
        false,
        git_protocol(headers),
    )?;

    stream_response(process, None, body, service.result_content_type()).await
}

fn git_protocol(headers: &HeaderMap) -> Option<&str> {
    headers.get("git-protocol").and_then(|v| v.to_str().ok())
}

/// Run the exchange on its own task and stream `preamble` plus the child's
/// stdout as the response body.
///
/// Waits for the first chunk of output before answering. If the child
/// closes stdout without writing, its exit status decides between an empty
/// success and an error response. Dropping the request or the body cancels
/// the exchange.
async fn stream_response(
    process: GitProcess,
    preamble: Option<Vec<u8>>,
    input: Bytes,
    content_type: String,
) -> Result<Response> {
    let service = process.service();
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let (mut writer, reader) = tokio::io::duplex(PIPE_CAPACITY);

    let exchange = tokio::spawn(async move { process.pipe(input, &mut writer, cancel).await });

    let mut output = ReaderStream::new(reader);
    let first = match output.next().await {
        Some(chunk) => {
            let chunk = chunk?;
            tokio::spawn(log_outcome(service, exchange));
            chunk
        }
        None => {
            // Stdout reached EOF, so the task has finished.
            exchange
                .await
                .map_err(|e| AppError::Internal(format!("git {} task failed: {}", service.name(), e)))??;
            Bytes::new()
        }
    };

    let mut head = preamble.unwrap_or_default();
    head.extend_from_slice(&first);

    let body = stream::once(async move { Ok::<_, std::io::Error>(Bytes::from(head)) })
        .chain(output)
        .map(move |chunk| {
            let _guard = &guard;
            chunk
        });

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(body))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Failures once the status line is out can only be logged.
async fn log_outcome(service: Service, exchange: JoinHandle<Result<u64>>) {
    match exchange.await {
        Ok(Ok(_)) => {}
        Ok(Err(AppError::Cancelled(_))) => {
            tracing::warn!("git {} aborted: client disconnected", service.name());
        }
        Ok(Err(AppError::Io(e))) => {
            tracing::warn!("git {} stream interrupted: {}", service.name(), e);
        }
        Ok(Err(e)) => {
            tracing::error!("git {} failed mid-stream: {}", service.name(), e);
        }
        Err(e) => {
            tracing::error!("git {} task failed: {}", service.name(), e);
        }
    }
}
