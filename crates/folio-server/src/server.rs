// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion HTTP server.
//
// # Routes
//
//   GET  /        upload form
//   POST /        multipart submission -> PDF attachment
//   GET  /health  liveness probe
//
// The conversion itself is CPU-bound and synchronous, so each POST hands it
// to `spawn_blocking`. Requests share nothing but the immutable config.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

use folio_core::config::ServerConfig;
use folio_core::error::{FolioError, Result};
use folio_core::human_errors::humanize_error;
use folio_core::types::{OutputArtifact, RequestId, ServerStatus};
use folio_document::convert_batch;

use crate::form::{self, ConversionForm};
use crate::page;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the application router for `config`.
pub fn router(config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(upload_form).post(convert))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
}

async fn upload_form() -> Html<String> {
    Html(page::upload_form())
}

async fn health() -> &'static str {
    "ok"
}

/// `POST /`: read the form, run the pipeline, return the PDF.
async fn convert(multipart: Multipart) -> Response {
    let request_id = RequestId::new();
    let span = info_span!("convert", %request_id);
    async move {
        let parts = match form::read_parts(multipart).await {
            Ok(parts) => parts,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                warn!(error = %e, "upload exceeds body limit");
                return (StatusCode::PAYLOAD_TOO_LARGE, e.body_text()).into_response();
            }
            Err(e) => return error_response(&FolioError::InvalidForm(e.body_text())),
        };
        let ConversionForm { uploads, request } = form::interpret(parts);
        info!(uploads = uploads.len(), "conversion requested");

        let span = Span::current();
        let outcome =
            tokio::task::spawn_blocking(move || span.in_scope(|| convert_batch(&uploads, &request)))
                .await
                .map_err(|e| FolioError::Server(format!("conversion task failed: {e}")))
                .and_then(|result| result);

        match outcome {
            Ok(artifact) => pdf_response(artifact),
            Err(err) => error_response(&err),
        }
    }
    .instrument(span)
    .await
}

fn pdf_response(artifact: OutputArtifact) -> Response {
    let disposition = artifact.content_disposition();
    (
        [(header::CONTENT_TYPE, OutputArtifact::MIME_TYPE)],
        [(header::CONTENT_DISPOSITION, disposition)],
        artifact.bytes,
    )
        .into_response()
}

fn error_response(err: &FolioError) -> Response {
    let human = humanize_error(err);
    if err.is_client_error() {
        warn!(error = %err, "conversion rejected");
    } else {
        error!(error = %err, "conversion failed");
    }
    let status = StatusCode::from_u16(human.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        human.body(),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// ConvertServer
// ---------------------------------------------------------------------------

/// Owns the listener task and its lifecycle.
///
/// Created `Stopped`; [`ConvertServer::start`] binds and spawns the serve
/// loop, [`ConvertServer::stop`] signals a graceful shutdown and waits for it.
pub struct ConvertServer {
    config: Arc<ServerConfig>,
    /// Current lifecycle state of the server.
    status: ServerStatus,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the Tokio task running `axum::serve`.
    task_handle: Option<JoinHandle<()>>,
    /// Address actually bound, known once started.
    local_addr: Option<SocketAddr>,
}

impl ConvertServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            status: ServerStatus::Stopped,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
            local_addr: None,
        }
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The bound address, resolving port 0 to the real port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Bind the listener and start serving.
    ///
    /// # Errors
    ///
    /// Returns `FolioError::Server` if the address cannot be bound.
    pub async fn start(&mut self) -> Result<()> {
        if self.status == ServerStatus::Running {
            debug!(addr = ?self.local_addr, "conversion server already running");
            return Ok(());
        }

        self.status = ServerStatus::Starting;

        let bind_addr = self.config.socket_addr();
        let listener = match TcpListener::bind(bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.status = ServerStatus::Error;
                return Err(FolioError::Server(format!("bind {bind_addr}: {e}")));
            }
        };
        let local_addr = listener
            .local_addr()
            .map_err(|e| FolioError::Server(format!("local address: {e}")))?;

        info!(addr = %local_addr, max_upload_bytes = self.config.max_upload_bytes, "conversion server listening");

        let app = router(&self.config);
        let shutdown = Arc::clone(&self.shutdown_signal);
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown.notified().await;
                    debug!("serve loop received shutdown signal");
                })
                .await;
            if let Err(e) = served {
                error!(error = %e, "serve loop exited with error");
            }
        });

        self.task_handle = Some(handle);
        self.local_addr = Some(local_addr);
        self.status = ServerStatus::Running;
        Ok(())
    }

    /// Gracefully stop the server. In-flight requests are allowed to finish.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }

        info!(addr = ?self.local_addr, "stopping conversion server");
        self.shutdown_signal.notify_one();

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| FolioError::Server(format!("task join: {e}")))?;
        }

        self.status = ServerStatus::Stopped;
        info!("conversion server stopped");
        Ok(())
    }
}
