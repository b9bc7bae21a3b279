//! HTTP server for fontl - the front desk of the font library (made by FontLab https://www.fontlab.com/)
//!
//! This module puts the catalog on the network: a browsable page, a JSON
//! listing, the font files themselves, ready-made `@font-face` CSS, and two
//! small forms for adding fonts and fixing up their details.
//!
//! The catalog does blocking filesystem work, so every call that may touch
//! the disk is handed to `spawn_blocking` rather than stalling the runtime.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Form, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info, warn};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task;
use tokio_util::io::ReaderStream;

use fontl_core::catalog::{validate_filename, Catalog};
use fontl_core::content::{content_type, generate_css};
use fontl_core::error::{CatalogError, ErrorKind};
use fontl_core::metadata::{validate_display_name, FontMetadata};
use fontl_core::output::FontData;

use crate::page::render_index;

/// Largest upload we accept, form fields included.
pub const MAX_UPLOAD_BYTES: usize = 32 << 20;

/// How long in-flight transfers may keep going after a shutdown signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

type Shared = Arc<Catalog>;
type HandlerError = (StatusCode, String);

/// Opens the doors and keeps serving until Ctrl-C or SIGTERM.
///
/// On shutdown the listener stops accepting, running requests get
/// [`SHUTDOWN_GRACE`] to finish, and anything still going after that is cut.
pub async fn serve(bind: &str, catalog: Shared) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding HTTP server to {bind}"))?;

    let stop = Arc::new(Notify::new());
    let stop_rx = stop.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router(catalog))
            .with_graceful_shutdown(async move { stop_rx.notified().await })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            return joined.context("server task panicked")?.context("serving HTTP");
        }
        _ = shutdown_signal() => {}
    }

    info!("received shutdown signal, gracefully shutting down");
    stop.notify_one();

    match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
        Ok(joined) => joined.context("server task panicked")?.context("serving HTTP")?,
        Err(_) => {
            warn!("in-flight requests still running after {SHUTDOWN_GRACE:?}, closing them");
            server.abort();
        }
    }
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Routing table for the catalog.
pub fn router(catalog: Shared) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/api/fonts", get(api_fonts_handler))
        .route("/fonts/{*name}", get(font_handler))
        .route("/css/{*name}", get(css_handler))
        .route("/upload", post(upload_handler))
        .route("/edit", post(edit_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(catalog)
}

async fn index_handler(State(catalog): State<Shared>) -> Html<String> {
    Html(render_index(&catalog.listing()))
}

async fn api_fonts_handler(State(catalog): State<Shared>) -> Json<Vec<FontData>> {
    Json(catalog.listing())
}

/// Stream font bytes; the file handle travels with the body and is closed
/// when the transfer finishes, fails, or the client goes away.
async fn font_handler(
    State(catalog): State<Shared>,
    Path(name): Path<String>,
) -> Result<Response, HandlerError> {
    let lookup = name.clone();
    let file = run_blocking(move || catalog.open_font(&lookup)).await?;

    let stream = ReaderStream::new(tokio::fs::File::from_std(file));
    Ok((
        [(header::CONTENT_TYPE, content_type(&name))],
        Body::from_stream(stream),
    )
        .into_response())
}

async fn css_handler(
    State(catalog): State<Shared>,
    Path(name): Path<String>,
) -> Result<Response, HandlerError> {
    let metadata = catalog
        .get(&name)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Font not found".to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        generate_css(&name, &metadata),
    )
        .into_response())
}

/// Fields of the upload and edit forms. `filename` is only read by edit;
/// uploads take the name from the file part.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataForm {
    pub filename: String,
    pub font_name: String,
    pub source: String,
    pub commercial_use: String,
    pub projects: String,
    pub tags: String,
}

impl MetadataForm {
    fn set(&mut self, field: &str, value: String) {
        match field {
            "fontName" => self.font_name = value,
            "source" => self.source = value,
            "commercialUse" => self.commercial_use = value,
            "projects" => self.projects = value,
            "tags" => self.tags = value,
            _ => {}
        }
    }

    /// Validate and convert into the record stored in the sidecar.
    pub fn into_metadata(self) -> Result<FontMetadata, CatalogError> {
        let name = self.font_name.trim().to_string();
        validate_display_name(&name)?;
        Ok(FontMetadata::default()
            .with_name(name)
            .with_source(self.source.trim())
            .with_commercial_use(parse_flag(&self.commercial_use))
            .with_projects(split_csv(&self.projects))
            .with_tags(split_csv(&self.tags)))
    }
}

async fn upload_handler(
    State(catalog): State<Shared>,
    mut multipart: Multipart,
) -> Result<Redirect, HandlerError> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut form = MetadataForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("Failed to parse form"))?
    {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };
        if field_name == "fontFile" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| bad_request("Failed to parse form"))?;
            upload = Some((filename, bytes));
        } else {
            let value = field
                .text()
                .await
                .map_err(|_| bad_request("Failed to parse form"))?;
            form.set(&field_name, value);
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| bad_request("Failed to get file from form"))?;
    validate_filename(&filename).map_err(to_response)?;
    let metadata = form.into_metadata().map_err(to_response)?;
    let font_path = catalog.upload_path(&filename).map_err(to_response)?;

    if catalog.contains(&filename) {
        return Err(conflict());
    }

    let saved = filename.clone();
    run_blocking(move || {
        save_new_file(&font_path, &bytes)?;
        if let Err(err) = catalog.add_font(&font_path, metadata) {
            if let Err(cleanup) = fs::remove_file(&font_path) {
                warn!("could not remove {} after failed add: {cleanup}", font_path.display());
            }
            return Err(err);
        }
        Ok(())
    })
    .await?;

    info!("uploaded font: {saved}");
    Ok(Redirect::to("/"))
}

/// Write `bytes` to a file that must not exist yet.
fn save_new_file(path: &FsPath, bytes: &[u8]) -> Result<(), CatalogError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|err| match err.kind() {
            io::ErrorKind::AlreadyExists => {
                CatalogError::Conflict("Font file already exists".to_string())
            }
            _ => CatalogError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        })?;

    let written = file.write_all(bytes).and_then(|_| file.sync_all());
    if let Err(source) = written {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(CatalogError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

async fn edit_handler(
    State(catalog): State<Shared>,
    Form(form): Form<MetadataForm>,
) -> Result<Redirect, HandlerError> {
    let filename = form.filename.trim().to_string();
    if filename.is_empty() {
        return Err(bad_request("Filename is required"));
    }
    let metadata = form.into_metadata().map_err(to_response)?;

    let updated = filename.clone();
    run_blocking(move || catalog.update_metadata(&updated, metadata)).await?;

    info!("updated font metadata: {filename}");
    Ok(Redirect::to("/"))
}

/// Run a blocking catalog call off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, HandlerError>
where
    F: FnOnce() -> Result<T, CatalogError> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("task join error: {e}");
            internal_error()
        })?
        .map_err(to_response)
}

/// Parse a checkbox/boolean form value.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "t" | "true" | "on" | "yes"
    )
}

/// Split a comma-separated field, trimming entries and dropping empty ones.
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Map a catalog error onto a status code and a body that never leaks paths.
fn to_response(err: CatalogError) -> HandlerError {
    match err.kind() {
        ErrorKind::Validation => {
            warn!("rejected request: {err}");
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "Font not found".to_string()),
        ErrorKind::Conflict => {
            warn!("conflict: {err}");
            conflict()
        }
        ErrorKind::Io => {
            error!("{err}");
            internal_error()
        }
    }
}

fn bad_request(msg: &str) -> HandlerError {
    (StatusCode::BAD_REQUEST, msg.to_string())
}

fn conflict() -> HandlerError {
    (StatusCode::CONFLICT, "Font file already exists".to_string())
}

fn internal_error() -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}
