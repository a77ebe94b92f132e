use crate::analytics::{DashboardView, EXPORT_FILE_NAME, SolutionFilter, export_csv};
use crate::config::ServerConfig;
use crate::error::{ApiError, ConfigError};
use crate::login::{
    CredentialStore, CurrentUser, SessionStore, check_auth, handle_login, handle_logout,
    login_templates, require_auth, serve_login_page,
};
use crate::loader::load_records;
use crate::record::SolutionRecord;
use crate::storage::WorkbookStore;
use axum::{
    Extension, Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path as AxumPath, Query, Request, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use handlebars::Handlebars;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::services::ServeFile;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const MALFORMED_UPLOAD: &str = "Malformed upload";
const NOT_FOUND: &str = "File not found";

/// Extensions the static route will serve
const STATIC_EXTENSIONS: [&str; 14] = [
    "html", "css", "js", "json", "png", "jpg", "jpeg", "svg", "ico", "webp", "woff", "woff2",
    "txt", "xlsx",
];

lazy_static! {
    static ref PATH_SEGMENT: Regex =
        Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]*$").expect("static path pattern is valid");
}

/// Shared state for every route of the gateway
pub struct AppState {
    pub config: ServerConfig,
    pub credentials: CredentialStore,
    pub sessions: SessionStore,
    pub workbook: WorkbookStore,
    pub templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(config: ServerConfig, credentials: CredentialStore) -> Result<Self, ConfigError> {
        Ok(AppState {
            sessions: SessionStore::new(config.session_ttl()),
            workbook: WorkbookStore::new(config.workbook_path.clone(), config.keep_backup),
            templates: login_templates()?,
            credentials,
            config,
        })
    }
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    success: bool,
    message: &'static str,
}

/// Build the router: public auth routes plus the session-protected rest
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/", get(serve_dashboard))
        .route("/download-excel", get(download_excel))
        .route("/upload-excel", post(upload_excel))
        .route("/api/summary", get(dashboard_summary))
        .route("/api/export", get(export_solutions))
        .route("/*path", get(serve_static))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/login", get(serve_login_page).post(handle_login))
        .route("/logout", get(handle_logout))
        .route("/check-auth", get(check_auth))
        .merge(protected)
        .with_state(state)
}

/// Start the gateway and serve until the process is stopped
pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = CredentialStore::load_or_empty(&config.credentials_path)?;
    if credentials.is_empty() {
        log::warn!(
            "No users in {}; add one with the add_user binary",
            config.credentials_path.display()
        );
    } else {
        log::info!(
            "Loaded {} user(s) from {}",
            credentials.len(),
            config.credentials_path.display()
        );
    }

    let address = config.bind_address();
    let port = config.port;
    let state = Arc::new(AppState::new(config, credentials)?);
    let app = build_router(state);

    let listener = TcpListener::bind(&address).await?;
    log::info!("Listening on http://{}", address);
    match local_ip_address::local_ip() {
        Ok(ip) => log::info!("On your network: http://{}:{}", ip, port),
        Err(e) => log::debug!("Could not determine LAN address: {}", e),
    }

    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_dashboard(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let index = state.config.static_root.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(page) => Ok(Html(page)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::error!("Dashboard page missing at {}", index.display());
            Err(ApiError::NotFound("Dashboard page not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn download_excel(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let Some(bytes) = state.workbook.read().await? else {
        log::warn!("Download requested but {} is missing", state.workbook.path().display());
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    };

    let name = state.workbook.file_name();
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_file_name(&name),
        urlencoding::encode(&name)
    );
    log::info!("Serving {} ({} bytes) to {}", name, bytes.len(), username);

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

// Quoted-string fallback for clients that ignore filename*
fn ascii_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Read the solution list out of the canonical workbook
async fn current_records(state: &AppState) -> Result<Vec<SolutionRecord>, ApiError> {
    if tokio::fs::metadata(state.workbook.path()).await.is_err() {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    let path = state.workbook.path().to_path_buf();
    let loaded = tokio::task::spawn_blocking(move || load_records(&path))
        .await
        .map_err(|e| {
            log::error!("Workbook reader task failed: {}", e);
            ApiError::Internal("Internal server error".to_string())
        })?;

    loaded.map_err(|e| {
        log::warn!("Cannot read {}: {}", state.workbook.path().display(), e);
        ApiError::Unprocessable(format!("Cannot read the solution list: {}", e))
    })
}

async fn dashboard_summary(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SolutionFilter>,
) -> Result<Json<DashboardView>, ApiError> {
    let records = current_records(&state).await?;
    let view = DashboardView::build(&records, &filter);
    log::debug!(
        "Summary of {} of {} solutions",
        view.solutions.len(),
        view.total_records
    );
    Ok(Json(view))
}

async fn export_solutions(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Query(filter): Query<SolutionFilter>,
) -> Result<Response, ApiError> {
    let records = filter.apply(&current_records(&state).await?);
    let csv = export_csv(&records).map_err(|e| {
        log::error!("CSV export failed: {}", e);
        ApiError::Internal("Internal server error".to_string())
    })?;
    log::info!("Exported {} solutions to {}", records.len(), username);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        csv,
    )
        .into_response())
}

async fn upload_excel(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        log::warn!("Rejected upload from {}: {}", username, e);
        ApiError::BadRequest(MALFORMED_UPLOAD.to_string())
    })?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    if let Err(e) = validate_upload_name(&file_name) {
        log::warn!("Rejected upload '{}' from {}", file_name, username);
        return Err(e);
    }

    let size = bytes.len();
    state.workbook.replace(bytes.to_vec()).await?;
    log::info!(
        "Upload '{}' ({} bytes) from {} replaced {}",
        file_name,
        size,
        username,
        state.workbook.path().display()
    );

    Ok(Json(UploadResponse {
        success: true,
        message: "File uploaded successfully!",
    }))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        log::warn!("Malformed multipart body: {}", err);
        ApiError::BadRequest(MALFORMED_UPLOAD.to_string())
    }
}

/// Check the client-side file name of an upload
///
/// # Errors
/// * `No file selected` for an empty name
/// * `Invalid file type...` unless the name ends in `.xlsx` (any case)
pub fn validate_upload_name(file_name: &str) -> Result<(), ApiError> {
    if file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }
    if !file_name.to_ascii_lowercase().ends_with(".xlsx") {
        return Err(ApiError::BadRequest(
            "Invalid file type. Please upload an Excel file (.xlsx)".to_string(),
        ));
    }
    Ok(())
}

/// Map a request path onto a relative file path inside the static root
///
/// Every segment must match `PATH_SEGMENT`, which rules out `..`, hidden
/// files, empty segments and separators, and the extension must be allowed.
pub fn resolve_static_path(path: &str) -> Option<PathBuf> {
    let segments: Vec<&str> = path.split('/').collect();
    if !segments.iter().all(|segment| PATH_SEGMENT.is_match(segment)) {
        return None;
    }

    let extension = segments.last()?.rsplit_once('.')?.1.to_ascii_lowercase();
    if !STATIC_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    Some(segments.iter().collect())
}

async fn serve_static(
    State(state): State<Arc<AppState>>,
    AxumPath(path): AxumPath<String>,
    request: Request,
) -> Response {
    let not_found = || ApiError::NotFound(NOT_FOUND.to_string()).into_response();

    let Some(relative) = resolve_static_path(&path) else {
        log::warn!("Rejected static path '{}'", path);
        return not_found();
    };

    let root = &state.config.static_root;
    let (Ok(root), Ok(file)) = (
        tokio::fs::canonicalize(root).await,
        tokio::fs::canonicalize(root.join(&relative)).await,
    ) else {
        return not_found();
    };
    let is_file = tokio::fs::metadata(&file)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !file.starts_with(&root) || !is_file {
        log::warn!("Rejected static path '{}' outside the static root", path);
        return not_found();
    }

    match ServeFile::new(&file).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
