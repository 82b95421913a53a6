//! HTTP surface: feeds, exports, page data, document uploads and the GraphQL
//! proxy, all backed by the shared [`AppState`].

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use color_eyre::eyre::{Result, eyre};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use vitrine_cms::{ContentSource, WordPressClient};
use vitrine_shared::{Document, DocumentType, VitrineError};
use vitrine_site::{FeedKind, PageOutcome, SiteContext, compose, compose_feed, sha256_hex};
use vitrine_storage::Storage;

/// Prefix under which composer view-models are served.
const PAGES_PREFIX: &str = "/api/pages";

/// Route of the document upload endpoint.
const UPLOAD_ROUTE: &str = "/api/documents/upload";

/// Name used when an upload arrives without a usable file name.
const FALLBACK_FILE_NAME: &str = "document";

/// Immutable state shared by every request.
#[derive(Clone)]
pub(crate) struct AppState {
    pub ctx: Arc<SiteContext>,
    pub source: Arc<dyn ContentSource>,
    /// Client the GraphQL proxy forwards to.
    pub proxy: Arc<WordPressClient>,
    pub storage: Arc<Storage>,
    pub upload_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Server lifecycle
// ---------------------------------------------------------------------------

/// Bind `addr` and serve until Ctrl-C.
pub(crate) async fn serve(state: AppState, addr: &str, max_upload_bytes: usize) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| eyre!("cannot bind {addr}: {e}"))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state, max_upload_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Build the full router.
pub(crate) fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let mut feeds = Router::new();
    for kind in FeedKind::ALL {
        feeds = feeds.route(
            &feed_route(kind),
            get(move |State(state): State<AppState>| serve_feed(state, kind)),
        );
    }

    let uploads = Router::new()
        .route(
            UPLOAD_ROUTE,
            get(list_document_types)
                .post(upload_document)
                .options(upload_preflight),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::map_response(allow_any_origin));

    let pages = Router::new()
        .route("/home", get(home_page))
        .route("/blog", get(blog_index_page))
        .route("/blog/{slug}", get(blog_post_page))
        .route("/category/{slug}", get(category_page))
        .route("/author/{slug}", get(author_page))
        .route("/team", get(team_list_page))
        .route("/team/{slug}", get(team_member_page))
        .route("/portfolio", get(portfolio_list_page))
        .route("/portfolio/{slug}", get(portfolio_item_page))
        .route("/toolbox", get(toolbox_list_page))
        .route("/toolbox/{slug}", get(toolbox_entry_page))
        .route("/levee", get(levee_list_page))
        .route("/levee/{slug}", get(levee_item_page))
        .route("/expertise", get(expertise_catalog_page))
        .route("/expertise/{category}", get(expertise_category_page))
        .route("/expertise/{category}/{expertise}", get(expertise_detail_page));

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/api/graphql", post(graphql_proxy))
        .merge(feeds)
        .merge(uploads)
        .nest(PAGES_PREFIX, pages)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

fn feed_route(kind: FeedKind) -> String {
    match kind {
        FeedKind::Campaigns => "/api/csv".to_string(),
        FeedKind::Keywords => "/api/keywords".to_string(),
        other => format!("/{}", other.file_name()),
    }
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    debug!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    response
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned by handlers, rendered as a plain-text body.
#[derive(Debug)]
pub(crate) enum ApiError {
    Domain(VitrineError),
    Status(StatusCode, String),
}

impl From<VitrineError> for ApiError {
    fn from(e: VitrineError) -> Self {
        Self::Domain(e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::Status(e.status(), e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Domain(e) => {
                let status = match &e {
                    VitrineError::NotFound { .. } => StatusCode::NOT_FOUND,
                    VitrineError::Validation { .. } => StatusCode::BAD_REQUEST,
                    VitrineError::Conflict { .. } => StatusCode::CONFLICT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            Self::Status(status, message) => (status, message),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        }
        (status, message).into_response()
    }
}

type ApiResult<T = Response> = std::result::Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

async fn serve_feed(state: AppState, kind: FeedKind) -> ApiResult {
    let body = compose_feed(kind, state.source.as_ref(), &state.ctx, Utc::now()).await?;

    let mut response = (
        [
            (header::CONTENT_TYPE, kind.content_type()),
            (header::CACHE_CONTROL, kind.cache_control()),
        ],
        body,
    )
        .into_response();

    if kind.is_export() {
        let disposition = format!("attachment; filename=\"{}\"", kind.file_name());
        let value = HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

// ---------------------------------------------------------------------------
// Page data
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<String>,
}

fn page_response<T: Serialize>(outcome: PageOutcome<T>) -> Response {
    match outcome {
        PageOutcome::Found(page) => Json(page).into_response(),
        PageOutcome::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
        PageOutcome::Redirect(path) => (
            StatusCode::PERMANENT_REDIRECT,
            [(header::LOCATION, format!("{PAGES_PREFIX}{path}"))],
        )
            .into_response(),
    }
}

async fn home_page(State(state): State<AppState>) -> ApiResult {
    Ok(page_response(compose::home(state.source.as_ref(), &state.ctx).await?))
}

async fn blog_index_page(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult {
    let outcome =
        compose::blog_index(state.source.as_ref(), &state.ctx, params.page.as_deref()).await?;
    Ok(page_response(outcome))
}

async fn blog_post_page(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult {
    Ok(page_response(
        compose::blog_post(state.source.as_ref(), &state.ctx, &slug).await?,
    ))
}

async fn category_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult {
    let outcome = compose::category_archive(
        state.source.as_ref(),
        &state.ctx,
        &slug,
        params.page.as_deref(),
    )
    .await?;
    Ok(page_response(outcome))
}

async fn author_page(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult {
    Ok(page_response(
        compose::author(state.source.as_ref(), &state.ctx, &slug).await?,
    ))
}

async fn team_list_page(State(state): State<AppState>) -> ApiResult {
    Ok(page_response(
        compose::team_list(state.source.as_ref(), &state.ctx).await?,
    ))
}

async fn team_member_page(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult {
    Ok(page_response(
        compose::team_member(state.source.as_ref(), &state.ctx, &slug).await?,
    ))
}

async fn portfolio_list_page(State(state): State<AppState>) -> ApiResult {
    Ok(page_response(
        compose::portfolio_list(state.source.as_ref(), &state.ctx).await?,
    ))
}

async fn portfolio_item_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult {
    Ok(page_response(
        compose::portfolio_item(state.source.as_ref(), &state.ctx, &slug).await?,
    ))
}

async fn toolbox_list_page(State(state): State<AppState>) -> ApiResult {
    Ok(page_response(
        compose::toolbox_list(state.source.as_ref(), &state.ctx).await?,
    ))
}

async fn toolbox_entry_page(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult {
    Ok(page_response(
        compose::toolbox_entry(state.source.as_ref(), &state.ctx, &slug).await?,
    ))
}

async fn levee_list_page(State(state): State<AppState>) -> ApiResult {
    Ok(page_response(
        compose::levee_list(state.source.as_ref(), &state.ctx).await?,
    ))
}

async fn levee_item_page(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult {
    Ok(page_response(
        compose::levee_item(state.source.as_ref(), &state.ctx, &slug).await?,
    ))
}

async fn expertise_catalog_page(State(state): State<AppState>) -> Response {
    page_response(compose::expertise_catalog(&state.ctx))
}

async fn expertise_category_page(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Response {
    page_response(compose::expertise_category(&state.ctx, &category))
}

async fn expertise_detail_page(
    State(state): State<AppState>,
    Path((category, expertise)): Path<(String, String)>,
) -> Response {
    page_response(compose::expertise_detail(&state.ctx, &category, &expertise))
}

// ---------------------------------------------------------------------------
// Document uploads
// ---------------------------------------------------------------------------

async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

async fn upload_preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
        ],
    )
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentListing {
    document_types: Vec<DocumentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documents: Option<Vec<Document>>,
}

async fn list_document_types(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<DocumentListing>> {
    let document_types = state.storage.list_document_types().await?;
    let documents = match params.user_id.as_deref() {
        Some(user_id) => Some(
            state
                .storage
                .list_documents_for_user(checked_user_id(user_id)?)
                .await?,
        ),
        None => None,
    };
    Ok(Json(DocumentListing {
        document_types,
        documents,
    }))
}

#[derive(Debug)]
struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    document_type_id: Option<String>,
    metadata: Option<String>,
    user_id: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?;
                    form.file = Some(UploadedFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
                "documentTypeId" => form.document_type_id = Some(field.text().await?),
                "metadata" => form.metadata = Some(field.text().await?),
                "userId" => form.user_id = Some(field.text().await?),
                other => debug!(field = other, "ignoring unknown multipart field"),
            }
        }
        Ok(form)
    }
}

async fn upload_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let form = UploadForm::read(multipart).await?;

    let user_id = checked_user_id(
        form.user_id
            .as_deref()
            .ok_or_else(|| VitrineError::validation("missing field 'userId'"))?,
    )?
    .to_string();
    let document_type_id: i64 = form
        .document_type_id
        .as_deref()
        .ok_or_else(|| VitrineError::validation("missing field 'documentTypeId'"))?
        .trim()
        .parse()
        .map_err(|_| VitrineError::validation("'documentTypeId' must be an integer"))?;
    let metadata = parse_metadata(form.metadata.as_deref())?;
    let file = form
        .file
        .ok_or_else(|| VitrineError::validation("missing field 'file'"))?;
    if file.data.is_empty() {
        return Err(VitrineError::validation("uploaded file is empty").into());
    }

    if state
        .storage
        .get_document_type(document_type_id)
        .await?
        .is_none()
    {
        return Err(
            VitrineError::validation(format!("unknown document type {document_type_id}")).into(),
        );
    }
    if state
        .storage
        .find_document(&user_id, document_type_id)
        .await?
        .is_some()
    {
        return Err(VitrineError::conflict(format!(
            "user '{user_id}' already has a document of type {document_type_id}"
        ))
        .into());
    }

    let id = Uuid::now_v7().to_string();
    let file_name = safe_file_name(&file.file_name);
    let stored_path = format!("{user_id}/{id}-{file_name}");
    let document = Document {
        id,
        user_id,
        document_type_id,
        file_name,
        content_type: file.content_type,
        size_bytes: file.data.len() as u64,
        checksum: sha256_hex(&file.data),
        stored_path,
        metadata,
        created_at: Utc::now(),
    };

    // The row claims the (user, type) slot before any bytes hit the disk.
    state.storage.insert_document(&document).await?;
    if let Err(e) = write_upload(&state.upload_dir, &document.stored_path, &file.data).await {
        if let Err(cleanup) = state.storage.delete_document(&document.id).await {
            warn!(id = %document.id, error = %cleanup, "failed to remove orphaned document record");
        }
        return Err(e.into());
    }

    info!(
        id = %document.id,
        user_id = %document.user_id,
        document_type_id,
        size_bytes = document.size_bytes,
        "document stored"
    );
    Ok((StatusCode::CREATED, Json(document)))
}

async fn write_upload(
    upload_dir: &std::path::Path,
    stored_path: &str,
    data: &[u8],
) -> vitrine_shared::Result<()> {
    let target = upload_dir.join(stored_path);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| VitrineError::io(parent, e))?;
    }
    tokio::fs::write(&target, data)
        .await
        .map_err(|e| VitrineError::io(&target, e))
}

/// User ids become directory names, so only a conservative alphabet is accepted.
fn checked_user_id(raw: &str) -> vitrine_shared::Result<&str> {
    let id = raw.trim();
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(VitrineError::validation(format!("invalid userId '{raw}'")))
    }
}

fn parse_metadata(raw: Option<&str>) -> vitrine_shared::Result<serde_json::Value> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    };
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value @ serde_json::Value::Object(_)) => Ok(value),
        Ok(_) => Err(VitrineError::validation("'metadata' must be a JSON object")),
        Err(e) => Err(VitrineError::validation(format!("invalid 'metadata': {e}"))),
    }
}

/// Last path component of the client-supplied name, restricted to safe characters.
fn safe_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

// ---------------------------------------------------------------------------
// GraphQL proxy
// ---------------------------------------------------------------------------

async fn graphql_proxy(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let upstream = state.proxy.forward_graphql(body).await?;
    let compressed = gzip(&upstream.body).map_err(|e| {
        ApiError::Status(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("gzip encoding failed: {e}"),
        )
    })?;
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);

    Ok((
        status,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_ENCODING, "gzip"),
        ],
        compressed,
    )
        .into_response())
}

fn gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Read;
    use std::time::Duration;

    use flate2::read::GzDecoder;
    use vitrine_shared::{AppConfig, CmsSettings};
    use vitrine_site::memory::fixtures;
    use vitrine_site::{InMemorySource, default_catalog};
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BOUNDARY: &str = "vitrine-test-boundary";

    struct TestApp {
        base: String,
        upload_dir: PathBuf,
        client: reqwest::Client,
    }

    async fn spawn_with(source: InMemorySource, graphql_origin: &str) -> TestApp {
        let mut config = AppConfig::default();
        config.site.base_url = "https://www.agence.test".into();
        config.redirects.authors = BTreeMap::from([("jdupont".into(), "jean-dupont".into())]);
        let ctx = SiteContext::from_config(&config, default_catalog()).unwrap();

        let settings = CmsSettings {
            rest_url: format!("{graphql_origin}/wp-json/wp/v2/").parse().unwrap(),
            graphql_url: format!("{graphql_origin}/graphql").parse().unwrap(),
            timeout: Duration::from_secs(5),
            token: None,
        };

        let scratch = std::env::temp_dir().join(format!("vitrine_server_{}", Uuid::now_v7()));
        let storage = Storage::open(&scratch.join("vitrine.db")).await.unwrap();
        let upload_dir = scratch.join("uploads");

        let state = AppState {
            ctx: Arc::new(ctx),
            source: Arc::new(source),
            proxy: Arc::new(WordPressClient::new(settings).unwrap()),
            storage: Arc::new(storage),
            upload_dir: upload_dir.clone(),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state, 64 * 1024)).await.unwrap();
        });

        TestApp {
            base: format!("http://{addr}"),
            upload_dir,
            client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
        }
    }

    async fn spawn() -> TestApp {
        spawn_with(fixtures::source(), "http://127.0.0.1:9").await
    }

    impl TestApp {
        async fn get(&self, path: &str) -> reqwest::Response {
            self.client
                .get(format!("{}{path}", self.base))
                .send()
                .await
                .unwrap()
        }

        async fn upload(&self, parts: &[Part<'_>]) -> reqwest::Response {
            self.client
                .post(format!("{}{UPLOAD_ROUTE}", self.base))
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(multipart_body(parts))
                .send()
                .await
                .unwrap()
        }
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(file_name, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/pdf\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn header_str<'a>(response: &'a reqwest::Response, name: &str) -> &'a str {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    // -- feeds --------------------------------------------------------------

    #[tokio::test]
    async fn health_check() {
        let app = spawn().await;
        let response = app.get("/healthz").await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn sitemap_index_lists_sub_sitemaps() {
        let app = spawn().await;
        let response = app.get("/sitemap.xml").await;
        assert_eq!(response.status(), 200);
        assert_eq!(header_str(&response, "content-type"), "application/xml; charset=utf-8");
        assert_eq!(
            header_str(&response, "cache-control"),
            "public, max-age=3600, stale-while-revalidate=86400"
        );
        let body = response.text().await.unwrap();
        assert!(body.contains("https://www.agence.test/blog-sitemap.xml"));
        assert!(body.contains("https://www.agence.test/discover-sitemap.xml"));
    }

    #[tokio::test]
    async fn news_sitemap_has_short_cache() {
        let app = spawn().await;
        let response = app.get("/news-sitemap.xml").await;
        assert_eq!(response.status(), 200);
        assert_eq!(
            header_str(&response, "cache-control"),
            "public, max-age=1800, stale-while-revalidate=86400"
        );
    }

    #[tokio::test]
    async fn blog_sitemap_lists_posts() {
        let app = spawn().await;
        let body = app.get("/blog-sitemap.xml").await.text().await.unwrap();
        assert!(body.contains("https://www.agence.test/blog/article-1"));
    }

    #[tokio::test]
    async fn exports_are_attachments() {
        let app = spawn().await;

        let response = app.get("/api/csv").await;
        assert_eq!(response.status(), 200);
        assert_eq!(header_str(&response, "content-type"), "text/csv; charset=utf-8");
        assert_eq!(
            header_str(&response, "content-disposition"),
            "attachment; filename=\"campaigns.csv\""
        );
        let bytes = response.bytes().await.unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));

        let response = app.get("/api/keywords").await;
        assert_eq!(
            header_str(&response, "content-disposition"),
            "attachment; filename=\"keywords.tsv\""
        );
        let body = response.text().await.unwrap();
        assert!(body.contains('\t'));
    }

    #[tokio::test]
    async fn upstream_failure_is_500() {
        let source = InMemorySource {
            unavailable: true,
            ..fixtures::source()
        };
        let app = spawn_with(source, "http://127.0.0.1:9").await;
        let response = app.get("/blog-sitemap.xml").await;
        assert_eq!(response.status(), 500);
        assert!(header_str(&response, "content-type").starts_with("text/plain"));
    }

    // -- pages --------------------------------------------------------------

    #[tokio::test]
    async fn post_page_is_json() {
        let app = spawn().await;
        let response = app.get("/api/pages/blog/article-2").await;
        assert_eq!(response.status(), 200);
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            json["meta"]["canonical"],
            "https://www.agence.test/blog/article-2"
        );
        assert_eq!(json["meta"]["open_graph"]["type"], "article");
    }

    #[tokio::test]
    async fn missing_and_invalid_pages_are_404() {
        let app = spawn().await;
        assert_eq!(app.get("/api/pages/blog/inconnu").await.status(), 404);
        assert_eq!(app.get("/api/pages/blog?page=0").await.status(), 404);
        assert_eq!(app.get("/api/pages/blog?page=abc").await.status(), 404);
        assert_eq!(app.get("/api/pages/blog?page=99").await.status(), 404);
        assert_eq!(app.get("/api/pages/team/personne").await.status(), 404);
        assert_eq!(app.get("/api/pages/expertise/inconnue").await.status(), 404);
    }

    #[tokio::test]
    async fn listing_pages_are_found() {
        let app = spawn().await;
        for path in [
            "/api/pages/home",
            "/api/pages/blog",
            "/api/pages/blog?page=2",
            "/api/pages/category/growth",
            "/api/pages/team",
            "/api/pages/portfolio",
            "/api/pages/toolbox",
            "/api/pages/levee",
            "/api/pages/expertise",
            "/api/pages/expertise/growth-marketing",
            "/api/pages/expertise/growth-marketing/seo",
        ] {
            assert_eq!(app.get(path).await.status(), 200, "{path}");
        }
    }

    #[tokio::test]
    async fn legacy_author_slug_redirects() {
        let app = spawn().await;
        let response = app.get("/api/pages/author/jdupont").await;
        assert_eq!(response.status(), 308);
        assert_eq!(header_str(&response, "location"), "/api/pages/author/jean-dupont");

        assert_eq!(app.get("/api/pages/author/jean-dupont").await.status(), 200);
    }

    // -- uploads ------------------------------------------------------------

    #[tokio::test]
    async fn lists_document_types() {
        let app = spawn().await;
        let response = app.get(UPLOAD_ROUTE).await;
        assert_eq!(response.status(), 200);
        assert_eq!(header_str(&response, "access-control-allow-origin"), "*");
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json["documentTypes"].as_array().map(Vec::len), Some(5));
        assert!(json.get("documents").is_none());
    }

    #[tokio::test]
    async fn preflight_is_permissive() {
        let app = spawn().await;
        let response = app
            .client
            .request(
                reqwest::Method::OPTIONS,
                format!("{}{UPLOAD_ROUTE}", app.base),
            )
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204);
        assert_eq!(header_str(&response, "access-control-allow-origin"), "*");
        assert_eq!(
            header_str(&response, "access-control-allow-methods"),
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            header_str(&response, "access-control-allow-headers"),
            "Content-Type, Authorization"
        );
    }

    #[tokio::test]
    async fn upload_stores_file_and_record() {
        let app = spawn().await;
        let data = b"%PDF-1.4 extrait kbis";
        let response = app
            .upload(&[
                Part::Text("userId", "user-42"),
                Part::Text("documentTypeId", "1"),
                Part::Text("metadata", r#"{"siren": "123456789"}"#),
                Part::File("../../kbis 2024.pdf", data),
            ])
            .await;
        assert_eq!(response.status(), 201);

        let doc: serde_json::Value = response.json().await.unwrap();
        assert_eq!(doc["userId"], "user-42");
        assert_eq!(doc["documentTypeId"], 1);
        assert_eq!(doc["fileName"], "kbis_2024.pdf");
        assert_eq!(doc["sizeBytes"], data.len());
        assert_eq!(doc["checksum"], sha256_hex(data));
        assert_eq!(doc["metadata"]["siren"], "123456789");

        let stored = app.upload_dir.join(doc["storedPath"].as_str().unwrap());
        assert!(stored.starts_with(app.upload_dir.join("user-42")));
        assert_eq!(std::fs::read(stored).unwrap(), data);

        let listing: serde_json::Value = app
            .get(&format!("{UPLOAD_ROUTE}?userId=user-42"))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(listing["documents"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn duplicate_upload_is_409() {
        let app = spawn().await;
        let parts = [
            Part::Text("userId", "user-7"),
            Part::Text("documentTypeId", "2"),
            Part::File("statuts.pdf", b"statuts"),
        ];
        assert_eq!(app.upload(&parts).await.status(), 201);
        assert_eq!(app.upload(&parts).await.status(), 409);
    }

    #[tokio::test]
    async fn malformed_uploads_are_400() {
        let app = spawn().await;

        let missing_file = app
            .upload(&[
                Part::Text("userId", "user-1"),
                Part::Text("documentTypeId", "1"),
            ])
            .await;
        assert_eq!(missing_file.status(), 400);

        let missing_user = app
            .upload(&[
                Part::Text("documentTypeId", "1"),
                Part::File("a.pdf", b"data"),
            ])
            .await;
        assert_eq!(missing_user.status(), 400);

        let unknown_type = app
            .upload(&[
                Part::Text("userId", "user-1"),
                Part::Text("documentTypeId", "999"),
                Part::File("a.pdf", b"data"),
            ])
            .await;
        assert_eq!(unknown_type.status(), 400);

        let bad_metadata = app
            .upload(&[
                Part::Text("userId", "user-1"),
                Part::Text("documentTypeId", "1"),
                Part::Text("metadata", "{not json"),
                Part::File("a.pdf", b"data"),
            ])
            .await;
        assert_eq!(bad_metadata.status(), 400);

        let empty_file = app
            .upload(&[
                Part::Text("userId", "user-1"),
                Part::Text("documentTypeId", "1"),
                Part::File("a.pdf", b""),
            ])
            .await;
        assert_eq!(empty_file.status(), 400);

        let traversal_user = app
            .upload(&[
                Part::Text("userId", "../etc"),
                Part::Text("documentTypeId", "1"),
                Part::File("a.pdf", b"data"),
            ])
            .await;
        assert_eq!(traversal_user.status(), 400);
    }

    #[test]
    fn file_names_are_sanitised() {
        assert_eq!(safe_file_name("rapport final.pdf"), "rapport_final.pdf");
        assert_eq!(safe_file_name("C:\\docs\\kbis.pdf"), "kbis.pdf");
        assert_eq!(safe_file_name("../.."), FALLBACK_FILE_NAME);
        assert_eq!(safe_file_name(""), FALLBACK_FILE_NAME);
        assert_eq!(safe_file_name(".htaccess"), "htaccess");
    }

    #[test]
    fn metadata_must_be_an_object() {
        assert!(parse_metadata(None).unwrap().is_object());
        assert!(parse_metadata(Some("  ")).unwrap().is_object());
        assert!(parse_metadata(Some("[1, 2]")).is_err());
        assert_eq!(parse_metadata(Some(r#"{"a": 1}"#)).unwrap()["a"], 1);
    }

    // -- graphql proxy ------------------------------------------------------

    #[tokio::test]
    async fn graphql_proxy_forwards_and_gzips() {
        let cms = MockServer::start().await;
        let query = r#"{"query":"{ teams { nodes { slug } } }"}"#;
        let upstream_body = r#"{"data":{"teams":{"nodes":[{"slug":"marie-curie"}]}}}"#;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string(query))
            .respond_with(ResponseTemplate::new(200).set_body_string(upstream_body))
            .expect(1)
            .mount(&cms)
            .await;

        let app = spawn_with(fixtures::source(), &cms.uri()).await;
        let response = app
            .client
            .post(format!("{}/api/graphql", app.base))
            .body(query)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(header_str(&response, "content-encoding"), "gzip");

        let compressed = response.bytes().await.unwrap();
        let mut decoded = String::new();
        GzDecoder::new(&compressed[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, upstream_body);
    }

    #[tokio::test]
    async fn graphql_proxy_keeps_upstream_status() {
        let cms = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"errors":[]}"#))
            .mount(&cms)
            .await;

        let app = spawn_with(fixtures::source(), &cms.uri()).await;
        let response = app
            .client
            .post(format!("{}/api/graphql", app.base))
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(header_str(&response, "content-encoding"), "gzip");
    }
}
