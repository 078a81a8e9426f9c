use crate::{
    catalog::{ContentLocator, ImageEntry, NEXTCLOUD_SOURCE},
    error::ApiError,
    plans::{ExportDocument, PlanDraft, PostPlan},
    scanner,
    suggest::{SuggestMode, SuggestionResult},
    webdav::{self, DavError, URI_COMPONENT},
    AppState,
};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use percent_encoding::utf8_percent_encode;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

type SharedState = Arc<AppState>;

/// Upper bound on images gathered by one crawl.
const CRAWL_MAX_IMAGES: usize = 300;
const CRAWL_MAX_DEPTH: usize = 6;
/// Upper bound on samples returned to the caller, applied after the crawl.
const SAMPLES_LIMIT: usize = 200;
const REQUEST_BODY_LIMIT: usize = 25 * 1024 * 1024;
const EXPORT_FILENAME: &str = "instagram-post-plans.json";

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/suggest", post(suggest))
        .route("/api/nextcloud/samples", get(nextcloud_samples))
        .route("/api/nextcloud/file", get(nextcloud_file))
        .route("/api/catalog", get(get_catalog))
        .route("/api/catalog/refresh", post(refresh_catalog))
        .route("/api/catalog/select", post(select_image))
        .route("/api/catalog/suggest", post(suggest_for_selected))
        .route("/api/catalog/randomize", post(randomize_selection))
        .route("/api/folders", post(connect_folder).delete(clear_folders))
        .route("/api/local/file", get(local_file))
        .route("/api/plans", get(list_plans).put(save_plan))
        .route("/api/plans/export", get(export_plans))
        .route("/api/plans/import", post(import_plans))
        .route("/api/plans/:image_id", delete(delete_plan))
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
        .with_state(state)
}

// ────────────────────────── Suggestions ──────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    #[serde(default)]
    pub mode: Option<Value>,
    #[serde(default)]
    pub image_data_url: Option<Value>,
}

async fn suggest(
    State(state): State<SharedState>,
    request: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<SuggestionResult>, ApiError> {
    let suggester = state.suggester.as_ref().ok_or(ApiError::MissingApiKey)?;
    let Json(request) = request.map_err(bad_json)?;
    let mode = request.mode.as_ref().and_then(Value::as_str).unwrap_or("");
    let image = request
        .image_data_url
        .as_ref()
        .and_then(Value::as_str)
        .unwrap_or("");

    Ok(Json(suggester.suggest(mode, image).await?))
}

#[derive(Debug, Deserialize)]
pub struct SelectedSuggestRequest {
    pub mode: String,
}

async fn suggest_for_selected(
    State(state): State<SharedState>,
    request: Result<Json<SelectedSuggestRequest>, JsonRejection>,
) -> Result<Json<SuggestionResult>, ApiError> {
    let suggester = state.suggester.as_ref().ok_or(ApiError::MissingApiKey)?;
    let Json(request) = request.map_err(bad_json)?;
    let mode = SuggestMode::parse(&request.mode)
        .ok_or_else(|| ApiError::BadRequest("Invalid mode".to_string()))?;

    let selected = state
        .session
        .lock()
        .await
        .selected()
        .cloned()
        .ok_or_else(|| ApiError::BadRequest("Select an image first.".to_string()))?;

    let data_url = load_image_data_url(&state, &selected).await?;
    Ok(Json(suggester.suggest(mode.as_str(), &data_url).await?))
}

fn bad_json(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizeResponse {
    pub image_id: String,
    pub suggestion: SuggestionResult,
}

async fn randomize_selection(
    State(state): State<SharedState>,
) -> Result<Json<RandomizeResponse>, ApiError> {
    let suggester = state.suggester.as_ref().ok_or(ApiError::MissingApiKey)?;

    let picked = {
        let mut session = state.session.lock().await;
        let current = session.selected_id().map(str::to_string);
        let images = session.images();
        if images.is_empty() {
            return Err(ApiError::BadRequest("No images loaded yet.".to_string()));
        }
        let others: Vec<&ImageEntry> = images
            .iter()
            .filter(|entry| Some(entry.id.as_str()) != current.as_deref())
            .collect();
        let picked = if others.is_empty() {
            images.first().cloned()
        } else {
            others.choose(&mut rand::thread_rng()).map(|entry| (*entry).clone())
        };
        let picked = picked.ok_or_else(|| ApiError::BadRequest("No images loaded yet.".to_string()))?;
        session.select(&picked.id);
        picked
    };

    let data_url = load_image_data_url(&state, &picked).await?;
    let suggestion = suggester.suggest(SuggestMode::Both.as_str(), &data_url).await?;
    Ok(Json(RandomizeResponse {
        image_id: picked.id,
        suggestion,
    }))
}

/// Reads an entry's bytes through its locator and encodes them as a data URI.
async fn load_image_data_url(state: &AppState, entry: &ImageEntry) -> Result<String, ApiError> {
    let (mime, bytes) = match &entry.content_locator {
        ContentLocator::LocalHandle { handle, .. } => {
            let path = state
                .session
                .lock()
                .await
                .handles()
                .resolve(handle)
                .map(std::path::Path::to_path_buf)
                .ok_or_else(|| ApiError::NotFound("Image handle was released".to_string()))?;
            let bytes = tokio::fs::read(&path).await.map_err(|error| {
                ApiError::Internal(format!("Failed to read {}: {}", path.display(), error))
            })?;
            (scanner::mime_for_path(&path).to_string(), bytes)
        }
        ContentLocator::Remote { .. } => {
            let client = state
                .nextcloud
                .as_ref()
                .ok_or(ApiError::MissingRemoteConfig)?;
            let response = client.fetch_file(&entry.path).await?;
            let mime = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .filter(|value| value.starts_with("image/"))
                .unwrap_or_else(|| scanner::mime_for_path(std::path::Path::new(&entry.path)))
                .to_string();
            let bytes = response
                .bytes()
                .await
                .map_err(|error| ApiError::Internal(format!("Image fetch failed: {}", error)))?;
            (mime, bytes.to_vec())
        }
    };

    Ok(format!(
        "data:{};base64,{}",
        mime,
        BASE64_STANDARD.encode(bytes)
    ))
}

// ────────────────────────── Nextcloud ──────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RemoteSample {
    pub name: String,
    pub path: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SamplesResponse {
    pub images: Vec<RemoteSample>,
}

pub fn proxy_url(relative_path: &str) -> String {
    format!(
        "/api/nextcloud/file?path={}",
        utf8_percent_encode(relative_path, URI_COMPONENT)
    )
}

async fn nextcloud_samples(
    State(state): State<SharedState>,
) -> Result<Json<SamplesResponse>, ApiError> {
    let client = state
        .nextcloud
        .as_ref()
        .ok_or(ApiError::MissingRemoteConfig)?;

    let entries =
        webdav::crawl_images(client, client.root_dir(), CRAWL_MAX_IMAGES, CRAWL_MAX_DEPTH).await?;
    log::info!(
        "Crawled {} images below {}",
        entries.len(),
        client.root_dir()
    );

    let images: Vec<RemoteSample> = entries
        .iter()
        .take(SAMPLES_LIMIT)
        .map(|entry| RemoteSample {
            name: entry.name().to_string(),
            path: entry.path.clone(),
            url: proxy_url(&entry.path),
        })
        .collect();

    let catalog_entries = images
        .iter()
        .map(|sample| {
            ImageEntry::new(
                NEXTCLOUD_SOURCE,
                &sample.path,
                ContentLocator::Remote {
                    url: sample.url.clone(),
                },
            )
        })
        .collect();
    {
        let mut session = state.session.lock().await;
        session.set_remote_entries(NEXTCLOUD_SOURCE, catalog_entries);
        session.refresh_off_runtime().await;
    }

    Ok(Json(SamplesResponse { images }))
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub path: Option<String>,
}

fn text_response(status: StatusCode, body: String) -> Response {
    (status, body).into_response()
}

async fn nextcloud_file(State(state): State<SharedState>, Query(query): Query<FileQuery>) -> Response {
    let Some(client) = state.nextcloud.as_ref() else {
        return text_response(
            StatusCode::BAD_REQUEST,
            "Missing Nextcloud env configuration.".to_string(),
        );
    };

    let relative_path = query.path.unwrap_or_default();
    if relative_path.is_empty() {
        return text_response(StatusCode::BAD_REQUEST, "Missing path query.".to_string());
    }
    if relative_path.split('/').any(|part| part == "..") {
        return text_response(StatusCode::BAD_REQUEST, "Invalid path query.".to_string());
    }

    match client.fetch_file(&relative_path).await {
        Ok(response) => {
            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("application/octet-stream")
                .to_string();
            (
                [(header::CONTENT_TYPE, content_type)],
                Body::from_stream(response.bytes_stream()),
            )
                .into_response()
        }
        Err(DavError::Upstream { status, body }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            let body = if body.is_empty() {
                "Could not fetch file.".to_string()
            } else {
                body
            };
            text_response(status, body)
        }
        Err(error) => {
            log::error!("Proxy fetch of {} failed: {}", relative_path, error);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

// ────────────────────────── Catalog ──────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub images: Vec<ImageEntry>,
    pub selected_image_id: Option<String>,
    pub generation: u64,
}

fn catalog_view(session: &crate::catalog::CatalogSession) -> CatalogView {
    CatalogView {
        images: session.images().to_vec(),
        selected_image_id: session.selected_id().map(str::to_string),
        generation: session.generation(),
    }
}

async fn get_catalog(State(state): State<SharedState>) -> Json<CatalogView> {
    Json(catalog_view(&*state.session.lock().await))
}

async fn refresh_catalog(State(state): State<SharedState>) -> Json<CatalogView> {
    let mut session = state.session.lock().await;
    session.refresh_off_runtime().await;
    Json(catalog_view(&session))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub image_id: String,
}

async fn select_image(
    State(state): State<SharedState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<CatalogView>, ApiError> {
    let mut session = state.session.lock().await;
    if !session.select(&request.image_id) {
        return Err(ApiError::BadRequest(format!(
            "Image {} is not in the catalog",
            request.image_id
        )));
    }
    Ok(Json(catalog_view(&session)))
}

#[derive(Debug, Deserialize)]
pub struct ConnectFolderRequest {
    pub path: String,
}

async fn connect_folder(
    State(state): State<SharedState>,
    Json(request): Json<ConnectFolderRequest>,
) -> Result<Json<CatalogView>, ApiError> {
    let dir = std::path::PathBuf::from(request.path.trim());
    let is_dir = tokio::fs::metadata(&dir)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(ApiError::BadRequest(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut session = state.session.lock().await;
    let label = session.connect_folder(&dir).label.clone();
    log::info!("Connected local folder {} as {}", dir.display(), label);
    session.refresh_off_runtime().await;
    Ok(Json(catalog_view(&session)))
}

async fn clear_folders(State(state): State<SharedState>) -> Json<CatalogView> {
    let mut session = state.session.lock().await;
    session.clear();
    Json(catalog_view(&session))
}

#[derive(Debug, Deserialize)]
pub struct LocalFileQuery {
    pub handle: Option<String>,
}

async fn local_file(
    State(state): State<SharedState>,
    Query(query): Query<LocalFileQuery>,
) -> Response {
    let handle = query.handle.unwrap_or_default();
    let path = state
        .session
        .lock()
        .await
        .handles()
        .resolve(&handle)
        .map(std::path::Path::to_path_buf);
    let Some(path) = path else {
        return text_response(StatusCode::NOT_FOUND, "Unknown or released handle.".to_string());
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, scanner::mime_for_path(&path))],
            bytes,
        )
            .into_response(),
        Err(error) => text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read {}: {}", path.display(), error),
        ),
    }
}

// ────────────────────────── Plans ──────────────────────────

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<PostPlan>,
}

async fn list_plans(State(state): State<SharedState>) -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: state.plans.list(),
    })
}

async fn save_plan(
    State(state): State<SharedState>,
    Json(draft): Json<PlanDraft>,
) -> Result<Json<PostPlan>, ApiError> {
    Ok(Json(state.plans.save_draft(&draft)?))
}

async fn delete_plan(
    State(state): State<SharedState>,
    Path(image_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.plans.delete(&image_id)?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

async fn export_plans(State(state): State<SharedState>) -> impl IntoResponse {
    let document: ExportDocument = {
        let session = state.session.lock().await;
        state.plans.export(session.images())
    };
    (
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
        )],
        Json(document),
    )
}

async fn import_plans(
    State(state): State<SharedState>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let imported = state.plans.import(&body)?;
    log::info!("Imported {} plans", imported);
    Ok(Json(serde_json::json!({ "imported": imported })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::Request;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tower::ServiceExt;

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "post_planner_routes_{}_{}_{}",
            tag,
            std::process::id(),
            nanos
        ));
        std::fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    fn test_app(data_dir: &std::path::Path, extra: &[(&str, &str)]) -> Router {
        let mut env: HashMap<String, String> = extra
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        env.insert(
            "PLANNER_DATA_DIR".to_string(),
            data_dir.display().to_string(),
        );
        let config = AppConfig::from_lookup(|key| env.get(key).cloned());
        let state = AppState::new(config).expect("state");
        build_router(Arc::new(state))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(Body::from(body.unwrap_or("").to_string()))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, bytes.to_vec())
    }

    fn json(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).expect("json body")
    }

    #[tokio::test]
    async fn remote_routes_require_nextcloud_config() {
        let dir = temp_dir("remote");
        let app = test_app(&dir, &[("NEXTCLOUD_BASE_URL", "https://cloud.example.com")]);

        let (status, body) = call(&app, "GET", "/api/nextcloud/samples", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json(&body)["error"]
            .as_str()
            .unwrap_or_default()
            .contains("NEXTCLOUD"));

        let (status, body) = call(&app, "GET", "/api/nextcloud/file?path=a.jpg", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Missing Nextcloud env configuration.");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn file_proxy_requires_path() {
        let dir = temp_dir("proxy");
        let app = test_app(
            &dir,
            &[
                ("NEXTCLOUD_BASE_URL", "http://127.0.0.1:9"),
                ("NEXTCLOUD_USERNAME", "ana"),
                ("NEXTCLOUD_APP_PASSWORD", "secret"),
            ],
        );

        let (status, body) = call(&app, "GET", "/api/nextcloud/file", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Missing path query.");

        let (status, _) = call(&app, "GET", "/api/nextcloud/file?path=..%2Fsecret.jpg", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn suggest_checks_key_then_input() {
        let dir = temp_dir("suggest");
        let without_key = test_app(&dir, &[]);
        let payload = r#"{"mode":"both","imageDataUrl":"data:image/png;base64,AA=="}"#;
        let (status, body) = call(&without_key, "POST", "/api/suggest", Some(payload)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(&body)["error"], "OPENAI_API_KEY is not set on server");

        let with_key = test_app(
            &dir,
            &[
                ("OPENAI_API_KEY", "sk-test"),
                ("OPENAI_BASE_URL", "http://127.0.0.1:9/v1"),
            ],
        );
        let (status, body) = call(
            &with_key,
            "POST",
            "/api/suggest",
            Some(r#"{"mode":"poem","imageDataUrl":"data:image/png;base64,AA=="}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "Invalid mode");

        let (status, body) = call(
            &with_key,
            "POST",
            "/api/suggest",
            Some(r#"{"mode":"caption","imageDataUrl":42}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "Invalid or missing imageDataUrl");

        let (status, body) = call(&with_key, "POST", "/api/suggest", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json(&body)["error"]
            .as_str()
            .unwrap_or_default()
            .starts_with("Invalid request body"));

        let (status, body) = call(&with_key, "POST", "/api/suggest", Some("[1, 2]")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json(&body)["error"].is_string());

        let request = Request::builder()
            .method("POST")
            .uri("/api/suggest")
            .body(Body::from("mode=both"))
            .expect("request");
        let response = with_key.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn local_folder_flow_issues_and_releases_handles() {
        let data = temp_dir("local_data");
        let photos = temp_dir("local_photos");
        std::fs::write(photos.join("b.png"), b"png-bytes").expect("write");
        std::fs::write(photos.join("a.jpg"), b"jpg-bytes").expect("write");
        let app = test_app(&data, &[]);

        let request = serde_json::json!({ "path": photos.display().to_string() }).to_string();
        let (status, body) = call(&app, "POST", "/api/folders", Some(&request)).await;
        assert_eq!(status, StatusCode::OK);
        let view = json(&body);
        let images = view["images"].as_array().cloned().unwrap_or_default();
        assert_eq!(images.len(), 2);
        assert!(images[0]["path"].as_str().unwrap_or_default().ends_with("/a.jpg"));
        assert_eq!(view["selectedImageId"], images[0]["id"]);

        let url = images[0]["contentLocator"]["url"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let (status, bytes) = call(&app, "GET", &url, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"jpg-bytes");

        let (status, _) = call(&app, "POST", "/api/catalog/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "GET", &url, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, "DELETE", "/api/folders", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["images"].as_array().map(Vec::len), Some(0));

        let missing = serde_json::json!({ "path": photos.join("nope").display().to_string() }).to_string();
        let (status, _) = call(&app, "POST", "/api/folders", Some(&missing)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        std::fs::remove_dir_all(&data).ok();
        std::fs::remove_dir_all(&photos).ok();
    }

    #[tokio::test]
    async fn plan_routes_save_export_and_reject_bad_imports() {
        let dir = temp_dir("plans");
        let app = test_app(&dir, &[]);

        let draft = r#"{"imageId":"nextcloud:a.jpg","caption":" Hi ","hashtags":"foo, #bar baz","scheduledAt":"2025-01-01T10:00"}"#;
        let (status, body) = call(&app, "PUT", "/api/plans", Some(draft)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["hashtags"], "#foo #bar #baz");

        let (status, _) = call(&app, "POST", "/api/plans/import", Some(r#"{"nothing":1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(&app, "GET", "/api/plans/export", None).await;
        let exported = json(&body);
        assert_eq!(exported["plans"][0]["imageId"], "nextcloud:a.jpg");
        assert_eq!(exported["plans"][0]["caption"], "Hi");
        assert_eq!(exported["plans"][0]["source"], Value::Null);

        let (status, body) = call(&app, "DELETE", "/api/plans/nextcloud:a.jpg", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["deleted"], true);

        let (_, body) = call(&app, "GET", "/api/plans", None).await;
        assert_eq!(json(&body)["plans"].as_array().map(Vec::len), Some(0));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn proxy_urls_encode_the_whole_path() {
        assert_eq!(
            proxy_url("Trip 1/beach&sun.jpg"),
            "/api/nextcloud/file?path=Trip%201%2Fbeach%26sun.jpg"
        );
    }
}
