//! catalog-api — HTTP API for the shop's brand and type catalogs.
//!
//! Endpoints:
//! - `POST /api/brand`, `GET /api/brand` — create / list brands
//! - `POST /api/type`,  `GET /api/type`  — create / list types
//!
//! Storage is in-memory or SQLite (file) when the `sqlite` feature is enabled.
//! Failures are classified (bad request, conflict, internal) and rendered as
//! `{"error": {"code", "message"}}` bodies.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p catalog-api
//!
//! # ephemeral storage, JSON logs
//! STORAGE_PROVIDER=memory LOG_FORMAT=json cargo run -p catalog-api
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.
//!

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, Uri};
use axum::{extract::State, routing::get, Json, Router};
use domain::adapters::memory_repo::InMemoryRepo;
use domain::service::CatalogService;
use domain::{CatalogEntity, CatalogKind, CatalogRepository, Clock, CoreError, EntityName};
use http_common::ApiError;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Local repo abstraction supporting memory or sqlite (feature-gated).
enum RepoKind {
    Memory(InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite_adapter::SqliteRepo),
}

#[derive(Clone)]
struct AnyRepo {
    kind: Arc<RepoKind>,
}

impl AnyRepo {
    fn memory() -> Self {
        Self {
            kind: Arc::new(RepoKind::Memory(InMemoryRepo::new())),
        }
    }

    #[cfg(feature = "sqlite")]
    fn sqlite(path: &std::path::Path) -> Result<Self, CoreError> {
        Ok(Self {
            kind: Arc::new(RepoKind::Sqlite(
                sqlite_adapter::SqliteRepo::open_creating_dirs(path)?,
            )),
        })
    }
}

impl CatalogRepository for AnyRepo {
    fn create(
        &self,
        kind: CatalogKind,
        name: &EntityName,
        at: SystemTime,
    ) -> Result<CatalogEntity, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.create(kind, name, at),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.create(kind, name, at),
        }
    }

    fn find_all(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.find_all(kind),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.find_all(kind),
        }
    }
}

#[derive(Clone)]
struct StdClock;
impl Clock for StdClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[derive(Clone)]
struct AppState {
    catalog: Arc<CatalogService<AnyRepo, StdClock>>,
}

impl AppState {
    fn new(repo: AnyRepo) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(repo, StdClock)),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_ephemeral();

    let repo = match build_repo(&cfg) {
        Ok(r) => r,
        Err(e) => {
            error!(err = %e, db_path = %cfg.db_path.display(), "failed to open storage");
            std::process::exit(1);
        }
    };
    let app = build_app(AppState::new(repo), cfg.cors_allow_origin.clone());

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "bind failed");
            std::process::exit(1);
        }
    };
    info!(%addr, "catalog-api listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct a repository instance based on config and feature flags.
fn build_repo(cfg: &config::Config) -> Result<AnyRepo, CoreError> {
    match cfg.storage_provider {
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => AnyRepo::sqlite(&cfg.db_path),
        _ => Ok(AnyRepo::memory()),
    }
}

/// Routes for both catalogs, without middleware.
fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/brand", get(list_brands).post(create_brand))
        .route("/api/type", get(list_types).post(create_type))
        .fallback(not_found)
        .with_state(state)
}

/// Full application: routes plus request-id, tracing and CORS layers.
fn build_app(state: AppState, cors_allow_origin: HeaderValue) -> Router {
    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let app = routes(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // CORS - already validated in Config::from_env()
    let cors = if cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cors_allow_origin]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    app.layer(cors)
}

#[derive(Deserialize)]
struct CreateEntityReq {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntityOut {
    id: u64,
    name: EntityName,
    created_at: String,
    updated_at: String,
}

fn entity_to_out(e: CatalogEntity) -> EntityOut {
    EntityOut {
        id: e.id,
        name: e.name,
        created_at: http_common::system_time_to_rfc3339(e.created_at),
        updated_at: http_common::system_time_to_rfc3339(e.updated_at),
    }
}

/// Map a domain failure to the error the client sees.
///
/// Input problems stay client errors; storage failures become 500s and are
/// logged with the real cause, which is not echoed back.
fn translate(kind: CatalogKind, err: CoreError) -> ApiError {
    match err {
        CoreError::InvalidName(msg) => {
            warn!(kind = %kind, reason = %msg, "create rejected");
            ApiError::bad_request(msg)
        }
        CoreError::AlreadyExists => {
            warn!(kind = %kind, "create conflict");
            ApiError::conflict(format!("{} with this name already exists", kind))
        }
        CoreError::Repository(msg) => {
            error!(kind = %kind, err = %msg, "storage error");
            ApiError::internal("server error")
        }
    }
}

fn create_entity(
    state: &AppState,
    kind: CatalogKind,
    payload: Result<Json<CreateEntityReq>, JsonRejection>,
) -> Result<Json<EntityOut>, ApiError> {
    let Json(body) = payload.map_err(|rej| {
        warn!(kind = %kind, reason = %rej.body_text(), "unreadable create body");
        ApiError::bad_request(rej.body_text())
    })?;
    let entity = state
        .catalog
        .create(kind, body.name.as_deref())
        .map_err(|e| translate(kind, e))?;
    info!(kind = %kind, id = entity.id, name = %entity.name, "create ok");
    Ok(Json(entity_to_out(entity)))
}

fn list_entities(state: &AppState, kind: CatalogKind) -> Result<Json<Vec<EntityOut>>, ApiError> {
    let rows = state.catalog.list(kind).map_err(|e| translate(kind, e))?;
    info!(kind = %kind, count = rows.len(), "list ok");
    Ok(Json(rows.into_iter().map(entity_to_out).collect()))
}

async fn create_brand(
    State(state): State<AppState>,
    payload: Result<Json<CreateEntityReq>, JsonRejection>,
) -> Result<Json<EntityOut>, ApiError> {
    create_entity(&state, CatalogKind::Brand, payload)
}

async fn list_brands(State(state): State<AppState>) -> Result<Json<Vec<EntityOut>>, ApiError> {
    list_entities(&state, CatalogKind::Brand)
}

async fn create_type(
    State(state): State<AppState>,
    payload: Result<Json<CreateEntityReq>, JsonRejection>,
) -> Result<Json<EntityOut>, ApiError> {
    create_entity(&state, CatalogKind::Type, payload)
}

async fn list_types(State(state): State<AppState>) -> Result<Json<Vec<EntityOut>>, ApiError> {
    list_entities(&state, CatalogKind::Type)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no route for {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app() -> Router {
        routes(AppState::new(AnyRepo::memory()))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_and_list_brand_flow() {
        let router = app();

        // Empty table lists nothing
        let resp = router.clone().oneshot(get_req("/api/brand")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!([]));

        // Create
        let resp = router
            .clone()
            .oneshot(post_json("/api/brand", r#"{"name":"Nike"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let created = body_json(resp).await;
        assert_eq!(created["id"], 1);
        assert_eq!(created["name"], "Nike");
        assert!(created["createdAt"].is_string());
        assert_eq!(created["createdAt"], created["updatedAt"]);

        // List
        let resp = router.clone().oneshot(get_req("/api/brand")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let listed = body_json(resp).await;
        assert_eq!(listed, json!([created]));
    }

    #[tokio::test]
    async fn type_controller_is_independent_of_brand() {
        let router = app();
        for name in ["Phones", "Laptops"] {
            let resp = router
                .clone()
                .oneshot(post_json("/api/type", &json!({ "name": name }).to_string()))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
        let resp = router
            .clone()
            .oneshot(post_json("/api/brand", r#"{"name":"Phones"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["id"], 1);

        let types = body_json(router.clone().oneshot(get_req("/api/type")).await.unwrap()).await;
        let names: Vec<&str> = types
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Phones", "Laptops"]);

        let brands = body_json(router.oneshot(get_req("/api/brand")).await.unwrap()).await;
        assert_eq!(brands.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_name_is_bad_request_and_stores_nothing() {
        let router = app();
        let resp = router
            .clone()
            .oneshot(post_json("/api/brand", r#"{"title":"Nike"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({"error": {"code": "bad_request", "message": "name is required"}})
        );

        let listed = body_json(router.oneshot(get_req("/api/brand")).await.unwrap()).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn blank_or_null_name_is_bad_request() {
        let router = app();
        for body in [r#"{"name":"   "}"#, r#"{"name":null}"#] {
            let resp = router
                .clone()
                .oneshot(post_json("/api/type", body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
            assert_eq!(body_json(resp).await["error"]["code"], "bad_request");
        }
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let router = app();
        for body in ["{not json", r#"{"name": 42}"#] {
            let resp = router
                .clone()
                .oneshot(post_json("/api/brand", body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
            let err = body_json(resp).await;
            assert_eq!(err["error"]["code"], "bad_request");
            assert!(!err["error"]["message"].as_str().unwrap().is_empty());
        }

        // No content-type header at all
        let req = Request::builder()
            .method("POST")
            .uri("/api/brand")
            .body(Body::from(r#"{"name":"Nike"}"#))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_name_is_conflict() {
        let router = app();
        let resp = router
            .clone()
            .oneshot(post_json("/api/brand", r#"{"name":"Nike"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = router
            .clone()
            .oneshot(post_json("/api/brand", r#"{"name":"Nike"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(resp).await,
            json!({"error": {"code": "conflict", "message": "brand with this name already exists"}})
        );
    }

    #[tokio::test]
    async fn list_is_idempotent() {
        let router = app();
        for name in ["Apple", "Samsung", "Xiaomi"] {
            router
                .clone()
                .oneshot(post_json("/api/brand", &json!({ "name": name }).to_string()))
                .await
                .unwrap();
        }
        let a = body_json(router.clone().oneshot(get_req("/api/brand")).await.unwrap()).await;
        let b = body_json(router.oneshot(get_req("/api/brand")).await.unwrap()).await;
        assert_eq!(a.as_array().unwrap().len(), 3);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn padded_name_is_stored_trimmed() {
        let router = app();
        let resp = router
            .clone()
            .oneshot(post_json("/api/type", r#"{"name":"  Smart Watches \t"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["name"], "Smart Watches");

        let listed = body_json(router.clone().oneshot(get_req("/api/type")).await.unwrap()).await;
        assert_eq!(listed[0]["name"], "Smart Watches");

        // The trimmed form is what uniqueness is checked against
        let resp = router
            .oneshot(post_json("/api/type", r#"{"name":"Smart Watches"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn sqlite_storage_create_and_list_flow() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("data").join("catalog.db");
        let db_path_str = db_path.to_string_lossy().into_owned();
        let cfg = config::Config::from_lookup(|key: &str| match key {
            "STORAGE_PROVIDER" => Some("sqlite".to_string()),
            "DB_PATH" => Some(db_path_str.clone()),
            _ => None,
        })
        .unwrap();

        let router = routes(AppState::new(build_repo(&cfg).unwrap()));
        let resp = router
            .clone()
            .oneshot(post_json("/api/brand", r#"{"name":"Nike"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let created = body_json(resp).await;
        assert_eq!(created["id"], 1);

        let listed = body_json(router.oneshot(get_req("/api/brand")).await.unwrap()).await;
        assert_eq!(listed, json!([created]));
        assert!(db_path.exists());

        // A second app on the same file sees the stored row
        let reopened = routes(AppState::new(build_repo(&cfg).unwrap()));
        let listed = body_json(reopened.oneshot(get_req("/api/brand")).await.unwrap()).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["name"], "Nike");
    }

    #[tokio::test]
    async fn unknown_route_is_structured_404() {
        let resp = app().oneshot(get_req("/api/device")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"]["code"], "not_found");
    }

    #[test]
    fn storage_failure_translates_to_internal() {
        let err = translate(
            CatalogKind::Type,
            CoreError::Repository("sqlite error: disk I/O error".into()),
        );
        assert_eq!(err, ApiError::internal("server error"));
    }

    #[tokio::test]
    async fn full_app_sets_request_id() {
        let app = build_app(
            AppState::new(AnyRepo::memory()),
            HeaderValue::from_static("*"),
        );
        let resp = app.oneshot(get_req("/api/type")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
    }
}
