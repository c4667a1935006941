use crate::app::assembler::RecordAssembler;
use crate::app::ports::{
    AuthenticatorPort, DocumentStorePort, HttpClientPort, MetadataResolverPort,
    RequestValidatorPort, SignedRequest,
};
use crate::app::prober::EndpointProber;
use crate::app::refresh_use_case::{AgeFilter, RefreshOrchestrator, RefreshSummary};
use crate::app::registration_use_case::RegistrationService;
use crate::config::Config;
use crate::constants::{
    CLIENT_HEADER, MAX_REQUEST_BODY_BYTES, SIGNATURE_HEADER, TIMESTAMP_HEADER, UNPARSABLE_JSON,
};
use crate::error::{RegistryError, Result};
use crate::infra::http_client::ReqwestHttp;
use crate::infra::in_memory_store::InMemoryDocumentStore;
use crate::infra::metadata_resolver::CatalogueMetadataResolver;
use crate::infra::schema_validator::JsonSchemaValidator;
use crate::infra::signature::{OpenAuthenticator, SharedSecretAuthenticator};
use crate::infra::sqlite_store::SqliteDocumentStore;
use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{Method, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use http_body::{LengthLimitError, Limited};
use hyper::Server;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Services shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<RegistrationService>,
    pub refresh: Arc<RefreshOrchestrator>,
    pub auth: Arc<dyn AuthenticatorPort>,
}

impl AppState {
    pub fn new(
        http: Arc<dyn HttpClientPort>,
        store: Arc<dyn DocumentStorePort>,
        validator: Arc<dyn RequestValidatorPort>,
        metadata: Arc<dyn MetadataResolverPort>,
        auth: Arc<dyn AuthenticatorPort>,
    ) -> Self {
        let assembler = Arc::new(RecordAssembler::new(EndpointProber::new(http), metadata));
        Self {
            registration: Arc::new(RegistrationService::new(
                validator,
                assembler.clone(),
                store.clone(),
            )),
            refresh: Arc::new(RefreshOrchestrator::new(assembler, store)),
            auth,
        }
    }

    /// Wire the production adapters described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http: Arc<dyn HttpClientPort> = Arc::new(
            ReqwestHttp::new(Duration::from_secs(config.http.timeout_seconds))
                .map_err(|e| RegistryError::Config(format!("Failed to build HTTP client: {e}")))?,
        );
        let store: Arc<dyn DocumentStorePort> = match &config.storage.path {
            Some(path) => {
                info!("Using SQLite document store at {}", path.display());
                Arc::new(SqliteDocumentStore::open(path)?)
            }
            None => {
                warn!("No storage.path configured, records are kept in memory only");
                Arc::new(InMemoryDocumentStore::new())
            }
        };
        let metadata = Arc::new(CatalogueMetadataResolver::new(
            http.clone(),
            config.metadata.clone(),
        ));
        let auth: Arc<dyn AuthenticatorPort> = if config.auth.enabled {
            Arc::new(SharedSecretAuthenticator::new(
                config.auth.clients.clone(),
                config.auth.max_skew_seconds,
            ))
        } else {
            warn!("Request signature checks are disabled");
            Arc::new(OpenAuthenticator)
        };
        Ok(Self::new(
            http,
            store,
            Arc::new(JsonSchemaValidator::new()?),
            metadata,
            auth,
        ))
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let status = match &self {
            RegistryError::Validation(_)
            | RegistryError::Metadata(_)
            | RegistryError::TypeMismatch(_)
            | RegistryError::StaleRecord
            | RegistryError::InvalidAgeFilter(_) => StatusCode::BAD_REQUEST,
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let RegistryError::InvalidAgeFilter(msg) = &self {
            return (status, Json(json!({ "error": msg }))).into_response();
        }
        if !self.is_user_facing() {
            error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "errors": self.messages() }))).into_response()
    }
}

fn parse_json(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| {
        info!(error = %e, "Rejected unparsable request body");
        RegistryError::Validation(vec![UNPARSABLE_JSON.to_string()])
    })
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "layer_registry",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn register(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let request = parse_json(&body)?;
    let key = state.registration.create(&key, &request).await?;
    Ok((StatusCode::CREATED, key))
}

async fn update(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let payload = parse_json(&body)?;
    let key = state.registration.update(&key, &payload).await?;
    Ok((StatusCode::OK, key))
}

async fn remove(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.registration.delete(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn refresh(
    State(state): State<AppState>,
    Path(arg): Path<String>,
) -> Result<Json<RefreshSummary>> {
    let filter: AgeFilter = arg.parse()?;
    Ok(Json(state.refresh.refresh(filter).await?))
}

/// Rejects requests whose signature does not verify, before any handler runs.
///
/// Bodies are read up to `MAX_REQUEST_BODY_BYTES`; anything larger is refused with 413.
async fn require_signature(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next<Body>,
) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = match hyper::body::to_bytes(Limited::new(body, MAX_REQUEST_BODY_BYTES)).await {
        Ok(bytes) => bytes,
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!(method = %parts.method, path = %parts.uri.path(), "Rejected oversized request body");
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "errors": ["Request body too large"] })),
            )
                .into_response();
        }
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let verified = {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
        state.auth.verify(&SignedRequest {
            method: parts.method.as_str(),
            path: parts.uri.path(),
            client_id: header(CLIENT_HEADER),
            timestamp: header(TIMESTAMP_HEADER),
            signature: header(SIGNATURE_HEADER),
            body: &bytes,
        })
    };
    if !verified {
        warn!(method = %parts.method, path = %parts.uri.path(), "Rejected unsigned or badly signed request");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "errors": ["Invalid request signature"] })),
        )
            .into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Create the HTTP router with all registry routes
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let registry = Router::new()
        .route("/refresh/:arg", post(refresh))
        .route("/:key", put(register).post(update).delete(remove))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_signature));

    Router::new()
        .route("/health", get(health))
        .merge(registry)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Start the HTTP server on `addr`, stopping on Ctrl-C
pub async fn start_server(state: AppState, addr: SocketAddr) -> std::result::Result<(), hyper::Error> {
    let app = create_server(state);
    info!("Registry listening on http://{}", addr);
    Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}
