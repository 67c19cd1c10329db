//! REST API for the label calculator.
//!
//! Provides HTTP endpoints for the batch registration form.
//! Uses Axum as the web framework and supports CORS.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, Query, State};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::calculator::compute_input;
use crate::config::{ApiConfig, CalculatorConfig};
use crate::export::{BatchRecord, ExportError, records_to_csv};
use crate::model::{CalcError, PackingInput, PackingResult};
use crate::suggestions::{SuggestionCache, SuggestionError, SuggestionField, SuggestionItem};
use crate::trace::{PalletLines, TraceLine, TraceLineKind, TraceOptions};

#[derive(Clone)]
struct ApiState {
    calculator_config: CalculatorConfig,
    suggestions: Arc<RwLock<SuggestionCache>>,
}

impl ApiState {
    fn new(calculator_config: CalculatorConfig) -> Self {
        let cache = SuggestionCache::new(calculator_config.suggestion_config());
        Self {
            calculator_config,
            suggestions: Arc::new(RwLock::new(cache)),
        }
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>label-packer API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded Web Assets (HTML, CSS, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Request structure for the calculation endpoint.
///
/// `pallet_lines` overrides the configured trace policy for this request only.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "total_units": 1025,
        "units_per_container": 50,
        "containers_per_pallet": 10,
        "pallet_lines": "auto"
    })
)]
pub struct CalculateRequest {
    pub total_units: i64,
    pub units_per_container: i64,
    pub containers_per_pallet: i64,
    #[serde(default)]
    #[schema(nullable = true)]
    pub pallet_lines: Option<PalletLines>,
}

impl CalculateRequest {
    fn packing_input(&self) -> PackingInput {
        PackingInput::new(
            self.total_units,
            self.units_per_container,
            self.containers_per_pallet,
        )
    }
}

/// Calculation result as shown in the result panel.
#[derive(Serialize, ToSchema)]
pub struct CalculationResponse {
    pub total_units: u64,
    pub units_per_container: u64,
    pub containers_per_pallet: u64,
    pub full_containers: u64,
    pub remainder_units: u64,
    pub extra_container_needed: bool,
    /// Labels to print
    pub total_containers: u64,
    pub full_pallets: u64,
    pub remainder_containers: u64,
    pub total_pallets: u64,
    pub label_summary: String,
    pub trace: Vec<TraceLine>,
    pub trace_text: String,
}

impl CalculationResponse {
    /// Creates a CalculationResponse from a PackingResult.
    pub fn from_packing_result(result: &PackingResult, options: TraceOptions) -> Self {
        let trace: Vec<TraceLine> = result.derivation_trace.render(options).cloned().collect();
        let trace_text = result.trace_text(options);

        Self {
            total_units: result.input.total_units(),
            units_per_container: result.input.units_per_container(),
            containers_per_pallet: result.input.containers_per_pallet(),
            full_containers: result.full_containers,
            remainder_units: result.remainder_units,
            extra_container_needed: result.extra_container_needed,
            total_containers: result.total_containers,
            full_pallets: result.full_pallets,
            remainder_containers: result.remainder_containers,
            total_pallets: result.total_pallets,
            label_summary: result.label_summary(),
            trace,
            trace_text,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ExportRequest {
    pub records: Vec<BatchRecord>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestionQuery {
    /// Text typed so far
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize, ToSchema)]
pub struct SuggestionResponse {
    pub field: SuggestionField,
    pub suggestions: Vec<SuggestionItem>,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordSuggestionRequest {
    pub value: String,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn invalid_argument(err: CalcError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        err.to_string(),
    )
}

fn export_error(err: ExportError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid batch record",
        err.to_string(),
    )
}

fn suggestion_error(err: SuggestionError) -> Response {
    match err {
        SuggestionError::UnknownField(_) => {
            error_response(StatusCode::NOT_FOUND, "Unknown field", err.to_string())
        }
        SuggestionError::EmptyValue => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            err.to_string(),
        ),
    }
}

fn unwrap_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(payload)) => Ok(payload),
        Err(err) => Err(json_deserialize_error(err)),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_calculate, handle_export_csv, handle_suggest, handle_record_suggestion),
    components(
        schemas(
            CalculateRequest,
            CalculationResponse,
            ExportRequest,
            BatchRecord,
            SuggestionResponse,
            SuggestionItem,
            SuggestionField,
            RecordSuggestionRequest,
            ErrorResponse,
            PackingInput,
            PalletLines,
            TraceLine,
            TraceLineKind
        )
    ),
    tags(
        (name = "labels", description = "Label and pallet calculation"),
        (name = "suggestions", description = "Autocomplete for batch form fields")
    )
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        // API endpoints
        .route("/calculate", post(handle_calculate))
        .route("/export/csv", post(handle_export_csv))
        .route(
            "/suggestions/{field}",
            get(handle_suggest).post(handle_record_suggestion),
        )
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Web-UI (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from the frontend.
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    calculator_config: CalculatorConfig,
) -> std::io::Result<()> {
    let app = router(ApiState::new(calculator_config));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| {
        error!("❌ Could not bind API server to {}: {}", addr, err);
        err
    })?;

    let display_host = config.display_host().to_string();
    info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("🏷️ API Endpoints: POST /calculate, POST /export/csv, GET|POST /suggestions/{{field}}");
    info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await.map_err(|err| {
        error!("❌ API server terminated with an error: {err}");
        err
    })
}

/// Handler for POST /calculate endpoint.
///
/// Converts a piece count into labels, pallets and a derivation trace.
#[utoipa::path(
    post,
    path = "/calculate",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Calculation succeeded", body = CalculationResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid JSON or non-positive capacity",
            body = ErrorResponse
        )
    ),
    tag = "labels"
)]
async fn handle_calculate(
    State(state): State<ApiState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match unwrap_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = match compute_input(&request.packing_input()) {
        Ok(result) => result,
        Err(err) => {
            warn!("⚠️ Rejected calculation: {}", err);
            return invalid_argument(err);
        }
    };

    let mut options = state.calculator_config.trace_options();
    if let Some(pallet_lines) = request.pallet_lines {
        options.pallet_lines = pallet_lines;
    }

    info!(
        "🏷️ {} pieces -> {} labels, {} pallets",
        result.input.total_units(),
        result.total_containers,
        result.total_pallets
    );

    let response = CalculationResponse::from_packing_result(&result, options);
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /export/csv endpoint.
///
/// Recalculates each record and renders the report as CSV.
#[utoipa::path(
    post,
    path = "/export/csv",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "CSV report", content_type = "text/csv", body = String),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid JSON or invalid record",
            body = ErrorResponse
        )
    ),
    tag = "labels"
)]
async fn handle_export_csv(payload: Result<Json<ExportRequest>, JsonRejection>) -> Response {
    let request = match unwrap_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!("📤 CSV export for {} records", request.records.len());
    match records_to_csv(&request.records) {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(err) => export_error(err),
    }
}

/// Handler for GET /suggestions/{field}.
#[utoipa::path(
    get,
    path = "/suggestions/{field}",
    params(
        ("field" = SuggestionField, Path, description = "Form field"),
        SuggestionQuery
    ),
    responses(
        (status = 200, description = "Ranked suggestions", body = SuggestionResponse),
        (status = NOT_FOUND, description = "Unknown field", body = ErrorResponse)
    ),
    tag = "suggestions"
)]
async fn handle_suggest(
    State(state): State<ApiState>,
    Path(field): Path<String>,
    Query(query): Query<SuggestionQuery>,
) -> Response {
    let field = match field.parse::<SuggestionField>() {
        Ok(field) => field,
        Err(err) => return suggestion_error(err),
    };

    let suggestions = state.suggestions.read().await.suggest(field, &query.q);
    Json(SuggestionResponse { field, suggestions }).into_response()
}

/// Handler for POST /suggestions/{field}.
///
/// Records one use of a value so it ranks higher next time.
#[utoipa::path(
    post,
    path = "/suggestions/{field}",
    params(("field" = SuggestionField, Path, description = "Form field")),
    request_body = RecordSuggestionRequest,
    responses(
        (status = 200, description = "Updated entry", body = SuggestionItem),
        (status = NOT_FOUND, description = "Unknown field", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Empty value", body = ErrorResponse)
    ),
    tag = "suggestions"
)]
async fn handle_record_suggestion(
    State(state): State<ApiState>,
    Path(field): Path<String>,
    payload: Result<Json<RecordSuggestionRequest>, JsonRejection>,
) -> Response {
    let field = match field.parse::<SuggestionField>() {
        Ok(field) => field,
        Err(err) => return suggestion_error(err),
    };
    let request = match unwrap_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let recorded = state.suggestions.write().await.record(field, &request.value);
    match recorded {
        Ok(item) => Json(item).into_response(),
        Err(err) => suggestion_error(err),
    }
}

/// Serves the index.html main page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
