//! REST API for the load planner.
//!
//! Provides HTTP endpoints for the loading form and the 3D viewer.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::catalog::{DemandLine, PartDefinition, SetDefinition, build_catalog, demand_summary};
use crate::config::{ApiConfig, ContainerDefaults, OptimizerConfig};
use crate::model::{CargoItem, ConfigurationError, Container};
use crate::optimizer::{PackingConfig, UnplacedItem};
use crate::planner::{LoadPlan, PlanMetrics, PlanPhase, plan_load, plan_load_with_progress};
use crate::report::{ExportRow, OrientationLabel, PlacementRecord};

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
    container_defaults: ContainerDefaults,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>load_planner API Docs</title>
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
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Container of a plan request, in cm and kg.
#[derive(Deserialize, Clone, ToSchema)]
pub struct ContainerRequest {
    #[schema(value_type = [f64; 3], example = json!([245.0, 1360.0, 270.0]))]
    pub dims: (f64, f64, f64),
    /// Door clearance taken off the depth
    #[serde(default)]
    pub clearance: f64,
    pub max_weight: f64,
}

impl ContainerRequest {
    fn into_container(self) -> Result<Container, ConfigurationError> {
        Container::new(self.dims, self.clearance, self.max_weight)
    }
}

/// Request structure for the planning endpoints.
///
/// Without `container` the configured default trailer is used.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "container": { "dims": [245.0, 1360.0, 270.0], "clearance": 30.0, "max_weight": 26000.0 },
        "sets": [
            {
                "name": "Gold Set",
                "quantity": 60,
                "parts": [
                    { "sub_type": "base", "dims": [90.0, 190.0, 28.0], "weight": 40.0, "load_bearing": 100.0 },
                    { "sub_type": "headboard", "dims": [90.0, 100.0, 10.0], "weight": 15.0, "load_bearing": 100.0 },
                    { "sub_type": "mattress", "dims": [90.0, 190.0, 25.0], "weight": 20.0, "load_bearing": 0.0 }
                ]
            }
        ],
        "allow_rotations": true
    })
)]
pub struct PlanRequest {
    #[serde(default)]
    #[schema(nullable = true)]
    pub container: Option<ContainerRequest>,
    pub sets: Vec<SetDefinition>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_rotations: Option<bool>,
}

#[derive(Debug)]
struct ValidatedPlanRequest {
    container: Container,
    catalog: Vec<CargoItem>,
    allow_rotations: Option<bool>,
}

impl ValidatedPlanRequest {
    fn packing_config(&self, base: PackingConfig) -> PackingConfig {
        let mut config = base;
        if let Some(allow_rotations) = self.allow_rotations {
            config.allow_rotation = allow_rotations;
        }
        config
    }
}

#[derive(Debug)]
enum PlanRequestValidationError {
    MissingSets,
    InvalidContainer(ConfigurationError),
    InvalidCatalog(ConfigurationError),
}

impl PlanRequest {
    fn into_validated(
        self,
        defaults: &ContainerDefaults,
    ) -> Result<ValidatedPlanRequest, PlanRequestValidationError> {
        if self.sets.is_empty() {
            return Err(PlanRequestValidationError::MissingSets);
        }

        let container = match self.container {
            Some(request) => request.into_container(),
            None => defaults.container(),
        }
        .map_err(PlanRequestValidationError::InvalidContainer)?;

        let catalog =
            build_catalog(&self.sets).map_err(PlanRequestValidationError::InvalidCatalog)?;

        Ok(ValidatedPlanRequest {
            container,
            catalog,
            allow_rotations: self.allow_rotations,
        })
    }
}

/// Response structure of a complete plan.
///
/// # Fields
/// * `satisfied_groups` - Sets that are loaded completely
/// * `excluded_groups` - Sets left out of the final layout
/// * `placed` - Render records of the final layout
/// * `export` - Flat rows for tabular export
#[derive(Serialize, ToSchema)]
pub struct PlanResponse {
    pub total_groups: usize,
    pub phase_one_satisfied: usize,
    pub satisfied_groups: usize,
    pub excluded_groups: usize,
    pub metrics: PlanMetrics,
    pub net_capacity_m3: f64,
    pub placed: Vec<PlacementRecord>,
    pub export: Vec<ExportRow>,
    pub unplaced: Vec<UnplacedRecord>,
    pub timed_out: bool,
}

/// Item of the final catalog that was not placed.
#[derive(Serialize, ToSchema)]
pub struct UnplacedRecord {
    pub id: String,
    pub group_id: String,
    pub sub_type: String,
    pub weight: f64,
    #[schema(value_type = [f64; 3], example = json!([90.0, 190.0, 25.0]))]
    pub dims: (f64, f64, f64),
    pub reason_code: String,
    pub reason: String,
}

impl From<&UnplacedItem> for UnplacedRecord {
    fn from(entry: &UnplacedItem) -> Self {
        Self {
            id: entry.item.id.clone(),
            group_id: entry.item.group_id.clone(),
            sub_type: entry.item.sub_type.clone(),
            weight: entry.item.weight,
            dims: entry.item.dims,
            reason_code: entry.reason.code().to_string(),
            reason: entry.reason.to_string(),
        }
    }
}

impl PlanResponse {
    pub fn from_plan(plan: &LoadPlan, container: &Container) -> Self {
        Self {
            total_groups: plan.total_groups,
            phase_one_satisfied: plan.phase_one_satisfied,
            satisfied_groups: plan.satisfied_groups,
            excluded_groups: plan.excluded_groups,
            metrics: plan.metrics.clone(),
            net_capacity_m3: container.net_capacity_m3(),
            placed: plan.placement_records(),
            export: plan.export_rows(),
            unplaced: plan.result.unplaced.iter().map(UnplacedRecord::from).collect(),
            timed_out: plan.timed_out,
        }
    }
}

/// Request of the catalog summary endpoint.
#[derive(Deserialize, ToSchema)]
pub struct CatalogSummaryRequest {
    pub sets: Vec<SetDefinition>,
}

/// Volume of one set definition.
#[derive(Serialize, ToSchema)]
pub struct SetVolume {
    pub name: String,
    pub quantity: usize,
    pub set_volume_m3: f64,
    pub total_volume_m3: f64,
}

/// Requested units per part type plus set volumes.
#[derive(Serialize, ToSchema)]
pub struct CatalogSummaryResponse {
    pub item_count: usize,
    pub demand: Vec<DemandLine>,
    pub sets: Vec<SetVolume>,
    pub total_volume_m3: f64,
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

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn container_config_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid container configuration",
        details,
    )
}

fn parse_plan_request(
    payload: Result<Json<PlanRequest>, JsonRejection>,
    defaults: &ContainerDefaults,
) -> Result<ValidatedPlanRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    match payload.into_validated(defaults) {
        Ok(validated) => Ok(validated),
        Err(PlanRequestValidationError::MissingSets) => Err(validation_error(
            "At least one set definition must be specified",
        )),
        Err(PlanRequestValidationError::InvalidContainer(err)) => {
            Err(container_config_error(err.to_string()))
        }
        Err(PlanRequestValidationError::InvalidCatalog(err)) => {
            Err(validation_error(err.to_string()))
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_plan, handle_plan_stream, handle_catalog_summary),
    components(
        schemas(
            PlanRequest,
            ContainerRequest,
            SetDefinition,
            PartDefinition,
            PlanResponse,
            PlanMetrics,
            PlanPhase,
            PlacementRecord,
            ExportRow,
            OrientationLabel,
            UnplacedRecord,
            CatalogSummaryRequest,
            CatalogSummaryResponse,
            DemandLine,
            SetVolume,
            ErrorResponse
        )
    ),
    tags((name = "planning", description = "Endpoints for container load planning"))
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from the frontend.
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    optimizer_config: OptimizerConfig,
    container_defaults: ContainerDefaults,
) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        optimizer_config,
        container_defaults,
    };

    let app = Router::new()
        .route("/plan", post(handle_plan))
        .route("/plan_stream", post(handle_plan_stream))
        .route("/catalog/summary", post(handle_catalog_summary))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        info!("Local access: http://localhost:{}", config.port());
    }
    info!("API endpoints: POST /plan, POST /plan_stream, POST /catalog/summary");
    info!("Documentation: GET /docs, GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        error!("API server terminated with an error: {err}");
    }
}

/// Handler for POST /plan endpoint.
///
/// Expands the set definitions, runs both packing phases and returns the
/// final layout with its metrics.
#[utoipa::path(
    post,
    path = "/plan",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Load plan computed", body = PlanResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "planning"
)]
async fn handle_plan(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_plan_request(payload, &state.container_defaults) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let config = request.packing_config(state.optimizer_config.packing_config());
    info!(
        "New plan request: {} items, container {:?}, rotations {}",
        request.catalog.len(),
        request.container.dims,
        config.allow_rotation
    );

    let ValidatedPlanRequest {
        container, catalog, ..
    } = request;
    let outcome = tokio::task::spawn_blocking(move || {
        plan_load(&container, &catalog, &config).map(|plan| (plan, container))
    })
    .await;

    match outcome {
        Ok(Ok((plan, container))) => {
            info!(
                "Result: {} of {} sets loaded, utilization {:.1}%",
                plan.satisfied_groups, plan.total_groups, plan.metrics.utilization_percent
            );
            let response = PlanResponse::from_plan(&plan, &container);
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(err)) => validation_error(err.to_string()),
        Err(err) => {
            error!("Planning task failed: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Planning failed",
                err.to_string(),
            )
        }
    }
}

/// Handler for POST /plan_stream endpoint (SSE).
///
/// Streams plan events of both phases in real-time as Server-Sent Events
/// (text/event-stream), so the viewer can animate the loading.
#[utoipa::path(
    post,
    path = "/plan_stream",
    request_body = PlanRequest,
    responses(
        (
            status = 200,
            description = "Streams plan events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "planning"
)]
async fn handle_plan_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_plan_request(payload, &state.container_defaults) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let config = request.packing_config(state.optimizer_config.packing_config());
    let ValidatedPlanRequest {
        container, catalog, ..
    } = request;

    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        let outcome = plan_load_with_progress(&container, &catalog, &config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver only means the client went away
                let _ = tx.blocking_send(json);
            }
        });
        if let Err(err) = outcome {
            warn!("Streamed plan aborted: {err}");
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /catalog/summary endpoint.
///
/// Counts the requested units per set and part type and reports the set
/// volumes, without packing anything.
#[utoipa::path(
    post,
    path = "/catalog/summary",
    request_body = CatalogSummaryRequest,
    responses(
        (status = 200, description = "Catalog summary", body = CatalogSummaryResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid set definitions",
            body = ErrorResponse
        )
    ),
    tag = "planning"
)]
async fn handle_catalog_summary(
    payload: Result<Json<CatalogSummaryRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    match summarize_catalog(&request.sets) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => validation_error(err.to_string()),
    }
}

fn summarize_catalog(sets: &[SetDefinition]) -> Result<CatalogSummaryResponse, ConfigurationError> {
    let catalog = build_catalog(sets)?;
    let set_volumes: Vec<SetVolume> = sets
        .iter()
        .map(|set| SetVolume {
            name: set.name.clone(),
            quantity: set.quantity,
            set_volume_m3: set.set_volume_m3(),
            total_volume_m3: set.total_volume_m3(),
        })
        .collect();

    Ok(CatalogSummaryResponse {
        item_count: catalog.len(),
        demand: demand_summary(&catalog),
        total_volume_m3: set_volumes
            .iter()
            .map(|s| s.total_volume_m3)
            .fold(0.0, |acc, v| acc + v),
        sets: set_volumes,
    })
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
