// Route path constants - single source of truth for all API paths

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::handlers::{get_handler, index_handler, put_handler};
use crate::state::AppState;

pub const INDEX: &str = "/";
pub const ENTRY: &str = "/{key}";
// Kept below /docs/ so they never shadow a single-segment key
pub const SWAGGER_UI: &str = "/docs/swagger-ui";
pub const OPENAPI_JSON: &str = "/docs/openapi.json";

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(INDEX, get(index_handler).put(put_handler))
        .route(ENTRY, get(get_handler))
        .merge(SwaggerUi::new(SWAGGER_UI).url(OPENAPI_JSON, ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
