use crate::routes;
use axum::{http::StatusCode, response::Html};

/// GET / handler - Static landing page
#[utoipa::path(
    get,
    path = routes::INDEX,
    responses(
        (status = 200, description = "Landing page", body = String, content_type = "text/html")
    ),
    tag = "kv"
)]
pub async fn index_handler() -> (StatusCode, Html<&'static str>) {
    tracing::info!("main page");
    (StatusCode::OK, Html("<h1>hello world</h1>"))
}
