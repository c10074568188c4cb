use crate::error::ApiError;
use crate::models::render_entry;
use crate::routes;
use crate::state::AppState;
use axum::{extract::Path, extract::State, http::StatusCode, response::Html};

/// GET /{key} handler - Show the value stored under a key
#[utoipa::path(
    get,
    path = routes::ENTRY,
    params(
        ("key" = String, Path, description = "Key to look up")
    ),
    responses(
        (status = 200, description = "Entry found", body = String, content_type = "text/html"),
        (status = 404, description = "Key not found", body = String, content_type = "text/html"),
        (status = 500, description = "Store error", body = String, content_type = "text/html")
    ),
    tag = "kv"
)]
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<(StatusCode, Html<String>), ApiError> {
    tracing::info!("get var {}", key);

    let value = state.store.get(&key).await?;

    tracing::info!("Successfully retrieved key: {}", key);
    Ok((StatusCode::OK, Html(render_entry(&key, &value))))
}
