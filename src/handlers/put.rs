use crate::error::ApiError;
use crate::models::PutValueRequest;
use crate::routes;
use crate::state::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode};

/// PUT / handler - Store a value under a key
///
/// The body is decoded as JSON whatever its content type, so clients that
/// omit the header still work. A body that is not an object with string
/// `name` and `value` is answered with 500, like a store failure.
#[utoipa::path(
    put,
    path = routes::INDEX,
    request_body = PutValueRequest,
    responses(
        (status = 204, description = "Value stored"),
        (status = 500, description = "Malformed body or store error", body = String, content_type = "text/html")
    ),
    tag = "kv"
)]
pub async fn put_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    tracing::info!("set var");

    let request = PutValueRequest::from_json(&body)?;

    state.store.set(&request.name, &request.value).await?;

    tracing::info!("Successfully stored key: {}", request.name);
    Ok(StatusCode::NO_CONTENT)
}
