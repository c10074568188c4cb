use utoipa::OpenApi;

use crate::handlers;
use crate::models::PutValueRequest;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rust-storage-kv API",
        version = "1.0.0",
        description = "A minimal string key-value store backed by a relational storage table"
    ),
    paths(
        handlers::index::index_handler,
        handlers::put::put_handler,
        handlers::get::get_handler
    ),
    components(
        schemas(PutValueRequest)
    ),
    tags(
        (name = "kv", description = "Key-value store operations")
    )
)]
pub struct ApiDoc;
