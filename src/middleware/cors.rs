use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// The browser client is served from another origin; the API is open.
pub fn api_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any)
}
