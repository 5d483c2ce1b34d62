pub mod attempts;
pub mod feedback;
pub mod health;
pub mod interviews;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{cors::api_cors, rate_limit};
use crate::AppState;

/// Full API surface. Routes that call the language model share one
/// requests-per-second budget.
pub fn app(state: AppState, public_rps: u32) -> Router {
    let model_routes = Router::new()
        .route("/api/vapi/generate", post(interviews::generate_interview))
        .route("/api/interviews/generate", post(interviews::generate_interview))
        .route("/api/interviews/evaluate", post(interviews::evaluate_answer))
        .route(
            "/api/interviews/random",
            get(interviews::random_interviews).post(interviews::regenerate_random_interview),
        )
        .route(
            "/api/feedback",
            get(feedback::get_feedback).post(feedback::create_feedback),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RateLimiter::new(public_rps),
            rate_limit::rps_middleware,
        ));

    let data_routes = Router::new()
        .route("/api/interviews/user", get(interviews::user_interviews))
        .route("/api/interviews/latest", get(interviews::latest_interviews))
        .route(
            "/api/interviews/attempt",
            get(attempts::list_attempts).post(attempts::save_attempt),
        )
        .route("/api/interviews/:id", get(interviews::get_interview));

    Router::new()
        .route("/health", get(health::health))
        .merge(model_routes)
        .merge(data_routes)
        .with_state(state)
        .layer(api_cors())
        .layer(TraceLayer::new_for_http())
}
