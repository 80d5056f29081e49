pub mod config;
pub mod credential;
pub mod error;
pub mod handlers;
pub mod payloads;
pub mod providers;
pub mod session;
pub mod state;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use handlers::*;
use session::session_middleware;

pub use config::ServerConfig;
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/session", get(get_session).delete(end_session))
        .route("/credential", post(set_credential).delete(clear_credential))
        .route("/upload", post(upload_document))
        .route("/ask", post(ask_question))
        .route("/history/clear", post(clear_history))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state)
}
