use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use config::Config;
use services::check_in::CheckInService;

#[derive(Clone)]
pub struct AppState {
    pub check_ins: CheckInService,
    pub config: Arc<Config>,
}

pub fn build_router(state: AppState) -> Router {
    let check_in_routes = Router::new()
        .route("/:userId", post(handlers::check_ins::create_check_in))
        .route("/:userId/today", get(handlers::check_ins::get_today_check_in))
        .route(
            "/:userId/history",
            get(handlers::check_ins::get_check_in_history),
        );

    let api = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .nest("/checkins", check_in_routes);

    Router::new()
        .nest("/api/v1", api)
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let origin = if allowed_origins.trim() == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .filter_map(|o| {
                let o = o.trim();
                match o.parse::<HeaderValue>() {
                    Ok(hv) if !o.is_empty() => Some(hv),
                    _ => {
                        tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                        None
                    }
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}
