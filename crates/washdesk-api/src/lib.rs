pub mod config;
pub mod error;
pub mod middleware;
pub mod retention;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{logging, rate_limit};
use crate::routes::{admin, docs, health, send, testing, twilio, upload, webhooks};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Provider callbacks share one per-IP budget
    let webhook_routes = Router::new()
        .route("/webhook/gupshup", any(webhooks::gupshup_message))
        .route("/webhook/gupshup/events", any(webhooks::gupshup_events))
        .route("/webhook/gupshup/users", any(webhooks::gupshup_users))
        .route("/webhook", post(twilio::twilio_webhook))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), rate_limit::limit_webhooks));

    let relay_routes = Router::new()
        .route("/send-gupshup", post(send::send_gupshup))
        .route("/send-whatsapp", post(send::send_whatsapp))
        .route(
            "/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(upload::BODY_LIMIT_BYTES)),
        )
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), rate_limit::limit_relay));

    Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/gupshup-status", get(health::gupshup_status))
        .route("/twilio-status", get(twilio::twilio_status))
        // Admin
        .route("/admin/conversations/:id", get(admin::get_conversation))
        .route("/admin/stats/messages", get(admin::message_stats))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/users/:phone/messages", get(admin::user_messages))
        // Development
        .route("/test/webhook", post(testing::echo_webhook))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .merge(webhook_routes)
        .merge(relay_routes)
        .fallback(routes::not_found)
        .layer(axum_middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(state.config.server.request_timeout_secs)))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let mut cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors = cors.allow_origin(Any);
        } else {
            for origin in &config.cors.origins {
                if let Ok(parsed_origin) = origin.parse::<axum::http::HeaderValue>() {
                    cors = cors.allow_origin(parsed_origin);
                }
            }
        }

        cors
    } else {
        CorsLayer::permissive()
    }
}
