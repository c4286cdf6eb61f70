// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

pub mod health;
pub mod oauth;
pub mod resources;
pub mod session;
pub mod verification;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{ChannelReport, ChannelStatus};
use crate::github::{RepositorySummary, RepositoryView};
use crate::models::{
    AuthorizationUrlResponse, HandleLookupResponse, SessionStatusResponse,
    VerificationStatusResponse,
};
use crate::state::AppState;
use health::{HealthChecks, HealthResponse, ReadyResponse};

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.frontend_origin);

    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/api/auth/{provider}", get(oauth::initiate))
        .route("/api/auth/{provider}/callback", get(oauth::callback))
        .route("/api/resource/{owner}", get(resources::legacy_resource))
        .route(
            "/api/resource/{owner}/authenticated",
            get(resources::authenticated_resource),
        )
        .route(
            "/api/verify/status/{subject}",
            get(verification::verification_status),
        )
        .route("/api/verify/github/{handle}", get(verification::handle_lookup))
        .route(
            "/api/session",
            get(session::session_status).delete(session::logout),
        )
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Credentialed CORS for the single frontend origin.
fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin, "Frontend origin is not a valid header value, CORS disabled");
            layer
        }
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        oauth::initiate,
        oauth::callback,
        resources::authenticated_resource,
        resources::legacy_resource,
        verification::verification_status,
        verification::handle_lookup,
        session::session_status,
        session::logout
    ),
    components(
        schemas(
            AuthorizationUrlResponse,
            RepositorySummary,
            RepositoryView,
            ChannelReport,
            ChannelStatus,
            VerificationStatusResponse,
            HandleLookupResponse,
            SessionStatusResponse,
            ReadyResponse,
            HealthChecks,
            HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "OAuth", description = "GitHub authorization flow"),
        (name = "Resources", description = "Authenticated GitHub repository proxy"),
        (name = "Verification", description = "On-chain verification status"),
        (name = "Session", description = "Session cookie management")
    )
)]
struct ApiDoc;
