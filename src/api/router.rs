//! HTTP router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Cache-Control → 2. CORS → 3. Extension(ApiContext) → 4. Audit logger

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router with the HTTP drafting client.
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build the router from a pre-constructed `ApiContext` (custom drafting
/// client, shared state in tests).
pub fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Handlers use State<ApiContext>; the audit middleware reads the
    // Extension copy, so Extension sits outside it.
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/health/access", get(endpoints::health::access_log))
        // access control
        .route(
            "/users",
            get(endpoints::users::list).post(endpoints::users::create),
        )
        .route(
            "/users/:id",
            get(endpoints::users::detail)
                .put(endpoints::users::update)
                .delete(endpoints::users::remove),
        )
        .route(
            "/roles",
            get(endpoints::roles::list).post(endpoints::roles::create),
        )
        .route(
            "/roles/:id",
            get(endpoints::roles::detail)
                .put(endpoints::roles::update)
                .delete(endpoints::roles::remove),
        )
        .route(
            "/permissions",
            get(endpoints::permissions::list).post(endpoints::permissions::create),
        )
        .route(
            "/permissions/:id",
            put(endpoints::permissions::update).delete(endpoints::permissions::remove),
        )
        // registry
        .route(
            "/clinics",
            get(endpoints::clinics::list).post(endpoints::clinics::create),
        )
        .route(
            "/clinics/:id",
            get(endpoints::clinics::detail)
                .put(endpoints::clinics::update)
                .delete(endpoints::clinics::remove),
        )
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route(
            "/patients/:id/plannings",
            get(endpoints::plannings::list_for_patient),
        )
        // planning lifecycle
        .route("/plannings", post(endpoints::plannings::create))
        .route(
            "/plannings/:id",
            get(endpoints::plannings::detail).delete(endpoints::plannings::remove),
        )
        .route(
            "/plannings/:id/status",
            put(endpoints::plannings::update_status),
        )
        .route("/plannings/:id/plan", put(endpoints::plannings::update_plan))
        .route(
            "/plannings/:id/diagnosis",
            post(endpoints::drafting::diagnosis),
        )
        .route(
            "/plannings/:id/phased-plan",
            post(endpoints::drafting::phased_plan),
        )
        .route(
            "/plannings/:id/contracts",
            get(endpoints::contracts::list_for_planning).post(endpoints::contracts::generate),
        )
        .route(
            "/plannings/:id/treatment",
            get(endpoints::treatments::detail).put(endpoints::treatments::save),
        )
        .route("/plannings/:id/pdf", get(endpoints::exports::planning_pdf))
        .route(
            "/contracts/:id",
            get(endpoints::contracts::detail)
                .put(endpoints::contracts::update)
                .delete(endpoints::contracts::remove),
        )
        .route("/contracts/:id/sign", post(endpoints::contracts::sign))
        .route("/contracts/:id/pdf", get(endpoints::contracts::contract_pdf))
        .route("/exports/markup", post(endpoints::exports::markup_pdf))
        .route("/ai/completions", post(endpoints::ai::completions))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}
