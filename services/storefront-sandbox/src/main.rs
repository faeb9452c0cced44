mod catalog;
mod config;
mod pages;
mod routes;
mod state;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::config::SandboxConfig;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
}

pub(crate) type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = SandboxConfig::from_env()?;
    let addr = config.addr;
    info!(
        static_dir = %config.static_dir.display(),
        login_required = config.login_required,
        logged_in = config.logged_in,
        "storefront-sandbox configured"
    );

    let app = app(AppState::new(config));

    info!("storefront-sandbox listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub(crate) fn app(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(health))
        .route("/package/{id}", get(routes::package_page))
        .route("/login", get(routes::login_page).post(routes::login))
        .route("/logout", get(routes::logout))
        .route("/tier/quote", get(routes::quote_page).post(routes::subscribe_quote))
        .route("/checkout/basket", get(routes::basket_page))
        .route("/checkout/ident", get(routes::basket_ident))
        .route("/checkout/update", post(routes::update_basket))
        .route("/checkout/packages/remove/{id}", get(routes::remove_package))
        .route(
            "/checkout/packages/add/{id}/{kind}",
            get(routes::add_package).post(routes::add_package_with_options),
        )
        .route(
            "/checkout/packages/add/{id}/{kind}/gift",
            get(routes::gift_package).post(routes::gift_package_with_options),
        )
        .nest_service("/pkg", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "storefront-sandbox",
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}

pub(crate) fn not_found(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}
