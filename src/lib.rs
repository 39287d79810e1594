use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;

use auth::TokenService;
use clients::{AdminKey, AnonKey, DataClient, GoTrueClient, IdentityClient, PostgrestClient};
use config::Config;

/// Everything a handler needs, built once at startup and cloned per request.
/// The provider clients carry the process-wide connection pools; nothing in
/// here is mutable after construction.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityClient>,
    pub data: Arc<dyn DataClient>,
    pub tokens: TokenService,
    pub permitted_email_domain: String,
}

impl AppState {
    /// Wire the real provider-backed clients from the runtime config. Both
    /// adapters share one reqwest connection pool but hold distinct keys.
    pub fn from_config(config: &Config) -> Self {
        let http = reqwest::Client::new();
        let identity = GoTrueClient::new(
            http.clone(),
            config.identity_url.clone(),
            AnonKey(config.identity_anon_key.clone()),
        );
        let data = PostgrestClient::new(
            http,
            config.identity_url.clone(),
            AdminKey(config.identity_admin_key.clone()),
        );

        Self {
            identity: Arc::new(identity),
            data: Arc::new(data),
            tokens: TokenService::new(&config.token_secret),
            permitted_email_domain: config.permitted_email_domain.clone(),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState, cors: CorsLayer) -> Router {
    let protected = Router::new()
        .route(
            "/propostas",
            get(handlers::proposals::list).post(handlers::proposals::create),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive CORS by default, pinned to one origin when configured.
pub fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    Ok(match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    })
}
