//! HTTP API for the voice gateway.

mod handlers;
mod middleware;
mod pages;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use crate::auth::SignIn;
use crate::config::Config;
use crate::token::CredentialIssuer;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use identity_store::IdentityStore;
use mail_client::MailClient;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<CredentialIssuer>,
    pub sign_in: Arc<SignIn>,
    /// Caller id for calls bridged to phone numbers
    pub caller_id: Arc<str>,
    /// Require a session for `/api/token`
    pub protect_token: bool,
}

impl AppState {
    pub fn new(
        issuer: CredentialIssuer,
        sign_in: SignIn,
        caller_id: impl Into<Arc<str>>,
        protect_token: bool,
    ) -> Self {
        Self {
            issuer: Arc::new(issuer),
            sign_in: Arc::new(sign_in),
            caller_id: caller_id.into(),
            protect_token,
        }
    }

    pub fn from_config(config: &Config, store: IdentityStore, mail: Option<MailClient>) -> Self {
        Self::new(
            CredentialIssuer::new(config.twilio.clone()),
            SignIn::from_config(config, store, mail),
            config.twilio.phone_number.as_str(),
            config.auth.protect_token,
        )
    }
}

pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(60))
}

/// Create the API router with custom rate limiting. `/health` is not limited.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/api/token", get(handlers::issue_token))
        .route("/api/voice", post(handlers::inbound_call))
        .route("/api/session", get(handlers::session))
        .route(
            "/auth/signin",
            get(handlers::signin_page).post(handlers::request_link),
        )
        .route("/auth/callback", get(handlers::callback))
        .route("/auth/verify", get(handlers::verify_page))
        .route("/auth/signout", post(handlers::sign_out))
        .route_layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ))
        .route("/health", get(handlers::health))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
