//! API request handlers.

use super::{pages, types::*, AppState};
use crate::auth::{cookie, SignInOutcome};
use crate::error::GatewayError;
use crate::inbound::{self, CONTENT_TYPE};
use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use identity_store::{Session, User};
use tracing::{info, instrument};
use voice_types::TokenResponse;

/// Session for the request's cookie, if any.
async fn current_session(state: &AppState, jar: &CookieJar) -> Option<(Session, User)> {
    let token = cookie::session_token(jar)?;
    state.sign_in.current_session(&token).await
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store_backend: state.sign_in.store().backend_name(),
    })
}

/// Issue a voice access token for a fresh identity.
#[instrument(skip_all)]
pub async fn issue_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<TokenResponse>, GatewayError> {
    if state.protect_token && current_session(&state, &jar).await.is_none() {
        return Err(GatewayError::Unauthorized);
    }

    let credential = state.issuer.issue()?;
    Ok(Json(credential.into()))
}

/// Call-control webhook for inbound and client-originated calls.
#[instrument(skip_all)]
pub async fn inbound_call(
    State(state): State<AppState>,
    Form(webhook): Form<VoiceWebhook>,
) -> Result<Response, GatewayError> {
    info!(
        call_sid = ?webhook.call_sid,
        to = ?webhook.to,
        from = ?webhook.from,
        "Inbound call"
    );

    let instruction = inbound::route(webhook.to.as_deref(), &state.caller_id);
    let xml = inbound::render(&instruction)?;

    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], xml).into_response())
}

pub async fn signin_page() -> Html<&'static str> {
    Html(pages::SIGN_IN)
}

/// Send a sign-in link and confirm it went out.
pub async fn request_link(
    State(state): State<AppState>,
    Form(form): Form<SignInForm>,
) -> Result<Html<&'static str>, GatewayError> {
    state.sign_in.send_link(&form.email).await?;
    Ok(Html(pages::LINK_SENT))
}

/// Follow a sign-in link.
///
/// Denied addresses land on the same page as a pending sign-in.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<Response, GatewayError> {
    match state.sign_in.complete(&params.email, &params.token).await? {
        SignInOutcome::Established(session) => {
            let cookie = cookie::session_cookie(
                session.session_token,
                state.sign_in.session_max_age(),
                state.sign_in.secure_cookies(),
            );
            Ok((jar.add(cookie), Redirect::to("/")).into_response())
        }
        SignInOutcome::Denied => Ok(Redirect::to("/auth/verify").into_response()),
    }
}

pub async fn verify_page() -> Html<&'static str> {
    Html(pages::CHECK_EMAIL)
}

pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), GatewayError> {
    if let Some(token) = cookie::session_token(&jar) {
        state.sign_in.sign_out(&token).await?;
    }

    Ok((cookie::clear_session(jar), Redirect::to("/auth/signin")))
}

/// Phone page, or the sign-in page without a session.
pub async fn home(State(state): State<AppState>, jar: CookieJar) -> Response {
    match current_session(&state, &jar).await {
        Some(_) => Html(pages::PHONE).into_response(),
        None => Redirect::to("/auth/signin").into_response(),
    }
}

pub async fn session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<SessionResponse>, GatewayError> {
    let (session, user) = current_session(&state, &jar)
        .await
        .ok_or(GatewayError::Unauthorized)?;

    Ok(Json(SessionResponse {
        user: SessionUser {
            id: user.id,
            email: user.email,
            name: user.name,
        },
        expires: session.expires,
    }))
}
