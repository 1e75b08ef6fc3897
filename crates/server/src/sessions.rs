//! Signing in and out.

use api_types::{
    Flash,
    session::{SignInForm, SignInView},
};
use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use engine::{EngineError, normalize_email};

use crate::{RequestContext, ServerError, context, render::View, server::ServerState};

const INVALID_CREDENTIALS: &str = "Invalid email/password combination.";

/// `GET /signin`
pub async fn new(Extension(ctx): Extension<RequestContext>) -> Response {
    View::new(
        &ctx,
        "Sign in",
        "sessions/new",
        SignInView {
            email: String::new(),
        },
    )
    .into_response()
}

/// `POST /sessions`
///
/// On success any previous session of this browser is closed and the user
/// lands on the page they were sent away from, or on their profile.
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Result<Response, ServerError> {
    let user = match state.engine.authenticate(&form.email, &form.password).await {
        Ok(user) => user,
        Err(EngineError::Authentication(failure)) => {
            tracing::warn!(email = %normalize_email(&form.email), %failure, "sign-in rejected");
            let body = SignInView { email: form.email };
            return Ok(View::new(&ctx, "Sign in", "sessions/new", body)
                .status(StatusCode::UNAUTHORIZED)
                .flash_now(Flash::error(INVALID_CREDENTIALS))
                .into_response());
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(previous) = &ctx.session_token {
        state.engine.close_session(previous).await?;
    }
    let session = state.engine.open_session(user.id).await?;
    tracing::info!(user_id = user.id, "user signed in");

    let jar = context::sign_in(jar, &state.config, session.token, state.session_max_age());
    let (jar, location) = context::take_location(jar);
    let location = location.unwrap_or_else(|| format!("/users/{}", user.id));
    Ok((jar, Redirect::to(&location)).into_response())
}

/// `DELETE /sessions`, `/signout`
pub async fn destroy(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    jar: CookieJar,
) -> Result<Response, ServerError> {
    if let Some(token) = &ctx.session_token {
        state.engine.close_session(token).await?;
        if let Some(user) = &ctx.current_user {
            tracing::info!(user_id = user.id, "user signed out");
        }
    }
    Ok((context::sign_out(jar), Redirect::to("/")).into_response())
}
