//! Posting and deleting microposts.

use api_types::{Flash, micropost::MicropostForm};
use axum::{
    Extension, Form,
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use engine::EngineError;

use crate::{Guard, RequestContext, ServerError, flash, guards, pages, render::View, server::ServerState};

const WRITE: &[Guard] = &[Guard::Authenticate];

/// `POST /microposts`
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    jar: CookieJar,
    form: Result<Form<MicropostForm>, FormRejection>,
) -> Result<Response, ServerError> {
    guards::run(WRITE, &ctx, None)?;
    let Form(form) = form?;
    let author = ctx.user()?;

    match state
        .engine
        .post_micropost(author.id, &form.content, form.location.as_deref())
        .await
    {
        Ok(micropost) => {
            tracing::info!(user_id = author.id, micropost_id = micropost.id, "micropost created");
            let jar = flash::set(jar, Flash::success("Micropost created!"));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(EngineError::Invalid(errors)) => {
            let body = pages::home_view(&state, &ctx, 1, form, errors.full_messages()).await?;
            Ok(View::new(&ctx, "Home", "pages/home", body)
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// `DELETE /microposts/{id}`
///
/// Only the author may delete; anyone else is sent home.
pub async fn destroy(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Response, ServerError> {
    guards::run(WRITE, &ctx, None)?;
    let author = ctx.user()?;

    let micropost = state.engine.micropost(id).await?;
    if micropost.user_id != author.id {
        return Ok(Redirect::to("/").into_response());
    }
    state.engine.delete_micropost(micropost.id, author.id).await?;
    tracing::info!(user_id = author.id, micropost_id = id, "micropost deleted");
    Ok(Redirect::to("/").into_response())
}
