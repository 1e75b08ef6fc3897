//! Follow and unfollow from a profile page.

use api_types::relationship::FollowForm;
use axum::{
    Extension, Form,
    extract::{Path, State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};

use crate::{Guard, RequestContext, ServerError, guards, server::ServerState};

const FOLLOW: &[Guard] = &[Guard::Authenticate];

/// `POST /relationships`
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    form: Result<Form<FollowForm>, FormRejection>,
) -> Result<Response, ServerError> {
    guards::run(FOLLOW, &ctx, None)?;
    let Form(form) = form?;
    let viewer = ctx.user()?;

    let relationship = state.engine.follow(viewer.id, form.followed_id).await?;
    tracing::info!(
        follower_id = relationship.follower_id,
        followed_id = relationship.followed_id,
        "follow"
    );
    Ok(Redirect::to(&format!("/users/{}", relationship.followed_id)).into_response())
}

/// `DELETE /relationships/{id}`
///
/// Only the follower may remove the edge; anyone else is sent home.
pub async fn destroy(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Response, ServerError> {
    guards::run(FOLLOW, &ctx, None)?;
    let viewer = ctx.user()?;

    let relationship = state.engine.relationship(id).await?;
    if relationship.follower_id != viewer.id {
        return Ok(Redirect::to("/").into_response());
    }
    state
        .engine
        .unfollow(relationship.follower_id, relationship.followed_id)
        .await?;
    tracing::info!(
        follower_id = relationship.follower_id,
        followed_id = relationship.followed_id,
        "unfollow"
    );
    Ok(Redirect::to(&format!("/users/{}", relationship.followed_id)).into_response())
}
