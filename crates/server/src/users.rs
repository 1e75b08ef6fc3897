//! Users: registration, profiles, editing, admin deletion and the follow
//! listings.

use api_types::{
    Flash,
    pagination::PageQuery,
    user::{FollowListView, ProfileView, UserForm, UserFormView, UserListItem},
};
use axum::{
    Extension, Form,
    extract::{Path, Query, State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use engine::{EngineError, ProfileUpdate, SignUp};

use crate::{
    Guard, RequestContext, ServerError, context, flash, guards,
    render::{View, micropost_view, paginated, user_view},
    server::ServerState,
};

const SIGNED_IN: &[Guard] = &[Guard::Authenticate];
/// Runs after the target user is loaded, so a missing id is a 404.
const OWNER: &[Guard] = &[Guard::CorrectUser];
const DESTROY: &[Guard] = &[Guard::Authenticate, Guard::AdminUser];
const SIGN_UP: &[Guard] = &[Guard::Anonymous];

fn page_number(query: &PageQuery) -> u64 {
    query.page.unwrap_or(1)
}

/// `GET /users`
pub async fn index(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ServerError> {
    guards::run(SIGNED_IN, &ctx, None)?;

    let page = state.engine.list_users(page_number(&query)).await?;
    let body = paginated(page, |user| UserListItem {
        deletable: ctx.is_admin() && !ctx.is_current_user(user.id),
        user: user_view(&user),
    });
    Ok(View::new(&ctx, "All users", "users/index", body).into_response())
}

/// `GET /users/{id}`
pub async fn show(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ServerError> {
    let user = state.engine.user(id).await?;
    let microposts = state
        .engine
        .microposts_for(user.id, page_number(&query))
        .await?;

    let relationship = match &ctx.current_user {
        Some(viewer) if viewer.id != user.id => Some(
            state
                .engine
                .relationship_between(viewer.id, user.id)
                .await?,
        ),
        _ => None,
    };

    let body = ProfileView {
        user: user_view(&user),
        microposts_count: microposts.total_items,
        microposts: paginated(microposts, micropost_view),
        following_count: state.engine.following_count(user.id).await?,
        followers_count: state.engine.followers_count(user.id).await?,
        following: relationship.as_ref().map(Option::is_some),
        relationship_id: relationship.flatten().map(|rel| rel.id),
    };
    Ok(View::new(&ctx, &user.name, "users/show", body).into_response())
}

/// `GET /users/new` and `GET /signup`
pub async fn new(Extension(ctx): Extension<RequestContext>) -> Result<Response, ServerError> {
    guards::run(SIGN_UP, &ctx, None)?;

    let body = UserFormView::from_form(UserForm::default(), Vec::new());
    Ok(View::new(&ctx, "Sign up", "users/new", body).into_response())
}

/// `POST /users`
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    jar: CookieJar,
    form: Result<Form<UserForm>, FormRejection>,
) -> Result<Response, ServerError> {
    guards::run(SIGN_UP, &ctx, None)?;
    let Form(form) = form?;

    let sign_up = SignUp {
        name: form.name.clone(),
        email: form.email.clone(),
        username: form.username.clone(),
        password: form.password.clone(),
        password_confirmation: form.password_confirmation.clone(),
    };
    let user = match state.engine.sign_up(sign_up).await {
        Ok(user) => user,
        Err(EngineError::Invalid(errors)) => {
            let body = UserFormView::from_form(form, errors.full_messages());
            return Ok(View::new(&ctx, "Sign up", "users/new", body)
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .into_response());
        }
        Err(err) => return Err(err.into()),
    };
    tracing::info!(user_id = user.id, "user signed up");

    let session = state.engine.open_session(user.id).await?;
    let jar = context::sign_in(jar, &state.config, session.token, state.session_max_age());
    let jar = flash::set(jar, Flash::success(format!("Welcome, {}!", user.name)));
    Ok((jar, Redirect::to(&format!("/users/{}", user.id))).into_response())
}

/// `GET /users/{id}/edit`
pub async fn edit(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Response, ServerError> {
    guards::run(SIGNED_IN, &ctx, None)?;
    let user = state.engine.user(id).await?;
    guards::run(OWNER, &ctx, Some(user.id))?;

    let form = UserForm {
        username: Some(user.handle()),
        name: user.name,
        email: user.email,
        ..UserForm::default()
    };
    let body = UserFormView::from_form(form, Vec::new());
    Ok(View::new(&ctx, "Edit profile", "users/edit", body).into_response())
}

/// `PUT/PATCH /users/{id}`
pub async fn update(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    jar: CookieJar,
    form: Result<Form<UserForm>, FormRejection>,
) -> Result<Response, ServerError> {
    guards::run(SIGNED_IN, &ctx, None)?;
    state.engine.user(id).await?;
    guards::run(OWNER, &ctx, Some(id))?;
    let Form(form) = form?;

    let update = ProfileUpdate {
        name: form.name.clone(),
        email: form.email.clone(),
        username: form.username.clone(),
        password: form.password.clone(),
        password_confirmation: form.password_confirmation.clone(),
    };
    match state.engine.update_profile(id, update).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "profile updated");
            let jar = flash::set(jar, Flash::success("Profile updated."));
            Ok((jar, Redirect::to(&format!("/users/{}", user.id))).into_response())
        }
        Err(EngineError::Invalid(errors)) => {
            let body = UserFormView::from_form(form, errors.full_messages());
            Ok(View::new(&ctx, "Edit profile", "users/edit", body)
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// `DELETE /users/{id}`
pub async fn destroy(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    jar: CookieJar,
) -> Result<Response, ServerError> {
    guards::run(DESTROY, &ctx, Some(id))?;

    let message = if ctx.is_current_user(id) {
        Flash::notice("Not permitted to delete the signed-in user")
    } else {
        state.engine.destroy_user(id).await?;
        tracing::info!(user_id = id, "user destroyed");
        Flash::success(format!("User {id} destroyed."))
    };
    Ok((flash::set(jar, message), Redirect::to("/users")).into_response())
}

/// `GET /users/{id}/following`
pub async fn following(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ServerError> {
    guards::run(SIGNED_IN, &ctx, None)?;

    let user = state.engine.user(id).await?;
    let users = state.engine.following(id, page_number(&query)).await?;
    let body = FollowListView {
        user: user_view(&user),
        users: paginated(users, |u| user_view(&u)),
    };
    Ok(View::new(&ctx, "Following", "users/show_follow", body).into_response())
}

/// `GET /users/{id}/followers`
pub async fn followers(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ServerError> {
    guards::run(SIGNED_IN, &ctx, None)?;

    let user = state.engine.user(id).await?;
    let users = state.engine.followers(id, page_number(&query)).await?;
    let body = FollowListView {
        user: user_view(&user),
        users: paginated(users, |u| user_view(&u)),
    };
    Ok(View::new(&ctx, "Followers", "users/show_follow", body).into_response())
}
