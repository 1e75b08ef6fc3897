//! Home and the static pages.

use api_types::{
    StaticPage,
    micropost::{HomeView, MicropostForm},
    pagination::PageQuery,
};
use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use crate::{
    RequestContext, ServerError,
    render::{View, micropost_view, paginated},
    server::ServerState,
};

/// The home body: a feed and an empty micropost form for signed-in users.
pub(crate) async fn home_view(
    state: &ServerState,
    ctx: &RequestContext,
    page: u64,
    form: MicropostForm,
    errors: Vec<String>,
) -> Result<HomeView, ServerError> {
    let Some(user) = &ctx.current_user else {
        return Ok(HomeView {
            feed: None,
            micropost_form: None,
            errors,
        });
    };
    let feed = state.engine.feed(user.id, page).await?;
    Ok(HomeView {
        feed: Some(paginated(feed, micropost_view)),
        micropost_form: Some(form),
        errors,
    })
}

/// `GET /`
pub async fn home(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ServerError> {
    let body = home_view(
        &state,
        &ctx,
        query.page.unwrap_or(1),
        MicropostForm::default(),
        Vec::new(),
    )
    .await?;
    Ok(View::new(&ctx, "Home", "pages/home", body).into_response())
}

fn static_page(ctx: &RequestContext, title: &str, page: &str) -> Response {
    let body = StaticPage {
        page: page.to_string(),
    };
    View::new(ctx, title, &format!("pages/{page}"), body).into_response()
}

/// `GET /contact`
pub async fn contact(Extension(ctx): Extension<RequestContext>) -> Response {
    static_page(&ctx, "Contact", "contact")
}

/// `GET /about`
pub async fn about(Extension(ctx): Extension<RequestContext>) -> Response {
    static_page(&ctx, "About", "about")
}

/// `GET /help`
pub async fn help(Extension(ctx): Extension<RequestContext>) -> Response {
    static_page(&ctx, "Help", "help")
}
