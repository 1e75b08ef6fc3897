use axum::{
    Router,
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::CookieJar;

use std::sync::Arc;

use crate::{
    RequestContext, ServerError,
    context::{self, SESSION_COOKIE},
    flash::{self, FLASH_COOKIE},
    microposts, pages, relationships, sessions, users,
};
use engine::Engine;

/// Knobs of the HTTP layer that do not belong to the engine.
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Mark cookies `Secure` (serve over HTTPS only).
    pub secure_cookies: bool,
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub config: ServerConfig,
}

impl ServerState {
    /// Cookie lifetime matching the engine's session lifetime.
    pub(crate) fn session_max_age(&self) -> time::Duration {
        time::Duration::seconds(self.engine.session_ttl().num_seconds())
    }
}

fn sets_cookie(response: &Response, name: &str) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.split('=').next() == Some(name))
}

/// Resolve the session cookie into a [`RequestContext`] and consume the
/// incoming flash.
async fn load_context(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let current_user = match &token {
        Some(token) => state.engine.session_user(token).await?,
        None => None,
    };
    let stale_session = token.is_some() && current_user.is_none();
    let incoming_flash = jar.get(FLASH_COOKIE).map(|c| c.value().to_string());

    let ctx = RequestContext {
        current_user,
        session_token: token.filter(|_| !stale_session),
        flash: incoming_flash.as_deref().and_then(flash::decode),
        path: request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string()),
        method: request.method().clone(),
    };
    request.extensions_mut().insert(ctx);

    let response = next.run(request).await;

    let mut jar = jar;
    if incoming_flash.is_some() && !sets_cookie(&response, FLASH_COOKIE) {
        jar = flash::clear(jar);
    }
    if stale_session && !sets_cookie(&response, SESSION_COOKIE) {
        jar = context::sign_out(jar);
    }
    Ok((jar, response).into_response())
}

/// Build the application router.
pub fn app(engine: Engine, config: ServerConfig) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
        config,
    };

    Router::new()
        .route("/", get(pages::home))
        .route("/contact", get(pages::contact))
        .route("/about", get(pages::about))
        .route("/help", get(pages::help))
        .route("/signup", get(users::new))
        .route("/users", get(users::index).post(users::create))
        .route("/users/new", get(users::new))
        .route(
            "/users/{id}",
            get(users::show)
                .put(users::update)
                .patch(users::update)
                .delete(users::destroy),
        )
        .route("/users/{id}/edit", get(users::edit))
        .route("/users/{id}/following", get(users::following))
        .route("/users/{id}/followers", get(users::followers))
        .route("/signin", get(sessions::new))
        .route("/signout", get(sessions::destroy).delete(sessions::destroy))
        .route("/sessions", post(sessions::create).delete(sessions::destroy))
        .route("/relationships", post(relationships::create))
        .route("/relationships/{id}", delete(relationships::destroy))
        .route("/microposts", post(microposts::create))
        .route("/microposts/{id}", delete(microposts::destroy))
        .route_layer(middleware::from_fn_with_state(state.clone(), load_context))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine, config)).await
}
