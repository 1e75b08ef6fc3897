//! Per-request identity, resolved from the session cookie by the
//! `load_context` middleware and handed to handlers as an extension.

use api_types::Flash;
use axum::http::Method;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use engine::User;

use crate::{ServerError, server::ServerConfig};

pub(crate) const SESSION_COOKIE: &str = "sample_app_session";
pub(crate) const RETURN_TO_COOKIE: &str = "return_to";

#[derive(Clone, Debug)]
pub struct RequestContext {
    pub current_user: Option<User>,
    /// Token of the session the user was resolved from.
    pub session_token: Option<String>,
    /// Flash carried over from the previous request.
    pub flash: Option<Flash>,
    /// Path and query of the request.
    pub path: String,
    pub method: Method,
}

impl RequestContext {
    pub fn signed_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn is_current_user(&self, user_id: i32) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|user| user.id == user_id)
    }

    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(|user| user.admin)
    }

    /// The signed-in user, for actions already behind `Guard::Authenticate`.
    pub(crate) fn user(&self) -> Result<&User, ServerError> {
        self.current_user
            .as_ref()
            .ok_or_else(|| ServerError::Generic("not signed in".to_string()))
    }
}

/// Store the session token in an HttpOnly cookie living as long as the
/// server-side session.
pub(crate) fn sign_in(
    jar: CookieJar,
    config: &ServerConfig,
    token: String,
    ttl: time::Duration,
) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(config.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(ttl),
    )
}

pub(crate) fn sign_out(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Remember where an anonymous visitor was going.
pub(crate) fn store_location(jar: CookieJar, path: &str) -> CookieJar {
    jar.add(
        Cookie::build((RETURN_TO_COOKIE, path.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Take the remembered location, if it is a local path.
pub(crate) fn take_location(jar: CookieJar) -> (CookieJar, Option<String>) {
    let location = jar
        .get(RETURN_TO_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|path| path.starts_with('/') && !path.starts_with("//"));
    if jar.get(RETURN_TO_COOKIE).is_none() {
        return (jar, location);
    }
    (jar.remove(Cookie::build(RETURN_TO_COOKIE).path("/")), location)
}
