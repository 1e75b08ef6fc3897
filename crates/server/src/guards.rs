//! Per-action access checks.
//!
//! Handlers declare an ordered chain of [`Guard`]s and run it before doing
//! anything else. The first guard that refuses produces a [`Halt`] and the
//! action body never runs.

use api_types::Flash;
use axum::{
    http::Method,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{RequestContext, context, flash};

pub(crate) const SIGN_IN_NOTICE: &str = "Please sign in to access this page.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guard {
    /// Someone must be signed in.
    Authenticate,
    /// The signed-in user must be the resource owner.
    CorrectUser,
    /// The signed-in user must be an admin.
    AdminUser,
    /// Nobody may be signed in.
    Anonymous,
}

/// Terminal outcome of a refused guard: a redirect, optionally with a flash
/// and a location to come back to after signing in.
#[derive(Debug, PartialEq, Eq)]
pub struct Halt {
    pub location: String,
    pub flash: Option<Flash>,
    pub return_to: Option<String>,
}

impl Halt {
    fn home() -> Self {
        Self {
            location: "/".to_string(),
            flash: None,
            return_to: None,
        }
    }
}

impl IntoResponse for Halt {
    fn into_response(self) -> Response {
        let mut jar = CookieJar::new();
        if let Some(message) = self.flash {
            jar = flash::set(jar, message);
        }
        if let Some(path) = self.return_to {
            jar = context::store_location(jar, &path);
        }
        (jar, Redirect::to(&self.location)).into_response()
    }
}

impl Guard {
    fn check(self, ctx: &RequestContext, owner_id: Option<i32>) -> Result<(), Halt> {
        match self {
            Guard::Authenticate if !ctx.signed_in() => Err(Halt {
                location: "/signin".to_string(),
                flash: Some(Flash::notice(SIGN_IN_NOTICE)),
                return_to: (ctx.method == Method::GET).then(|| ctx.path.clone()),
            }),
            Guard::CorrectUser if !owner_id.is_some_and(|id| ctx.is_current_user(id)) => {
                Err(Halt::home())
            }
            Guard::AdminUser if !ctx.is_admin() => Err(Halt::home()),
            Guard::Anonymous if ctx.signed_in() => Err(Halt::home()),
            _ => Ok(()),
        }
    }
}

/// Evaluate `chain` in order. `owner_id` is the user the action targets,
/// when it targets one.
pub(crate) fn run(chain: &[Guard], ctx: &RequestContext, owner_id: Option<i32>) -> Result<(), Halt> {
    chain
        .iter()
        .try_for_each(|guard| guard.check(ctx, owner_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::{context, user};

    const EDIT: &[Guard] = &[Guard::Authenticate, Guard::CorrectUser];
    const DESTROY: &[Guard] = &[Guard::Authenticate, Guard::AdminUser];

    #[test]
    fn anonymous_get_is_sent_to_sign_in_and_remembered() {
        let ctx = context(None, Method::GET, "/users/1/edit");
        let halt = run(EDIT, &ctx, Some(1)).unwrap_err();
        assert_eq!(halt.location, "/signin");
        assert_eq!(halt.flash, Some(Flash::notice(SIGN_IN_NOTICE)));
        assert_eq!(halt.return_to.as_deref(), Some("/users/1/edit"));
    }

    #[test]
    fn anonymous_post_is_not_remembered() {
        let ctx = context(None, Method::POST, "/microposts");
        let halt = run(&[Guard::Authenticate], &ctx, None).unwrap_err();
        assert_eq!(halt.return_to, None);
    }

    #[test]
    fn wrong_user_goes_home_silently() {
        let ctx = context(Some(user(2, false)), Method::PATCH, "/users/1");
        assert_eq!(run(EDIT, &ctx, Some(1)), Err(Halt::home()));
        assert_eq!(run(EDIT, &ctx, Some(2)), Ok(()));
    }

    #[test]
    fn admin_guard() {
        let plain = context(Some(user(2, false)), Method::DELETE, "/users/1");
        assert_eq!(run(DESTROY, &plain, Some(1)), Err(Halt::home()));

        let admin = context(Some(user(3, true)), Method::DELETE, "/users/1");
        assert_eq!(run(DESTROY, &admin, Some(1)), Ok(()));
    }

    #[test]
    fn anonymous_guard_rejects_signed_in() {
        let ctx = context(Some(user(1, false)), Method::GET, "/signup");
        assert_eq!(run(&[Guard::Anonymous], &ctx, None), Err(Halt::home()));
        let ctx = context(None, Method::GET, "/signup");
        assert_eq!(run(&[Guard::Anonymous], &ctx, None), Ok(()));
    }

    #[test]
    fn first_failure_wins() {
        let ctx = context(None, Method::GET, "/users/1/edit");
        let halt = run(&[Guard::CorrectUser, Guard::Authenticate], &ctx, Some(1)).unwrap_err();
        assert_eq!(halt.location, "/");
    }
}
