//! Page envelopes and conversions from engine models to views.

use api_types::{
    Flash, Rendered,
    micropost::MicropostView,
    pagination::{Paginated, Pagination},
    user::UserView,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::{Micropost, Page, User};
use serde::Serialize;

use crate::RequestContext;

pub(crate) const BASE_TITLE: &str = "Sample App";

pub(crate) fn full_title(page_title: &str) -> String {
    if page_title.is_empty() {
        BASE_TITLE.to_string()
    } else {
        format!("{BASE_TITLE} | {page_title}")
    }
}

/// A page rendered with `template`.
///
/// The flash shown is the one carried over from the previous request unless
/// the handler sets one for this response only.
pub(crate) struct View<T> {
    status: StatusCode,
    rendered: Rendered<T>,
}

impl<T: Serialize> View<T> {
    pub(crate) fn new(ctx: &RequestContext, page_title: &str, template: &str, body: T) -> Self {
        Self {
            status: StatusCode::OK,
            rendered: Rendered {
                title: full_title(page_title),
                template: template.to_string(),
                flash: ctx.flash.clone(),
                signed_in: ctx.signed_in(),
                body,
            },
        }
    }

    pub(crate) fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn flash_now(mut self, flash: Flash) -> Self {
        self.rendered.flash = Some(flash);
        self
    }
}

impl<T: Serialize> IntoResponse for View<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.rendered)).into_response()
    }
}

pub(crate) fn user_view(user: &User) -> UserView {
    UserView {
        id: user.id,
        name: user.name.clone(),
        username: user.handle(),
        email: user.email.clone(),
        admin: user.admin,
        created_at: user.created_at,
    }
}

pub(crate) fn micropost_view(micropost: Micropost) -> MicropostView {
    MicropostView {
        id: micropost.id,
        content: micropost.content,
        location: micropost.location,
        user_id: micropost.user_id,
        created_at: micropost.created_at,
    }
}

pub(crate) fn paginated<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> Paginated<U> {
    let pagination = Pagination {
        page: page.page,
        per_page: page.per_page,
        total_items: page.total_items,
        total_pages: page.total_pages,
        previous: page.previous(),
        next: page.next(),
    };
    Paginated {
        items: page.map(f).items,
        pagination,
    }
}
