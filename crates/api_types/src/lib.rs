use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a one-shot message shown on the next rendered page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Notice,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Notice,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// A rendered page: what a template would receive.
///
/// `title` is the full document title ("Sample App | Sign up"), `template`
/// names the view that would render `body`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Rendered<T> {
    pub title: String,
    pub template: String,
    pub flash: Option<Flash>,
    pub signed_in: bool,
    pub body: T,
}

pub mod pagination {
    use super::*;

    /// Query string accepted by every paginated listing (`?page=N`, 1-based).
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PageQuery {
        pub page: Option<u64>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Pagination {
        pub page: u64,
        pub per_page: u64,
        pub total_items: u64,
        pub total_pages: u64,
        pub previous: Option<u64>,
        pub next: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Paginated<T> {
        pub items: Vec<T>,
        pub pagination: Pagination,
    }
}

pub mod user {
    use super::*;
    use crate::micropost::MicropostView;
    use crate::pagination::Paginated;

    /// Public view of an account. Credentials never leave the server.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i32,
        pub name: String,
        pub username: String,
        pub email: String,
        pub admin: bool,
        pub created_at: DateTime<Utc>,
    }

    /// Form body for `POST /users` and `PATCH /users/{id}`.
    ///
    /// Field names follow the HTML form (`password_confirmation`).
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct UserForm {
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub username: Option<String>,
        #[serde(default)]
        pub password: String,
        #[serde(default)]
        pub password_confirmation: String,
    }

    /// State of the sign-up or edit form when it is (re-)rendered.
    ///
    /// Password fields are always sent back empty.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserFormView {
        pub name: String,
        pub email: String,
        pub username: Option<String>,
        pub password: String,
        pub password_confirmation: String,
        pub errors: Vec<String>,
    }

    impl UserFormView {
        pub fn from_form(form: UserForm, errors: Vec<String>) -> Self {
            Self {
                name: form.name,
                email: form.email,
                username: form.username,
                password: String::new(),
                password_confirmation: String::new(),
                errors,
            }
        }
    }

    /// A row of the users index.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserListItem {
        pub user: UserView,
        /// Whether the viewer may delete this user (admins, not themselves).
        pub deletable: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileView {
        pub user: UserView,
        pub microposts: Paginated<MicropostView>,
        pub microposts_count: u64,
        pub following_count: u64,
        pub followers_count: u64,
        /// Whether the signed-in viewer follows this user. `None` when
        /// nobody is signed in or the viewer is looking at their own profile.
        pub following: Option<bool>,
        /// Id of the relationship to delete when unfollowing.
        pub relationship_id: Option<i32>,
    }

    /// `/users/{id}/following` and `/users/{id}/followers`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FollowListView {
        pub user: UserView,
        pub users: Paginated<UserView>,
    }
}

pub mod session {
    use super::*;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct SignInForm {
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub password: String,
    }

    /// Sign-in form as rendered: the email is kept, the password is not.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignInView {
        pub email: String,
    }
}

pub mod relationship {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FollowForm {
        pub followed_id: i32,
    }
}

pub mod micropost {
    use super::*;
    use crate::pagination::Paginated;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct MicropostForm {
        #[serde(default)]
        pub content: String,
        #[serde(default)]
        pub location: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MicropostView {
        pub id: i32,
        pub content: String,
        pub location: Option<String>,
        pub user_id: i32,
        pub created_at: DateTime<Utc>,
    }

    /// Body of `GET /`.
    ///
    /// Anonymous visitors get neither a feed nor the micropost form.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct HomeView {
        pub feed: Option<Paginated<MicropostView>>,
        pub micropost_form: Option<MicropostForm>,
        pub errors: Vec<String>,
    }
}

/// Body of the static pages (contact, about, help).
#[derive(Debug, Serialize, Deserialize)]
pub struct StaticPage {
    pub page: String,
}
