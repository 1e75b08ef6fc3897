use axum::{
    Json,
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::EngineError;

use serde::Serialize;
pub use context::RequestContext;
pub use guards::{Guard, Halt};
pub use server::{ServerConfig, app, run_with_listener};

mod context;
mod flash;
mod guards;
mod microposts;
mod pages;
mod relationships;
mod render;
mod server;
mod sessions;
mod users;

pub mod types {
    pub use api_types::{Flash, FlashKind, Rendered, StaticPage};

    pub mod user {
        pub use api_types::user::{
            FollowListView, ProfileView, UserForm, UserFormView, UserListItem, UserView,
        };
    }

    pub mod session {
        pub use api_types::session::{SignInForm, SignInView};
    }

    pub mod micropost {
        pub use api_types::micropost::{HomeView, MicropostForm, MicropostView};
    }

    pub mod relationship {
        pub use api_types::relationship::FollowForm;
    }

    pub mod pagination {
        pub use api_types::pagination::{PageQuery, Paginated, Pagination};
    }
}

pub enum ServerError {
    Engine(EngineError),
    /// A guard refused the request; answered with its redirect.
    Halted(Halt),
    /// The request body could not be decoded. Only surfaced after the guards
    /// have let the request through.
    Rejected(FormRejection),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Authentication(_) => StatusCode::UNAUTHORIZED,
        EngineError::PasswordHash(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(hash_err) => {
            tracing::error!("password hashing error: {hash_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Halted(halt) => return halt.into_response(),
            ServerError::Rejected(rejection) => (rejection.status(), rejection.body_text()),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<FormRejection> for ServerError {
    fn from(value: FormRejection) -> Self {
        Self::Rejected(value)
    }
}

impl From<Halt> for ServerError {
    fn from(value: Halt) -> Self {
        Self::Halted(value)
    }
}
