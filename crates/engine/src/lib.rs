//! Domain engine for the sample app: accounts, sessions, the follow graph and
//! microposts, persisted with sea-orm.

pub use error::{AuthFailure, EngineError};
pub use ops::{Engine, EngineBuilder, ProfileUpdate, SignUp};
pub use pagination::{DEFAULT_PER_PAGE, Page};
pub use validation::{FieldError, ValidationErrors, normalize_email};

pub use microposts::Model as Micropost;
pub use relationships::Model as Relationship;
pub use users::Model as User;

pub mod microposts;
pub mod relationships;
pub mod sessions;
pub mod users;

mod error;
mod ops;
mod pagination;
mod password;
mod validation;

type ResultEngine<T> = Result<T, EngineError>;
