use chrono::Duration;
use sea_orm::DatabaseConnection;

use crate::{DEFAULT_PER_PAGE, ResultEngine};

mod auth;
mod microposts;
mod relationships;
mod sessions;
mod users;

pub use users::{ProfileUpdate, SignUp};

/// Default lifetime of a session opened by `open_session`.
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 14;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    per_page: u64,
    session_ttl: Duration,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Lifetime of newly opened sessions.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    per_page: Option<u64>,
    session_ttl: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the page size (defaults to 30, zero is ignored)
    pub fn per_page(mut self, per_page: u64) -> EngineBuilder {
        self.per_page = (per_page > 0).then_some(per_page);
        self
    }

    /// Override how long a session stays valid
    pub fn session_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.session_ttl = Some(ttl);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE),
            session_ttl: self
                .session_ttl
                .unwrap_or_else(|| Duration::hours(DEFAULT_SESSION_TTL_HOURS)),
        })
    }
}
