use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, User, sessions, users};

use super::{Engine, with_tx};

const TOKEN_BYTES: usize = 32;

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl Engine {
    /// Opens a session for `user_id` and returns it; the token goes into the
    /// session cookie.
    pub async fn open_session(&self, user_id: i32) -> ResultEngine<sessions::Model> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        with_tx!(self, |db_tx| {
            users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;

            let session = sessions::ActiveModel {
                token: ActiveValue::Set(new_token()),
                user_id: ActiveValue::Set(user_id),
                created_at: ActiveValue::Set(now),
                expires_at: ActiveValue::Set(expires_at),
            }
            .insert(&db_tx)
            .await?;
            Ok(session)
        })
    }

    /// Resolves a session token to its user.
    ///
    /// Unknown tokens resolve to `None`; expired ones are deleted and resolve
    /// to `None` as well.
    pub async fn session_user(&self, token: &str) -> ResultEngine<Option<User>> {
        let Some((session, user)) = sessions::Entity::find_by_id(token.to_string())
            .find_also_related(users::Entity)
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now() {
            sessions::Entity::delete_by_id(session.token)
                .exec(&self.database)
                .await?;
            return Ok(None);
        }

        Ok(user)
    }

    /// Ends a session. Closing an unknown token is not an error.
    pub async fn close_session(&self, token: &str) -> ResultEngine<()> {
        sessions::Entity::delete_by_id(token.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Removes every expired session and returns how many were removed.
    pub async fn purge_expired_sessions(&self) -> ResultEngine<u64> {
        let res = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lte(Utc::now()))
            .exec(&self.database)
            .await?;
        Ok(res.rows_affected)
    }
}
