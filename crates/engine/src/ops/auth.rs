use sea_orm::{QueryFilter, prelude::*};

use crate::{AuthFailure, EngineError, ResultEngine, User, normalize_email, password, users};

use super::Engine;

impl Engine {
    /// Checks an email/password pair and returns the matching account.
    ///
    /// Emails match case-insensitively. The password is hashed with the
    /// account's stored salt and compared against the stored hash. Nothing is
    /// written on success or failure.
    pub async fn authenticate(&self, email: &str, plaintext: &str) -> ResultEngine<User> {
        let email = normalize_email(email);
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .ok_or(EngineError::Authentication(AuthFailure::NotFound))?;

        if !password::password_matches(plaintext, &user.salt, &user.encrypted_password)? {
            return Err(EngineError::Authentication(AuthFailure::BadCredentials));
        }

        Ok(user)
    }
}
