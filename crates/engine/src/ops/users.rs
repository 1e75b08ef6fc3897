use chrono::Utc;
use sea_orm::{ActiveValue, Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, Page, ResultEngine, User,
    error::user_write_error,
    microposts, pagination, password, relationships, sessions, users,
    validation::{
        ValidationErrors, normalize_username, validate_email, validate_name, validate_password,
        validate_username,
    },
};

use super::{Engine, with_tx};

/// Fields accepted when registering. Nothing else can be set at sign-up.
#[derive(Clone, Debug, Default)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    pub password_confirmation: String,
}

/// Fields a user may change on their own profile.
///
/// `admin` only changes through [`Engine::set_admin`]. A blank password keeps
/// the current one.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    pub password_confirmation: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl Engine {
    /// Registers a new account.
    ///
    /// When no username is given the account gets `user<ID>` in the same
    /// transaction.
    pub async fn sign_up(&self, form: SignUp) -> ResultEngine<User> {
        let mut errors = ValidationErrors::default();
        let name = validate_name(&form.name, &mut errors);
        let email = validate_email(&form.email, &mut errors);
        let username =
            non_blank(form.username.as_deref()).map(|raw| validate_username(raw, &mut errors));
        validate_password(
            &form.password,
            &form.password_confirmation,
            true,
            &mut errors,
        );
        self.check_taken(&email, username.as_deref(), None, &mut errors)
            .await?;
        if !errors.is_empty() {
            return Err(EngineError::Invalid(errors));
        }

        let hashed = password::hash_password(&form.password)?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                email: ActiveValue::Set(email),
                username: ActiveValue::Set(username),
                encrypted_password: ActiveValue::Set(hashed.hash),
                salt: ActiveValue::Set(hashed.salt),
                admin: ActiveValue::Set(false),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await
            .map_err(user_write_error)?;

            if model.username.is_some() {
                Ok(model)
            } else {
                let generated = format!("user{}", model.id);
                let mut active: users::ActiveModel = model.into();
                active.username = ActiveValue::Set(Some(generated));
                active.update(&db_tx).await.map_err(user_write_error)
            }
        })
    }

    /// Applies an allow-listed profile change to user `user_id`.
    pub async fn update_profile(&self, user_id: i32, form: ProfileUpdate) -> ResultEngine<User> {
        let current = self.user(user_id).await?;

        let mut errors = ValidationErrors::default();
        let name = validate_name(&form.name, &mut errors);
        let email = validate_email(&form.email, &mut errors);
        // Re-submitting the current handle (generated ones included) keeps it.
        let username = non_blank(form.username.as_deref())
            .filter(|raw| current.username.as_deref() != Some(normalize_username(raw).as_str()))
            .map(|raw| validate_username(raw, &mut errors));
        validate_password(
            &form.password,
            &form.password_confirmation,
            false,
            &mut errors,
        );
        self.check_taken(&email, username.as_deref(), Some(user_id), &mut errors)
            .await?;
        if !errors.is_empty() {
            return Err(EngineError::Invalid(errors));
        }

        let hashed = if form.password.is_empty() {
            None
        } else {
            Some(password::hash_password(&form.password)?)
        };

        with_tx!(self, |db_tx| {
            let mut active: users::ActiveModel = current.into();
            active.name = ActiveValue::Set(name);
            active.email = ActiveValue::Set(email);
            if let Some(username) = username {
                active.username = ActiveValue::Set(Some(username));
            }
            if let Some(hashed) = hashed {
                active.encrypted_password = ActiveValue::Set(hashed.hash);
                active.salt = ActiveValue::Set(hashed.salt);
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            active.update(&db_tx).await.map_err(user_write_error)
        })
    }

    /// Grants or revokes the admin flag.
    pub async fn set_admin(&self, user_id: i32, admin: bool) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let user = users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;
            let mut active: users::ActiveModel = user.into();
            active.admin = ActiveValue::Set(admin);
            active.updated_at = ActiveValue::Set(Utc::now());
            Ok(active.update(&db_tx).await?)
        })
    }

    /// Deletes a user together with their microposts, relationships in both
    /// directions and sessions.
    pub async fn destroy_user(&self, user_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;

            sessions::Entity::delete_many()
                .filter(sessions::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            microposts::Entity::delete_many()
                .filter(microposts::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            relationships::Entity::delete_many()
                .filter(
                    Condition::any()
                        .add(relationships::Column::FollowerId.eq(user_id))
                        .add(relationships::Column::FollowedId.eq(user_id)),
                )
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(user_id).exec(&db_tx).await?;
            Ok(())
        })
    }

    /// Returns a user by id.
    pub async fn user(&self, user_id: i32) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))
    }

    /// Looks a user up by email, ignoring case.
    pub async fn user_by_email(&self, email: &str) -> ResultEngine<Option<User>> {
        let email = crate::normalize_email(email);
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?)
    }

    /// Lists all users ordered by id.
    pub async fn list_users(&self, page: u64) -> ResultEngine<Page<User>> {
        let paginator = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .paginate(&self.database, self.per_page);
        pagination::fetch_page(paginator, page, self.per_page).await
    }

    pub async fn user_count(&self) -> ResultEngine<u64> {
        Ok(users::Entity::find().count(&self.database).await?)
    }

    /// Adds "has already been taken" errors for an email or username already
    /// owned by another account. Fields that already failed are skipped.
    async fn check_taken(
        &self,
        email: &str,
        username: Option<&str>,
        except: Option<i32>,
        errors: &mut ValidationErrors,
    ) -> ResultEngine<()> {
        if !errors.has("email") {
            let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
            if let Some(id) = except {
                query = query.filter(users::Column::Id.ne(id));
            }
            if query.one(&self.database).await?.is_some() {
                errors.add("email", "has already been taken");
            }
        }

        if let Some(username) = username
            && !errors.has("username")
        {
            let mut query = users::Entity::find().filter(users::Column::Username.eq(username));
            if let Some(id) = except {
                query = query.filter(users::Column::Id.ne(id));
            }
            if query.one(&self.database).await?.is_some() {
                errors.add("username", "has already been taken");
            }
        }

        Ok(())
    }
}
