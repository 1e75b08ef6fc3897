use chrono::Utc;
use sea_orm::{ActiveValue, Condition, QueryFilter, QueryOrder, prelude::*};

use crate::{
    EngineError, Micropost, Page, ResultEngine, microposts, pagination, users,
    validation::{ValidationErrors, validate_content, validate_location},
};

use super::{Engine, relationships::followed_ids};

impl Engine {
    /// Publishes a micropost for `user_id`.
    pub async fn post_micropost(
        &self,
        user_id: i32,
        content: &str,
        location: Option<&str>,
    ) -> ResultEngine<Micropost> {
        let mut errors = ValidationErrors::default();
        let content = validate_content(content, &mut errors);
        let location = validate_location(location, &mut errors);
        if !errors.is_empty() {
            return Err(EngineError::Invalid(errors));
        }

        if users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .is_none()
        {
            return Err(EngineError::KeyNotFound(format!("user {user_id}")));
        }

        let now = Utc::now();
        Ok(microposts::ActiveModel {
            id: ActiveValue::NotSet,
            content: ActiveValue::Set(content),
            location: ActiveValue::Set(location),
            user_id: ActiveValue::Set(user_id),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await?)
    }

    pub async fn micropost(&self, micropost_id: i32) -> ResultEngine<Micropost> {
        microposts::Entity::find_by_id(micropost_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("micropost {micropost_id}")))
    }

    /// Deletes a micropost. Only its author may do so.
    pub async fn delete_micropost(&self, micropost_id: i32, actor_id: i32) -> ResultEngine<()> {
        let micropost = self.micropost(micropost_id).await?;
        if micropost.user_id != actor_id {
            return Err(EngineError::Forbidden(
                "only the author can delete a micropost".to_string(),
            ));
        }
        microposts::Entity::delete_by_id(micropost.id)
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Microposts written by `user_id`, newest first.
    pub async fn microposts_for(&self, user_id: i32, page: u64) -> ResultEngine<Page<Micropost>> {
        let paginator = microposts::Entity::find()
            .filter(microposts::Column::UserId.eq(user_id))
            .order_by_desc(microposts::Column::CreatedAt)
            .order_by_desc(microposts::Column::Id)
            .paginate(&self.database, self.per_page);
        pagination::fetch_page(paginator, page, self.per_page).await
    }

    /// Microposts by `user_id` and by everyone they follow, newest first.
    pub async fn feed(&self, user_id: i32, page: u64) -> ResultEngine<Page<Micropost>> {
        let paginator = microposts::Entity::find()
            .filter(
                Condition::any()
                    .add(microposts::Column::UserId.eq(user_id))
                    .add(microposts::Column::UserId.in_subquery(followed_ids(user_id))),
            )
            .order_by_desc(microposts::Column::CreatedAt)
            .order_by_desc(microposts::Column::Id)
            .paginate(&self.database, self.per_page);
        pagination::fetch_page(paginator, page, self.per_page).await
    }

    pub async fn microposts_count(&self, user_id: i32) -> ResultEngine<u64> {
        Ok(microposts::Entity::find()
            .filter(microposts::Column::UserId.eq(user_id))
            .count(&self.database)
            .await?)
    }
}
