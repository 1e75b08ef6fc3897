use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::{Query, SelectStatement},
};

use crate::{EngineError, Page, Relationship, ResultEngine, User, pagination, relationships, users};

use super::{Engine, with_tx};

/// `SELECT followed_id FROM relationships WHERE follower_id = ?`
pub(super) fn followed_ids(follower_id: i32) -> SelectStatement {
    Query::select()
        .column(relationships::Column::FollowedId)
        .from(relationships::Entity)
        .and_where(relationships::Column::FollowerId.eq(follower_id))
        .to_owned()
}

/// `SELECT follower_id FROM relationships WHERE followed_id = ?`
fn follower_ids(followed_id: i32) -> SelectStatement {
    Query::select()
        .column(relationships::Column::FollowerId)
        .from(relationships::Entity)
        .and_where(relationships::Column::FollowedId.eq(followed_id))
        .to_owned()
}

impl Engine {
    async fn require_user(&self, db: &DatabaseTransaction, user_id: i32) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(user_id).one(db).await?.is_some();
        if !exists {
            return Err(EngineError::KeyNotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    async fn find_edge<C: ConnectionTrait>(
        db: &C,
        follower_id: i32,
        followed_id: i32,
    ) -> ResultEngine<Option<Relationship>> {
        Ok(relationships::Entity::find()
            .filter(relationships::Column::FollowerId.eq(follower_id))
            .filter(relationships::Column::FollowedId.eq(followed_id))
            .one(db)
            .await?)
    }

    /// Makes `follower_id` follow `followed_id`.
    ///
    /// Following yourself is forbidden. Following someone twice returns the
    /// existing relationship instead of creating a second one.
    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> ResultEngine<Relationship> {
        if follower_id == followed_id {
            return Err(EngineError::Forbidden(
                "users cannot follow themselves".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, follower_id).await?;
            self.require_user(&db_tx, followed_id).await?;

            if let Some(existing) = Self::find_edge(&db_tx, follower_id, followed_id).await? {
                return Ok(existing);
            }

            let now = Utc::now();
            let created = relationships::ActiveModel {
                id: ActiveValue::NotSet,
                follower_id: ActiveValue::Set(follower_id),
                followed_id: ActiveValue::Set(followed_id),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| match err.sql_err() {
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => EngineError::ExistingKey(
                    format!("relationship {follower_id} -> {followed_id}"),
                ),
                _ => EngineError::Database(err),
            })?;
            Ok(created)
        })
    }

    /// Removes the follow edge if present. Returns whether an edge was removed.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> ResultEngine<bool> {
        let res = relationships::Entity::delete_many()
            .filter(relationships::Column::FollowerId.eq(follower_id))
            .filter(relationships::Column::FollowedId.eq(followed_id))
            .exec(&self.database)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Whether `follower_id` currently follows `followed_id`.
    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> ResultEngine<bool> {
        Ok(self
            .relationship_between(follower_id, followed_id)
            .await?
            .is_some())
    }

    /// The edge from `follower_id` to `followed_id`, if any.
    pub async fn relationship_between(
        &self,
        follower_id: i32,
        followed_id: i32,
    ) -> ResultEngine<Option<Relationship>> {
        Self::find_edge(&self.database, follower_id, followed_id).await
    }

    pub async fn relationship(&self, relationship_id: i32) -> ResultEngine<Relationship> {
        relationships::Entity::find_by_id(relationship_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("relationship {relationship_id}")))
    }

    /// Users that `user_id` follows, ordered by id.
    pub async fn following(&self, user_id: i32, page: u64) -> ResultEngine<Page<User>> {
        let paginator = users::Entity::find()
            .filter(users::Column::Id.in_subquery(followed_ids(user_id)))
            .order_by_asc(users::Column::Id)
            .paginate(&self.database, self.per_page);
        pagination::fetch_page(paginator, page, self.per_page).await
    }

    /// Users following `user_id`, ordered by id.
    pub async fn followers(&self, user_id: i32, page: u64) -> ResultEngine<Page<User>> {
        let paginator = users::Entity::find()
            .filter(users::Column::Id.in_subquery(follower_ids(user_id)))
            .order_by_asc(users::Column::Id)
            .paginate(&self.database, self.per_page);
        pagination::fetch_page(paginator, page, self.per_page).await
    }

    pub async fn following_count(&self, user_id: i32) -> ResultEngine<u64> {
        Ok(relationships::Entity::find()
            .filter(relationships::Column::FollowerId.eq(user_id))
            .count(&self.database)
            .await?)
    }

    pub async fn followers_count(&self, user_id: i32) -> ResultEngine<u64> {
        Ok(relationships::Entity::find()
            .filter(relationships::Column::FollowedId.eq(user_id))
            .count(&self.database)
            .await?)
    }
}
