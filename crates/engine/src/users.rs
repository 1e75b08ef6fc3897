//! Users table.
//!
//! The password is never stored: only the Argon2 hash and the salt used to
//! produce it.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: Option<String>,
    pub encrypted_password: String,
    pub salt: String,
    pub admin: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::microposts::Entity")]
    Microposts,
    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
}

impl Related<super::microposts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Microposts.def()
    }
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Username shown on profiles, falling back to the generated form.
    pub fn handle(&self) -> String {
        self.username
            .clone()
            .unwrap_or_else(|| format!("user{}", self.id))
    }
}
