use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Stored lower-cased, so the unique index is case-insensitive in effect.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// SHA-256 hex digest of the active remember token; null until first sign-in.
    pub remember_digest: Option<String>,

    pub is_admin: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::microposts::Entity")]
    Microposts,
}

impl Related<super::microposts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Microposts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
