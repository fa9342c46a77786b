//! SeaORM Entity for administratives table
//!
//! Officer profile attached to a user with the Administrative role.
//! The badge number doubles as the primary key.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "administratives")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub badge_number: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub designation: String,
    pub department: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
