//! SeaORM Entity for crime_logs table
//!
//! Rows are only ever inserted.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "crime_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub crime_id: i32,
    pub user_id: i32,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::crimes::Entity",
        from = "Column::CrimeId",
        to = "super::crimes::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Crime,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Author,
}

impl Related<super::crimes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Crime.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
