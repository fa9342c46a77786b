//! SeaORM Entity for evidence table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "evidence")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub crime_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub img: Option<Vec<u8>>,
    pub mime: Option<String>,
    pub filename: Option<String>,
    pub submitted_by: Option<i32>,
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
        from = "Column::SubmittedBy",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Submitter,
}

impl Related<super::crimes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Crime.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
