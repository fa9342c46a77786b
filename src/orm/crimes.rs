//! SeaORM Entity for crimes table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Case status. Any staff caller may set any value; there is no
/// transition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum CrimeStatus {
    #[sea_orm(string_value = "Reported")]
    Reported,
    #[sea_orm(string_value = "Accepted")]
    Accepted,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "Investigation")]
    Investigation,
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Closed")]
    Closed,
}

impl CrimeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrimeStatus::Reported => "Reported",
            CrimeStatus::Accepted => "Accepted",
            CrimeStatus::Rejected => "Rejected",
            CrimeStatus::Investigation => "Investigation",
            CrimeStatus::Pending => "Pending",
            CrimeStatus::Closed => "Closed",
        }
    }

    /// Counted as ongoing work for an officer.
    pub fn is_ongoing(&self) -> bool {
        matches!(self, CrimeStatus::Investigation | CrimeStatus::Pending)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "crimes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub crime_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub date_occurred: DateTime,
    pub status: CrimeStatus,
    pub reported_by: i32,
    pub administrative_id: Option<i32>,
    #[sea_orm(unique)]
    pub location_id: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReportedBy",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Reporter,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AdministrativeId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Administrative,
    #[sea_orm(
        belongs_to = "super::locations::Entity",
        from = "Column::LocationId",
        to = "super::locations::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Location,
}

impl Related<super::locations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
