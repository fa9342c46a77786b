//! SeaORM Entity for users table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Stored as a short string so the schema stays portable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum Role {
    #[sea_orm(string_value = "Civilian")]
    Civilian,
    #[sea_orm(string_value = "Admin")]
    Admin,
    #[sea_orm(string_value = "Administrative")]
    Administrative,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Civilian => "Civilian",
            Role::Admin => "Admin",
            Role::Administrative => "Administrative",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Civilian" => Ok(Role::Civilian),
            "Admin" => Ok(Role::Admin),
            "Administrative" => Ok(Role::Administrative),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub dob: Option<Date>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2id PHC string.
    pub password: String,
    pub role: Role,
    pub created_at: DateTime,
}

impl Model {
    /// "First Last", without a trailing space when the last name is missing.
    pub fn display_name(&self) -> String {
        crate::users::full_name(&self.first_name, self.last_name.as_deref())
    }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        panic!("No RelationDef")
    }
}

impl ActiveModelBehavior for ActiveModel {}
