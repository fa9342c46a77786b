//! User directory and self-service profile.

use crate::error::CaseError;
use crate::orm::users::{self, Role};
use crate::orm::{admins, administratives};
use chrono::NaiveDate;
use sea_orm::{entity::*, query::*, Condition, ConnectionTrait, DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

pub fn full_name(first_name: &str, last_name: Option<&str>) -> String {
    match last_name.map(str::trim).filter(|s| !s.is_empty()) {
        Some(last) => format!("{} {}", first_name, last),
        None => first_name.to_owned(),
    }
}

/// Public view of a user, safe to embed in crime and search responses.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserSummary {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
}

impl From<&users::Model> for UserSummary {
    fn from(user: &users::Model) -> Self {
        Self {
            user_id: user.id,
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            email: user.email.to_owned(),
            phone_number: user.phone_number.to_owned(),
        }
    }
}

/// Loads users by id, keyed by id. Missing ids are simply absent.
pub async fn users_by_ids<C>(db: &C, ids: &[i32]) -> Result<HashMap<i32, users::Model>, DbErr>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(users::Entity::find()
        .filter(users::Column::Id.is_in(ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect())
}

const LIKE_ESCAPE: char = '!';

/// Lowercased `%query%` with LIKE wildcards in the query escaped by `!`.
pub fn contains_pattern(query: &str) -> String {
    let mut pattern = String::from("%");
    for c in query.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive "contains" over first name, last name and email.
pub fn search_condition(query: &str) -> Condition {
    let pattern = contains_pattern(query);
    Condition::any()
        .add(sea_orm::sea_query::Expr::cust_with_values(
            "LOWER(first_name) LIKE ? ESCAPE '!'",
            vec![pattern.clone()],
        ))
        .add(sea_orm::sea_query::Expr::cust_with_values(
            "LOWER(COALESCE(last_name, '')) LIKE ? ESCAPE '!'",
            vec![pattern.clone()],
        ))
        .add(sea_orm::sea_query::Expr::cust_with_values(
            "LOWER(email) LIKE ? ESCAPE '!'",
            vec![pattern],
        ))
}

/// Users whose name or email contains `query`.
pub async fn search_users(
    db: &DatabaseConnection,
    query: &str,
) -> Result<Vec<UserSummary>, DbErr> {
    let limit = crate::app_config::limits().search_result_limit;

    Ok(users::Entity::find()
        .filter(search_condition(query))
        .order_by_asc(users::Column::FirstName)
        .order_by_asc(users::Column::Id)
        .limit(limit)
        .all(db)
        .await?
        .iter()
        .map(UserSummary::from)
        .collect())
}

#[derive(Clone, Debug, Serialize)]
pub struct AdministrativeDetails {
    pub badge_number: i32,
    pub designation: String,
    pub department: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Profile {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub location: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_since: Option<chrono::NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative_details: Option<AdministrativeDetails>,
}

pub async fn get_profile(db: &DatabaseConnection, user_id: i32) -> Result<Profile, CaseError> {
    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| CaseError::not_found("User not found"))?;

    let admin_since = match user.role {
        Role::Admin => admins::Entity::find()
            .filter(admins::Column::UserId.eq(user.id))
            .one(db)
            .await?
            .map(|a| a.created_at),
        _ => None,
    };

    let administrative_details = match user.role {
        Role::Administrative => administratives::Entity::find()
            .filter(administratives::Column::UserId.eq(user.id))
            .one(db)
            .await?
            .map(|a| AdministrativeDetails {
                badge_number: a.badge_number,
                designation: a.designation,
                department: a.department,
            }),
        _ => None,
    };

    Ok(Profile {
        user_id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        phone_number: user.phone_number,
        dob: user.dob,
        location: user.location.unwrap_or_default(),
        role: user.role,
        admin_since,
        administrative_details,
    })
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 255))]
    pub first_name: String,
    #[validate(length(max = 255))]
    pub last_name: Option<String>,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    pub dob: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
}

/// Replaces the editable profile fields. Email and role are not editable here.
pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: i32,
    update: &ProfileUpdate,
) -> Result<Profile, CaseError> {
    update.validate()?;

    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| CaseError::not_found("User not found"))?;

    let mut active: users::ActiveModel = user.into();
    active.first_name = Set(update.first_name.trim().to_owned());
    active.last_name = Set(update.last_name.to_owned());
    active.phone_number = Set(update.phone_number.to_owned());
    active.dob = Set(update.dob);
    active.location = Set(update.location.to_owned());
    active.update(db).await?;

    log::debug!("profile updated: user_id={}", user_id);
    get_profile(db, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_skips_missing_last_name() {
        assert_eq!(full_name("Ned", Some("Flanders")), "Ned Flanders");
        assert_eq!(full_name("Apu", None), "Apu");
        assert_eq!(full_name("Apu", Some("  ")), "Apu");
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(" Homer "), "%homer%");
        assert_eq!(contains_pattern("_"), "%!_%");
        assert_eq!(contains_pattern("100%"), "%100!%%");
        assert_eq!(contains_pattern("hey!"), "%hey!!%");
    }
}
