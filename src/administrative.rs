//! Officer (Administrative role) accounts, managed by Admins.

use crate::auth::{insert_account, NewAccount};
use crate::error::CaseError;
use crate::orm::users::{self, Role};
use crate::orm::{administratives, crimes};
use crate::users::{search_condition, UserSummary};
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// One row of the officer table, with case workload.
#[derive(Clone, Debug, Serialize)]
pub struct OfficerView {
    pub badge_number: i32,
    pub designation: String,
    pub department: String,
    pub user: OfficerContact,
    pub total_cases: usize,
    pub ongoing_cases: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct OfficerContact {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub location: Option<String>,
}

pub async fn list_officers(db: &DatabaseConnection) -> Result<Vec<OfficerView>, DbErr> {
    let officers = administratives::Entity::find()
        .find_also_related(users::Entity)
        .order_by_asc(administratives::Column::BadgeNumber)
        .all(db)
        .await?;

    let officer_ids: Vec<i32> = officers.iter().map(|(a, _)| a.user_id).collect();

    // (total, ongoing) per officer
    let mut workload: HashMap<i32, (usize, usize)> = HashMap::new();
    if !officer_ids.is_empty() {
        let assigned = crimes::Entity::find()
            .filter(crimes::Column::AdministrativeId.is_in(officer_ids))
            .all(db)
            .await?;
        for crime in assigned {
            if let Some(officer_id) = crime.administrative_id {
                let entry = workload.entry(officer_id).or_default();
                entry.0 += 1;
                if crime.status.is_ongoing() {
                    entry.1 += 1;
                }
            }
        }
    }

    Ok(officers
        .into_iter()
        .filter_map(|(profile, user)| {
            let user = user?;
            let (total_cases, ongoing_cases) =
                workload.get(&user.id).copied().unwrap_or_default();
            Some(OfficerView {
                badge_number: profile.badge_number,
                designation: profile.designation,
                department: profile.department,
                user: OfficerContact {
                    user_id: user.id,
                    first_name: user.first_name,
                    last_name: user.last_name,
                    email: user.email,
                    phone_number: user.phone_number,
                    location: user.location,
                },
                total_cases,
                ongoing_cases,
            })
        })
        .collect())
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewOfficerForm {
    #[validate(length(min = 1, max = 255))]
    pub first_name: String,
    #[validate(length(min = 1, max = 255))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 1000))]
    pub password: String,
    #[validate(length(min = 1, max = 64))]
    pub designation: String,
    #[validate(length(min = 1, max = 64))]
    pub department: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreatedOfficer {
    pub badge_number: i32,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub designation: String,
    pub department: String,
}

/// Creates the user account and its officer profile together.
pub async fn create_officer(
    db: &DatabaseConnection,
    form: &NewOfficerForm,
) -> Result<CreatedOfficer, CaseError> {
    form.validate()?;

    let txn = db.begin().await?;

    let user = insert_account(
        &txn,
        NewAccount {
            first_name: &form.first_name,
            last_name: Some(&form.last_name),
            dob: None,
            location: None,
            phone_number: None,
            email: &form.email,
            password: &form.password,
            role: Role::Administrative,
        },
    )
    .await?;

    let profile = administratives::ActiveModel {
        user_id: Set(user.id),
        designation: Set(form.designation.trim().to_owned()),
        department: Set(form.department.trim().to_owned()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    log::info!(
        "Officer created: user_id={} badge={}",
        user.id,
        profile.badge_number
    );

    Ok(CreatedOfficer {
        badge_number: profile.badge_number,
        user_id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        designation: profile.designation,
        department: profile.department,
    })
}

/// Administrative users whose name or email contains `query`.
pub async fn search_officers(
    db: &DatabaseConnection,
    query: &str,
) -> Result<Vec<UserSummary>, DbErr> {
    let limit = crate::app_config::limits().search_result_limit;

    Ok(users::Entity::find()
        .filter(users::Column::Role.eq(Role::Administrative.as_str()))
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
