//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::Utc;
use crimewatch::administrative::{create_officer, NewOfficerForm};
use crimewatch::auth::{hash_password, Actor};
use crimewatch::crimes::{report_crime, LocationInput, ReportCrimeForm};
use crimewatch::orm::users::{self, Role};
use crimewatch::orm::{admins, crimes};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Test user fixture
pub struct TestUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password: String, // Plain text password for testing
    pub role: Role,
}

impl TestUser {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            name: self.name.to_owned(),
            role: self.role,
        }
    }
}

/// Create a user with known credentials.
///
/// Hashing is slow in debug builds, so only users that sign in should be
/// created with `hashed = true`.
async fn insert_user(
    db: &DatabaseConnection,
    first_name: &str,
    email: &str,
    password: &str,
    role: Role,
    hashed: bool,
) -> Result<TestUser, DbErr> {
    let password_hash = if hashed {
        hash_password(password).map_err(|e| DbErr::Custom(e.to_string()))?
    } else {
        "unusable".to_string()
    };

    let user = users::ActiveModel {
        first_name: Set(first_name.to_string()),
        last_name: Set(Some("Test".to_string())),
        email: Set(email.to_lowercase()),
        password: Set(password_hash),
        role: Set(role),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    if role == Role::Admin {
        admins::ActiveModel {
            user_id: Set(user.id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(TestUser {
        id: user.id,
        name: user.display_name(),
        email: user.email,
        password: password.to_string(),
        role,
    })
}

/// Create a user that can sign in with `password`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    first_name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<TestUser, DbErr> {
    insert_user(db, first_name, email, password, role, true).await
}

/// Create a civilian that is only referenced, never signed in.
pub async fn create_civilian(db: &DatabaseConnection, first_name: &str) -> Result<TestUser, DbErr> {
    let email = format!("{}@springfield.test", first_name.to_lowercase());
    insert_user(db, first_name, &email, "", Role::Civilian, false).await
}

pub async fn create_admin(db: &DatabaseConnection, first_name: &str) -> Result<TestUser, DbErr> {
    let email = format!("{}@police.test", first_name.to_lowercase());
    insert_user(db, first_name, &email, "", Role::Admin, false).await
}

/// Create an officer account together with its administrative profile.
pub async fn create_test_officer(
    db: &DatabaseConnection,
    first_name: &str,
) -> Result<TestUser, DbErr> {
    let form = NewOfficerForm {
        first_name: first_name.to_string(),
        last_name: "Test".to_string(),
        email: format!("{}@police.test", first_name.to_lowercase()),
        password: "officer-password".to_string(),
        designation: "Sergeant".to_string(),
        department: "Homicide".to_string(),
    };
    let officer = create_officer(db, &form)
        .await
        .map_err(|e| DbErr::Custom(e.to_string()))?;

    Ok(TestUser {
        id: officer.user_id,
        name: format!("{} Test", first_name),
        email: form.email,
        password: form.password,
        role: Role::Administrative,
    })
}

pub fn springfield() -> LocationInput {
    LocationInput {
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        country: "USA".to_string(),
    }
}

pub fn report_form(title: &str) -> ReportCrimeForm {
    ReportCrimeForm {
        title: title.to_string(),
        crime_type: "Theft".to_string(),
        description: Some(format!("{} near the power plant", title)),
        date_occurred: "2024-03-01T09:30:00Z".to_string(),
        location: springfield(),
        accused_ids: Vec::new(),
        victim_ids: Vec::new(),
        evidence: Vec::new(),
    }
}

/// Report a crime as `reporter` and return its id.
pub async fn create_test_crime(
    db: &DatabaseConnection,
    reporter: &TestUser,
    title: &str,
) -> Result<i32, DbErr> {
    report_crime(db, &reporter.actor(), &report_form(title))
        .await
        .map_err(|e| DbErr::Custom(e.to_string()))
}

/// Assign `officer` to a crime directly, bypassing the update workflow.
pub async fn assign_officer(
    db: &DatabaseConnection,
    crime_id: i32,
    officer: &TestUser,
) -> Result<(), DbErr> {
    let crime = crimes::Entity::find_by_id(crime_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::Custom("crime missing".to_string()))?;
    let mut crime: crimes::ActiveModel = crime.into();
    crime.administrative_id = Set(Some(officer.id));
    crime.update(db).await?;
    Ok(())
}
