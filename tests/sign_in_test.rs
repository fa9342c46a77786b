//! Integration tests for the credential check and civilian registration

mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use crimewatch::auth::{register_civilian, sign_in, SignInError, SignUpForm};
use crimewatch::error::CaseError;
use crimewatch::orm::users::Role;

#[actix_rt::test]
#[serial]
async fn test_sign_in_with_valid_credentials() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let marge = create_test_user(&db, "Marge", "marge@springfield.test", "donut-lover", Role::Civilian)
        .await
        .expect("Failed to create user");

    // Email lookup ignores case and surrounding whitespace
    let user = sign_in(&db, "  Marge@Springfield.TEST ", "donut-lover", Some(Role::Civilian))
        .await
        .expect("Database error")
        .expect("Sign-in should succeed");

    assert_eq!(user.id, marge.id);
    assert_eq!(user.display_name(), "Marge Test");
}

#[actix_rt::test]
#[serial]
async fn test_sign_in_reports_specific_failure() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    create_test_user(&db, "Lou", "lou@police.test", "badge-1234", Role::Administrative)
        .await
        .expect("Failed to create user");

    let attempt = |email: &'static str, password: &'static str, role: Option<Role>| {
        let db = db.clone();
        async move { sign_in(&db, email, password, role).await.expect("Database error") }
    };

    assert_eq!(
        attempt("nobody@police.test", "badge-1234", Some(Role::Administrative)).await,
        Err(SignInError::UserNotFound)
    );
    assert_eq!(
        attempt("lou@police.test", "wrong-password", Some(Role::Administrative)).await,
        Err(SignInError::InvalidPassword)
    );
    assert_eq!(
        attempt("lou@police.test", "badge-1234", Some(Role::Admin)).await,
        Err(SignInError::InvalidRole)
    );
    assert_eq!(
        attempt("lou@police.test", "badge-1234", None).await,
        Err(SignInError::MissingFields)
    );
    assert_eq!(
        attempt("", "badge-1234", Some(Role::Administrative)).await,
        Err(SignInError::MissingFields)
    );
}

fn signup(email: &str, password: &str) -> SignUpForm {
    SignUpForm {
        first_name: "Homer".to_string(),
        last_name: Some("Simpson".to_string()),
        dob: None,
        location: Some("Springfield".to_string()),
        phone_number: Some("555-0113".to_string()),
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[actix_rt::test]
#[serial]
async fn test_signup_creates_civilian_that_can_sign_in() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let user = register_civilian(&db, &signup("Homer@Springfield.test", "mmm-donuts"))
        .await
        .expect("Signup should succeed");
    assert_eq!(user.role, Role::Civilian);
    assert_eq!(user.email, "homer@springfield.test");
    assert_ne!(user.password, "mmm-donuts", "Password must be stored hashed");

    let signed_in = sign_in(&db, "homer@springfield.test", "mmm-donuts", Some(Role::Civilian))
        .await
        .expect("Database error");
    assert!(signed_in.is_ok());
}

#[actix_rt::test]
#[serial]
async fn test_signup_rejects_duplicate_email() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    register_civilian(&db, &signup("homer@springfield.test", "mmm-donuts"))
        .await
        .expect("First signup should succeed");

    let duplicate = register_civilian(&db, &signup("HOMER@springfield.test", "other-password")).await;
    assert!(matches!(duplicate, Err(CaseError::Conflict(_))));
}

#[actix_rt::test]
#[serial]
async fn test_signup_rejects_short_password_and_bad_email() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let short = register_civilian(&db, &signup("bart@springfield.test", "short")).await;
    assert!(matches!(short, Err(CaseError::Validation(_))));

    let bad_email = register_civilian(&db, &signup("not-an-email", "long-enough-password")).await;
    assert!(matches!(bad_email, Err(CaseError::Validation(_))));
}
