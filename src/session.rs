//! Signed-cookie session identity.
//!
//! The cookie is signed by `actix-session`; the identity inside it carries
//! its own expiry so a session cannot outlive its window even when the
//! browser keeps the cookie around. Signing in again is the only renewal.

use crate::auth::Actor;
use crate::orm::users::{self, Role};
use actix_session::Session;
use argon2::Argon2;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const IDENTITY_KEY: &str = "identity";

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

/// What a signed-in session asserts about its holder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Unix timestamp in seconds.
    pub expires_at: i64,
}

impl SessionIdentity {
    pub fn for_user(user: &users::Model, ttl_minutes: u32) -> Self {
        Self {
            user_id: user.id,
            name: user.display_name(),
            email: user.email.to_owned(),
            role: user.role,
            expires_at: Utc::now().timestamp() + i64::from(ttl_minutes) * 60,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            name: self.name.to_owned(),
            role: self.role,
        }
    }
}

/// Stores a fresh identity in the session, replacing any previous one.
pub fn issue_session(
    session: &Session,
    identity: &SessionIdentity,
) -> Result<(), actix_session::SessionInsertError> {
    session.renew();
    session.insert(IDENTITY_KEY, identity)
}

/// Returns the identity held by the session, if present and unexpired.
pub fn authenticate_by_session(session: &Session) -> Option<SessionIdentity> {
    match session.get::<SessionIdentity>(IDENTITY_KEY) {
        Ok(Some(identity)) if identity.is_expired() => {
            log::debug!("session expired for user_id={}", identity.user_id);
            session.remove(IDENTITY_KEY);
            None
        }
        Ok(identity) => identity,
        Err(e) => {
            log::error!("authenticate_by_session: {}", e);
            None
        }
    }
}

pub fn clear_session(session: &Session) {
    session.purge();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> users::Model {
        users::Model {
            id: 7,
            first_name: "Marge".to_owned(),
            last_name: Some("Bouvier".to_owned()),
            dob: None,
            location: None,
            phone_number: None,
            email: "marge@example.com".to_owned(),
            password: String::new(),
            role: Role::Civilian,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn identity_expires_after_window() {
        let mut identity = SessionIdentity::for_user(&user(), 60);
        assert!(!identity.is_expired());
        assert_eq!(identity.name, "Marge Bouvier");

        identity.expires_at = Utc::now().timestamp() - 1;
        assert!(identity.is_expired());
    }

    #[test]
    fn identity_maps_to_actor() {
        let actor = SessionIdentity::for_user(&user(), 60).actor();
        assert_eq!(actor.user_id, 7);
        assert_eq!(actor.role, Role::Civilian);
    }
}
