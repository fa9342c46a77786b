use crate::auth::Actor;
use crate::error::CaseError;
use crate::orm::users::Role;
use crate::session::{authenticate_by_session, SessionIdentity};
use actix_session::SessionExt;
use actix_web::dev::{Extensions, Payload};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use std::time::{Duration, Instant};

/// Client data stored for a single request cycle.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// Session identity. None is an anonymous visitor.
    pub client: Option<SessionIdentity>,
    /// Time the request started for page load statistics.
    pub request_start: Instant,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            client: None,
            request_start: Instant::now(),
        }
    }
}

impl ClientCtxInner {
    pub fn from_request(req: &HttpRequest) -> Self {
        Self {
            client: authenticate_by_session(&req.get_session()),
            ..Default::default()
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is resolved once per request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    pub fn get_or_insert_from_extensions(req: &HttpRequest) -> Self {
        if let Some(cbox) = req.extensions().get::<Data<ClientCtxInner>>() {
            return Self(cbox.clone());
        }

        let cbox = Data::new(ClientCtxInner::from_request(req));
        Self::insert(&mut req.extensions_mut(), cbox)
    }

    fn insert(extensions: &mut Extensions, cbox: Data<ClientCtxInner>) -> Self {
        extensions.insert(cbox.clone());
        Self(cbox)
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.client.as_ref().map(|u| u.user_id)
    }

    /// Returns either the user's name or the word for guest.
    pub fn get_name(&self) -> String {
        match &self.0.client {
            Some(user) => user.name.to_owned(),
            None => "Guest".to_owned(),
        }
    }

    pub fn get_identity(&self) -> Option<&SessionIdentity> {
        self.0.client.as_ref()
    }

    pub fn is_user(&self) -> bool {
        self.0.client.is_some()
    }

    /// Require user to be logged in. Returns the acting user or 401.
    pub fn require_login(&self) -> Result<Actor, CaseError> {
        self.0
            .client
            .as_ref()
            .map(SessionIdentity::actor)
            .ok_or_else(CaseError::unauthorized)
    }

    /// Require one of `roles`. Returns the acting user, 401 or 403.
    pub fn require_role(&self, roles: &[Role]) -> Result<Actor, CaseError> {
        let actor = self.require_login()?;
        if roles.contains(&actor.role) {
            Ok(actor)
        } else {
            Err(CaseError::forbidden("Insufficient permissions"))
        }
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.request_start
    }

    /// Returns human readable representing request time.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::get_or_insert_from_extensions(req)))
    }
}
