use crate::auth::{register_civilian, sign_in, SignInError, SignUpForm};
use crate::error::CaseError;
use crate::middleware::ClientCtx;
use crate::orm::users::Role;
use crate::session::{clear_session, issue_session, SessionIdentity};
use actix_session::Session;
use actix_web::{get, post, web, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_signin)
        .service(post_signout)
        .service(post_signup)
        .service(view_session);
}

#[derive(Deserialize)]
pub struct SignInForm {
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

#[derive(Serialize)]
struct SessionUser<'a> {
    user_id: i32,
    name: &'a str,
    email: &'a str,
    role: Role,
    expires_at: i64,
}

impl<'a> From<&'a SessionIdentity> for SessionUser<'a> {
    fn from(identity: &'a SessionIdentity) -> Self {
        Self {
            user_id: identity.user_id,
            name: &identity.name,
            email: &identity.email,
            role: identity.role,
            expires_at: identity.expires_at,
        }
    }
}

fn sign_in_failure(kind: SignInError) -> HttpResponse {
    let body = serde_json::json!({ "error": kind.to_string() });
    match kind {
        SignInError::MissingFields => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::Unauthorized().json(body),
    }
}

#[post("/api/auth/signin")]
pub async fn post_signin(
    db: web::Data<DatabaseConnection>,
    cookies: Session,
    form: web::Json<SignInForm>,
) -> Result<HttpResponse, CaseError> {
    let email = form.email.as_deref().unwrap_or_default();
    let password = form.password.as_deref().unwrap_or_default();
    let role = match form.role.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => match name.parse::<Role>() {
            Ok(role) => Some(role),
            Err(()) => return Ok(sign_in_failure(SignInError::InvalidRole)),
        },
    };

    let user = match sign_in(db.get_ref(), email, password, role).await? {
        Ok(user) => user,
        Err(kind) => {
            log::debug!("sign-in refused: {}", kind);
            return Ok(sign_in_failure(kind));
        }
    };

    let identity =
        SessionIdentity::for_user(&user, crate::app_config::security().session_ttl_minutes);
    issue_session(&cookies, &identity)
        .map_err(|e| CaseError::internal(format!("failed to store session: {}", e)))?;

    log::info!("user {} signed in as {}", user.id, user.role);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": SessionUser::from(&identity),
    })))
}

#[post("/api/auth/signout")]
pub async fn post_signout(client: ClientCtx, cookies: Session) -> impl Responder {
    if let Some(user_id) = client.get_id() {
        log::debug!("user {} signed out", user_id);
    }
    clear_session(&cookies);
    HttpResponse::Ok().json(serde_json::json!({ "success": true }))
}

#[post("/api/auth/signup")]
pub async fn post_signup(
    db: web::Data<DatabaseConnection>,
    form: web::Json<SignUpForm>,
) -> Result<HttpResponse, CaseError> {
    let user = register_civilian(db.get_ref(), &form).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "user_id": user.id,
    })))
}

#[get("/api/auth/session")]
pub async fn view_session(client: ClientCtx) -> Result<HttpResponse, CaseError> {
    let identity = client.get_identity().ok_or_else(CaseError::unauthorized)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "user": SessionUser::from(identity) })))
}
