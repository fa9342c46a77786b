use crate::error::CaseError;
use crate::middleware::ClientCtx;
use crate::users::{get_profile, update_profile, ProfileUpdate};
use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_profile).service(update_own_profile);
}

#[get("/api/profile")]
pub async fn view_profile(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, CaseError> {
    let actor = client.require_login()?;
    let profile = get_profile(db.get_ref(), actor.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[post("/api/profile")]
pub async fn update_own_profile(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, CaseError> {
    let actor = client.require_login()?;
    let profile = update_profile(db.get_ref(), actor.user_id, &form).await?;
    Ok(HttpResponse::Ok().json(profile))
}
