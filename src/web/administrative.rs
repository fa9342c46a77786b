use crate::administrative::{create_officer, list_officers, search_officers, NewOfficerForm};
use crate::error::CaseError;
use crate::middleware::ClientCtx;
use crate::orm::users::Role;
use crate::web::users::SearchQuery;
use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_officer_search)
        .service(view_officers)
        .service(create_officer_post);
}

#[get("/api/administrative")]
pub async fn view_officers(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, CaseError> {
    client.require_role(&[Role::Admin])?;
    let officers = list_officers(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(officers))
}

#[post("/api/administrative")]
pub async fn create_officer_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<NewOfficerForm>,
) -> Result<HttpResponse, CaseError> {
    let actor = client.require_role(&[Role::Admin])?;
    let officer = create_officer(db.get_ref(), &form).await?;
    log::info!(
        "admin {} created officer badge {}",
        actor.user_id,
        officer.badge_number
    );
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "administrative": officer,
    })))
}

#[get("/api/administrative/query")]
pub async fn view_officer_search(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, CaseError> {
    client.require_role(&[Role::Admin, Role::Administrative])?;
    let officers = search_officers(db.get_ref(), &query.query).await?;
    Ok(HttpResponse::Ok().json(officers))
}
