use crate::error::CaseError;
use crate::evidence::{apply_changes, list_evidence, EvidenceChangeSet};
use crate::middleware::ClientCtx;
use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_evidence).service(change_evidence);
}

#[get("/api/crimes/{crime_id}/evidence")]
pub async fn view_evidence(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, CaseError> {
    let actor = client.require_login()?;
    let items = list_evidence(db.get_ref(), &actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(items))
}

#[post("/api/crimes/{crime_id}/evidence")]
pub async fn change_evidence(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    changes: web::Json<EvidenceChangeSet>,
) -> Result<HttpResponse, CaseError> {
    let actor = client.require_login()?;
    let result = apply_changes(db.get_ref(), &actor, path.into_inner(), &changes).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "result": result,
    })))
}
