use crate::crimes::{
    get_crime, get_crime_logs, list_crimes, report_crime, update_crime, ListQuery,
    ReportCrimeForm, UpdateCrimeForm,
};
use crate::error::CaseError;
use crate::middleware::ClientCtx;
use actix_web::{get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_crimes)
        .service(report_crime_post)
        .service(view_crime_logs)
        .service(view_crime)
        .service(update_crime_put);
}

#[get("/api/crimes")]
pub async fn view_crimes(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, CaseError> {
    let actor = client.require_login()?;
    let rows = list_crimes(db.get_ref(), &actor, &query).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[post("/api/crimes")]
pub async fn report_crime_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<ReportCrimeForm>,
) -> Result<HttpResponse, CaseError> {
    let actor = client.require_login()?;
    let crime_id = report_crime(db.get_ref(), &actor, &form).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "crime_id": crime_id,
    })))
}

#[get("/api/crimes/{crime_id}")]
pub async fn view_crime(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, CaseError> {
    let actor = client.require_login()?;
    let detail = get_crime(db.get_ref(), &actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[put("/api/crimes/{crime_id}")]
pub async fn update_crime_put(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<UpdateCrimeForm>,
) -> Result<HttpResponse, CaseError> {
    let actor = client.require_login()?;
    let detail = update_crime(db.get_ref(), &actor, path.into_inner(), &form).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "crime": detail,
    })))
}

#[get("/api/crimes/{crime_id}/logs")]
pub async fn view_crime_logs(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, CaseError> {
    let actor = client.require_login()?;
    let logs = get_crime_logs(db.get_ref(), &actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(logs))
}
