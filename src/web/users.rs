use crate::error::CaseError;
use crate::middleware::ClientCtx;
use crate::users::search_users;
use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_user_search);
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[get("/api/users")]
pub async fn view_user_search(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, CaseError> {
    client.require_login()?;
    let users = search_users(db.get_ref(), &query.query).await?;
    Ok(HttpResponse::Ok().json(users))
}
