use crate::crimes::{list_crimes, CrimeRow, ListQuery};
use crate::error::CaseError;
use crate::middleware::ClientCtx;
use crate::orm::crimes::CrimeStatus;
use crate::orm::users::Role;
use actix_web::{get, web, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{DatabaseConnection, Iterable};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard);
}

struct StatusCount {
    label: &'static str,
    count: usize,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    client: ClientCtx,
    site_name: String,
    role: Role,
    status_counts: Vec<StatusCount>,
    crimes: Vec<CrimeRow>,
    query: String,
}

fn count_by_status(rows: &[CrimeRow]) -> Vec<StatusCount> {
    CrimeStatus::iter()
        .map(|status| StatusCount {
            label: status.as_str(),
            count: rows.iter().filter(|row| row.status == status).count(),
        })
        .collect()
}

/// Role-scoped summary page: status totals and the visible crime table.
#[get("/dashboard")]
pub async fn view_dashboard(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, CaseError> {
    let actor = client.require_login()?;
    let crimes = list_crimes(db.get_ref(), &actor, &query).await?;

    Ok(DashboardTemplate {
        site_name: crate::app_config::site().name,
        role: actor.role,
        status_counts: count_by_status(&crimes),
        query: query.q.clone().unwrap_or_default(),
        crimes,
        client,
    }
    .to_response())
}
