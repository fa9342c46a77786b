//! Crime reports: reporting, role-scoped reads and the full-replace update
//! workflow.

pub mod reconcile;

use crate::auth::Actor;
use crate::crime_log::{append_log, list_logs, LogEntry};
use crate::error::CaseError;
use crate::evidence::{evidence_for_crime, insert_report_evidence, EvidenceSummary, NewEvidence};
use crate::orm::crimes::{self, CrimeStatus};
use crate::orm::locations;
use crate::orm::users::{self, Role};
use crate::users::{users_by_ids, UserSummary};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reconcile::{crimes_for_party, dedup_ids, link_all, party_ids, reconcile, Party};
use sea_orm::{entity::*, query::*, Condition, ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Human-facing case reference.
pub fn case_id(crime_id: i32) -> String {
    format!("CR-{}", crime_id)
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` and bare dates.
pub fn parse_date_occurred(value: &str) -> Result<NaiveDateTime, CaseError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| CaseError::validation("Invalid date"))
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct LocationInput {
    #[validate(length(min = 1, max = 128))]
    pub city: String,
    #[validate(length(min = 1, max = 128))]
    pub state: String,
    #[validate(length(min = 1, max = 128))]
    pub country: String,
}

impl From<&locations::Model> for LocationInput {
    fn from(loc: &locations::Model) -> Self {
        Self {
            city: loc.city.to_owned(),
            state: loc.state.to_owned(),
            country: loc.country.to_owned(),
        }
    }
}

// ============ Authorization ============

pub(crate) async fn load_crime<C>(db: &C, crime_id: i32) -> Result<crimes::Model, CaseError>
where
    C: ConnectionTrait,
{
    crimes::Entity::find_by_id(crime_id)
        .one(db)
        .await?
        .ok_or_else(|| CaseError::not_found("Crime not found"))
}

/// How `user_id` is involved in `crime`, if at all. Victim wins over
/// accused, accused over reporter.
pub async fn party_role<C>(
    db: &C,
    crime: &crimes::Model,
    user_id: i32,
) -> Result<Option<&'static str>, DbErr>
where
    C: ConnectionTrait,
{
    if party_ids(db, Party::Victim, crime.id).await?.contains(&user_id) {
        return Ok(Some(Party::Victim.label()));
    }
    if party_ids(db, Party::Accused, crime.id).await?.contains(&user_id) {
        return Ok(Some(Party::Accused.label()));
    }
    if crime.reported_by == user_id {
        return Ok(Some("Reporter"));
    }
    Ok(None)
}

/// Admin sees every crime, Administrative the ones assigned to them,
/// Civilian the ones they are party to.
pub(crate) async fn authorize_view<C>(
    db: &C,
    actor: &Actor,
    crime: &crimes::Model,
) -> Result<(), CaseError>
where
    C: ConnectionTrait,
{
    let visible = match actor.role {
        Role::Admin => true,
        Role::Administrative => crime.administrative_id == Some(actor.user_id),
        Role::Civilian => party_role(db, crime, actor.user_id).await?.is_some(),
    };

    if visible {
        Ok(())
    } else {
        Err(CaseError::forbidden("You do not have access to this crime"))
    }
}

/// Only staff edit cases; officers only the ones assigned to them.
pub(crate) fn authorize_edit(actor: &Actor, crime: &crimes::Model) -> Result<(), CaseError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Administrative if crime.administrative_id == Some(actor.user_id) => Ok(()),
        Role::Administrative => Err(CaseError::forbidden("Crime is not assigned to you")),
        Role::Civilian => Err(CaseError::forbidden("Only officers may update crimes")),
    }
}

/// Rejects ids that do not name an existing user.
async fn ensure_users_exist<C>(db: &C, ids: &[i32], what: &str) -> Result<(), CaseError>
where
    C: ConnectionTrait,
{
    let found = users_by_ids(db, ids).await?;
    if let Some(missing) = ids.iter().find(|id| !found.contains_key(id)) {
        return Err(CaseError::referential(format!(
            "{} user {} not found",
            what, missing
        )));
    }
    Ok(())
}

async fn ensure_officer<C>(db: &C, user_id: i32) -> Result<(), CaseError>
where
    C: ConnectionTrait,
{
    match users::Entity::find_by_id(user_id).one(db).await? {
        Some(user) if user.role == Role::Administrative => Ok(()),
        Some(_) => Err(CaseError::referential(format!(
            "User {} is not an administrative officer",
            user_id
        ))),
        None => Err(CaseError::referential(format!(
            "Administrative user {} not found",
            user_id
        ))),
    }
}

// ============ Reporting ============

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ReportCrimeForm {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 64))]
    pub crime_type: String,
    pub description: Option<String>,
    pub date_occurred: String,
    pub location: LocationInput,
    #[serde(default)]
    pub accused_ids: Vec<i32>,
    #[serde(default)]
    pub victim_ids: Vec<i32>,
    #[serde(default)]
    pub evidence: Vec<NewEvidence>,
}

/// Files a new report on behalf of `actor`. Status starts at Reported.
pub async fn report_crime(
    db: &DatabaseConnection,
    actor: &Actor,
    form: &ReportCrimeForm,
) -> Result<i32, CaseError> {
    form.validate()?;
    form.location.validate()?;
    let date_occurred = parse_date_occurred(&form.date_occurred)?;
    let accused_ids = dedup_ids(&form.accused_ids);
    let victim_ids = dedup_ids(&form.victim_ids);

    let txn = db.begin().await?;

    ensure_users_exist(&txn, &[actor.user_id], "Reporting").await?;
    ensure_users_exist(&txn, &accused_ids, "Accused").await?;
    ensure_users_exist(&txn, &victim_ids, "Victim").await?;

    let location = locations::ActiveModel {
        city: Set(form.location.city.to_owned()),
        state: Set(form.location.state.to_owned()),
        country: Set(form.location.country.to_owned()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let now = Utc::now().naive_utc();
    let crime = crimes::ActiveModel {
        title: Set(form.title.trim().to_owned()),
        crime_type: Set(form.crime_type.trim().to_owned()),
        description: Set(form.description.clone()),
        date_occurred: Set(date_occurred),
        status: Set(CrimeStatus::Reported),
        reported_by: Set(actor.user_id),
        administrative_id: Set(None),
        location_id: Set(location.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    link_all(&txn, Party::Accused, crime.id, &accused_ids).await?;
    link_all(&txn, Party::Victim, crime.id, &victim_ids).await?;
    insert_report_evidence(&txn, crime.id, actor.user_id, &form.evidence).await?;
    append_log(
        &txn,
        crime.id,
        actor.user_id,
        &format!("Crime reported by {}", actor.name),
    )
    .await?;

    txn.commit().await?;

    log::info!("crime {} reported by user {}", crime.id, actor.user_id);
    Ok(crime.id)
}

// ============ Reads ============

#[derive(Clone, Debug, Serialize)]
pub struct CrimeDetail {
    pub crime_id: i32,
    pub case_id: String,
    pub title: String,
    pub crime_type: String,
    pub description: Option<String>,
    pub date_occurred: NaiveDateTime,
    pub status: CrimeStatus,
    pub location: LocationInput,
    pub reported_by: Option<UserSummary>,
    pub administrative: Option<UserSummary>,
    pub victims: Vec<UserSummary>,
    pub accused: Vec<UserSummary>,
    pub evidence: Vec<EvidenceSummary>,
    pub logs: Vec<LogEntry>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

async fn build_detail<C>(db: &C, crime: crimes::Model) -> Result<CrimeDetail, CaseError>
where
    C: ConnectionTrait,
{
    let location = locations::Entity::find_by_id(crime.location_id)
        .one(db)
        .await?
        .ok_or_else(|| CaseError::internal(format!("crime {} has no location", crime.id)))?;

    let victim_ids = party_ids(db, Party::Victim, crime.id).await?;
    let accused_ids = party_ids(db, Party::Accused, crime.id).await?;

    let mut wanted: Vec<i32> = victim_ids.iter().chain(accused_ids.iter()).copied().collect();
    wanted.push(crime.reported_by);
    wanted.extend(crime.administrative_id);
    let people = users_by_ids(db, &wanted).await?;
    let summarize = |ids: &[i32]| -> Vec<UserSummary> {
        ids.iter()
            .filter_map(|id| people.get(id))
            .map(UserSummary::from)
            .collect()
    };

    let evidence = evidence_for_crime(db, crime.id).await?;
    let logs = list_logs(db, crime.id).await?;

    Ok(CrimeDetail {
        crime_id: crime.id,
        case_id: case_id(crime.id),
        title: crime.title,
        crime_type: crime.crime_type,
        description: crime.description,
        date_occurred: crime.date_occurred,
        status: crime.status,
        location: LocationInput::from(&location),
        reported_by: people.get(&crime.reported_by).map(UserSummary::from),
        administrative: crime
            .administrative_id
            .and_then(|id| people.get(&id))
            .map(UserSummary::from),
        victims: summarize(&victim_ids),
        accused: summarize(&accused_ids),
        evidence: evidence.iter().map(EvidenceSummary::from).collect(),
        logs,
        created_at: crime.created_at,
        updated_at: crime.updated_at,
    })
}

pub async fn get_crime(
    db: &DatabaseConnection,
    actor: &Actor,
    crime_id: i32,
) -> Result<CrimeDetail, CaseError> {
    let crime = load_crime(db, crime_id).await?;
    authorize_view(db, actor, &crime).await?;
    build_detail(db, crime).await
}

/// The case log of a crime visible to `actor`.
pub async fn get_crime_logs(
    db: &DatabaseConnection,
    actor: &Actor,
    crime_id: i32,
) -> Result<Vec<LogEntry>, CaseError> {
    let crime = load_crime(db, crime_id).await?;
    authorize_view(db, actor, &crime).await?;
    Ok(list_logs(db, crime_id).await?)
}

/// One line of the crime table.
#[derive(Clone, Debug, Serialize)]
pub struct CrimeRow {
    pub id: i32,
    pub case_id: String,
    pub title: String,
    pub crime_type: String,
    pub status: CrimeStatus,
    pub date_occurred: NaiveDateTime,
    pub location: String,
    pub assigned_officer: String,
    pub description: Option<String>,
    pub party_role: Option<&'static str>,
}

impl CrimeRow {
    /// Case-insensitive substring match over the searchable text fields.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            Some(self.title.as_str()),
            Some(self.crime_type.as_str()),
            self.description.as_deref(),
            Some(self.status.as_str()),
            Some(self.location.as_str()),
            Some(self.case_id.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

/// Crimes visible to `actor`, newest occurrence first, optionally filtered.
pub async fn list_crimes(
    db: &DatabaseConnection,
    actor: &Actor,
    query: &ListQuery,
) -> Result<Vec<CrimeRow>, CaseError> {
    let mut select = crimes::Entity::find();

    let mut victim_of: Vec<i32> = Vec::new();
    let mut accused_in: Vec<i32> = Vec::new();
    match actor.role {
        Role::Admin => {}
        Role::Administrative => {
            select = select.filter(crimes::Column::AdministrativeId.eq(actor.user_id));
        }
        Role::Civilian => {
            victim_of = crimes_for_party(db, Party::Victim, actor.user_id).await?;
            accused_in = crimes_for_party(db, Party::Accused, actor.user_id).await?;

            let party_crimes = dedup_ids(&[victim_of.as_slice(), accused_in.as_slice()].concat());
            let mut scope = Condition::any().add(crimes::Column::ReportedBy.eq(actor.user_id));
            if !party_crimes.is_empty() {
                scope = scope.add(crimes::Column::Id.is_in(party_crimes));
            }
            select = select.filter(scope);
        }
    }

    let found = select
        .find_also_related(locations::Entity)
        .order_by_desc(crimes::Column::DateOccurred)
        .order_by_desc(crimes::Column::Id)
        .all(db)
        .await?;

    let officer_ids: Vec<i32> = found.iter().filter_map(|(c, _)| c.administrative_id).collect();
    let officers = users_by_ids(db, &officer_ids).await?;

    let rows = found.into_iter().map(|(crime, location)| {
        let party_role = match actor.role {
            Role::Civilian if victim_of.contains(&crime.id) => Some(Party::Victim.label()),
            Role::Civilian if accused_in.contains(&crime.id) => Some(Party::Accused.label()),
            Role::Civilian if crime.reported_by == actor.user_id => Some("Reporter"),
            _ => None,
        };

        CrimeRow {
            id: crime.id,
            case_id: case_id(crime.id),
            location: location
                .map(|l| format!("{}, {}", l.city, l.state))
                .unwrap_or_default(),
            assigned_officer: crime
                .administrative_id
                .and_then(|id| officers.get(&id))
                .map(|u| u.display_name())
                .unwrap_or_else(|| "Unassigned".to_owned()),
            title: crime.title,
            crime_type: crime.crime_type,
            status: crime.status,
            date_occurred: crime.date_occurred,
            description: crime.description,
            party_role,
        }
    });

    Ok(match query.q.as_deref() {
        Some(needle) => rows.filter(|row| row.matches(needle)).collect(),
        None => rows.collect(),
    })
}

// ============ Full-replace update ============

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct UpdateCrimeForm {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 64))]
    pub crime_type: String,
    pub status: CrimeStatus,
    pub description: Option<String>,
    pub date_occurred: String,
    pub location: LocationInput,
    #[serde(default)]
    pub accused_ids: Vec<i32>,
    #[serde(default)]
    pub victim_ids: Vec<i32>,
    /// Only honoured for Admin callers. `None` detaches the officer.
    #[serde(default)]
    pub administrative_id: Option<i32>,
    #[serde(default)]
    /// Blank messages fall back to the default entry.
    #[validate(length(max = 2000))]
    pub log_message: Option<String>,
}

/// Replaces the fields and relation sets of a crime and appends one log
/// entry, all in a single transaction.
///
/// Concurrent updates of the same crime are last-write-wins.
pub async fn update_crime(
    db: &DatabaseConnection,
    actor: &Actor,
    crime_id: i32,
    form: &UpdateCrimeForm,
) -> Result<CrimeDetail, CaseError> {
    let crime = load_crime(db, crime_id).await?;
    authorize_edit(actor, &crime)?;

    form.validate()?;
    form.location.validate()?;
    let date_occurred = parse_date_occurred(&form.date_occurred)?;
    let accused_ids = dedup_ids(&form.accused_ids);
    let victim_ids = dedup_ids(&form.victim_ids);

    let administrative_id = match actor.role {
        Role::Admin => form.administrative_id,
        _ => crime.administrative_id,
    };

    let txn = db.begin().await?;

    ensure_users_exist(&txn, &accused_ids, "Accused").await?;
    ensure_users_exist(&txn, &victim_ids, "Victim").await?;
    if actor.role == Role::Admin {
        if let Some(officer_id) = administrative_id {
            ensure_officer(&txn, officer_id).await?;
        }
    }

    reconcile(&txn, Party::Accused, crime_id, &accused_ids).await?;
    reconcile(&txn, Party::Victim, crime_id, &victim_ids).await?;

    let location = locations::Entity::find_by_id(crime.location_id)
        .one(&txn)
        .await?
        .ok_or_else(|| CaseError::internal(format!("crime {} has no location", crime_id)))?;
    let mut location: locations::ActiveModel = location.into();
    location.city = Set(form.location.city.to_owned());
    location.state = Set(form.location.state.to_owned());
    location.country = Set(form.location.country.to_owned());
    location.update(&txn).await?;

    let mut active: crimes::ActiveModel = crime.into();
    active.title = Set(form.title.trim().to_owned());
    active.crime_type = Set(form.crime_type.trim().to_owned());
    active.status = Set(form.status);
    active.description = Set(form.description.clone());
    active.date_occurred = Set(date_occurred);
    active.administrative_id = Set(administrative_id);
    active.updated_at = Set(Utc::now().naive_utc());
    let updated = active.update(&txn).await?;

    let message = form
        .log_message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("Crime details updated by {}", actor.name));
    append_log(&txn, crime_id, actor.user_id, &message).await?;

    let detail = build_detail(&txn, updated).await?;
    txn.commit().await?;

    log::info!(
        "crime {} updated by user {} ({})",
        crime_id,
        actor.user_id,
        actor.role
    );
    Ok(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> CrimeRow {
        CrimeRow {
            id: 12,
            case_id: case_id(12),
            title: "Stolen donut truck".to_owned(),
            crime_type: "Theft".to_owned(),
            status: CrimeStatus::Investigation,
            date_occurred: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            location: "Springfield, IL".to_owned(),
            assigned_officer: "Unassigned".to_owned(),
            description: None,
            party_role: None,
        }
    }

    #[test]
    fn parses_supported_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_date_occurred("2024-03-01T09:30:00Z").unwrap(), expected);
        assert_eq!(parse_date_occurred("2024-03-01T10:30:00+01:00").unwrap(), expected);
        assert_eq!(parse_date_occurred("2024-03-01T09:30").unwrap(), expected);
        assert_eq!(
            parse_date_occurred("2024-03-01").unwrap(),
            expected.date().and_hms_opt(0, 0, 0).unwrap()
        );
        assert!(matches!(
            parse_date_occurred("yesterday"),
            Err(CaseError::Validation(_))
        ));
    }

    #[test]
    fn row_filter_is_case_insensitive_substring() {
        let row = row();
        assert!(row.matches("donut"));
        assert!(row.matches("THEFT"));
        assert!(row.matches("springfield"));
        assert!(row.matches("investig"));
        assert!(row.matches("cr-12"));
        assert!(row.matches("  "));
        assert!(!row.matches("assault"));
    }

    #[test]
    fn officers_only_edit_assigned_crimes() {
        let crime = crimes::Model {
            id: 1,
            title: "t".to_owned(),
            crime_type: "Fraud".to_owned(),
            description: None,
            date_occurred: row().date_occurred,
            status: CrimeStatus::Reported,
            reported_by: 1,
            administrative_id: Some(5),
            location_id: 1,
            created_at: row().date_occurred,
            updated_at: row().date_occurred,
        };
        let actor = |user_id, role| Actor {
            user_id,
            name: "x".to_owned(),
            role,
        };

        assert!(authorize_edit(&actor(99, Role::Admin), &crime).is_ok());
        assert!(authorize_edit(&actor(5, Role::Administrative), &crime).is_ok());
        assert!(matches!(
            authorize_edit(&actor(6, Role::Administrative), &crime),
            Err(CaseError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_edit(&actor(1, Role::Civilian), &crime),
            Err(CaseError::Forbidden(_))
        ));
    }
}
