//! Evidence attached to a crime.
//!
//! Images arrive as base64 (optionally wrapped in a `data:image/...` URL),
//! are stored as raw bytes and are re-encoded when listed.

use crate::auth::Actor;
use crate::crimes::{authorize_edit, authorize_view, load_crime};
use crate::error::CaseError;
use crate::orm::evidence;
use crate::users::users_by_ids;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIME: &str = "image/jpeg";
pub const DEFAULT_FILENAME: &str = "evidence.jpg";

/// A decoded image payload.
#[derive(Debug, PartialEq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    /// Mime type taken from a data URL prefix, when one was given.
    pub mime: Option<String>,
}

/// Decodes `data:image/<type>;base64,<payload>` or a bare base64 string.
pub fn decode_image(input: &str, max_bytes: usize) -> Result<DecodedImage, CaseError> {
    let input = input.trim();

    let (mime, payload) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| CaseError::validation("Invalid image format"))?;
            let mime = header.strip_suffix(";base64").unwrap_or(header);
            if !mime.starts_with("image/") {
                return Err(CaseError::validation("Invalid image format"));
            }
            (Some(mime.to_owned()), payload)
        }
        None => (None, input),
    };

    // Reject before decoding; base64 inflates by 4/3.
    if payload.len() / 4 * 3 > max_bytes + 2 {
        return Err(CaseError::validation("Image is too large"));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| CaseError::validation("Image is not valid base64"))?;

    if bytes.is_empty() {
        return Err(CaseError::validation("Image is empty"));
    }
    if bytes.len() > max_bytes {
        return Err(CaseError::validation("Image is too large"));
    }

    Ok(DecodedImage { bytes, mime })
}

/// Evidence submitted together with a new crime report.
#[derive(Clone, Debug, Deserialize)]
pub struct NewEvidence {
    pub title: String,
    pub description: Option<String>,
    pub img: Option<String>,
    pub mime: Option<String>,
    pub filename: Option<String>,
}

pub(crate) async fn insert_report_evidence<C>(
    db: &C,
    crime_id: i32,
    submitted_by: i32,
    items: &[NewEvidence],
) -> Result<(), CaseError>
where
    C: ConnectionTrait,
{
    let max_bytes = crate::app_config::limits().max_evidence_bytes;

    for item in items {
        if item.title.trim().is_empty() {
            return Err(CaseError::validation("Evidence title is required"));
        }
        let image = item
            .img
            .as_deref()
            .map(|img| decode_image(img, max_bytes))
            .transpose()?;
        let data_url_mime = image.as_ref().and_then(|i| i.mime.clone());

        evidence::ActiveModel {
            crime_id: Set(crime_id),
            title: Set(item.title.trim().to_owned()),
            description: Set(Some(item.description.clone().unwrap_or_default())),
            img: Set(image.map(|i| i.bytes)),
            mime: Set(Some(
                item.mime
                    .clone()
                    .or(data_url_mime)
                    .unwrap_or_else(|| DEFAULT_MIME.to_owned()),
            )),
            filename: Set(Some(
                item.filename
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FILENAME.to_owned()),
            )),
            submitted_by: Set(Some(submitted_by)),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Evidence as listed for a crime, image included.
#[derive(Clone, Debug, Serialize)]
pub struct EvidenceView {
    pub evidence_id: i32,
    pub title: String,
    pub description: Option<String>,
    /// Base64 without a data URL prefix.
    pub img: Option<String>,
    pub mime: Option<String>,
    pub filename: Option<String>,
    pub submitted_by: Option<i32>,
    pub submitted_by_name: String,
    pub created_at: NaiveDateTime,
}

/// Evidence metadata for embedding in crime detail, without image bytes.
#[derive(Clone, Debug, Serialize)]
pub struct EvidenceSummary {
    pub evidence_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub mime: Option<String>,
    pub filename: Option<String>,
    pub has_image: bool,
    pub submitted_by: Option<i32>,
}

impl From<&evidence::Model> for EvidenceSummary {
    fn from(ev: &evidence::Model) -> Self {
        Self {
            evidence_id: ev.id,
            title: ev.title.to_owned(),
            description: ev.description.to_owned(),
            mime: ev.mime.to_owned(),
            filename: ev.filename.to_owned(),
            has_image: ev.img.is_some(),
            submitted_by: ev.submitted_by,
        }
    }
}

pub(crate) async fn evidence_for_crime<C>(db: &C, crime_id: i32) -> Result<Vec<evidence::Model>, DbErr>
where
    C: ConnectionTrait,
{
    evidence::Entity::find()
        .filter(evidence::Column::CrimeId.eq(crime_id))
        .order_by_asc(evidence::Column::Id)
        .all(db)
        .await
}

/// Evidence of a crime visible to `actor`.
pub async fn list_evidence(
    db: &DatabaseConnection,
    actor: &Actor,
    crime_id: i32,
) -> Result<Vec<EvidenceView>, CaseError> {
    let crime = load_crime(db, crime_id).await?;
    authorize_view(db, actor, &crime).await?;

    let items = evidence_for_crime(db, crime_id).await?;
    let submitter_ids: Vec<i32> = items.iter().filter_map(|e| e.submitted_by).collect();
    let submitters = users_by_ids(db, &submitter_ids).await?;

    Ok(items
        .into_iter()
        .map(|ev| EvidenceView {
            evidence_id: ev.id,
            submitted_by_name: ev
                .submitted_by
                .and_then(|id| submitters.get(&id))
                .map(|u| u.display_name())
                .unwrap_or_else(|| "Unknown User".to_owned()),
            title: ev.title,
            description: ev.description,
            img: ev.img.map(|bytes| STANDARD.encode(bytes)),
            mime: ev.mime,
            filename: ev.filename,
            submitted_by: ev.submitted_by,
            created_at: ev.created_at,
        })
        .collect())
}

/// One entry of an evidence change set. With `evidence_id` it is a partial
/// update; without, a create.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EvidenceUpdate {
    pub evidence_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub img: Option<String>,
    pub mime: Option<String>,
    pub filename: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EvidenceChangeSet {
    #[serde(default)]
    pub updates: Vec<EvidenceUpdate>,
    #[serde(default)]
    pub delete_ids: Vec<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceChangeResult {
    pub created: Vec<i32>,
    pub updated: Vec<i32>,
    pub deleted: u64,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

async fn create_evidence<C>(
    db: &C,
    crime_id: i32,
    submitted_by: i32,
    entry: &EvidenceUpdate,
    max_bytes: usize,
) -> Result<i32, CaseError>
where
    C: ConnectionTrait,
{
    let title = non_empty(&entry.title)
        .ok_or_else(|| CaseError::validation("Evidence title is required"))?;
    let img = entry
        .img
        .as_deref()
        .ok_or_else(|| CaseError::validation("Evidence image is required"))?;
    let image = decode_image(img, max_bytes)?;
    let mime = non_empty(&entry.mime)
        .or(image.mime)
        .ok_or_else(|| CaseError::validation("Evidence mime type is required"))?;
    let filename = non_empty(&entry.filename)
        .ok_or_else(|| CaseError::validation("Evidence filename is required"))?;

    let model = evidence::ActiveModel {
        crime_id: Set(crime_id),
        title: Set(title),
        description: Set(entry.description.clone()),
        img: Set(Some(image.bytes)),
        mime: Set(Some(mime)),
        filename: Set(Some(filename)),
        submitted_by: Set(Some(submitted_by)),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(model.id)
}

async fn update_evidence<C>(
    db: &C,
    crime_id: i32,
    evidence_id: i32,
    entry: &EvidenceUpdate,
    max_bytes: usize,
) -> Result<i32, CaseError>
where
    C: ConnectionTrait,
{
    let existing = evidence::Entity::find_by_id(evidence_id)
        .filter(evidence::Column::CrimeId.eq(crime_id))
        .one(db)
        .await?
        .ok_or_else(|| CaseError::not_found(format!("Evidence {} not found", evidence_id)))?;

    let mut active: evidence::ActiveModel = existing.into();
    if let Some(title) = non_empty(&entry.title) {
        active.title = Set(title);
    }
    if let Some(description) = &entry.description {
        active.description = Set(Some(description.to_owned()));
    }
    if let Some(img) = entry.img.as_deref() {
        let image = decode_image(img, max_bytes)?;
        if let (Some(mime), None) = (&image.mime, &entry.mime) {
            active.mime = Set(Some(mime.to_owned()));
        }
        active.img = Set(Some(image.bytes));
    }
    if let Some(mime) = non_empty(&entry.mime) {
        active.mime = Set(Some(mime));
    }
    if let Some(filename) = non_empty(&entry.filename) {
        active.filename = Set(Some(filename));
    }
    active.update(db).await?;

    Ok(evidence_id)
}

/// Applies deletes, partial updates and creates for one crime atomically.
pub async fn apply_changes(
    db: &DatabaseConnection,
    actor: &Actor,
    crime_id: i32,
    changes: &EvidenceChangeSet,
) -> Result<EvidenceChangeResult, CaseError> {
    let crime = load_crime(db, crime_id).await?;
    authorize_edit(actor, &crime)?;

    let max_bytes = crate::app_config::limits().max_evidence_bytes;
    let mut result = EvidenceChangeResult::default();
    let txn = db.begin().await?;

    if !changes.delete_ids.is_empty() {
        result.deleted = evidence::Entity::delete_many()
            .filter(evidence::Column::CrimeId.eq(crime_id))
            .filter(evidence::Column::Id.is_in(changes.delete_ids.clone()))
            .exec(&txn)
            .await?
            .rows_affected;
    }

    for entry in &changes.updates {
        match entry.evidence_id {
            Some(evidence_id) => {
                let id = update_evidence(&txn, crime_id, evidence_id, entry, max_bytes).await?;
                result.updated.push(id);
            }
            None => {
                let id = create_evidence(&txn, crime_id, actor.user_id, entry, max_bytes).await?;
                result.created.push(id);
            }
        }
    }

    txn.commit().await?;

    log::info!(
        "evidence changes on crime {} by user {}: created={:?} updated={:?} deleted={}",
        crime_id,
        actor.user_id,
        result.created,
        result.updated,
        result.deleted
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_data_url() {
        let encoded = STANDARD.encode(b"\x89PNG fake");
        let image = decode_image(&format!("data:image/png;base64,{}", encoded), 1024).unwrap();
        assert_eq!(image.bytes, b"\x89PNG fake");
        assert_eq!(image.mime.as_deref(), Some("image/png"));
    }

    #[test]
    fn decodes_bare_base64() {
        let image = decode_image(&STANDARD.encode(b"jpeg bytes"), 1024).unwrap();
        assert_eq!(image.bytes, b"jpeg bytes");
        assert!(image.mime.is_none());
    }

    #[test]
    fn rejects_non_image_data_url() {
        let encoded = STANDARD.encode(b"%PDF");
        let err = decode_image(&format!("data:application/pdf;base64,{}", encoded), 1024);
        assert!(matches!(err, Err(CaseError::Validation(_))));
    }

    #[test]
    fn rejects_oversized_and_garbage() {
        let big = STANDARD.encode(vec![0u8; 64]);
        assert!(matches!(decode_image(&big, 16), Err(CaseError::Validation(_))));
        assert!(matches!(decode_image("!!not base64!!", 1024), Err(CaseError::Validation(_))));
        assert!(matches!(decode_image("", 1024), Err(CaseError::Validation(_))));
    }
}
