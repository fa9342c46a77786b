//! Append-only case log.
//!
//! Entries are inserted by the report and update workflows and read back in
//! chronological order. Nothing in the crate updates or deletes them.

use crate::orm::crime_logs;
use crate::users::users_by_ids;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    pub log_id: i32,
    pub user_id: i32,
    pub author_name: String,
    pub message: String,
    pub created_at: NaiveDateTime,
}

pub async fn append_log<C>(
    db: &C,
    crime_id: i32,
    user_id: i32,
    message: &str,
) -> Result<crime_logs::Model, DbErr>
where
    C: ConnectionTrait,
{
    crime_logs::ActiveModel {
        crime_id: Set(crime_id),
        user_id: Set(user_id),
        message: Set(message.to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn count_logs<C>(db: &C, crime_id: i32) -> Result<usize, DbErr>
where
    C: ConnectionTrait,
{
    crime_logs::Entity::find()
        .filter(crime_logs::Column::CrimeId.eq(crime_id))
        .count(db)
        .await
}

/// Oldest first, with author display names resolved.
pub async fn list_logs<C>(db: &C, crime_id: i32) -> Result<Vec<LogEntry>, DbErr>
where
    C: ConnectionTrait,
{
    let logs = crime_logs::Entity::find()
        .filter(crime_logs::Column::CrimeId.eq(crime_id))
        .order_by_asc(crime_logs::Column::CreatedAt)
        .order_by_asc(crime_logs::Column::Id)
        .all(db)
        .await?;

    let author_ids: Vec<i32> = logs.iter().map(|l| l.user_id).collect();
    let authors = users_by_ids(db, &author_ids).await?;

    Ok(logs
        .into_iter()
        .map(|log| LogEntry {
            log_id: log.id,
            user_id: log.user_id,
            author_name: authors
                .get(&log.user_id)
                .map(|u| u.display_name())
                .unwrap_or_else(|| "Unknown User".to_owned()),
            message: log.message,
            created_at: log.created_at,
        })
        .collect())
}
