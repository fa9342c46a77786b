//! Set reconciliation for the accused and victim relations of a crime.
//!
//! A full-replace update leaves each relation equal to the submitted set.
//! Only the difference is written: rows for ids no longer present are
//! deleted, rows for new ids are inserted, unchanged rows are untouched.

use crate::orm::{crime_accused, crime_victims};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use serde::Serialize;
use std::collections::BTreeSet;

/// Which many-to-many relation of a crime is meant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Party {
    Accused,
    Victim,
}

impl Party {
    pub fn label(&self) -> &'static str {
        match self {
            Party::Accused => "Accused",
            Party::Victim => "Victim",
        }
    }
}

/// Ids to insert and ids to delete, each sorted and free of duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetDiff {
    pub add: Vec<i32>,
    pub remove: Vec<i32>,
}

impl SetDiff {
    pub fn compute(current: &[i32], desired: &[i32]) -> Self {
        let current: BTreeSet<i32> = current.iter().copied().collect();
        let desired: BTreeSet<i32> = desired.iter().copied().collect();

        Self {
            add: desired.difference(&current).copied().collect(),
            remove: current.difference(&desired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Sorted, de-duplicated copy of submitted ids.
pub fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// User ids currently linked to `crime_id` through `party`.
pub async fn party_ids<C>(db: &C, party: Party, crime_id: i32) -> Result<Vec<i32>, DbErr>
where
    C: ConnectionTrait,
{
    let ids = match party {
        Party::Accused => crime_accused::Entity::find()
            .filter(crime_accused::Column::CrimeId.eq(crime_id))
            .order_by_asc(crime_accused::Column::UserId)
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.user_id)
            .collect(),
        Party::Victim => crime_victims::Entity::find()
            .filter(crime_victims::Column::CrimeId.eq(crime_id))
            .order_by_asc(crime_victims::Column::UserId)
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.user_id)
            .collect(),
    };
    Ok(ids)
}

/// Crime ids in which `user_id` appears through `party`.
pub async fn crimes_for_party<C>(db: &C, party: Party, user_id: i32) -> Result<Vec<i32>, DbErr>
where
    C: ConnectionTrait,
{
    let ids = match party {
        Party::Accused => crime_accused::Entity::find()
            .filter(crime_accused::Column::UserId.eq(user_id))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.crime_id)
            .collect(),
        Party::Victim => crime_victims::Entity::find()
            .filter(crime_victims::Column::UserId.eq(user_id))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.crime_id)
            .collect(),
    };
    Ok(ids)
}

async fn insert_links<C>(db: &C, party: Party, crime_id: i32, user_ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if user_ids.is_empty() {
        return Ok(());
    }

    match party {
        Party::Accused => {
            let rows = user_ids.iter().map(|&user_id| crime_accused::ActiveModel {
                crime_id: Set(crime_id),
                user_id: Set(user_id),
                ..Default::default()
            });
            crime_accused::Entity::insert_many(rows).exec(db).await?;
        }
        Party::Victim => {
            let rows = user_ids.iter().map(|&user_id| crime_victims::ActiveModel {
                crime_id: Set(crime_id),
                user_id: Set(user_id),
                ..Default::default()
            });
            crime_victims::Entity::insert_many(rows).exec(db).await?;
        }
    }
    Ok(())
}

async fn delete_links<C>(db: &C, party: Party, crime_id: i32, user_ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if user_ids.is_empty() {
        return Ok(());
    }

    match party {
        Party::Accused => {
            crime_accused::Entity::delete_many()
                .filter(crime_accused::Column::CrimeId.eq(crime_id))
                .filter(crime_accused::Column::UserId.is_in(user_ids.to_vec()))
                .exec(db)
                .await?;
        }
        Party::Victim => {
            crime_victims::Entity::delete_many()
                .filter(crime_victims::Column::CrimeId.eq(crime_id))
                .filter(crime_victims::Column::UserId.is_in(user_ids.to_vec()))
                .exec(db)
                .await?;
        }
    }
    Ok(())
}

/// Links a freshly created crime to `user_ids`.
pub async fn link_all<C>(db: &C, party: Party, crime_id: i32, user_ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    insert_links(db, party, crime_id, &dedup_ids(user_ids)).await
}

/// Makes the `party` relation of `crime_id` equal to `desired`.
///
/// Must run inside the caller's transaction.
pub async fn reconcile<C>(db: &C, party: Party, crime_id: i32, desired: &[i32]) -> Result<SetDiff, DbErr>
where
    C: ConnectionTrait,
{
    let current = party_ids(db, party, crime_id).await?;
    let diff = SetDiff::compute(&current, desired);

    delete_links(db, party, crime_id, &diff.remove).await?;
    insert_links(db, party, crime_id, &diff.add).await?;

    if !diff.is_empty() {
        log::debug!(
            "crime {} {:?}: +{:?} -{:?}",
            crime_id,
            party,
            diff.add,
            diff.remove
        );
    }
    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_only_touches_changed_ids() {
        let diff = SetDiff::compute(&[1, 2, 3], &[2, 3, 4, 5]);
        assert_eq!(diff.add, vec![4, 5]);
        assert_eq!(diff.remove, vec![1]);
    }

    #[test]
    fn diff_collapses_duplicates() {
        let diff = SetDiff::compute(&[], &[9, 9, 3]);
        assert_eq!(diff.add, vec![3, 9]);
        assert!(diff.remove.is_empty());
    }

    #[test]
    fn identical_sets_produce_no_writes() {
        assert!(SetDiff::compute(&[4, 1], &[1, 4]).is_empty());
    }

    #[test]
    fn empty_submission_removes_everything() {
        let diff = SetDiff::compute(&[7, 8], &[]);
        assert!(diff.add.is_empty());
        assert_eq!(diff.remove, vec![7, 8]);
    }

    #[test]
    fn dedup_sorts() {
        assert_eq!(dedup_ids(&[5, 1, 5, 3]), vec![1, 3, 5]);
    }
}
