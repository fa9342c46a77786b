//! Integration tests for role-scoped crime listing and detail visibility

mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use crimewatch::crimes::{get_crime, list_crimes, report_crime, ListQuery};
use crimewatch::error::CaseError;

fn all() -> ListQuery {
    ListQuery::default()
}

fn search(q: &str) -> ListQuery {
    ListQuery {
        q: Some(q.to_string()),
    }
}

#[actix_rt::test]
#[serial]
async fn test_civilian_sees_only_crimes_they_are_party_to() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let ned = create_civilian(&db, "Ned").await.expect("user");
    let homer = create_civilian(&db, "Homer").await.expect("user");
    let bart = create_civilian(&db, "Bart").await.expect("user");
    let moe = create_civilian(&db, "Moe").await.expect("user");

    let reported = create_test_crime(&db, &ned, "Fence damage").await.expect("crime");

    let mut as_victim = report_form("Stolen rake");
    as_victim.victim_ids = vec![ned.id];
    let victim_of = report_crime(&db, &homer.actor(), &as_victim).await.expect("crime");

    let mut as_accused = report_form("Prank call");
    as_accused.accused_ids = vec![ned.id, bart.id];
    let accused_in = report_crime(&db, &moe.actor(), &as_accused).await.expect("crime");

    let unrelated = create_test_crime(&db, &homer, "Lost donut").await.expect("crime");

    let rows = list_crimes(&db, &ned.actor(), &all()).await.expect("list");
    let mut ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![reported, victim_of, accused_in]);
    assert!(!ids.contains(&unrelated));

    let role_of = |id: i32| rows.iter().find(|r| r.id == id).and_then(|r| r.party_role);
    assert_eq!(role_of(reported), Some("Reporter"));
    assert_eq!(role_of(victim_of), Some("Victim"));
    assert_eq!(role_of(accused_in), Some("Accused"));

    // Detail access follows the same rule
    assert!(get_crime(&db, &ned.actor(), victim_of).await.is_ok());
    assert!(matches!(
        get_crime(&db, &ned.actor(), unrelated).await,
        Err(CaseError::Forbidden(_))
    ));
    assert!(matches!(
        get_crime(&db, &ned.actor(), 9999).await,
        Err(CaseError::NotFound(_))
    ));
}

#[actix_rt::test]
#[serial]
async fn test_staff_scoping() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let admin = create_admin(&db, "Quimby").await.expect("admin");
    let lou = create_test_officer(&db, "Lou").await.expect("officer");
    let ned = create_civilian(&db, "Ned").await.expect("user");

    let assigned = create_test_crime(&db, &ned, "Assigned case").await.expect("crime");
    let open = create_test_crime(&db, &ned, "Open case").await.expect("crime");
    assign_officer(&db, assigned, &lou).await.expect("assign");

    let officer_rows = list_crimes(&db, &lou.actor(), &all()).await.expect("list");
    assert_eq!(officer_rows.len(), 1);
    assert_eq!(officer_rows[0].id, assigned);
    assert_eq!(officer_rows[0].assigned_officer, "Lou Test");
    assert_eq!(officer_rows[0].party_role, None);

    let admin_rows = list_crimes(&db, &admin.actor(), &all()).await.expect("list");
    assert_eq!(admin_rows.len(), 2);
    let open_row = admin_rows.iter().find(|r| r.id == open).expect("open row");
    assert_eq!(open_row.assigned_officer, "Unassigned");
    assert_eq!(open_row.location, "Springfield, IL");
    assert_eq!(open_row.case_id, format!("CR-{}", open));

    assert!(matches!(
        get_crime(&db, &lou.actor(), open).await,
        Err(CaseError::Forbidden(_))
    ));
}

#[actix_rt::test]
#[serial]
async fn test_listing_order_and_filter() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let admin = create_admin(&db, "Quimby").await.expect("admin");
    let ned = create_civilian(&db, "Ned").await.expect("user");

    let mut old = report_form("Old burglary");
    old.crime_type = "Burglary".to_string();
    old.date_occurred = "2023-01-15".to_string();
    let old_id = report_crime(&db, &ned.actor(), &old).await.expect("crime");

    let mut recent = report_form("Recent assault");
    recent.crime_type = "Assault".to_string();
    recent.description = Some("Outside Moe's Tavern".to_string());
    recent.date_occurred = "2024-06-01T22:00:00Z".to_string();
    recent.location.city = "Shelbyville".to_string();
    let recent_id = report_crime(&db, &ned.actor(), &recent).await.expect("crime");

    let rows = list_crimes(&db, &admin.actor(), &all()).await.expect("list");
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![recent_id, old_id], "Newest occurrence first");

    let by_type = list_crimes(&db, &admin.actor(), &search("burgl")).await.expect("list");
    assert_eq!(by_type.iter().map(|r| r.id).collect::<Vec<_>>(), vec![old_id]);

    let by_description = list_crimes(&db, &admin.actor(), &search("TAVERN")).await.expect("list");
    assert_eq!(by_description.iter().map(|r| r.id).collect::<Vec<_>>(), vec![recent_id]);

    let by_city = list_crimes(&db, &admin.actor(), &search("shelby")).await.expect("list");
    assert_eq!(by_city.iter().map(|r| r.id).collect::<Vec<_>>(), vec![recent_id]);

    let by_status = list_crimes(&db, &admin.actor(), &search("reported")).await.expect("list");
    assert_eq!(by_status.len(), 2);

    let none = list_crimes(&db, &admin.actor(), &search("embezzlement")).await.expect("list");
    assert!(none.is_empty());
}
