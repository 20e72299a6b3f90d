//! End-to-end CSV import against an in-memory database

use snehband_common::db::{self, profiles, Gender, ProfileFilter};
use snehband_common::import::{import_csv, SyntheticIds, SYNTHETIC_ID_START};
use snehband_common::Error;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

const HEADER: &str = "अनुबंध आयडी,संपूर्ण नाव,मोबाईल नंबर,लिंग,मेळाव्यास उपस्थित राहणाऱ्या व्यक्तींची संख्या,ई-मेल";

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::create_schema(&pool).await.unwrap();
    pool
}

fn sheet(rows: &[&str]) -> Vec<u8> {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text.into_bytes()
}

#[tokio::test]
async fn test_import_normalises_fields() {
    let pool = setup_test_db().await;
    let data = sheet(&[
        "1201,Sneha Patil,9876543210,स्त्री,मी स्वतः आणि १ व्यक्ती,sneha@example.org",
        "1202,Rahul Jadhav,9123456780,M,Rs.200 only,",
        "1203,Asha,9000000000,,,",
    ]);

    let report = import_csv(&pool, &data, SyntheticIds::default()).await.unwrap();
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.imported, 3);
    assert!(report.errors.is_empty());

    let sneha = profiles::get_profile(&pool, 1201).await.unwrap().unwrap();
    assert_eq!(sneha.gender, Some(Gender::Female));
    assert_eq!(sneha.attendee_count, 2);
    assert_eq!(sneha.details.email.as_deref(), Some("sneha@example.org"));

    let rahul = profiles::get_profile(&pool, 1202).await.unwrap().unwrap();
    assert_eq!(rahul.gender, Some(Gender::Male));
    assert_eq!(rahul.attendee_count, 1);
    assert_eq!(rahul.details.email, None);

    let asha = profiles::get_profile(&pool, 1203).await.unwrap().unwrap();
    assert_eq!(asha.gender, None);
    assert_eq!(asha.attendee_count, 0);
}

#[tokio::test]
async fn test_reimport_overwrites_single_record() {
    let pool = setup_test_db().await;
    import_csv(&pool, &sheet(&["42,Old Name,111,F,Rs.200,"]), SyntheticIds::default())
        .await
        .unwrap();
    profiles::update_status(&pool, 42, true, false).await.unwrap();

    let report = import_csv(
        &pool,
        &sheet(&["42,New Name,222,M,Rs.600,new@example.org"]),
        SyntheticIds::default(),
    )
    .await
    .unwrap();
    assert_eq!(report.imported, 1);

    let all = profiles::list_profiles(&pool, &ProfileFilter::default(), None, 0)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    let p = &all[0];
    assert_eq!(p.name, "New Name");
    assert_eq!(p.mobile, "222");
    assert_eq!(p.gender, Some(Gender::Male));
    assert_eq!(p.attendee_count, 3);
    assert!(p.approved, "approval survives re-import");
}

#[tokio::test]
async fn test_rows_without_id_get_distinct_synthetic_ids() {
    let pool = setup_test_db().await;
    let rows: Vec<String> = (0..5).map(|i| format!(",Person {},90000000{},,,", i, i)).collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();

    let report = import_csv(&pool, &sheet(&refs), SyntheticIds::default()).await.unwrap();
    assert_eq!(report.imported, 5);

    let mut ids = report.assigned_synthetic.clone();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
    assert!(ids.iter().all(|id| *id <= SYNTHETIC_ID_START && *id > SYNTHETIC_ID_START - 5));
    assert_eq!(report.next_synthetic_id, SYNTHETIC_ID_START - 5);

    let stored = profiles::get_profile(&pool, SYNTHETIC_ID_START).await.unwrap().unwrap();
    assert!(stored.id_synthetic);
    assert_eq!(stored.name, "Person 0");
}

#[tokio::test]
async fn test_second_batch_seeded_from_store_does_not_reuse_ids() {
    let pool = setup_test_db().await;
    import_csv(&pool, &sheet(&[",A,1,,,", ",B,2,,,"]), SyntheticIds::default())
        .await
        .unwrap();

    let seed = profiles::next_synthetic_id(&pool).await.unwrap();
    let report = import_csv(&pool, &sheet(&[",C,3,,,"]), SyntheticIds::starting_at(seed))
        .await
        .unwrap();

    assert_eq!(report.assigned_synthetic, vec![SYNTHETIC_ID_START - 2]);
    assert_eq!(
        profiles::count_profiles(&pool, &ProfileFilter::default()).await.unwrap(),
        3
    );
}

#[tokio::test]
async fn test_id_less_rows_never_overwrite_explicit_profiles() {
    let pool = setup_test_db().await;
    import_csv(&pool, &sheet(&["99999,Real Person,222,,,"]), SyntheticIds::default())
        .await
        .unwrap();
    profiles::update_status(&pool, 99999, true, false).await.unwrap();

    let ids = profiles::synthetic_ids(&pool).await.unwrap();
    let report = import_csv(&pool, &sheet(&[",Newcomer,333,,,"]), ids).await.unwrap();
    assert_eq!(report.assigned_synthetic, vec![SYNTHETIC_ID_START - 1]);

    let real = profiles::get_profile(&pool, 99999).await.unwrap().unwrap();
    assert_eq!(real.name, "Real Person");
    assert!(real.approved);
    assert!(!real.id_synthetic);

    let newcomer = profiles::get_profile(&pool, SYNTHETIC_ID_START - 1).await.unwrap().unwrap();
    assert_eq!(newcomer.name, "Newcomer");
    assert!(newcomer.id_synthetic);
    assert!(!newcomer.approved);
}

#[tokio::test]
async fn test_explicit_id_in_batch_does_not_reject_id_less_row() {
    let pool = setup_test_db().await;
    let report = import_csv(
        &pool,
        &sheet(&[",Idless,111,,,", "99999,Explicit,222,,,"]),
        SyntheticIds::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.imported, 2);
    assert!(report.errors.is_empty());
    assert_eq!(report.assigned_synthetic, vec![99998]);
    let idless = profiles::get_profile(&pool, 99998).await.unwrap().unwrap();
    assert_eq!(idless.name, "Idless");
}

#[tokio::test]
async fn test_invalid_rows_are_isolated() {
    let pool = setup_test_db().await;
    let data = sheet(&[
        "1,Valid One,111,,,",
        "2,,222,,,",
        "3,Valid Three,,,,",
        "4,Valid Four,444,,,",
    ]);

    let report = import_csv(&pool, &data, SyntheticIds::default()).await.unwrap();
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.imported, 2);
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.errors[0].row, 2);
    assert_eq!(report.errors[0].anubandh_id, Some(2));
    assert!(report.errors[0].message.contains("name"));
    assert_eq!(report.errors[1].row, 3);
    assert!(report.errors[1].message.contains("mobile"));

    assert!(profiles::get_profile(&pool, 1).await.unwrap().is_some());
    assert!(profiles::get_profile(&pool, 4).await.unwrap().is_some());
    assert!(profiles::get_profile(&pool, 2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_csv_aborts_before_writing() {
    let pool = setup_test_db().await;
    let mut data = sheet(&["1,Valid,111,,,"]);
    data.extend_from_slice(&[0xff, 0xfe, b',', b'x', b'\n']);

    let err = import_csv(&pool, &data, SyntheticIds::default()).await.unwrap_err();
    assert!(matches!(err, Error::Csv(_)));
    assert_eq!(
        profiles::count_profiles(&pool, &ProfileFilter::default()).await.unwrap(),
        0
    );
}
