mod harness;
mod support;

use std::sync::Arc;

use chrono::NaiveDate;
use gridflux::adapter::store::{ResidentRawStore, SqliteRawStore};
use gridflux::domain::{Cadence, EntityId, TimeRange};
use gridflux::port::RawStore;
use gridflux::testkit::series::{constant_day, day_records};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

#[tokio::test]
async fn merge_then_fetch_roundtrip() {
    let db = harness::temp_db::TempDb::create("merge-roundtrip");
    let store = SqliteRawStore::new(db.pool().clone());

    let records = day_records("nsw1-wind", day(1), Cadence::FIVE_MINUTE, |i| i as f64);
    let outcome = store.merge(records.clone()).await.unwrap();
    assert_eq!(outcome.inserted, 288);
    assert_eq!(outcome.duplicates, 0);

    let fetched = store
        .fetch_range(
            &EntityId::new("nsw1-wind"),
            Cadence::FIVE_MINUTE,
            &TimeRange::day(day(1)),
        )
        .await
        .unwrap();
    assert_eq!(fetched, records);
}

#[tokio::test]
async fn remerge_is_idempotent_on_disk() {
    let db = harness::temp_db::TempDb::create("remerge");
    let store = SqliteRawStore::new(db.pool().clone());
    let records = constant_day("nsw1-wind", day(1), Cadence::FIVE_MINUTE, 42.0);

    store.merge(records.clone()).await.unwrap();
    let second = store.merge(records).await.unwrap();

    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 288);
    let count = store
        .count_day(&EntityId::new("nsw1-wind"), Cadence::FIVE_MINUTE, day(1))
        .await
        .unwrap();
    assert_eq!(count, 288);
}

#[tokio::test]
async fn conflicting_value_on_disk_is_rejected() {
    let db = harness::temp_db::TempDb::create("conflict");
    let store = SqliteRawStore::new(db.pool().clone());

    store
        .merge(constant_day("nsw1-wind", day(1), Cadence::FIVE_MINUTE, 42.0))
        .await
        .unwrap();
    let err = store
        .merge(constant_day("nsw1-wind", day(1), Cadence::FIVE_MINUTE, 43.0))
        .await
        .unwrap_err();
    assert!(matches!(err, gridflux::error::Error::Integrity(_)));
}

#[tokio::test]
async fn cadence_partitions_are_disjoint() {
    let db = harness::temp_db::TempDb::create("partitions");
    let store = SqliteRawStore::new(db.pool().clone());

    store
        .merge(constant_day("nsw1-price", day(1), Cadence::THIRTY_MINUTE, 55.0))
        .await
        .unwrap();

    let five_min_count = store
        .count_day(&EntityId::new("nsw1-price"), Cadence::FIVE_MINUTE, day(1))
        .await
        .unwrap();
    assert_eq!(five_min_count, 0);

    let thirty_min_count = store
        .count_day(&EntityId::new("nsw1-price"), Cadence::THIRTY_MINUTE, day(1))
        .await
        .unwrap();
    assert_eq!(thirty_min_count, 48);
}

#[tokio::test]
async fn concurrent_merges_for_distinct_entities_preserve_uniqueness() {
    let db = harness::temp_db::TempDb::create("concurrent-entities");
    let store = Arc::new(SqliteRawStore::new(db.pool().clone()));

    let mut handles = Vec::new();
    for entity in ["nsw1-wind", "nsw1-solar", "vic1-wind", "vic1-solar"] {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            // Two racing merges of the same day per entity.
            let a = store.merge(constant_day(entity, day(1), Cadence::FIVE_MINUTE, 9.0));
            let b = store.merge(constant_day(entity, day(1), Cadence::FIVE_MINUTE, 9.0));
            let (a, b) = tokio::join!(a, b);
            (a.unwrap(), b.unwrap())
        }));
    }

    for handle in handles {
        let (a, b) = handle.await.unwrap();
        // Between the two racing merges, each record landed exactly once.
        assert_eq!(a.inserted + b.inserted, 288);
        assert_eq!(a.duplicates + b.duplicates, 288);
    }

    for entity in ["nsw1-wind", "nsw1-solar", "vic1-wind", "vic1-solar"] {
        let count = store
            .count_day(&EntityId::new(entity), Cadence::FIVE_MINUTE, day(1))
            .await
            .unwrap();
        assert_eq!(count, 288);
    }
}

#[tokio::test]
async fn resident_store_materializes_disk_and_writes_through() {
    let db = harness::temp_db::TempDb::create("resident");
    let disk = SqliteRawStore::new(db.pool().clone());
    disk.merge(constant_day("nsw1-wind", day(1), Cadence::FIVE_MINUTE, 10.0))
        .await
        .unwrap();

    let registry = support::registry::single_entity("nsw1-wind");
    let resident = ResidentRawStore::load(disk, &registry).await.unwrap();
    assert_eq!(resident.resident_len(), 288);

    // New merges land on disk and in memory.
    resident
        .merge(constant_day("nsw1-wind", day(2), Cadence::FIVE_MINUTE, 20.0))
        .await
        .unwrap();
    assert_eq!(resident.resident_len(), 576);

    let reread = SqliteRawStore::new(db.pool().clone());
    let on_disk = reread
        .count_day(&EntityId::new("nsw1-wind"), Cadence::FIVE_MINUTE, day(2))
        .await
        .unwrap();
    assert_eq!(on_disk, 288);
}
