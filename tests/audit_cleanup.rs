use store_sync::audit::{build_report, format_size, group_by_display_name};
use store_sync::cleanup::{cleanup_denylist, cleanup_duplicates};
use store_sync::store::{MockStoreClient, Store};

fn store(name: &str, display_name: &str, create_time: &str, size_bytes: u64) -> Store {
    Store {
        name: name.to_string(),
        display_name: display_name.to_string(),
        create_time: create_time.to_string(),
        size_bytes,
        active_documents_count: 3,
        pending_documents_count: 0,
        failed_documents_count: 0,
    }
}

#[test]
fn format_size_scales_units() {
    assert_eq!(format_size(512), "512.00 B");
    assert_eq!(format_size(2048), "2.00 KB");
    assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
}

#[test]
fn grouping_sorts_each_group_newest_first() {
    let stores = vec![
        store("fileSearchStores/a1", "a", "2026-01-01T00:00:00Z", 10),
        store("fileSearchStores/a2", "a", "2026-03-01T00:00:00Z", 20),
        store("fileSearchStores/b1", "b", "2026-02-01T00:00:00Z", 30),
    ];
    let groups = group_by_display_name(&stores);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups["a"][0].name, "fileSearchStores/a2");
    assert_eq!(groups["a"][1].name, "fileSearchStores/a1");
}

#[test]
fn report_flags_duplicates_and_failures() {
    let mut failing = store("fileSearchStores/c1", "c", "2026-01-05T00:00:00Z", 50);
    failing.failed_documents_count = 4;
    let stores = vec![
        store("fileSearchStores/a1", "a", "2026-01-01T00:00:00Z", 10),
        store("fileSearchStores/a2", "a", "2026-03-01T00:00:00Z", 20),
        failing,
    ];

    let report = build_report(&stores, false);
    assert!(report.contains("Total stores:            3"));
    assert!(report.contains("Unique store names:      2"));
    assert!(report.contains("DUPLICATE STORES DETECTED: 1"));
    // The older copy's size is the wasted storage.
    assert!(report.contains("Wasted storage from duplicates: 10.00 B"));
    assert!(report.contains("STORES WITH FAILED DOCUMENTS: 1"));
}

#[test]
fn report_for_empty_collection_is_benign() {
    let report = build_report(&[], true);
    assert!(report.contains("No file search stores found"));
}

#[test]
fn healthy_collection_gets_a_clean_bill() {
    let stores = vec![store(
        "fileSearchStores/a1",
        "a",
        "2026-01-01T00:00:00Z",
        10,
    )];
    let report = build_report(&stores, false);
    assert!(report.contains("All stores look healthy"));
    assert!(!report.contains("DUPLICATE STORES DETECTED"));
}

#[tokio::test]
async fn duplicate_cleanup_keeps_newest_copy() {
    let mut client = MockStoreClient::new();
    client.expect_list_stores().return_once(|| {
        Ok(vec![
            store("fileSearchStores/a-old", "a", "2026-01-01T00:00:00Z", 100),
            store("fileSearchStores/a-new", "a", "2026-03-01T00:00:00Z", 200),
            store("fileSearchStores/b", "b", "2026-02-01T00:00:00Z", 300),
        ])
    });
    client
        .expect_delete_store()
        .withf(|name, force| name == "fileSearchStores/a-old" && *force)
        .times(1)
        .returning(|_, _| Ok(()));

    let outcome = cleanup_duplicates(&client, false).await.unwrap();
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.freed_bytes, 100);
}

#[tokio::test]
async fn duplicate_cleanup_dry_run_deletes_nothing() {
    let mut client = MockStoreClient::new();
    client.expect_list_stores().return_once(|| {
        Ok(vec![
            store("fileSearchStores/a-old", "a", "2026-01-01T00:00:00Z", 100),
            store("fileSearchStores/a-new", "a", "2026-03-01T00:00:00Z", 200),
        ])
    });
    // delete_store must never be called in a dry run.

    let outcome = cleanup_duplicates(&client, true).await.unwrap();
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.freed_bytes, 100);
}

#[tokio::test]
async fn denylist_cleanup_partitions_stores() {
    let mut client = MockStoreClient::new();
    client.expect_list_stores().return_once(|| {
        Ok(vec![
            store(
                "fileSearchStores/nm",
                "node_modules",
                "2026-01-01T00:00:00Z",
                10,
            ),
            store(
                "fileSearchStores/ctx",
                "context",
                "2026-01-02T00:00:00Z",
                20,
            ),
            store(
                "fileSearchStores/mystery",
                "something-else",
                "2026-01-03T00:00:00Z",
                30,
            ),
        ])
    });
    client
        .expect_delete_store()
        .withf(|name, _| name == "fileSearchStores/nm")
        .times(1)
        .returning(|_, _| Ok(()));

    let outcome = cleanup_denylist(&client).await.unwrap();
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.kept, 1);
    assert_eq!(outcome.unknown, vec!["something-else".to_string()]);
}
