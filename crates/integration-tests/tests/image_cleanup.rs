//! Integration tests for the primary-image consistency sweep.
//!
//! These drive `ImageCleanupService` end to end against an in-memory store,
//! covering the externally observable properties of a sweep: invariant
//! restoration, idempotence, isolation of unaffected products, and atomic
//! failure behavior.

use std::sync::Mutex;

use ridgeline_core::{ImageId, ProductId};
use ridgeline_store::db::RepositoryError;
use ridgeline_store::db::images::PrimaryImageRow;
use ridgeline_store::services::{ImageCleanupService, PrimaryImageStore};

fn row(image_id: i32, product_id: i32) -> PrimaryImageRow {
    PrimaryImageRow {
        image_id: ImageId::new(image_id),
        product_id: ProductId::new(product_id),
    }
}

/// In-memory stand-in for the image table, tracking only primary-flagged
/// rows (all the sweep ever reads).
#[derive(Default)]
struct InMemoryImageStore {
    rows: Mutex<Vec<PrimaryImageRow>>,
    fail_demote: bool,
}

impl InMemoryImageStore {
    fn with_rows(rows: Vec<PrimaryImageRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fail_demote: false,
        }
    }

    fn rows(&self) -> Vec<PrimaryImageRow> {
        self.rows.lock().expect("store lock poisoned").clone()
    }
}

impl PrimaryImageStore for &InMemoryImageStore {
    async fn list_primary_flagged(&self) -> Result<Vec<PrimaryImageRow>, RepositoryError> {
        Ok(self.rows())
    }

    async fn demote(&self, image_ids: &[ImageId]) -> Result<u64, RepositoryError> {
        if self.fail_demote {
            return Err(RepositoryError::DataCorruption(
                "store unavailable".to_string(),
            ));
        }
        let mut rows = self.rows.lock().expect("store lock poisoned");
        let before = rows.len();
        rows.retain(|r| !image_ids.contains(&r.image_id));
        Ok(u64::try_from(before - rows.len()).expect("row count fits in u64"))
    }
}

// =============================================================================
// Invariant restoration
// =============================================================================

/// Product A has images {10: primary, 11: primary, 12: not-primary};
/// product B has {20: primary}. After a run: A keeps only image 10 as
/// primary, B is untouched, and the report counts one violating product.
#[tokio::test]
async fn duplicate_primaries_are_repaired_keeping_the_oldest() {
    // Image 12 is not flagged, so it never enters the sweep's input.
    let store = InMemoryImageStore::with_rows(vec![row(10, 1), row(11, 1), row(20, 2)]);
    let service = ImageCleanupService::new(&store);

    let report = service.run_once().await.expect("sweep should succeed");

    assert_eq!(report.products_with_duplicates, 1);
    assert_eq!(report.images_demoted, 1);
    assert_eq!(store.rows(), vec![row(10, 1), row(20, 2)]);
}

#[tokio::test]
async fn every_violating_product_is_repaired_in_one_run() {
    let store = InMemoryImageStore::with_rows(vec![
        row(10, 1),
        row(11, 1),
        row(12, 1),
        row(20, 2),
        row(21, 2),
        row(30, 3),
    ]);
    let service = ImageCleanupService::new(&store);

    let report = service.run_once().await.expect("sweep should succeed");

    assert_eq!(report.products_with_duplicates, 2);
    assert_eq!(report.images_demoted, 3);
    assert_eq!(store.rows(), vec![row(10, 1), row(20, 2), row(30, 3)]);
}

// =============================================================================
// Idempotence and no-op behavior
// =============================================================================

#[tokio::test]
async fn second_run_performs_zero_updates() {
    let store = InMemoryImageStore::with_rows(vec![row(10, 1), row(11, 1)]);
    let service = ImageCleanupService::new(&store);

    service.run_once().await.expect("first sweep should succeed");
    let state_after_first = store.rows();

    let second = service.run_once().await.expect("second sweep should succeed");

    assert_eq!(second.products_with_duplicates, 0);
    assert_eq!(second.images_demoted, 0);
    assert_eq!(store.rows(), state_after_first);
}

#[tokio::test]
async fn consistent_catalog_is_left_unchanged() {
    let store = InMemoryImageStore::with_rows(vec![row(10, 1), row(20, 2), row(30, 3)]);
    let service = ImageCleanupService::new(&store);

    let report = service.run_once().await.expect("sweep should succeed");

    assert_eq!(report.products_with_duplicates, 0);
    assert_eq!(report.images_demoted, 0);
    assert_eq!(store.rows(), vec![row(10, 1), row(20, 2), row(30, 3)]);
}

/// Empty catalog: the run reports zero violations and performs no updates.
#[tokio::test]
async fn empty_catalog_is_a_no_op() {
    let store = InMemoryImageStore::with_rows(Vec::new());
    let service = ImageCleanupService::new(&store);

    let report = service.run_once().await.expect("sweep should succeed");

    assert_eq!(report.products_with_duplicates, 0);
    assert_eq!(report.images_demoted, 0);
    assert!(store.rows().is_empty());
}

// =============================================================================
// Failure behavior
// =============================================================================

/// A failed batch write leaves no partial demotions; the next run (here,
/// after the store recovers) repairs everything.
#[tokio::test]
async fn failed_run_changes_nothing_and_next_run_repairs() {
    let mut store = InMemoryImageStore::with_rows(vec![row(10, 1), row(11, 1)]);
    store.fail_demote = true;

    {
        let service = ImageCleanupService::new(&store);
        let result = service.run_once().await;
        assert!(result.is_err());
    }
    assert_eq!(store.rows(), vec![row(10, 1), row(11, 1)]);

    // Store recovers; the next scheduled run retries naturally.
    store.fail_demote = false;
    let service = ImageCleanupService::new(&store);
    let report = service.run_once().await.expect("retry should succeed");

    assert_eq!(report.products_with_duplicates, 1);
    assert_eq!(store.rows(), vec![row(10, 1)]);
}
