//! Primary-image cleanup service.
//!
//! Each product should have at most one image flagged primary. Concurrent or
//! interrupted admin edits can leave more than one flag set; this service
//! sweeps the whole catalog, keeps the oldest flagged image per product, and
//! demotes the rest in one atomic batch.
//!
//! The sweep is stateless: a run is a pure function of the image table at
//! invocation time, so it can be triggered by the daily schedule, at process
//! startup, or from the CLI (`images repair`) interchangeably. A failed run
//! commits nothing and is simply retried at the next scheduled tick.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use sqlx::PgPool;
use tracing::{error, info, instrument};

use ridgeline_core::{ImageId, ProductId};

use crate::db::RepositoryError;
use crate::db::images::{self, PrimaryImageRow};

/// Hour of day (server-local) the daily sweep runs.
const SWEEP_HOUR: u32 = 3;

/// Persistence operations the sweep needs.
///
/// Kept as a trait so tests can drive [`ImageCleanupService`] against an
/// in-memory implementation.
pub trait PrimaryImageStore: Send + Sync {
    /// List every image row currently flagged primary.
    fn list_primary_flagged(
        &self,
    ) -> impl Future<Output = Result<Vec<PrimaryImageRow>, RepositoryError>> + Send;

    /// Clear the primary flag on a batch of images as one atomic write.
    ///
    /// Either every id in the batch is demoted or none are. Returns the
    /// number of rows updated.
    fn demote(
        &self,
        image_ids: &[ImageId],
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// `PostgreSQL`-backed [`PrimaryImageStore`].
#[derive(Clone)]
pub struct PgImageStore {
    pool: PgPool,
}

impl PgImageStore {
    /// Create a store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PrimaryImageStore for PgImageStore {
    async fn list_primary_flagged(&self) -> Result<Vec<PrimaryImageRow>, RepositoryError> {
        images::list_primary_flagged(&self.pool).await
    }

    async fn demote(&self, image_ids: &[ImageId]) -> Result<u64, RepositoryError> {
        images::demote(&self.pool, image_ids).await
    }
}

/// The demotions one sweep will apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPlan {
    /// Number of products with more than one primary-flagged image.
    pub violations: usize,
    /// Every image to demote, with its owning product.
    pub demotions: Vec<PrimaryImageRow>,
}

impl SweepPlan {
    /// The image ids to demote, in plan order.
    #[must_use]
    pub fn demotion_ids(&self) -> Vec<ImageId> {
        self.demotions.iter().map(|d| d.image_id).collect()
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of products that had duplicate primary images.
    pub products_with_duplicates: usize,
    /// Number of image rows demoted.
    pub images_demoted: u64,
}

/// Decide which primary flags to clear.
///
/// Groups the flagged rows by product, skips products with a single flag,
/// and within each violating group keeps the image with the smallest id
/// (insertion order) and plans demotion of the rest. Pure, so the tie-break
/// and the isolation of unaffected products are unit-testable without a
/// database.
#[must_use]
pub fn plan_demotions(rows: &[PrimaryImageRow]) -> SweepPlan {
    let mut by_product: BTreeMap<ProductId, Vec<ImageId>> = BTreeMap::new();
    for row in rows {
        by_product.entry(row.product_id).or_default().push(row.image_id);
    }

    let mut violations = 0;
    let mut demotions = Vec::new();
    for (product_id, mut image_ids) in by_product {
        if image_ids.len() < 2 {
            continue;
        }
        violations += 1;
        image_ids.sort_unstable();
        demotions.extend(
            image_ids
                .into_iter()
                .skip(1)
                .map(|image_id| PrimaryImageRow { image_id, product_id }),
        );
    }

    SweepPlan { violations, demotions }
}

/// Time until the next daily sweep, given the current server-local time.
#[must_use]
pub fn next_sweep_delay(now: NaiveDateTime) -> Duration {
    let run_time = NaiveTime::from_hms_opt(SWEEP_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date().and_time(run_time);
    if next <= now {
        next += chrono::Duration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::from_secs(0))
}

/// Service enforcing the single-primary-image invariant.
///
/// Constructed once at startup with a handle to the store; no process-wide
/// state. [`Self::run_once`] performs one sweep; [`Self::spawn_daily`] runs
/// it at 03:00 server time every day.
#[derive(Clone)]
pub struct ImageCleanupService<S> {
    store: S,
}

impl<S: PrimaryImageStore> ImageCleanupService<S> {
    /// Create the service over a store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Perform one full sweep over the catalog.
    ///
    /// Idempotent: a second run with no intervening writes finds no
    /// violations and updates nothing.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read or the batch demotion fails; no
    /// partial demotions are applied in that case.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<SweepReport, RepositoryError> {
        let rows = self.store.list_primary_flagged().await?;
        let plan = plan_demotions(&rows);

        info!(
            products = plan.violations,
            "Found {} products with duplicate primary images", plan.violations
        );

        for demotion in &plan.demotions {
            info!(
                image_id = %demotion.image_id,
                product_id = %demotion.product_id,
                "Demoting image {} of product {} from primary",
                demotion.image_id,
                demotion.product_id
            );
        }

        let images_demoted = self.store.demote(&plan.demotion_ids()).await?;
        info!(demoted = images_demoted, "Image cleanup completed and committed");

        Ok(SweepReport {
            products_with_duplicates: plan.violations,
            images_demoted,
        })
    }

    /// Spawn the background task that runs the sweep daily at 03:00.
    ///
    /// A failed run is logged and retried at the next scheduled tick; there
    /// is no other retry mechanism.
    pub fn spawn_daily(self)
    where
        S: 'static,
    {
        info!("Image cleanup scheduled daily at {SWEEP_HOUR:02}:00");
        tokio::spawn(async move {
            loop {
                let delay = next_sweep_delay(Local::now().naive_local());
                info!(seconds = delay.as_secs(), "Next image cleanup run scheduled");
                tokio::time::sleep(delay).await;

                match self.run_once().await {
                    Ok(report) => {
                        info!(
                            products = report.products_with_duplicates,
                            demoted = report.images_demoted,
                            "Scheduled image cleanup finished"
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "Image cleanup run failed; retrying at the next scheduled run");
                    }
                }
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::*;

    fn row(image_id: i32, product_id: i32) -> PrimaryImageRow {
        PrimaryImageRow {
            image_id: ImageId::new(image_id),
            product_id: ProductId::new(product_id),
        }
    }

    // =========================================================================
    // Planner
    // =========================================================================

    #[test]
    fn empty_catalog_plans_nothing() {
        let plan = plan_demotions(&[]);
        assert_eq!(plan.violations, 0);
        assert!(plan.demotions.is_empty());
    }

    #[test]
    fn single_primary_per_product_is_untouched() {
        let plan = plan_demotions(&[row(10, 1), row(20, 2)]);
        assert_eq!(plan.violations, 0);
        assert!(plan.demotions.is_empty());
    }

    #[test]
    fn smallest_image_id_survives() {
        // Rows arrive in arbitrary order; insertion order (ascending id) wins.
        let plan = plan_demotions(&[row(12, 1), row(10, 1), row(11, 1)]);
        assert_eq!(plan.violations, 1);
        assert_eq!(plan.demotions, vec![row(11, 1), row(12, 1)]);
    }

    #[test]
    fn unaffected_products_are_isolated() {
        // Product 1 has duplicates, product 2 is consistent.
        let plan = plan_demotions(&[row(10, 1), row(11, 1), row(20, 2)]);
        assert_eq!(plan.violations, 1);
        assert_eq!(plan.demotions, vec![row(11, 1)]);
    }

    #[test]
    fn multiple_violations_in_one_sweep() {
        let plan = plan_demotions(&[row(10, 1), row(11, 1), row(20, 2), row(21, 2), row(30, 3)]);
        assert_eq!(plan.violations, 2);
        assert_eq!(plan.demotions, vec![row(11, 1), row(21, 2)]);
    }

    // =========================================================================
    // Schedule
    // =========================================================================

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 6)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn sweep_delay_before_three_am() {
        assert_eq!(next_sweep_delay(at(2, 59, 0)), Duration::from_secs(60));
    }

    #[test]
    fn sweep_delay_after_three_am_waits_for_tomorrow() {
        assert_eq!(
            next_sweep_delay(at(3, 0, 0)),
            Duration::from_secs(24 * 60 * 60)
        );
        assert_eq!(
            next_sweep_delay(at(15, 0, 0)),
            Duration::from_secs(12 * 60 * 60)
        );
    }

    // =========================================================================
    // Service against an in-memory store
    // =========================================================================

    #[derive(Default)]
    struct MockStore {
        rows: Mutex<Vec<PrimaryImageRow>>,
        demote_batches: Mutex<Vec<Vec<ImageId>>>,
        fail_demote: bool,
    }

    impl MockStore {
        fn with_rows(rows: Vec<PrimaryImageRow>) -> Self {
            Self {
                rows: Mutex::new(rows),
                ..Self::default()
            }
        }

        fn rows(&self) -> Vec<PrimaryImageRow> {
            self.rows.lock().unwrap().clone()
        }

        fn demote_batches(&self) -> Vec<Vec<ImageId>> {
            self.demote_batches.lock().unwrap().clone()
        }
    }

    impl PrimaryImageStore for &MockStore {
        async fn list_primary_flagged(&self) -> Result<Vec<PrimaryImageRow>, RepositoryError> {
            Ok(self.rows())
        }

        async fn demote(&self, image_ids: &[ImageId]) -> Result<u64, RepositoryError> {
            if self.fail_demote {
                return Err(RepositoryError::DataCorruption("injected failure".to_string()));
            }
            self.demote_batches.lock().unwrap().push(image_ids.to_vec());
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| !image_ids.contains(&r.image_id));
            Ok((before - rows.len()) as u64)
        }
    }

    #[tokio::test]
    async fn run_once_restores_invariant() {
        let store = MockStore::with_rows(vec![row(10, 1), row(11, 1), row(20, 2)]);
        let service = ImageCleanupService::new(&store);

        let report = service.run_once().await.unwrap();

        assert_eq!(report.products_with_duplicates, 1);
        assert_eq!(report.images_demoted, 1);
        assert_eq!(store.rows(), vec![row(10, 1), row(20, 2)]);
    }

    #[tokio::test]
    async fn run_once_is_idempotent() {
        let store = MockStore::with_rows(vec![row(10, 1), row(11, 1), row(12, 1)]);
        let service = ImageCleanupService::new(&store);

        let first = service.run_once().await.unwrap();
        assert_eq!(first.images_demoted, 2);
        let after_first = store.rows();

        let second = service.run_once().await.unwrap();
        assert_eq!(second.products_with_duplicates, 0);
        assert_eq!(second.images_demoted, 0);
        assert_eq!(store.rows(), after_first);
    }

    #[tokio::test]
    async fn failed_demotion_leaves_state_unchanged() {
        let store = MockStore {
            rows: Mutex::new(vec![row(10, 1), row(11, 1)]),
            demote_batches: Mutex::new(Vec::new()),
            fail_demote: true,
        };
        let service = ImageCleanupService::new(&store);

        let result = service.run_once().await;

        assert!(result.is_err());
        assert_eq!(store.rows(), vec![row(10, 1), row(11, 1)]);
    }

    #[tokio::test]
    async fn demotions_commit_as_one_batch() {
        let store =
            MockStore::with_rows(vec![row(10, 1), row(11, 1), row(20, 2), row(21, 2)]);
        let service = ImageCleanupService::new(&store);

        service.run_once().await.unwrap();

        // All demotions of a run go through a single store write.
        assert_eq!(
            store.demote_batches(),
            vec![vec![ImageId::new(11), ImageId::new(21)]]
        );
    }
}
