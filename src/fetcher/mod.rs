//! Bulk retrieval of every row of a paginated collection.
//!
//! The row store only answers one page at a time and never reports a total
//! count. [`BulkCollectionFetcher`] reads page 0, then fans out bounded batches
//! of page requests until a short page, a degraded batch, or the page ceiling
//! ends the walk. Individual pages are retried through [`RetryPolicy`].

use std::{fmt::Display, future::Future, time::Duration};

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{Instrument, debug, debug_span, info, warn};

/// Per-page retry with exponential backoff.
pub mod retry;

pub use retry::RetryPolicy;

/// Rows requested per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Concurrent page requests per batch when nothing else is configured.
pub const DEFAULT_PARALLELISM: u32 = 5;
/// Hard ceiling on the number of pages read by a single invocation.
pub const DEFAULT_MAX_PAGES: u32 = 100;
/// Upper bound on a batch, whatever the configured parallelism.
pub const MAX_BATCH_PAGES: u32 = 20;

/// Tuning knobs for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Rows per page; a page with fewer rows is the last one.
    pub page_size: u32,
    /// Pages requested concurrently. `0` and `1` fetch strictly sequentially.
    pub parallelism: u32,
    /// Absolute ceiling on pages read, page 0 included.
    pub max_pages: u32,
    /// Optional pause between two batches to go easy on the store.
    pub batch_pause: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            parallelism: DEFAULT_PARALLELISM,
            max_pages: DEFAULT_MAX_PAGES,
            batch_pause: None,
        }
    }
}

impl FetchOptions {
    /// Pages issued together in one batch.
    pub fn batch_width(&self) -> u32 {
        self.parallelism.clamp(1, MAX_BATCH_PAGES)
    }
}

/// Why a bulk fetch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A short or empty page was seen: the collection is drained.
    Exhausted,
    /// More than half of a batch failed after retries; the rows are partial.
    Degraded,
    /// The page ceiling was reached before a short page showed up.
    PageCap,
}

impl StopReason {
    /// Stable label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Exhausted => "exhausted",
            StopReason::Degraded => "degraded",
            StopReason::PageCap => "page_cap",
        }
    }
}

/// Rows returned by a bulk fetch together with how the walk ended.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport<T> {
    /// Rows of every accepted page, in page order.
    pub rows: Vec<T>,
    /// Reason the walk stopped.
    pub stop: StopReason,
    /// Distinct pages requested (retries not counted).
    pub pages_requested: u32,
    /// Pages that still failed once their retries were exhausted.
    pub pages_failed: u32,
}

/// Reads an entire collection through a page-at-a-time accessor.
#[derive(Debug, Clone, Default)]
pub struct BulkCollectionFetcher {
    options: FetchOptions,
    retry: RetryPolicy,
}

/// Per-invocation walk state. Never outlives a call.
struct FetchPlan<T> {
    page_size: u32,
    batch_width: u32,
    max_pages: u32,
    frontier: u32,
    rows: Vec<T>,
    pages_requested: u32,
    pages_failed: u32,
}

#[derive(Debug, Default)]
struct BatchOutcome {
    failed: u32,
    reached_end: bool,
}

impl<T> FetchPlan<T> {
    fn new(options: &FetchOptions) -> Self {
        Self {
            page_size: options.page_size.max(1),
            batch_width: options.batch_width(),
            max_pages: options.max_pages,
            frontier: 0,
            rows: Vec::new(),
            pages_requested: 0,
            pages_failed: 0,
        }
    }

    fn is_short(&self, page: &[T]) -> bool {
        page.len() < self.page_size as usize
    }

    /// Fold one settled batch into the accumulator, strictly in page order.
    ///
    /// Rows of pages following the first short page are dropped.
    fn absorb<E: Display>(
        &mut self,
        first_page: u32,
        results: Vec<Result<Vec<T>, E>>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for (page, result) in (first_page..).zip(results) {
            match result {
                Ok(rows) if outcome.reached_end => {
                    debug!(
                        page,
                        discarded = rows.len(),
                        "ignoring page past end of collection"
                    );
                }
                Ok(rows) => {
                    outcome.reached_end = self.is_short(&rows);
                    self.rows.extend(rows);
                }
                Err(err) => {
                    warn!(page, error = %err, "page failed after exhausting retries");
                    outcome.failed += 1;
                }
            }
        }

        self.pages_failed += outcome.failed;
        outcome
    }
}

impl BulkCollectionFetcher {
    /// Build a fetcher from explicit options and retry policy.
    pub fn new(options: FetchOptions, retry: RetryPolicy) -> Self {
        Self { options, retry }
    }

    /// Options the fetcher was built with.
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetch every row reachable through `fetch_page`, best effort.
    ///
    /// The result does not say whether the collection was drained or the walk
    /// was cut short; use [`Self::fetch_all_with_report`] for that.
    pub async fn fetch_all<T, E, F, Fut>(&self, fetch_page: F) -> Vec<T>
    where
        F: Fn(u32, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        E: Display,
    {
        self.fetch_all_with_report(fetch_page).await.rows
    }

    /// Same walk as [`Self::fetch_all`], also reporting why it stopped.
    pub async fn fetch_all_with_report<T, E, F, Fut>(&self, fetch_page: F) -> FetchReport<T>
    where
        F: Fn(u32, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        E: Display,
    {
        let mut plan = FetchPlan::new(&self.options);
        let stop = self.walk(&mut plan, &fetch_page).await;

        match stop {
            StopReason::Exhausted => info!(
                rows = plan.rows.len(),
                pages = plan.pages_requested,
                "collection fetched"
            ),
            StopReason::Degraded => warn!(
                rows = plan.rows.len(),
                pages = plan.pages_requested,
                failed = plan.pages_failed,
                "collection fetch degraded; returning partial rows"
            ),
            StopReason::PageCap => warn!(
                rows = plan.rows.len(),
                max_pages = plan.max_pages,
                "page ceiling reached; returning truncated rows"
            ),
        }

        FetchReport {
            rows: plan.rows,
            stop,
            pages_requested: plan.pages_requested,
            pages_failed: plan.pages_failed,
        }
    }

    async fn walk<T, E, F, Fut>(&self, plan: &mut FetchPlan<T>, fetch_page: &F) -> StopReason
    where
        F: Fn(u32, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        E: Display,
    {
        if plan.max_pages == 0 {
            return StopReason::PageCap;
        }

        plan.pages_requested += 1;
        let first = self.fetch_one(fetch_page, 0, plan.page_size).await;
        // Page 0 alone is a batch of one: losing it degrades the whole call.
        let outcome = plan.absorb(0, vec![first]);
        if outcome.failed > 0 {
            return StopReason::Degraded;
        }
        if outcome.reached_end {
            return StopReason::Exhausted;
        }
        plan.frontier = 1;

        loop {
            if plan.frontier >= plan.max_pages {
                return StopReason::PageCap;
            }

            let first_page = plan.frontier;
            let page_size = plan.page_size;
            let end = first_page
                .saturating_add(plan.batch_width)
                .min(plan.max_pages);
            let batch_len = end - first_page;
            debug!(first_page, last_page = end - 1, "requesting batch");

            let requests = (first_page..end)
                .map(|page| self.fetch_one(fetch_page, page, page_size));
            let results = join_all(requests).await;
            plan.pages_requested += batch_len;

            let outcome = plan.absorb(first_page, results);
            plan.frontier = end;

            if outcome.failed * 2 > batch_len {
                return StopReason::Degraded;
            }
            if outcome.reached_end {
                return StopReason::Exhausted;
            }
            if plan.frontier >= plan.max_pages {
                return StopReason::PageCap;
            }

            if let Some(pause) = self.options.batch_pause {
                sleep(pause).await;
            }
        }
    }

    async fn fetch_one<T, E, F, Fut>(
        &self,
        fetch_page: &F,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<T>, E>
    where
        F: Fn(u32, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        E: Display,
    {
        self.retry
            .run(|| fetch_page(page, page_size))
            .instrument(debug_span!("fetch_page", page))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use tokio::time::Instant;

    use super::*;

    const ALWAYS: u32 = u32::MAX;

    /// Deterministic store: page `i` holds rows `i * size .. (i + 1) * size`.
    #[derive(Default)]
    struct FakeStore {
        total: Option<u64>,
        failures: HashMap<u32, u32>,
        overrides: HashMap<u32, Vec<u64>>,
        attempts: Mutex<HashMap<u32, u32>>,
        calls: Mutex<Vec<u32>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeStore {
        fn with_total(total: u64) -> Self {
            Self {
                total: Some(total),
                ..Self::default()
            }
        }

        fn endless() -> Self {
            Self::default()
        }

        fn failing(mut self, page: u32, times: u32) -> Self {
            self.failures.insert(page, times);
            self
        }

        fn overriding(mut self, page: u32, rows: Vec<u64>) -> Self {
            self.overrides.insert(page, rows);
            self
        }

        async fn page(&self, page: u32, size: u32) -> Result<Vec<u64>, String> {
            self.calls.lock().unwrap().push(page);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                let entry = attempts.entry(page).or_default();
                *entry += 1;
                *entry
            };
            if attempt <= self.failures.get(&page).copied().unwrap_or(0) {
                return Err(format!("page {page} unavailable (attempt {attempt})"));
            }

            if let Some(rows) = self.overrides.get(&page) {
                return Ok(rows.clone());
            }

            let start = u64::from(page) * u64::from(size);
            let end = start + u64::from(size);
            let end = self.total.map_or(end, |total| end.min(total));
            Ok((start..end.max(start)).collect())
        }

        fn distinct_pages(&self) -> Vec<u32> {
            let mut pages = self.calls.lock().unwrap().clone();
            pages.sort_unstable();
            pages.dedup();
            pages
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    fn fetcher(page_size: u32, parallelism: u32) -> BulkCollectionFetcher {
        BulkCollectionFetcher::new(
            FetchOptions {
                page_size,
                parallelism,
                ..FetchOptions::default()
            },
            RetryPolicy::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn short_first_page_is_the_whole_collection() {
        for parallelism in [1, 5, 20] {
            let store = FakeStore::with_total(42);
            let report = fetcher(100, parallelism)
                .fetch_all_with_report(|page, size| store.page(page, size))
                .await;

            assert_eq!(report.rows, (0..42).collect::<Vec<_>>());
            assert_eq!(report.stop, StopReason::Exhausted);
            assert_eq!(store.call_count(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_last_page_is_confirmed_by_probing_the_next_one() {
        let store = FakeStore::with_total(300);
        let report = fetcher(100, 1)
            .fetch_all_with_report(|page, size| store.page(page, size))
            .await;

        assert_eq!(report.rows.len(), 300);
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(store.distinct_pages(), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn rows_keep_page_order_for_any_parallelism() {
        for parallelism in [1, 5, 20] {
            let store = FakeStore::with_total(1_234);
            let rows = fetcher(100, parallelism)
                .fetch_all(|page, size| store.page(page, size))
                .await;

            assert_eq!(rows, (0..1_234).collect::<Vec<_>>(), "parallelism {parallelism}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failing_page_is_recovered_by_retry() {
        let store = FakeStore::with_total(250).failing(2, 2);
        let started = Instant::now();

        let report = fetcher(100, 5)
            .fetch_all_with_report(|page, size| store.page(page, size))
            .await;

        assert_eq!(report.rows, (0..250).collect::<Vec<_>>());
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(report.pages_failed, 0);
        assert!(started.elapsed() >= Duration::from_millis(1_000 + 2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn mostly_failing_batch_stops_the_walk() {
        let mut store = FakeStore::endless();
        for page in 1..=6 {
            store = store.failing(page, ALWAYS);
        }

        let report = fetcher(10, 10)
            .fetch_all_with_report(|page, size| store.page(page, size))
            .await;

        let mut expected: Vec<u64> = (0..10).collect();
        expected.extend(70..110);
        assert_eq!(report.rows, expected);
        assert_eq!(report.stop, StopReason::Degraded);
        assert_eq!(report.pages_failed, 6);
        assert_eq!(store.distinct_pages().last(), Some(&10));
    }

    #[tokio::test(start_paused = true)]
    async fn half_failing_batch_keeps_going() {
        let store = FakeStore::with_total(450).failing(1, ALWAYS).failing(2, ALWAYS);

        let report = fetcher(100, 4)
            .fetch_all_with_report(|page, size| store.page(page, size))
            .await;

        let mut expected: Vec<u64> = (0..100).collect();
        expected.extend(300..450);
        assert_eq!(report.rows, expected);
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(report.pages_failed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_first_page_yields_nothing() {
        let store = FakeStore::with_total(500).failing(0, ALWAYS);

        let report = fetcher(100, 5)
            .fetch_all_with_report(|page, size| store.page(page, size))
            .await;

        assert!(report.rows.is_empty());
        assert_eq!(report.stop, StopReason::Degraded);
        assert_eq!(store.call_count(), RetryPolicy::default().max_attempts as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn endless_collection_stops_at_the_page_ceiling() {
        let store = FakeStore::endless();

        let report = fetcher(100, 5)
            .fetch_all_with_report(|page, size| store.page(page, size))
            .await;

        assert_eq!(report.rows.len(), 100 * 100);
        assert_eq!(report.stop, StopReason::PageCap);
        assert_eq!(report.pages_requested, 100);
        assert_eq!(store.call_count(), 100);
        assert_eq!(store.distinct_pages().last(), Some(&99));
    }

    #[tokio::test(start_paused = true)]
    async fn pages_after_a_short_page_are_discarded() {
        let store = FakeStore::endless()
            .overriding(2, vec![200, 201])
            .overriding(3, vec![999]);

        let rows = fetcher(100, 5)
            .fetch_all(|page, size| store.page(page, size))
            .await;

        let mut expected: Vec<u64> = (0..200).collect();
        expected.extend([200, 201]);
        assert_eq!(rows, expected);
        assert_eq!(store.distinct_pages(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_width_is_capped() {
        let store = FakeStore::with_total(5_000);
        fetcher(100, 50)
            .fetch_all(|page, size| store.page(page, size))
            .await;
        assert_eq!(store.max_in_flight.load(Ordering::SeqCst), MAX_BATCH_PAGES as usize);

        let sequential = FakeStore::with_total(1_000);
        fetcher(100, 0)
            .fetch_all(|page, size| sequential.page(page, size))
            .await;
        assert_eq!(sequential.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_pause_is_applied_between_batches() {
        let store = FakeStore::with_total(1_050);
        let fetcher = BulkCollectionFetcher::new(
            FetchOptions {
                page_size: 100,
                parallelism: 5,
                batch_pause: Some(Duration::from_millis(500)),
                ..FetchOptions::default()
            },
            RetryPolicy::default(),
        );
        let started = Instant::now();

        let rows = fetcher.fetch_all(|page, size| store.page(page, size)).await;

        // Batches 1..=5 and 6..=10; a single pause separates them.
        assert_eq!(rows.len(), 1_050);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_page_ceiling_requests_nothing() {
        let store = FakeStore::with_total(10);
        let report = BulkCollectionFetcher::new(
            FetchOptions {
                max_pages: 0,
                ..FetchOptions::default()
            },
            RetryPolicy::default(),
        )
        .fetch_all_with_report(|page, size| store.page(page, size))
        .await;

        assert!(report.rows.is_empty());
        assert_eq!(report.stop, StopReason::PageCap);
        assert_eq!(store.call_count(), 0);
    }
}
