use crate::models::ObjectRecord;
use crate::services::storage::StorageService;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

/// An immutable view of the bucket, newest objects first.
#[derive(Debug, Default)]
pub struct CacheSnapshot {
    pub records: Vec<ObjectRecord>,
    pub refreshed_at: Option<Instant>,
    /// Sequence number of the refresh that produced this snapshot; 0 = never refreshed.
    generation: u64,
}

impl CacheSnapshot {
    pub fn total_size(&self) -> i64 {
        self.records.iter().map(|r| r.size).sum()
    }

    pub fn is_stale(&self, threshold: Duration) -> bool {
        match self.refreshed_at {
            Some(at) => at.elapsed() > threshold,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePage {
    pub records: Vec<ObjectRecord>,
    pub next_offset: Option<usize>,
}

/// Size-bounded, periodically rebuilt listing of the bucket.
///
/// Readers always see a complete snapshot: a refresh builds the new record list
/// off to the side and swaps the `Arc` in one write. Refreshes are serialized,
/// and a caller that queued behind a refresh which started after it asked
/// reuses that result instead of enumerating the bucket again.
pub struct ListingCache {
    storage: Arc<dyn StorageService>,
    max_bytes: i64,
    snapshot: RwLock<Arc<CacheSnapshot>>,
    refresh_lock: Mutex<()>,
    refreshes_started: AtomicU64,
}

impl ListingCache {
    pub fn new(storage: Arc<dyn StorageService>, max_bytes: i64) -> Self {
        Self {
            storage,
            max_bytes,
            snapshot: RwLock::new(Arc::new(CacheSnapshot::default())),
            refresh_lock: Mutex::new(()),
            refreshes_started: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Re-enumerates the bucket and installs the result.
    ///
    /// The returned snapshot always comes from an enumeration that began after
    /// this call was made. On failure the current snapshot is left untouched.
    pub async fn refresh(&self) -> Result<Arc<CacheSnapshot>> {
        let requested_after = self.refreshes_started.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        let current = self.snapshot().await;
        if current.generation > requested_after {
            debug!(
                "Reusing listing refresh #{} completed while waiting",
                current.generation
            );
            return Ok(current);
        }

        self.rebuild().await
    }

    /// Refreshes only if the snapshot is older than `threshold`. Concurrent
    /// callers that all observe a stale cache share a single enumeration.
    pub async fn refresh_if_stale(&self, threshold: Duration) -> Result<Arc<CacheSnapshot>> {
        let current = self.snapshot().await;
        if !current.is_stale(threshold) {
            return Ok(current);
        }

        let _guard = self.refresh_lock.lock().await;
        let current = self.snapshot().await;
        if !current.is_stale(threshold) {
            debug!(
                "Listing refreshed by refresh #{} while waiting",
                current.generation
            );
            return Ok(current);
        }

        self.rebuild().await
    }

    /// Caller must hold `refresh_lock`.
    async fn rebuild(&self) -> Result<Arc<CacheSnapshot>> {
        let generation = self.refreshes_started.fetch_add(1, Ordering::AcqRel) + 1;
        let started = Instant::now();

        let objects = self.storage.list_all_objects().await?;
        let listed = objects.len();
        let records = build_records(objects, self.max_bytes);

        let snapshot = Arc::new(CacheSnapshot {
            records,
            refreshed_at: Some(Instant::now()),
            generation,
        });

        info!(
            "🗂️  Listing refresh #{}: {} objects listed, {} cached ({} bytes) in {:?}",
            generation,
            listed,
            snapshot.records.len(),
            snapshot.total_size(),
            started.elapsed()
        );

        *self.snapshot.write().await = snapshot.clone();
        Ok(snapshot)
    }

    pub async fn get_page(&self, offset: usize, limit: usize) -> CachePage {
        let snapshot = self.snapshot().await;
        paginate(&snapshot.records, offset, limit)
    }

    /// True if never refreshed, or older than `threshold`.
    pub async fn is_stale(&self, threshold: Duration) -> bool {
        self.snapshot().await.is_stale(threshold)
    }

    pub async fn len(&self) -> usize {
        self.snapshot().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Deduplicates by key (newest wins), sorts newest first and applies the size budget.
pub fn build_records(mut objects: Vec<ObjectRecord>, max_bytes: i64) -> Vec<ObjectRecord> {
    objects.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.key.cmp(&b.key))
    });

    let mut seen = HashSet::with_capacity(objects.len());
    objects.retain(|o| seen.insert(o.key.clone()));

    let evicted = enforce_size_limit(&mut objects, max_bytes);
    if evicted > 0 {
        info!(
            "Evicted {} oldest objects to stay within {} byte cache budget",
            evicted, max_bytes
        );
    }
    objects
}

/// Drops records from the tail of a newest-first list until the total size fits.
/// Returns the number of evicted records.
pub fn enforce_size_limit(records: &mut Vec<ObjectRecord>, max_bytes: i64) -> usize {
    let mut total: i64 = records.iter().map(|r| r.size).sum();
    let mut evicted = 0;

    while total > max_bytes {
        match records.pop() {
            Some(removed) => {
                total -= removed.size;
                evicted += 1;
            }
            None => break,
        }
    }

    evicted
}

fn paginate(records: &[ObjectRecord], offset: usize, limit: usize) -> CachePage {
    if offset >= records.len() {
        return CachePage {
            records: Vec::new(),
            next_offset: None,
        };
    }

    let end = offset.saturating_add(limit).min(records.len());
    let next_offset = (end < records.len()).then_some(end);

    CachePage {
        records: records[offset..end].to_vec(),
        next_offset,
    }
}
