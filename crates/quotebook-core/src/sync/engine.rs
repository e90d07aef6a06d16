//! Sync cycle controller
//!
//! Drives one pull-detect-merge round at a time:
//!
//! ```text
//! Idle -> Detecting -> Clean            -> (auto merge)          -> Idle
//!                   -> ConflictsPending -> Resolving (user pick) -> Idle
//! ```
//!
//! Cycles never overlap. A cycle takes the in-flight guard before its first
//! await and the guard is released when it goes out of scope, so error
//! paths and a cycle future dropped mid-fetch both leave the engine Idle.
//! While conflicts are pending, new cycles are skipped until the user
//! resolves them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::detect::{detect_conflicts, merge};
use super::gateway::RemoteGateway;
use super::metadata::SyncMetadata;
use super::resolve::{apply_resolution, Resolution};
use crate::error::{QuoteError, Result};
use crate::models::Conflict;
use crate::store::QuoteStore;

/// Observable state of the sync controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing running, nothing pending
    Idle,
    /// A cycle is fetching and comparing
    Detecting,
    /// No conflicts; merge runs automatically
    Clean,
    /// Waiting for the user to pick a resolution
    ConflictsPending,
    /// Applying the user's resolution
    Resolving,
}

/// Why a requested cycle did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another cycle holds the in-flight guard
    InFlight,
    /// The previous round still awaits a resolution
    ConflictsPending,
}

/// Result of one sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No conflicts; remote and local-only quotes were merged
    Merged {
        total: usize,
        local_only: usize,
        degraded: bool,
    },
    /// Conflicts found; the store is untouched until `resolve`
    ConflictsPending {
        conflicts: Vec<Conflict>,
        degraded: bool,
    },
    /// Nothing ran
    Skipped(SkipReason),
}

impl SyncOutcome {
    /// Whether the remote data was cached or fallback data
    pub fn is_degraded(&self) -> bool {
        match self {
            SyncOutcome::Merged { degraded, .. } => *degraded,
            SyncOutcome::ConflictsPending { degraded, .. } => *degraded,
            SyncOutcome::Skipped(_) => false,
        }
    }
}

/// Shared "a sync cycle is running" flag
#[derive(Debug, Clone, Default)]
pub struct SyncGuard {
    flag: Arc<AtomicBool>,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard; `None` when a cycle already holds it
    pub fn try_acquire(&self) -> Option<InFlight> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight {
                flag: Arc::clone(&self.flag),
            })
    }

    pub fn is_held(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Held for the duration of one cycle; releases the guard on drop
#[derive(Debug)]
pub struct InFlight {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Sync controller owning the pending conflict list
pub struct SyncEngine {
    guard: SyncGuard,
    conflicts: Vec<Conflict>,
    metadata: SyncMetadata,
}

impl SyncEngine {
    /// Create an engine, loading sync metadata from the store's key-value backend
    pub fn new(store: &mut QuoteStore) -> Result<Self> {
        Self::with_guard(store, SyncGuard::new())
    }

    /// Create an engine sharing an existing in-flight guard
    pub fn with_guard(store: &mut QuoteStore, guard: SyncGuard) -> Result<Self> {
        let metadata = SyncMetadata::load_or_init(store.kv_mut())?;
        Ok(Self {
            guard,
            conflicts: Vec::new(),
            metadata,
        })
    }

    pub fn phase(&self) -> SyncPhase {
        if !self.conflicts.is_empty() {
            SyncPhase::ConflictsPending
        } else if self.guard.is_held() {
            SyncPhase::Detecting
        } else {
            SyncPhase::Idle
        }
    }

    /// Conflicts awaiting a resolution
    pub fn pending_conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn metadata(&self) -> &SyncMetadata {
        &self.metadata
    }

    pub fn guard(&self) -> &SyncGuard {
        &self.guard
    }

    /// Run one sync cycle against the gateway
    pub async fn sync_cycle(
        &mut self,
        store: &mut QuoteStore,
        gateway: &dyn RemoteGateway,
    ) -> Result<SyncOutcome> {
        if !self.conflicts.is_empty() {
            debug!("Sync skipped: {} conflicts pending", self.conflicts.len());
            return Ok(SyncOutcome::Skipped(SkipReason::ConflictsPending));
        }

        let Some(_in_flight) = self.guard.try_acquire() else {
            debug!("Sync skipped: another cycle is in flight");
            return Ok(SyncOutcome::Skipped(SkipReason::InFlight));
        };

        debug!("Sync phase: {:?}", SyncPhase::Detecting);
        let fetched = gateway.fetch().await;
        if fetched.degraded {
            warn!("Syncing against cached or fallback remote data");
        }

        let conflicts = detect_conflicts(store.quotes(), &fetched.quotes);
        if !conflicts.is_empty() {
            info!("Sync found {} conflicts", conflicts.len());
            debug!("Sync phase: {:?}", SyncPhase::ConflictsPending);
            self.conflicts = conflicts.clone();
            return Ok(SyncOutcome::ConflictsPending {
                conflicts,
                degraded: fetched.degraded,
            });
        }

        debug!("Sync phase: {:?}", SyncPhase::Clean);
        let merged = merge(store.quotes(), &fetched.quotes);
        let total = merged.len();
        let local_only = total - fetched.quotes.len();
        store.replace_all(merged)?;
        self.metadata.record_sync(store.kv_mut(), Utc::now())?;

        info!("Sync merged {} quotes ({} local only)", total, local_only);
        Ok(SyncOutcome::Merged {
            total,
            local_only,
            degraded: fetched.degraded,
        })
    }

    /// Apply the user's choice to the pending conflicts
    ///
    /// The conflict list is cleared even if persisting fails.
    pub fn resolve(&mut self, store: &mut QuoteStore, resolution: Resolution) -> Result<usize> {
        if self.conflicts.is_empty() {
            return Err(QuoteError::NothingToResolve);
        }

        debug!("Sync phase: {:?} ({})", SyncPhase::Resolving, resolution);
        let conflicts = std::mem::take(&mut self.conflicts);
        let affected = store.modify(|quotes| apply_resolution(quotes, &conflicts, resolution))?;
        self.metadata.record_sync(store.kv_mut(), Utc::now())?;

        info!(
            "Resolved {} conflicts with {} ({} quotes affected)",
            conflicts.len(),
            resolution,
            affected
        );
        Ok(affected)
    }

    /// Send the local set to the remote collection
    pub async fn push(&self, store: &QuoteStore, gateway: &dyn RemoteGateway) -> Result<usize> {
        gateway.post(store.quotes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quote;
    use crate::storage::{KeyValueStore, MemoryStore, StorageError, StorageResult, LAST_SYNC_KEY};
    use crate::sync::gateway::FetchOutcome;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Gateway returning a fixed remote set and recording posts
    struct ScriptedGateway {
        remote: Vec<Quote>,
        degraded: bool,
        posted: Mutex<Vec<Quote>>,
    }

    impl ScriptedGateway {
        fn new(remote: Vec<Quote>) -> Self {
            Self {
                remote,
                degraded: false,
                posted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RemoteGateway for ScriptedGateway {
        async fn fetch(&self) -> FetchOutcome {
            FetchOutcome {
                quotes: self.remote.clone(),
                degraded: self.degraded,
            }
        }

        async fn post(&self, quotes: &[Quote]) -> Result<usize> {
            let sent: Vec<Quote> = quotes.iter().take(5).cloned().collect();
            let count = sent.len();
            self.posted.lock().unwrap().extend(sent);
            Ok(count)
        }
    }

    /// Key-value store whose writes fail once armed
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: Arc<AtomicBool>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::WriteError {
                    path: "flaky".into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "write refused"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> StorageResult<()> {
            self.inner.remove(key)
        }

        fn clear(&mut self) -> StorageResult<()> {
            self.inner.clear()
        }
    }

    fn q(text: &str, category: &str) -> Quote {
        Quote::new(text, category)
    }

    fn store_with(quotes: Vec<Quote>) -> QuoteStore {
        let mut store = QuoteStore::open(Box::new(MemoryStore::new())).unwrap();
        store.replace_all(quotes).unwrap();
        store
    }

    #[tokio::test]
    async fn test_clean_cycle_merges_and_records_time() {
        let mut store = store_with(vec![q("Local", "Mine")]);
        let mut engine = SyncEngine::new(&mut store).unwrap();
        let gateway = ScriptedGateway::new(vec![q("Remote", "Theirs")]);

        let outcome = engine.sync_cycle(&mut store, &gateway).await.unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Merged {
                total: 2,
                local_only: 1,
                degraded: false
            }
        );
        assert_eq!(store.quotes(), &[q("Remote", "Theirs"), q("Local", "Mine")]);
        assert_eq!(engine.phase(), SyncPhase::Idle);
        assert!(engine.metadata().last_sync_timestamp.is_some());
        assert!(store.kv().get(LAST_SYNC_KEY).is_some());
    }

    #[tokio::test]
    async fn test_conflicts_suspend_until_resolved() {
        let mut store = store_with(vec![q("A", "X")]);
        let mut engine = SyncEngine::new(&mut store).unwrap();
        let gateway = ScriptedGateway::new(vec![q("A", "Y")]);

        let outcome = engine.sync_cycle(&mut store, &gateway).await.unwrap();
        match outcome {
            SyncOutcome::ConflictsPending { conflicts, .. } => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].server_category, "Y");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(engine.phase(), SyncPhase::ConflictsPending);
        assert_eq!(store.quotes(), &[q("A", "X")]);

        // A second cycle must not start while the round is unresolved
        let again = engine.sync_cycle(&mut store, &gateway).await.unwrap();
        assert_eq!(again, SyncOutcome::Skipped(SkipReason::ConflictsPending));

        let affected = engine.resolve(&mut store, Resolution::KeepServer).unwrap();
        assert_eq!(affected, 1);
        assert_eq!(store.quotes(), &[q("A", "Y")]);
        assert_eq!(engine.phase(), SyncPhase::Idle);
        assert!(engine.pending_conflicts().is_empty());
    }

    #[tokio::test]
    async fn test_keep_local_clears_conflicts_without_mutation() {
        let mut store = store_with(vec![q("A", "X")]);
        let mut engine = SyncEngine::new(&mut store).unwrap();
        let gateway = ScriptedGateway::new(vec![q("A", "Y")]);

        engine.sync_cycle(&mut store, &gateway).await.unwrap();
        let affected = engine.resolve(&mut store, Resolution::KeepLocal).unwrap();

        assert_eq!(affected, 0);
        assert_eq!(store.quotes(), &[q("A", "X")]);
        assert!(engine.pending_conflicts().is_empty());
    }

    #[tokio::test]
    async fn test_merge_resolution_duplicates_text() {
        let mut store = store_with(vec![q("A", "X")]);
        let mut engine = SyncEngine::new(&mut store).unwrap();
        let gateway = ScriptedGateway::new(vec![q("A", "Y")]);

        engine.sync_cycle(&mut store, &gateway).await.unwrap();
        engine.resolve(&mut store, Resolution::Merge).unwrap();

        assert_eq!(store.quotes(), &[q("A", "X"), q("A", "Y")]);
    }

    #[test]
    fn test_resolve_without_conflicts_errors() {
        let mut store = store_with(vec![]);
        let mut engine = SyncEngine::new(&mut store).unwrap();
        let err = engine.resolve(&mut store, Resolution::Merge).unwrap_err();
        assert!(matches!(err, QuoteError::NothingToResolve));
    }

    #[tokio::test]
    async fn test_cycle_skipped_while_guard_held() {
        let mut store = store_with(vec![q("A", "X")]);
        let guard = SyncGuard::new();
        let mut engine = SyncEngine::with_guard(&mut store, guard.clone()).unwrap();
        let gateway = ScriptedGateway::new(vec![]);

        let held = guard.try_acquire().unwrap();
        assert_eq!(engine.phase(), SyncPhase::Detecting);
        let outcome = engine.sync_cycle(&mut store, &gateway).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::InFlight));
        assert_eq!(store.quotes(), &[q("A", "X")]);

        drop(held);
        let outcome = engine.sync_cycle(&mut store, &gateway).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Merged { .. }));
    }

    #[test]
    fn test_guard_is_exclusive_and_released_on_drop() {
        let guard = SyncGuard::new();
        let first = guard.try_acquire();
        assert!(first.is_some());
        assert!(guard.try_acquire().is_none());

        drop(first);
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_failed_cycle_releases_guard() {
        let fail_writes = Arc::new(AtomicBool::new(false));
        let kv = FlakyStore {
            inner: MemoryStore::new(),
            fail_writes: Arc::clone(&fail_writes),
        };
        let mut store = QuoteStore::open(Box::new(kv)).unwrap();
        let mut engine = SyncEngine::new(&mut store).unwrap();
        let gateway = ScriptedGateway::new(vec![q("Remote", "R")]);

        fail_writes.store(true, Ordering::SeqCst);
        let result = engine.sync_cycle(&mut store, &gateway).await;
        assert!(matches!(result, Err(QuoteError::Storage(_))));
        assert!(!engine.guard().is_held());
        assert_eq!(engine.phase(), SyncPhase::Idle);

        fail_writes.store(false, Ordering::SeqCst);
        let outcome = engine.sync_cycle(&mut store, &gateway).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Merged { .. }));
    }

    #[tokio::test]
    async fn test_degraded_flag_is_reported() {
        let mut store = store_with(vec![]);
        let mut engine = SyncEngine::new(&mut store).unwrap();
        let mut gateway = ScriptedGateway::new(vec![q("Offline", "API")]);
        gateway.degraded = true;

        let outcome = engine.sync_cycle(&mut store, &gateway).await.unwrap();
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_push_sends_local_quotes() {
        let mut store = store_with((0..7).map(|i| q(&format!("q{i}"), "C")).collect());
        let engine = SyncEngine::new(&mut store).unwrap();
        let gateway = ScriptedGateway::new(vec![]);

        let sent = engine.push(&store, &gateway).await.unwrap();
        assert_eq!(sent, 5);
        assert_eq!(gateway.posted.lock().unwrap()[0], q("q0", "C"));
    }
}
