//! Per-caller rate quota accounting.
//!
//! # State Machine
//! ```text
//! api_t_start unset           → api_t_start = now
//! now - api_t_start >= window → api_t_start = now, api_rate = 0
//! use_quota(api_rate)         → false: RateLimited (nothing flushed)
//!                               true:  flush
//! ```

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use thiserror::Error;

use crate::error::ApiError;

/// Quota charged once per API call.
pub const RATE_QUOTA: &str = "api_rate";

/// State variable holding the start of the current rate window.
pub const RATE_WINDOW_START: &str = "api_t_start";

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("quota store unavailable: {0}")]
    Unavailable(String),
}

/// Store of per-caller quota state.
pub trait QuotaStore: Send + Sync {
    /// Open the quota state of one caller for a single request.
    ///
    /// Implementations serialize concurrent handles for the same caller.
    fn open<'a>(&'a self, user: &str) -> Result<Box<dyn CallerQuota + 'a>, QuotaError>;
}

/// Quota state of one caller. Changes are only persisted by `flush`.
pub trait CallerQuota {
    fn get_state_var(&self, key: &str) -> Option<u64>;

    fn set_state_var(&mut self, key: &str, value: u64);

    /// Overwrite the used amount of a quota.
    fn set_quota(&mut self, name: &str, used: u64);

    /// Use one unit of a quota. Returns false, without using anything, when
    /// the limit would be exceeded.
    fn use_quota(&mut self, name: &str) -> bool;

    fn flush(self: Box<Self>) -> Result<(), QuotaError>;
}

/// Charge one API call against `quota`.
pub fn account(
    mut quota: Box<dyn CallerQuota + '_>,
    now: u64,
    window_secs: u64,
) -> Result<(), ApiError> {
    match quota.get_state_var(RATE_WINDOW_START) {
        Some(start) if now.saturating_sub(start) >= window_secs => {
            quota.set_state_var(RATE_WINDOW_START, now);
            quota.set_quota(RATE_QUOTA, 0);
        }
        Some(_) => {}
        None => quota.set_state_var(RATE_WINDOW_START, now),
    }

    if !quota.use_quota(RATE_QUOTA) {
        return Err(ApiError::RateLimited);
    }

    quota
        .flush()
        .map_err(|e| ApiError::Internal(format!("failed to flush quota: {}", e)))
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Persisted quota state of one caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuotaRecord {
    pub state: HashMap<String, u64>,
    pub used: HashMap<String, u64>,
}

/// In-process quota store.
///
/// A handle keeps the caller's map entry locked until it is flushed or
/// dropped, so updates for one caller never interleave. The lock is the
/// DashMap shard lock: callers hashing to the same shard wait on each other
/// for the length of one `account` call. Stores backed by per-caller rows
/// avoid that.
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    records: DashMap<String, QuotaRecord>,
    limits: HashMap<String, u64>,
}

impl MemoryQuotaStore {
    /// Create a store with per-quota limits. Quotas without a limit are denied.
    pub fn new(limits: HashMap<String, u64>) -> Self {
        Self {
            records: DashMap::new(),
            limits,
        }
    }

    /// Store limiting only the API rate quota.
    pub fn with_rate_limit(limit: u64) -> Self {
        Self::new(HashMap::from([(RATE_QUOTA.to_string(), limit)]))
    }

    /// Committed state of a caller.
    pub fn snapshot(&self, user: &str) -> Option<QuotaRecord> {
        self.records.get(user).map(|r| r.value().clone())
    }

    /// Replace the committed state of a caller.
    pub fn restore(&self, user: &str, record: QuotaRecord) {
        self.records.insert(user.to_string(), record);
    }
}

impl QuotaStore for MemoryQuotaStore {
    fn open<'a>(&'a self, user: &str) -> Result<Box<dyn CallerQuota + 'a>, QuotaError> {
        let entry = self.records.entry(user.to_string()).or_default();
        let staged = entry.value().clone();
        Ok(Box::new(MemoryCallerQuota {
            entry,
            staged,
            limits: &self.limits,
        }))
    }
}

struct MemoryCallerQuota<'a> {
    entry: RefMut<'a, String, QuotaRecord>,
    staged: QuotaRecord,
    limits: &'a HashMap<String, u64>,
}

impl CallerQuota for MemoryCallerQuota<'_> {
    fn get_state_var(&self, key: &str) -> Option<u64> {
        self.staged.state.get(key).copied()
    }

    fn set_state_var(&mut self, key: &str, value: u64) {
        self.staged.state.insert(key.to_string(), value);
    }

    fn set_quota(&mut self, name: &str, used: u64) {
        self.staged.used.insert(name.to_string(), used);
    }

    fn use_quota(&mut self, name: &str) -> bool {
        let Some(limit) = self.limits.get(name).copied() else {
            tracing::warn!(quota = %name, "No limit configured for quota");
            return false;
        };
        let used = self.staged.used.entry(name.to_string()).or_insert(0);
        if *used >= limit {
            return false;
        }
        *used += 1;
        true
    }

    fn flush(self: Box<Self>) -> Result<(), QuotaError> {
        let MemoryCallerQuota {
            mut entry, staged, ..
        } = *self;
        *entry.value_mut() = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: u64 = 60;

    fn charge(store: &MemoryQuotaStore, now: u64) -> Result<(), ApiError> {
        account(store.open("alice").unwrap(), now, WINDOW)
    }

    fn used(store: &MemoryQuotaStore) -> u64 {
        store.snapshot("alice").unwrap().used[RATE_QUOTA]
    }

    #[test]
    fn test_first_call_starts_window() {
        let store = MemoryQuotaStore::with_rate_limit(10);
        charge(&store, 1000).unwrap();
        let record = store.snapshot("alice").unwrap();
        assert_eq!(record.state[RATE_WINDOW_START], 1000);
        assert_eq!(record.used[RATE_QUOTA], 1);
    }

    #[test]
    fn test_counts_within_window() {
        let store = MemoryQuotaStore::with_rate_limit(10);
        for t in 0..5 {
            charge(&store, 1000 + t).unwrap();
        }
        assert_eq!(used(&store), 5);
        assert_eq!(store.snapshot("alice").unwrap().state[RATE_WINDOW_START], 1000);
    }

    #[test]
    fn test_limit_exceeded_does_not_persist() {
        let store = MemoryQuotaStore::with_rate_limit(2);
        charge(&store, 1000).unwrap();
        charge(&store, 1001).unwrap();
        assert!(matches!(charge(&store, 1002), Err(ApiError::RateLimited)));
        assert_eq!(used(&store), 2);
    }

    #[test]
    fn test_rollover_resets_counter() {
        let store = MemoryQuotaStore::with_rate_limit(100);
        let mut record = QuotaRecord::default();
        record.state.insert(RATE_WINDOW_START.to_string(), 1000);
        record.used.insert(RATE_QUOTA.to_string(), 42);
        store.restore("alice", record);

        charge(&store, 1000 + WINDOW).unwrap();
        let record = store.snapshot("alice").unwrap();
        assert_eq!(record.used[RATE_QUOTA], 1);
        assert_eq!(record.state[RATE_WINDOW_START], 1000 + WINDOW);
    }

    #[test]
    fn test_rollover_unblocks_limited_caller() {
        let store = MemoryQuotaStore::with_rate_limit(1);
        charge(&store, 1000).unwrap();
        assert!(charge(&store, 1000 + WINDOW - 1).is_err());
        charge(&store, 1000 + WINDOW).unwrap();
    }

    #[test]
    fn test_callers_are_independent() {
        let store = MemoryQuotaStore::with_rate_limit(1);
        charge(&store, 1000).unwrap();
        account(store.open("bob").unwrap(), 1000, WINDOW).unwrap();
        assert!(charge(&store, 1001).is_err());
    }

    #[test]
    fn test_unflushed_handle_is_discarded() {
        let store = MemoryQuotaStore::with_rate_limit(5);
        {
            let mut handle = store.open("alice").unwrap();
            handle.set_state_var(RATE_WINDOW_START, 5);
            assert!(handle.use_quota(RATE_QUOTA));
        }
        assert_eq!(store.snapshot("alice"), Some(QuotaRecord::default()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_charges_for_one_caller() {
        const CALLS: usize = 64;
        const LIMIT: u64 = 20;
        let store = std::sync::Arc::new(MemoryQuotaStore::with_rate_limit(LIMIT));

        let tasks: Vec<_> = (0..CALLS)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { charge(&store, 1000) })
            })
            .collect();

        let mut limited = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => {}
                Err(ApiError::RateLimited) => limited += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(used(&store), LIMIT);
        assert_eq!(limited, CALLS - LIMIT as usize);
    }

    #[test]
    fn test_unknown_quota_denied() {
        let store = MemoryQuotaStore::new(HashMap::new());
        let mut handle = store.open("alice").unwrap();
        assert!(!handle.use_quota("uploads"));
    }
}
