//! In-memory quota store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use time::{Date, OffsetDateTime};

use crate::error::EntitleError;
use crate::key::MeteredFeatureKind;

use super::traits::{Increment, QuotaStore};
use super::utc_day;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct UsageKey {
    user_id: String,
    kind: MeteredFeatureKind,
    day: Date,
}

/// Process-local [`QuotaStore`].
///
/// All counters sit behind one mutex, so `try_increment` is a true
/// compare-and-increment. Counters do not survive a restart; use the SQL
/// store when they must.
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    counters: Mutex<HashMap<UsageKey, u32>>,
}

impl MemoryQuotaStore {
    /// Create an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live counters.
    #[inline]
    pub fn len(&self) -> usize {
        self.counters.lock().len()
    }

    /// Check if no counters exist.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counters.lock().is_empty()
    }

    /// Drop counters for days strictly before `day`. Returns how many were removed.
    ///
    /// `day` is capped at the current UTC day, so live counters are never dropped.
    pub fn prune_before(&self, day: Date) -> usize {
        let day = day.min(utc_day(OffsetDateTime::now_utc()));
        let mut counters = self.counters.lock();
        let before = counters.len();
        counters.retain(|key, _| key.day >= day);
        before - counters.len()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn current_usage(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        day: Date,
    ) -> Result<u32, EntitleError> {
        let key = UsageKey {
            user_id: user_id.to_string(),
            kind: kind.clone(),
            day,
        };
        Ok(self.counters.lock().get(&key).copied().unwrap_or(0))
    }

    async fn try_increment(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        day: Date,
        limit: u32,
    ) -> Result<Increment, EntitleError> {
        let key = UsageKey {
            user_id: user_id.to_string(),
            kind: kind.clone(),
            day,
        };
        let mut counters = self.counters.lock();
        let count = counters.get(&key).copied().unwrap_or(0);
        if count >= limit {
            return Ok(Increment {
                count,
                admitted: false,
            });
        }
        let count = count + 1;
        counters.insert(key, count);
        Ok(Increment {
            count,
            admitted: true,
        })
    }
}
