//! Quota store trait.

use std::sync::Arc;

use async_trait::async_trait;
use time::Date;

use crate::error::EntitleError;
use crate::key::MeteredFeatureKind;

/// Outcome of [`QuotaStore::try_increment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Increment {
    /// Counter value after the call (unchanged when not admitted).
    pub count: u32,
    /// Whether this call consumed a slot.
    pub admitted: bool,
}

/// Durable counters keyed by `(user, kind, UTC day)`.
///
/// Implementations must be thread-safe (`Send + Sync`) as they are called
/// concurrently from many requests. Counters are never decremented.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Read the counter. A missing counter reads as zero.
    ///
    /// Must not undercount increments that have already been committed.
    async fn current_usage(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        day: Date,
    ) -> Result<u32, EntitleError>;

    /// Atomically increment the counter iff its current value is below `limit`.
    ///
    /// Under any number of concurrent callers on the same key, at most
    /// `limit` calls per day are admitted.
    async fn try_increment(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        day: Date,
        limit: u32,
    ) -> Result<Increment, EntitleError>;
}

/// Blanket implementation for `Arc<Q>` where `Q: QuotaStore`.
#[async_trait]
impl<Q: QuotaStore + ?Sized> QuotaStore for Arc<Q> {
    #[inline]
    async fn current_usage(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        day: Date,
    ) -> Result<u32, EntitleError> {
        (**self).current_usage(user_id, kind, day).await
    }

    #[inline]
    async fn try_increment(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        day: Date,
        limit: u32,
    ) -> Result<Increment, EntitleError> {
        (**self).try_increment(user_id, kind, day, limit).await
    }
}

/// Blanket implementation for `Box<Q>` where `Q: QuotaStore`.
#[async_trait]
impl<Q: QuotaStore + ?Sized> QuotaStore for Box<Q> {
    #[inline]
    async fn current_usage(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        day: Date,
    ) -> Result<u32, EntitleError> {
        (**self).current_usage(user_id, kind, day).await
    }

    #[inline]
    async fn try_increment(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        day: Date,
        limit: u32,
    ) -> Result<Increment, EntitleError> {
        (**self).try_increment(user_id, kind, day, limit).await
    }
}
