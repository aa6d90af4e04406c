//! Subscription status sources.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::EntitleError;
use crate::plan::RawSubscriptionStatus;

/// Looks up the raw subscription status of a user.
///
/// The engine treats any error from a source as "no paid plan" and resolves
/// the user to `Free`.
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    async fn subscription_status(&self, user_id: &str)
    -> Result<RawSubscriptionStatus, EntitleError>;
}

#[async_trait]
impl<S: SubscriptionSource + ?Sized> SubscriptionSource for Arc<S> {
    #[inline]
    async fn subscription_status(
        &self,
        user_id: &str,
    ) -> Result<RawSubscriptionStatus, EntitleError> {
        (**self).subscription_status(user_id).await
    }
}

/// In-memory subscription table, mostly for tests and the CLI.
///
/// Users without an entry report [`RawSubscriptionStatus::Free`].
#[derive(Debug, Default)]
pub struct MemorySubscriptions {
    statuses: RwLock<HashMap<String, RawSubscriptionStatus>>,
}

impl MemorySubscriptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(user_id, status)` pairs.
    pub fn from_pairs<I, U, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, S)>,
        U: Into<String>,
        S: Into<RawSubscriptionStatus>,
    {
        let statuses = pairs
            .into_iter()
            .map(|(u, s)| (u.into(), s.into()))
            .collect();
        Self {
            statuses: RwLock::new(statuses),
        }
    }

    /// Set or replace a user's status.
    pub fn set(&self, user_id: impl Into<String>, status: impl Into<RawSubscriptionStatus>) {
        self.statuses.write().insert(user_id.into(), status.into());
    }

    /// Remove a user's status. Returns the previous one.
    pub fn remove(&self, user_id: &str) -> Option<RawSubscriptionStatus> {
        self.statuses.write().remove(user_id)
    }
}

#[async_trait]
impl SubscriptionSource for MemorySubscriptions {
    async fn subscription_status(
        &self,
        user_id: &str,
    ) -> Result<RawSubscriptionStatus, EntitleError> {
        Ok(self
            .statuses
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or(RawSubscriptionStatus::Free))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanTier;

    #[tokio::test]
    async fn test_missing_user_is_free() {
        let subs = MemorySubscriptions::new();
        assert_eq!(
            subs.subscription_status("nobody").await.unwrap(),
            RawSubscriptionStatus::Free
        );
    }

    #[tokio::test]
    async fn test_set_and_remove() {
        let subs = MemorySubscriptions::from_pairs([("alice", "premium")]);
        assert_eq!(
            subs.subscription_status("alice").await.unwrap(),
            RawSubscriptionStatus::Premium
        );

        subs.set("bob", PlanTier::Pro);
        assert_eq!(
            subs.subscription_status("bob").await.unwrap(),
            RawSubscriptionStatus::Pro
        );

        assert_eq!(subs.remove("alice"), Some(RawSubscriptionStatus::Premium));
        assert_eq!(
            subs.subscription_status("alice").await.unwrap(),
            RawSubscriptionStatus::Free
        );
    }
}
