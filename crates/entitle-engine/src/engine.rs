//! The authorization decision engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use time::OffsetDateTime;
use tracing::{debug, warn};

use entitle_core::{DEFAULT_STORE_TIMEOUT_MS, ERROR_TIMEOUT};

use crate::decision::Decision;
use crate::error::EntitleError;
use crate::key::{FeatureKey, LimitedFeatureKey, MeteredFeatureKind};
use crate::plan::{PlanResolver, PlanTier, RawSubscriptionStatus};
use crate::policy::FeatureAccessPolicy;
use crate::quota::QuotaPolicy;
use crate::request::AccessRequest;
use crate::store::{QuotaStore, utc_day};
use crate::subscription::SubscriptionSource;

/// Stateless authorization engine over two policy tables and a quota store.
///
/// Cloning is cheap when the store is cheap to clone (e.g. `Arc<S>`). The
/// engine holds no locks of its own; the only shared mutable state lives in
/// the [`QuotaStore`].
#[derive(Debug, Clone)]
pub struct EntitlementEngine<S> {
    features: Arc<FeatureAccessPolicy>,
    quotas: Arc<QuotaPolicy>,
    store: S,
    resolver: PlanResolver,
    store_timeout: Duration,
}

impl<S: QuotaStore> EntitlementEngine<S> {
    /// Create an engine with the default resolver and store timeout.
    pub fn new(features: FeatureAccessPolicy, quotas: QuotaPolicy, store: S) -> Self {
        Self {
            features: Arc::new(features),
            quotas: Arc::new(quotas),
            store,
            resolver: PlanResolver::default(),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }

    /// Engine over the compiled-in registries.
    pub fn builtin(store: S) -> Self {
        Self::new(FeatureAccessPolicy::builtin(), QuotaPolicy::builtin(), store)
    }

    /// Replace the plan resolver.
    pub fn with_resolver(mut self, resolver: PlanResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Bound on a single quota store round trip.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    #[inline]
    pub fn features(&self) -> &FeatureAccessPolicy {
        &self.features
    }

    #[inline]
    pub fn quotas(&self) -> &QuotaPolicy {
        &self.quotas
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn resolver(&self) -> &PlanResolver {
        &self.resolver
    }

    #[inline]
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Authorize a request for a user already resolved to `tier`.
    ///
    /// Returns `Err` only for [`EntitleError::UnknownFeature`]. Store
    /// failures come back as a denied [`Decision`].
    pub async fn authorize(
        &self,
        user_id: &str,
        tier: PlanTier,
        request: &AccessRequest,
    ) -> Result<Decision, EntitleError> {
        self.authorize_at(user_id, tier, request, OffsetDateTime::now_utc())
            .await
    }

    /// Same as [`authorize`](Self::authorize), with metered counters scoped
    /// to the UTC day of `now`.
    pub async fn authorize_at(
        &self,
        user_id: &str,
        tier: PlanTier,
        request: &AccessRequest,
        now: OffsetDateTime,
    ) -> Result<Decision, EntitleError> {
        let decision = match request {
            AccessRequest::Feature(key) => self.check_feature(tier, key)?,
            AccessRequest::Limited { key, report_limit } => {
                self.check_limited(tier, key, *report_limit)?
            }
            AccessRequest::Metered(kind) => self.consume(user_id, tier, kind, now).await?,
        };
        self.record(user_id, tier, request.family(), &decision);
        Ok(decision)
    }

    /// Authorize using a raw subscription status. Unrecognized statuses are
    /// treated as `Free`.
    pub async fn authorize_status(
        &self,
        user_id: &str,
        status: &RawSubscriptionStatus,
        request: &AccessRequest,
    ) -> Result<Decision, EntitleError> {
        let tier = self.resolver.resolve_or_free(status);
        self.authorize(user_id, tier, request).await
    }

    /// Look up the user's status in `source`, then authorize.
    ///
    /// A failed or slow lookup resolves the user to `Free`.
    pub async fn authorize_user<Src>(
        &self,
        source: &Src,
        user_id: &str,
        request: &AccessRequest,
    ) -> Result<Decision, EntitleError>
    where
        Src: SubscriptionSource + ?Sized,
    {
        let tier = self.lookup_tier(source, user_id).await;
        self.authorize(user_id, tier, request).await
    }

    /// Resolve a user's tier through `source`, failing closed to `Free`.
    pub async fn lookup_tier<Src>(&self, source: &Src, user_id: &str) -> PlanTier
    where
        Src: SubscriptionSource + ?Sized,
    {
        match tokio::time::timeout(self.store_timeout, source.subscription_status(user_id)).await
        {
            Ok(Ok(status)) => self.resolver.resolve_or_free(&status),
            Ok(Err(e)) => {
                warn!(user_id, error = %e, "subscription lookup failed, treating user as free");
                entitle_metrics::record_plan_fallback();
                PlanTier::Free
            }
            Err(_) => {
                warn!(
                    user_id,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "subscription lookup timed out, treating user as free"
                );
                entitle_metrics::record_plan_fallback();
                PlanTier::Free
            }
        }
    }

    /// Report today's usage of a metered kind without consuming a slot.
    pub async fn peek_quota(
        &self,
        user_id: &str,
        tier: PlanTier,
        kind: &MeteredFeatureKind,
    ) -> Result<Decision, EntitleError> {
        self.peek_quota_at(user_id, tier, kind, OffsetDateTime::now_utc())
            .await
    }

    /// Same as [`peek_quota`](Self::peek_quota) for the UTC day of `now`.
    pub async fn peek_quota_at(
        &self,
        user_id: &str,
        tier: PlanTier,
        kind: &MeteredFeatureKind,
        now: OffsetDateTime,
    ) -> Result<Decision, EntitleError> {
        let limit = self.quotas.daily_limit(tier, kind)?;
        let day = utc_day(now);

        let started = Instant::now();
        let result =
            tokio::time::timeout(self.store_timeout, self.store.current_usage(user_id, kind, day))
                .await;
        entitle_metrics::record_store_latency(started.elapsed().as_secs_f64());

        let decision = match result {
            Ok(Ok(used)) if used < limit => Decision::within_quota(used, limit),
            Ok(Ok(_)) => Decision::quota_exceeded(limit),
            Ok(Err(e)) => self.store_failed(user_id, kind, &e, limit),
            Err(_) => self.store_timed_out(user_id, kind, limit),
        };
        self.record(user_id, tier, entitle_metrics::FAMILY_PEEK, &decision);
        Ok(decision)
    }

    fn check_feature(&self, tier: PlanTier, key: &FeatureKey) -> Result<Decision, EntitleError> {
        let required = self.features.required_tier(key)?;
        if tier.satisfies(required) {
            Ok(Decision::granted())
        } else {
            Ok(Decision::plan_insufficient(Some(required)))
        }
    }

    fn check_limited(
        &self,
        tier: PlanTier,
        key: &LimitedFeatureKey,
        report_limit: bool,
    ) -> Result<Decision, EntitleError> {
        let entry = self.features.limited_entry(key)?;
        if !entry.allows(tier) {
            let lowest = PlanTier::ALL.into_iter().find(|t| entry.allows(*t));
            return Ok(Decision::plan_insufficient(lowest));
        }
        if report_limit {
            Ok(Decision::granted_with_limit(
                entry.limits.get(&tier).copied(),
            ))
        } else {
            Ok(Decision::granted())
        }
    }

    async fn consume(
        &self,
        user_id: &str,
        tier: PlanTier,
        kind: &MeteredFeatureKind,
        now: OffsetDateTime,
    ) -> Result<Decision, EntitleError> {
        let limit = self.quotas.daily_limit(tier, kind)?;
        let day = utc_day(now);

        let started = Instant::now();
        let result = tokio::time::timeout(
            self.store_timeout,
            self.store.try_increment(user_id, kind, day, limit),
        )
        .await;
        entitle_metrics::record_store_latency(started.elapsed().as_secs_f64());

        Ok(match result {
            Ok(Ok(inc)) if inc.admitted => Decision::within_quota(inc.count, limit),
            Ok(Ok(_)) => Decision::quota_exceeded(limit),
            Ok(Err(e)) => self.store_failed(user_id, kind, &e, limit),
            Err(_) => self.store_timed_out(user_id, kind, limit),
        })
    }

    fn store_failed(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        err: &EntitleError,
        limit: u32,
    ) -> Decision {
        warn!(user_id, kind = %kind, error = %err, "quota store error, denying");
        entitle_metrics::record_store_error(err.kind());
        Decision::quota_unavailable(limit)
    }

    fn store_timed_out(&self, user_id: &str, kind: &MeteredFeatureKind, limit: u32) -> Decision {
        warn!(
            user_id,
            kind = %kind,
            timeout_ms = self.store_timeout.as_millis() as u64,
            "quota store timed out, denying"
        );
        entitle_metrics::record_store_error(ERROR_TIMEOUT);
        Decision::quota_unavailable(limit)
    }

    fn record(&self, user_id: &str, tier: PlanTier, family: &'static str, decision: &Decision) {
        debug!(
            user_id,
            tier = %tier,
            family,
            allowed = decision.allowed,
            reason = %decision.reason,
            remaining = ?decision.remaining,
            limit = ?decision.limit,
            "authorization decision"
        );
        entitle_metrics::record_decision(family, decision.reason.as_str());
    }
}
