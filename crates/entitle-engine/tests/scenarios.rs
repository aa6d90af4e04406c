//! End-to-end authorization scenarios.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::macros::datetime;
use time::{Date, OffsetDateTime};

use entitle_engine::{
    AccessRequest, Decision, DecisionReason, EntitleError, EntitlementEngine, FeatureAccessPolicy,
    GatedFeature, Increment, LimitedFeature, MemoryQuotaStore, MemorySubscriptions,
    MeteredFeatureKind, PlanResolver, PlanTier, QuotaPolicy, QuotaStore, RawSubscriptionStatus,
    SubscriptionSource,
};

const NOON: OffsetDateTime = datetime!(2026-05-01 12:00 UTC);

fn engine() -> EntitlementEngine<MemoryQuotaStore> {
    EntitlementEngine::builtin(MemoryQuotaStore::new())
}

/// Store that always fails.
struct BrokenStore;

#[async_trait]
impl QuotaStore for BrokenStore {
    async fn current_usage(
        &self,
        _user_id: &str,
        _kind: &MeteredFeatureKind,
        _day: Date,
    ) -> Result<u32, EntitleError> {
        Err(EntitleError::backend("connection refused"))
    }

    async fn try_increment(
        &self,
        _user_id: &str,
        _kind: &MeteredFeatureKind,
        _day: Date,
        _limit: u32,
    ) -> Result<Increment, EntitleError> {
        Err(EntitleError::backend("connection refused"))
    }
}

/// Store that never answers in time.
struct StalledStore {
    calls: AtomicU32,
}

#[async_trait]
impl QuotaStore for StalledStore {
    async fn current_usage(
        &self,
        _user_id: &str,
        _kind: &MeteredFeatureKind,
        _day: Date,
    ) -> Result<u32, EntitleError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(0)
    }

    async fn try_increment(
        &self,
        _user_id: &str,
        _kind: &MeteredFeatureKind,
        _day: Date,
        _limit: u32,
    ) -> Result<Increment, EntitleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Increment {
            count: 1,
            admitted: true,
        })
    }
}

/// Subscription source that always fails.
struct BrokenSubscriptions;

#[async_trait]
impl SubscriptionSource for BrokenSubscriptions {
    async fn subscription_status(
        &self,
        _user_id: &str,
    ) -> Result<RawSubscriptionStatus, EntitleError> {
        Err(EntitleError::backend("billing service down"))
    }
}

#[tokio::test]
async fn free_user_denied_pro_feature() {
    let engine = engine();
    let d = engine
        .authorize("u1", PlanTier::Free, &AccessRequest::feature("ai_summaries"))
        .await
        .unwrap();

    assert!(!d.allowed);
    assert_eq!(d.reason, DecisionReason::PlanInsufficient);
    assert_eq!(d.required_plan, Some(PlanTier::Pro));
}

#[tokio::test]
async fn pro_content_generation_twelfth_and_thirteenth_call() {
    let engine = engine();
    let req = AccessRequest::metered("content_generation");

    for _ in 0..11 {
        let d = engine.authorize_at("u1", PlanTier::Pro, &req, NOON).await.unwrap();
        assert!(d.allowed);
    }

    let twelfth = engine.authorize_at("u1", PlanTier::Pro, &req, NOON).await.unwrap();
    assert!(twelfth.allowed);
    assert_eq!(twelfth.reason, DecisionReason::Granted);
    assert_eq!(twelfth.remaining, Some(0));
    assert_eq!(twelfth.limit, Some(12));

    let thirteenth = engine.authorize_at("u1", PlanTier::Pro, &req, NOON).await.unwrap();
    assert!(!thirteenth.allowed);
    assert_eq!(thirteenth.reason, DecisionReason::QuotaExceeded);
    assert_eq!(thirteenth.remaining, Some(0));
    assert_eq!(thirteenth.limit, Some(12));
}

#[tokio::test]
async fn vocabulary_review_reports_pro_limit() {
    let engine = engine();
    let d = engine
        .authorize("u1", PlanTier::Pro, &AccessRequest::limited("vocabulary_review"))
        .await
        .unwrap();
    assert_eq!(d, Decision::granted_with_limit(Some(10)));

    let d = engine
        .authorize("u1", PlanTier::Free, &AccessRequest::limited("vocabulary_review"))
        .await
        .unwrap();
    assert_eq!(d.limit, Some(5));
}

#[tokio::test]
async fn untargeted_trial_is_pro() {
    let engine = engine();
    let trial = RawSubscriptionStatus::parse("trial");

    let d = engine
        .authorize_status("u1", &trial, &AccessRequest::feature("advanced_analytics"))
        .await
        .unwrap();
    assert_eq!(d, Decision::plan_insufficient(Some(PlanTier::Premium)));

    let d = engine
        .authorize_status("u1", &trial, &AccessRequest::feature("pdf_export"))
        .await
        .unwrap();
    assert!(d.allowed);
}

#[tokio::test]
async fn targeted_trial_and_configured_default() {
    let engine = engine().with_resolver(PlanResolver::with_trial_default(PlanTier::Free));
    let req = AccessRequest::feature("advanced_analytics");

    let d = engine
        .authorize_status("u1", &RawSubscriptionStatus::parse("TRIAL:premium"), &req)
        .await
        .unwrap();
    assert!(d.allowed);

    let d = engine
        .authorize_status("u1", &RawSubscriptionStatus::parse("trial"), &AccessRequest::feature("pdf_export"))
        .await
        .unwrap();
    assert!(!d.allowed);
}

#[tokio::test]
async fn unknown_status_matches_free_for_every_feature() {
    let policy = FeatureAccessPolicy::builtin();
    let quotas = QuotaPolicy::builtin();
    let unknown = RawSubscriptionStatus::parse("platinum-enterprise");

    let mut requests: Vec<AccessRequest> = policy
        .gated_features()
        .into_iter()
        .map(|f| AccessRequest::Feature(f.key.clone()))
        .collect();
    requests.extend(
        policy
            .limited_features()
            .into_iter()
            .map(|f| AccessRequest::limited(f.key.as_str())),
    );
    requests.extend(
        quotas
            .entries()
            .into_iter()
            .map(|(kind, _)| AccessRequest::Metered(kind.clone())),
    );

    let as_unknown = engine();
    let as_free = engine();
    for req in &requests {
        let a = as_unknown.authorize_status("u1", &unknown, req).await.unwrap();
        let b = as_free.authorize("u1", PlanTier::Free, req).await.unwrap();
        assert_eq!(a, b, "{req:?}");
    }
}

#[tokio::test]
async fn store_error_denies_with_quota_unavailable() {
    let engine = EntitlementEngine::builtin(BrokenStore);
    let d = engine
        .authorize("u1", PlanTier::Premium, &AccessRequest::metered("ai_summary"))
        .await
        .unwrap();
    assert!(!d.allowed);
    assert_eq!(d.reason, DecisionReason::QuotaUnavailable);
    assert_eq!(d.limit, Some(100));
    assert_eq!(d.remaining, None);

    let peek = engine
        .peek_quota("u1", PlanTier::Premium, &"ai_summary".into())
        .await
        .unwrap();
    assert_eq!(peek.reason, DecisionReason::QuotaUnavailable);
}

#[tokio::test]
async fn store_error_does_not_affect_other_families() {
    let engine = EntitlementEngine::builtin(BrokenStore);
    let d = engine
        .authorize("u1", PlanTier::Pro, &AccessRequest::feature("custom_themes"))
        .await
        .unwrap();
    assert!(d.allowed);
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out() {
    let store = Arc::new(StalledStore {
        calls: AtomicU32::new(0),
    });
    let engine = EntitlementEngine::builtin(store.clone())
        .with_store_timeout(Duration::from_millis(250));

    let d = engine
        .authorize("u1", PlanTier::Pro, &AccessRequest::metered("pdf_report"))
        .await
        .unwrap();
    assert_eq!(d, Decision::quota_unavailable(10));
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);

    let peek = engine
        .peek_quota("u1", PlanTier::Pro, &"pdf_report".into())
        .await
        .unwrap();
    assert_eq!(peek, Decision::quota_unavailable(10));
}

#[tokio::test]
async fn unknown_keys_are_errors_not_decisions() {
    let engine = engine();
    let err = engine
        .authorize("u1", PlanTier::Free, &AccessRequest::feature("time_travel"))
        .await
        .unwrap_err();
    assert!(matches!(err, EntitleError::UnknownFeature(ref k) if k == "time_travel"));

    let err = engine
        .peek_quota("u1", PlanTier::Free, &"time_travel".into())
        .await
        .unwrap_err();
    assert!(matches!(err, EntitleError::UnknownFeature(_)));
}

#[tokio::test]
async fn usage_resets_at_utc_midnight() {
    let engine = engine();
    let req = AccessRequest::metered("pdf_report");
    let late = datetime!(2026-05-01 23:59:59 UTC);
    let early = datetime!(2026-05-02 00:00:01 UTC);

    assert!(engine.authorize_at("u1", PlanTier::Free, &req, late).await.unwrap().allowed);
    assert!(!engine.authorize_at("u1", PlanTier::Free, &req, late).await.unwrap().allowed);

    let next = engine.authorize_at("u1", PlanTier::Free, &req, early).await.unwrap();
    assert_eq!(next, Decision::within_quota(1, 1));
}

#[tokio::test]
async fn authorize_user_looks_up_subscription() {
    let engine = engine();
    let subs = MemorySubscriptions::from_pairs([("alice", "lifetime"), ("bob", "cancelled")]);
    let req = AccessRequest::feature("financial_forecasting");

    assert!(engine.authorize_user(&subs, "alice", &req).await.unwrap().allowed);
    assert!(!engine.authorize_user(&subs, "bob", &req).await.unwrap().allowed);
    assert!(!engine.authorize_user(&subs, "carol", &req).await.unwrap().allowed);
}

#[tokio::test]
async fn failed_subscription_lookup_is_free() {
    let engine = engine();
    assert_eq!(engine.lookup_tier(&BrokenSubscriptions, "u1").await, PlanTier::Free);

    let d = engine
        .authorize_user(&BrokenSubscriptions, "u1", &AccessRequest::feature("dashboard"))
        .await
        .unwrap();
    assert!(d.allowed);
}

#[tokio::test]
async fn custom_policy_tables() {
    let features = FeatureAccessPolicy::builder()
        .gate(GatedFeature::new("export", "Export", PlanTier::Pro))
        .limited(LimitedFeature::new("projects", true, true).limit(PlanTier::Free, 1))
        .build()
        .unwrap();
    let quotas = QuotaPolicy::new([("render", entitle_engine::DailyAllowance::new(0, 2, 5))]).unwrap();
    let engine = EntitlementEngine::new(features, quotas, MemoryQuotaStore::new());

    let d = engine
        .authorize_at("u1", PlanTier::Free, &AccessRequest::metered("render"), NOON)
        .await
        .unwrap();
    assert_eq!(d, Decision::quota_exceeded(0));

    let d = engine
        .authorize("u1", PlanTier::Pro, &AccessRequest::limited("projects"))
        .await
        .unwrap();
    assert_eq!(d, Decision::granted());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_metered_calls_never_over_admit() {
    let engine = Arc::new(engine());
    let mut handles = Vec::new();
    for _ in 0..64 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .authorize_at("u1", PlanTier::Premium, &AccessRequest::metered("content_generation"), NOON)
                .await
                .unwrap()
        }));
    }

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap().allowed {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 50);
}
