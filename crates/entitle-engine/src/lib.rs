//! Entitlement and quota authorization.
//!
//! Decides whether a user on a given plan tier may use a feature, and
//! whether a metered action still fits in today's allowance.
//!
//! # Example
//!
//! ```
//! use entitle_engine::{AccessRequest, EntitlementEngine, MemoryQuotaStore, PlanTier};
//!
//! # async fn example() -> Result<(), entitle_engine::EntitleError> {
//! let engine = EntitlementEngine::builtin(MemoryQuotaStore::new());
//!
//! // Binary plan gate
//! let decision = engine
//!     .authorize("user-1", PlanTier::Free, &AccessRequest::feature("pdf_export"))
//!     .await?;
//! assert!(!decision.allowed);
//! assert_eq!(decision.required_plan, Some(PlanTier::Pro));
//!
//! // Check-and-consume one slot of today's allowance
//! let decision = engine
//!     .authorize("user-1", PlanTier::Pro, &AccessRequest::metered("content_generation"))
//!     .await?;
//! assert_eq!(decision.remaining, Some(11));
//! # Ok(())
//! # }
//! ```

mod decision;
mod engine;
mod error;
mod key;
mod plan;
mod policy;
mod quota;
mod request;
mod store;
mod subscription;

#[cfg(feature = "sql")]
pub mod sql;

#[cfg(feature = "cli")]
pub mod cli;

pub use decision::{Decision, DecisionReason, remaining};
pub use engine::EntitlementEngine;
pub use error::EntitleError;
pub use key::{FeatureKey, LimitedFeatureKey, MeteredFeatureKind};
pub use plan::{PlanResolver, PlanTier, RawSubscriptionStatus};
pub use policy::{FeatureAccessPolicy, FeatureAccessPolicyBuilder, GatedFeature, LimitedFeature};
pub use quota::{DailyAllowance, QuotaPolicy};
pub use request::AccessRequest;
pub use store::{Increment, MemoryQuotaStore, QuotaStore, utc_day};
pub use subscription::{MemorySubscriptions, SubscriptionSource};

#[cfg(feature = "cli")]
pub use cli::UsageArgs;
