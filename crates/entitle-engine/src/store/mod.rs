//! Daily usage counter storage.
//!
//! This module provides:
//!
//! - [`QuotaStore`]: the two-operation contract the engine depends on
//! - [`Increment`]: outcome of an atomic compare-and-increment
//! - [`MemoryQuotaStore`]: in-process reference implementation
//! - [`utc_day`]: the calendar day a counter belongs to
//!
//! # Adding a new backend
//!
//! ```ignore
//! use entitle_engine::{EntitleError, Increment, MeteredFeatureKind, QuotaStore};
//! use time::Date;
//!
//! struct MyStore { /* ... */ }
//!
//! #[async_trait::async_trait]
//! impl QuotaStore for MyStore {
//!     async fn current_usage(&self, user_id: &str, kind: &MeteredFeatureKind, day: Date)
//!         -> Result<u32, EntitleError> { todo!() }
//!     async fn try_increment(&self, user_id: &str, kind: &MeteredFeatureKind, day: Date, limit: u32)
//!         -> Result<Increment, EntitleError> { todo!() }
//! }
//! ```

mod memory;
mod traits;

pub use memory::MemoryQuotaStore;
pub use traits::{Increment, QuotaStore};

use time::{Date, OffsetDateTime, UtcOffset};

/// UTC calendar date of `now`. Counters reset when this value changes.
#[inline]
pub fn utc_day(now: OffsetDateTime) -> Date {
    now.to_offset(UtcOffset::UTC).date()
}
