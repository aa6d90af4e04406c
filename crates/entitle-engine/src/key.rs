//! Registry identifiers.
//!
//! Each registry has its own key type so a gated feature, a limited feature
//! and a metered kind can never be confused at a call site.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a key from any string-like value.
            #[inline]
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// The key as a string slice.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_string())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

string_key!(
    /// Identifier of a binary plan-gated feature.
    FeatureKey
);

string_key!(
    /// Identifier of a feature with free/paid availability and optional limits.
    LimitedFeatureKey
);

string_key!(
    /// Identifier of an action metered by a daily counter.
    MeteredFeatureKind
);
