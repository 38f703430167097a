//! Entity trait: identity + continuity across state changes.

use chrono::{DateTime, Utc};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Last modification instant.
    ///
    /// Bumped whenever the entity itself changes, and whenever one of its
    /// owned associations changes (downstream caches key off this).
    fn updated_at(&self) -> DateTime<Utc>;
}
