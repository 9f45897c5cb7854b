//! Manual override / blacklist providers (§4.12).
//!
//! These traits are the engine's only window onto an external,
//! out-of-scope persistence layer. There is no setter and no cache
//! invalidation here — a provider that fails to load is logged and skipped
//! by the caller (the engine proceeds as if no overrides existed), never
//! retried mid-run.

use std::collections::HashMap;

use crate::model::DispositionKind;

/// Supplies manual disposition overrides, keyed by canonical `account_id`.
pub trait ManualOverrideProvider {
    /// Load the current override map. Implementations should return an
    /// empty map rather than erroring when no overrides exist; a genuine
    /// load failure should be logged by the caller and treated the same as
    /// an empty map (§4.12).
    fn load_overrides(&self) -> HashMap<String, DispositionKind>;
}

/// Supplies additional manual blacklist terms, layered on top of the
/// built-in terms in [`crate::disposition`].
pub trait ManualBlacklistProvider {
    fn load_blacklist(&self) -> Vec<String>;
}

/// A provider with nothing to contribute — the default when no external
/// persistence layer is wired in.
pub struct NoopProvider;

impl ManualOverrideProvider for NoopProvider {
    fn load_overrides(&self) -> HashMap<String, DispositionKind> {
        HashMap::new()
    }
}

impl ManualBlacklistProvider for NoopProvider {
    fn load_blacklist(&self) -> Vec<String> {
        Vec::new()
    }
}
