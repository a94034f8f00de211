//! Backend selection policy.
//!
//! Backends are scanned in priority order. The first available backend that
//! already holds a secret for the id wins; otherwise the first available
//! backend is used. Once a secret exists somewhere, that backend stays
//! selected for the id even if a higher-priority backend becomes available
//! later.

use tracing::debug;

use crate::error::Result;
use crate::store::SecretStore;

/// Outcome of [`select_store`], carrying an index into the scanned list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// An available backend that already holds a secret for the id.
    Preferred(usize),
    /// The first available backend; none holds a secret for the id.
    Fallback(usize),
    /// No backend is available.
    None,
}

impl Selection {
    /// Index of the selected backend, if any.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Preferred(i) | Self::Fallback(i) => Some(i),
            Self::None => None,
        }
    }
}

/// Pick the backend to use for `id` from `stores`, highest priority first.
///
/// Stops scanning at the first available backend holding a secret.
/// Availability and lookup failures are returned as-is.
pub fn select_store<S: SecretStore>(stores: &[S], id: &str) -> Result<Selection> {
    let mut fallback = None;
    for (index, store) in stores.iter().enumerate() {
        if !store.is_available()? {
            debug!(store = store.name(), "secret store unavailable");
            continue;
        }
        if store.has_secret(id)? {
            debug!(store = store.name(), id, "found existing secret");
            return Ok(Selection::Preferred(index));
        }
        fallback.get_or_insert(index);
    }

    Ok(match fallback {
        Some(index) => Selection::Fallback(index),
        None => Selection::None,
    })
}
