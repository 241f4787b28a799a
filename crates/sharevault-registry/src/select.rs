//! Availability-based registry selection.
//!
//! The ledger is preferred. If it does not answer a health probe when the
//! service is built, the local fallback is used for the lifetime of that
//! service. There is no switching back and forth mid-session.

use std::fmt;
use std::sync::Arc;

use crate::traits::Registry;

/// Which registry a selection settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrySource {
    Ledger,
    Fallback,
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrySource::Ledger => f.write_str("ledger"),
            RegistrySource::Fallback => f.write_str("fallback"),
        }
    }
}

/// Outcome of [`select_registry`].
#[derive(Clone)]
pub struct SelectedRegistry {
    pub registry: Arc<dyn Registry>,
    pub source: RegistrySource,
}

/// Probe `ledger` once and pick it if healthy, `fallback` otherwise.
pub async fn select_registry(
    ledger: Arc<dyn Registry>,
    fallback: Arc<dyn Registry>,
) -> SelectedRegistry {
    match ledger.ping().await {
        Ok(()) => {
            tracing::info!(caller = %ledger.caller(), "using ledger registry");
            SelectedRegistry {
                registry: ledger,
                source: RegistrySource::Ledger,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "ledger unavailable, using local fallback registry");
            SelectedRegistry {
                registry: fallback,
                source: RegistrySource::Fallback,
            }
        }
    }
}
