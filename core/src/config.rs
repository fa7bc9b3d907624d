//! Caller-facing options for a context-gathering run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default aggregate size budget: 100 MiB.
pub const DEFAULT_SIZE_LIMIT_BYTES: u64 = 100 * 1024 * 1024;

/// Environment override for the size budget, in whole megabytes.
pub const ENV_SIZE_LIMIT_MB: &str = "CTXCAT_MAX_SIZE_MB";

/// Cooperative cancellation handle, checked by the walker at each directory
/// entry. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// Options accepted by [`crate::read_context`]. Front-ends construct this
/// from their own input shapes.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// When non-empty, these rules replace defaults, `.gitignore` and
    /// `.contextfiles` entirely.
    pub override_rules: Vec<String>,
    /// Emit relative paths only, no file content.
    pub list_only: bool,
    /// In list mode, prefix each path with the file size and a tab.
    pub include_sizes: bool,
    /// Aggregate size budget in bytes. `None` falls back to the
    /// `CTXCAT_MAX_SIZE_MB` environment variable, then the 100 MiB default.
    pub size_limit_bytes: Option<u64>,
    /// Log per-path inclusion/exclusion decisions and emit in-stream notes
    /// for skipped unreadable files.
    pub debug_explain: bool,
    /// Optional cooperative cancellation flag.
    pub cancel: Option<CancelFlag>,
}

impl ContextOptions {
    /// Resolve the effective size budget: explicit option, then environment,
    /// then default. An unparsable environment value falls back to the
    /// default with a warning.
    pub fn effective_size_limit(&self) -> u64 {
        if let Some(limit) = self.size_limit_bytes {
            return limit;
        }
        match std::env::var(ENV_SIZE_LIMIT_MB) {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(mb) => mb * 1024 * 1024,
                Err(_) => {
                    log::warn!(
                        "Invalid value for {} ('{}'). Using default limit.",
                        ENV_SIZE_LIMIT_MB,
                        raw
                    );
                    DEFAULT_SIZE_LIMIT_BYTES
                }
            },
            Err(_) => DEFAULT_SIZE_LIMIT_BYTES,
        }
    }

    pub fn overrides_active(&self) -> bool {
        !self.override_rules.is_empty()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}
