//! # Principal
//!
//! The caller identity attached to a subscription. The engine makes no access
//! decisions of its own; the principal only narrows what cached data a replay
//! may return.

use std::collections::HashSet;

/// Which contexts a principal may read from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextScope {
    /// Every context.
    All,
    /// Only the listed context ids.
    Contexts(HashSet<String>),
}

/// Identity of whoever issued a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub scope: ContextScope,
}

impl Principal {
    /// A principal that may read every context.
    pub fn unrestricted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: ContextScope::All,
        }
    }

    /// A principal limited to the given contexts.
    pub fn with_contexts<I, S>(id: impl Into<String>, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            scope: ContextScope::Contexts(contexts.into_iter().map(Into::into).collect()),
        }
    }

    /// An unauthenticated caller; sees only the installation's own entity.
    pub fn anonymous(self_context: impl Into<String>) -> Self {
        Self::with_contexts("anonymous", [self_context.into()])
    }

    /// Whether cached data of `context` is visible to this principal.
    #[must_use]
    pub fn can_read(&self, context: &str) -> bool {
        match &self.scope {
            ContextScope::All => true,
            ContextScope::Contexts(allowed) => allowed.contains(context),
        }
    }
}
