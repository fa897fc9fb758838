//! Context filters
//!
//! Compiles a subscription's context specifier into a predicate over records.
//! The predicate is built once per subscription and shared by every row and
//! every key stream the subscription attaches to.

use std::sync::Arc;

use shared_bus::Predicate;
use shared_types::{ConfigWarning, ContextSpecifier, NormalizedRecord, RadiusSpecifier};
use tracing::warn;

use crate::domain::geodesy::within_radius;
use crate::domain::path_matcher::PathMatcher;
use crate::ports::{EntitySnapshot, WarnSink};

/// Predicate over records, shared across attachments.
pub type ContextPredicate = Predicate<NormalizedRecord>;

/// Specifiers that refer to this installation's own entity.
pub const SELF_ALIASES: [&str; 2] = ["self", "vessels.self"];

/// Builds context predicates.
pub struct ContextMatcher;

impl ContextMatcher {
    /// Compile `specifier` into a predicate.
    ///
    /// - absent: every record matches
    /// - pattern: wildcard match on the context, or the self context when the
    ///   pattern is a self alias
    /// - radius: entity position within the radius; an incomplete radius is
    ///   reported through `on_warn` and matches nothing
    pub fn compile(
        self_context: &str,
        specifier: Option<&ContextSpecifier>,
        snapshot: Arc<dyn EntitySnapshot>,
        on_warn: &WarnSink,
    ) -> ContextPredicate {
        match specifier {
            None => Arc::new(|_: &NormalizedRecord| true),
            Some(ContextSpecifier::Pattern(pattern)) => Self::pattern(self_context, pattern),
            Some(ContextSpecifier::Radius(radius)) => Self::radius(radius, snapshot, on_warn),
        }
    }

    fn pattern(self_context: &str, pattern: &str) -> ContextPredicate {
        let matcher = PathMatcher::compile(pattern);
        let self_alias = SELF_ALIASES.contains(&pattern);
        let self_context = self_context.to_string();

        Arc::new(move |record: &NormalizedRecord| {
            matcher.matches(&record.context) || (self_alias && record.context == self_context)
        })
    }

    fn radius(
        radius: &RadiusSpecifier,
        snapshot: Arc<dyn EntitySnapshot>,
        on_warn: &WarnSink,
    ) -> ContextPredicate {
        let Some((radius_m, center)) = radius.resolve() else {
            let warning = ConfigWarning::IncompleteRadius;
            warn!(warning = %warning, "Radius context rejected");
            on_warn(&warning);
            return Arc::new(|_: &NormalizedRecord| false);
        };

        Arc::new(move |record: &NormalizedRecord| {
            snapshot
                .position_of(&record.context)
                .is_some_and(|position| within_radius(center, position, radius_m))
        })
    }
}
