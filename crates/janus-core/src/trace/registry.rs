//! Module identity bookkeeping.
//!
//! A healthy build gives one module identifier per source file. The registry
//! files every observed identifier under its normalized basename and keeps
//! the distinct identifiers seen for it, in arrival order. A basename moves
//! from singleton to split the moment a second identifier shows up and never
//! moves back within a build.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Normalized basename of a module identifier: everything from the first `?`
/// or `#` is stripped, then the final path segment is taken. Both separator
/// styles are honored so Windows and POSIX identifiers compare equal.
#[must_use]
pub fn normalize_basename(id: &str) -> String {
    let clean = id.split(['?', '#']).next().unwrap_or(id);
    clean.rsplit(['/', '\\']).next().unwrap_or(clean).to_string()
}

/// Identity state of one basename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState {
    /// Exactly one identifier recorded.
    Singleton,
    /// Two or more distinct identifiers recorded.
    Split,
}

/// What [`IdentityRegistry::record`] observed for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Normalized basename the identifier was filed under.
    pub basename: String,
    /// False when this exact identifier had already been recorded.
    pub newly_recorded: bool,
    /// Every distinct identifier recorded for the basename so far, in
    /// arrival order.
    pub variants: Vec<String>,
}

impl Observation {
    /// State of the basename after this observation.
    #[must_use]
    pub fn state(&self) -> IdentityState {
        if self.variants.len() > 1 {
            IdentityState::Split
        } else {
            IdentityState::Singleton
        }
    }
}

/// Summary entry for one basename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasenameReport {
    pub basename: String,
    /// Distinct identifiers in arrival order. Never empty.
    pub ids: Vec<String>,
}

impl BasenameReport {
    #[must_use]
    pub fn state(&self) -> IdentityState {
        if self.ids.len() > 1 {
            IdentityState::Split
        } else {
            IdentityState::Singleton
        }
    }
}

/// Registry of module identifiers keyed by normalized basename.
///
/// Owned by the tracer that feeds it and alive for exactly one build. The
/// interior mutex keeps each `record` call atomic when the host runs
/// transforms in parallel; a host that serializes hook calls pays only an
/// uncontended lock.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    ids_by_basename: HashMap<String, Vec<String>>,
    /// Basenames in first-seen order, for deterministic summaries.
    order: Vec<String>,
}

impl IdentityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one identifier. Idempotent per exact identifier; recording is
    /// a total operation and never fails.
    pub fn record(&self, id: &str) -> Observation {
        let basename = normalize_basename(id);
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if !inner.ids_by_basename.contains_key(&basename) {
            inner.order.push(basename.clone());
        }

        let ids = inner.ids_by_basename.entry(basename.clone()).or_default();
        let newly_recorded = !ids.iter().any(|seen| seen == id);
        if newly_recorded {
            ids.push(id.to_string());
        }

        Observation {
            variants: ids.clone(),
            basename,
            newly_recorded,
        }
    }

    /// Number of distinct identifiers recorded for `basename`.
    #[must_use]
    pub fn variant_count(&self, basename: &str) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.ids_by_basename.get(basename).map_or(0, Vec::len)
    }

    /// Per-basename reports in first-seen order.
    #[must_use]
    pub fn summary(&self) -> Vec<BasenameReport> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .order
            .iter()
            .map(|basename| BasenameReport {
                basename: basename.clone(),
                ids: inner.ids_by_basename[basename].clone(),
            })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_query_and_fragment() {
        assert_eq!(normalize_basename("/a/b/Comp.ts?raw"), "Comp.ts");
        assert_eq!(normalize_basename(r"\a\b\Comp.ts#hash"), "Comp.ts");
    }

    #[test]
    fn test_normalize_plain_and_mixed_separators() {
        assert_eq!(normalize_basename("Comp.ts"), "Comp.ts");
        assert_eq!(normalize_basename(r"C:\work\libs/ui\index.ts"), "index.ts");
        assert_eq!(normalize_basename("/a/b/c.ts?x=1#frag"), "c.ts");
    }

    #[test]
    fn test_single_id_stays_singleton_over_repeats() {
        let registry = IdentityRegistry::new();

        let first = registry.record("/libs/shared/ui/src/index.ts");
        assert!(first.newly_recorded);
        assert_eq!(first.state(), IdentityState::Singleton);

        for _ in 0..3 {
            let repeat = registry.record("/libs/shared/ui/src/index.ts");
            assert!(!repeat.newly_recorded);
            assert_eq!(repeat.state(), IdentityState::Singleton);
            assert_eq!(repeat.variants.len(), 1);
        }

        let summary = registry.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].state(), IdentityState::Singleton);
        assert_eq!(summary[0].ids, vec!["/libs/shared/ui/src/index.ts"]);
    }

    #[test]
    fn test_two_ids_same_basename_split_either_order() {
        let a = "/libs/shared/ui/src/lib/facet.type.ts";
        let b = "/apps/test-app/node_modules/.vite/deps/facet.type.ts";

        for (first, second) in [(a, b), (b, a)] {
            let registry = IdentityRegistry::new();
            registry.record(first);
            let observation = registry.record(second);

            assert!(observation.newly_recorded);
            assert_eq!(observation.state(), IdentityState::Split);
            assert_eq!(observation.variants, vec![first, second]);

            let summary = registry.summary();
            assert_eq!(summary.len(), 1);
            assert_eq!(summary[0].basename, "facet.type.ts");
            assert_eq!(summary[0].state(), IdentityState::Split);
            assert_eq!(summary[0].ids, vec![first, second]);
        }
    }

    #[test]
    fn test_query_variant_counts_as_distinct_id() {
        // Same file, but the host handed out a query-suffixed id: still two
        // distinct identifiers for one basename.
        let registry = IdentityRegistry::new();
        registry.record("/a/facet.type.ts");
        let observation = registry.record("/a/facet.type.ts?v=2");

        assert_eq!(observation.basename, "facet.type.ts");
        assert_eq!(observation.state(), IdentityState::Split);
    }

    #[test]
    fn test_summary_preserves_first_seen_order() {
        let registry = IdentityRegistry::new();
        registry.record("/x/b.ts");
        registry.record("/x/a.ts");
        registry.record("/y/b.ts");

        let basenames: Vec<_> = registry
            .summary()
            .into_iter()
            .map(|report| report.basename)
            .collect();
        assert_eq!(basenames, vec!["b.ts", "a.ts"]);
    }

    #[test]
    fn test_variant_count_and_is_empty() {
        let registry = IdentityRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.variant_count("a.ts"), 0);

        registry.record("/x/a.ts");
        assert!(!registry.is_empty());
        assert_eq!(registry.variant_count("a.ts"), 1);
    }
}
