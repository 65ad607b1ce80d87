//! Passive tracers for split module identity.
//!
//! Two observers implement the plugin hook contract and never handle
//! anything themselves:
//!
//! - [`ResolveTracer`] logs resolution and load attempts for interesting
//!   specifiers, so the path a module takes through the resolver is visible.
//! - [`IdentityTracer`] files every interesting transformed identifier in an
//!   [`IdentityRegistry`] and raises an alert the moment one basename shows
//!   up under a second identifier. Its build-end summary is the primary
//!   artifact of the tool.
//!
//! Both run `Post` so the host's own resolution has already had its say.

mod registry;

pub use registry::{
    normalize_basename, BasenameReport, IdentityRegistry, IdentityState, Observation,
};

use crate::plugin::{
    HookResult, LoadResult, Plugin, PluginContext, PluginEnforce, ResolveIdResult, TransformResult,
};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Case-sensitive substring filter deciding which identifiers are worth
/// tracing.
#[derive(Debug, Clone, Default)]
pub struct InterestFilter {
    markers: Vec<String>,
}

impl InterestFilter {
    #[must_use]
    pub fn new(markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    /// True when `candidate` contains any configured marker.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.markers.iter().any(|marker| candidate.contains(marker))
    }
}

/// Where tracer lines go: process stdout in production, an in-memory buffer
/// in tests. Writing is fire-and-forget; a failed write never fails a hook.
#[derive(Debug, Clone)]
pub struct TraceSink {
    buffer: Option<Arc<Mutex<Vec<u8>>>>,
}

impl TraceSink {
    /// Sink that writes to process stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self { buffer: None }
    }

    /// Sink that accumulates lines in memory.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            buffer: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Everything written so far. `None` for the stdout sink.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.buffer.as_ref().map(|buffer| {
            let bytes = buffer.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&bytes).into_owned()
        })
    }

    fn line(&self, text: &str) {
        match &self.buffer {
            Some(buffer) => {
                let mut bytes = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                let _ = writeln!(bytes, "{text}");
            }
            None => println!("{text}"),
        }
    }
}

impl Default for TraceSink {
    fn default() -> Self {
        Self::stdout()
    }
}

/// Logs resolution and load attempts for interesting modules.
///
/// Every hook defers, so registering the tracer never changes what the host
/// resolves or loads. An absent importer is logged as `(none)`.
pub struct ResolveTracer {
    filter: InterestFilter,
    sink: TraceSink,
}

impl ResolveTracer {
    #[must_use]
    pub fn new(filter: InterestFilter) -> Self {
        Self::with_sink(filter, TraceSink::stdout())
    }

    #[must_use]
    pub fn with_sink(filter: InterestFilter, sink: TraceSink) -> Self {
        Self { filter, sink }
    }
}

impl Plugin for ResolveTracer {
    fn name(&self) -> &str {
        "resolve-tracer"
    }

    fn enforce(&self) -> PluginEnforce {
        PluginEnforce::Post
    }

    fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&str>,
        _ctx: &PluginContext,
    ) -> HookResult<Option<ResolveIdResult>> {
        if self.filter.matches(specifier) {
            self.sink.line(&format!(
                "[trace resolve] specifier=\"{specifier}\" importer=\"{}\"",
                importer.unwrap_or("(none)")
            ));
        }
        Ok(None)
    }

    fn load(&self, id: &str, _ctx: &PluginContext) -> HookResult<Option<LoadResult>> {
        if self.filter.matches(id) {
            self.sink.line(&format!("[trace load] id=\"{id}\""));
        }
        Ok(None)
    }
}

/// Files every interesting transformed identifier and reports split
/// identities.
///
/// Observations are tagged `NEW` or `cached`; the moment a basename is seen
/// under a second identifier an alert enumerating every identifier is
/// emitted. `build_end` prints the OK/SPLIT summary for the whole build.
pub struct IdentityTracer {
    filter: InterestFilter,
    registry: Arc<IdentityRegistry>,
    sink: TraceSink,
}

impl IdentityTracer {
    #[must_use]
    pub fn new(filter: InterestFilter) -> Self {
        Self::with_sink(filter, TraceSink::stdout())
    }

    #[must_use]
    pub fn with_sink(filter: InterestFilter, sink: TraceSink) -> Self {
        Self {
            filter,
            registry: Arc::new(IdentityRegistry::new()),
            sink,
        }
    }

    /// Handle to the registry, usable after a container has taken ownership
    /// of the tracer.
    #[must_use]
    pub fn registry(&self) -> Arc<IdentityRegistry> {
        Arc::clone(&self.registry)
    }
}

impl Plugin for IdentityTracer {
    fn name(&self) -> &str {
        "identity-tracer"
    }

    fn enforce(&self) -> PluginEnforce {
        PluginEnforce::Post
    }

    fn build_start(&self, ctx: &PluginContext) -> HookResult<()> {
        self.sink
            .line(&format!("[identity] build start (cwd: {})", ctx.cwd.display()));
        Ok(())
    }

    fn transform(
        &self,
        _code: &str,
        id: &str,
        _ctx: &PluginContext,
    ) -> HookResult<Option<TransformResult>> {
        if !self.filter.matches(id) {
            return Ok(None);
        }

        let observation = self.registry.record(id);
        let tag = if observation.newly_recorded {
            "NEW"
        } else {
            "cached"
        };
        self.sink.line(&format!(
            "[identity transform] id=\"{id}\" ({tag}, {} variant(s) for \"{}\")",
            observation.variants.len(),
            observation.basename
        ));

        if observation.state() == IdentityState::Split {
            self.sink.line(&format!(
                "[identity] *** SPLIT IDENTITY DETECTED *** \"{}\" has {} ids:",
                observation.basename,
                observation.variants.len()
            ));
            for variant in &observation.variants {
                self.sink.line(&format!("  -> \"{variant}\""));
            }
        }

        Ok(None)
    }

    fn build_end(&self, _ctx: &PluginContext) -> HookResult<()> {
        self.sink.line("");
        self.sink.line("[identity summary]");
        for report in self.registry.summary() {
            match report.state() {
                IdentityState::Split => {
                    self.sink.line(&format!(
                        "  SPLIT: \"{}\" has {} different ids:",
                        report.basename,
                        report.ids.len()
                    ));
                    for id in &report.ids {
                        self.sink.line(&format!("    -> \"{id}\""));
                    }
                }
                IdentityState::Singleton => {
                    self.sink.line(&format!(
                        "  OK: \"{}\" has 1 id: \"{}\"",
                        report.basename, report.ids[0]
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginContainer;
    use std::path::PathBuf;

    fn ctx() -> PluginContext {
        PluginContext::new(PathBuf::from("/work"))
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let filter = InterestFilter::new(["facet"]);
        assert!(filter.matches("/libs/facet.type.ts"));
        assert!(!filter.matches("/libs/FACET.type.ts"));
        assert!(!filter.matches("/libs/other.ts"));
    }

    #[test]
    fn test_irrelevant_id_never_recorded_nor_logged() {
        let sink = TraceSink::memory();
        let tracer = IdentityTracer::with_sink(InterestFilter::new(["facet"]), sink.clone());
        let registry = tracer.registry();

        let result = tracer.transform("", "/libs/unrelated/thing.ts", &ctx()).unwrap();
        assert!(result.is_none());
        assert!(registry.is_empty());
        assert_eq!(sink.contents().unwrap(), "");
    }

    #[test]
    fn test_split_identity_scenario() {
        let sink = TraceSink::memory();
        let tracer = IdentityTracer::with_sink(InterestFilter::new(["facet"]), sink.clone());
        let registry = tracer.registry();

        let first = "/libs/shared/ui/src/lib/facet.type.ts";
        let second = "/apps/test-app/node_modules/.vite/deps/facet.type.ts";

        assert!(tracer.transform("", first, &ctx()).unwrap().is_none());
        assert!(tracer.transform("", second, &ctx()).unwrap().is_none());
        tracer.build_end(&ctx()).unwrap();

        let summary = registry.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].basename, "facet.type.ts");
        assert_eq!(summary[0].state(), IdentityState::Split);
        assert_eq!(summary[0].ids, vec![first, second]);

        let output = sink.contents().unwrap();
        assert!(output.contains("SPLIT IDENTITY DETECTED"));
        assert!(output.contains(&format!("-> \"{first}\"")));
        assert!(output.contains(&format!("-> \"{second}\"")));
        assert!(output.contains("SPLIT: \"facet.type.ts\" has 2 different ids:"));
    }

    #[test]
    fn test_repeated_id_tagged_cached_and_summary_ok() {
        let sink = TraceSink::memory();
        let tracer = IdentityTracer::with_sink(InterestFilter::new(["index"]), sink.clone());
        let registry = tracer.registry();

        let id = "/libs/shared/ui/src/index.ts";
        tracer.transform("", id, &ctx()).unwrap();
        tracer.transform("", id, &ctx()).unwrap();
        tracer.build_end(&ctx()).unwrap();

        let summary = registry.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].state(), IdentityState::Singleton);

        let output = sink.contents().unwrap();
        assert!(output.contains("(NEW, 1 variant(s) for \"index.ts\")"));
        assert!(output.contains("(cached, 1 variant(s) for \"index.ts\")"));
        assert!(output.contains(&format!("OK: \"index.ts\" has 1 id: \"{id}\"")));
        assert!(!output.contains("SPLIT"));
    }

    #[test]
    fn test_resolve_tracer_logs_and_defers() {
        let sink = TraceSink::memory();
        let tracer = ResolveTracer::with_sink(InterestFilter::new(["shared-ui"]), sink.clone());

        let result = tracer
            .resolve_id("@myorg/shared-ui", Some("/apps/test-app/src/app.spec.ts"), &ctx())
            .unwrap();
        assert!(result.is_none());

        let result = tracer.resolve_id("@myorg/shared-ui", None, &ctx()).unwrap();
        assert!(result.is_none());

        // Irrelevant specifiers produce no output at all.
        tracer.resolve_id("lodash", Some("/x.ts"), &ctx()).unwrap();

        let output = sink.contents().unwrap();
        assert!(output.contains(
            "[trace resolve] specifier=\"@myorg/shared-ui\" importer=\"/apps/test-app/src/app.spec.ts\""
        ));
        assert!(output.contains("[trace resolve] specifier=\"@myorg/shared-ui\" importer=\"(none)\""));
        assert!(!output.contains("lodash"));
    }

    #[test]
    fn test_load_tracer_logs_and_defers() {
        let sink = TraceSink::memory();
        let tracer = ResolveTracer::with_sink(InterestFilter::new(["facet"]), sink.clone());

        assert!(tracer.load("/libs/facet.type.ts", &ctx()).unwrap().is_none());
        assert!(tracer.load("/libs/other.ts", &ctx()).unwrap().is_none());

        let output = sink.contents().unwrap();
        assert!(output.contains("[trace load] id=\"/libs/facet.type.ts\""));
        assert!(!output.contains("other.ts"));
    }

    #[test]
    fn test_tracers_never_alter_transform_output() {
        let mut container = PluginContainer::new(PathBuf::from("/work"));
        container.add(Box::new(ResolveTracer::with_sink(
            InterestFilter::new(["facet"]),
            TraceSink::memory(),
        )));
        container.add(Box::new(IdentityTracer::with_sink(
            InterestFilter::new(["facet"]),
            TraceSink::memory(),
        )));

        let code = "export enum FacetType { A, B }";
        let result = container.transform(code, "/libs/facet.type.ts").unwrap();
        assert_eq!(result, code);
    }
}
