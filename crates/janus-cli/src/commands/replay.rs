use janus_core::config::TraceConfig;
use janus_core::plugin::PluginContainer;
use janus_core::replay::{parse_script, run_events};
use janus_core::trace::{IdentityState, IdentityTracer, InterestFilter, ResolveTracer};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::Path;
use tracing::debug;

/// Run a recorded build event script through the tracer plugins.
///
/// Tracer output and the identity summary go to stdout; the summary is the
/// artifact that proves or disproves a split identity.
pub fn run(cwd: &Path, script: &Path, config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => TraceConfig::load(path).into_diagnostic()?,
        None => TraceConfig::default(),
    };

    let text = std::fs::read_to_string(script)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read script {}", script.display()))?;
    let events = parse_script(&text).into_diagnostic()?;
    debug!(count = events.len(), "parsed replay events");

    let mut container = PluginContainer::new(cwd.to_path_buf());
    container.add(Box::new(ResolveTracer::new(InterestFilter::new(
        config.trace_markers,
    ))));

    let tracer = IdentityTracer::new(InterestFilter::new(config.identity_markers));
    let registry = tracer.registry();
    container.add(Box::new(tracer));

    run_events(&container, &events).into_diagnostic()?;

    let splits = registry
        .summary()
        .iter()
        .filter(|report| report.state() == IdentityState::Split)
        .count();
    debug!(splits, "replay complete");

    Ok(())
}
