//! Deterministic event driver for the tracer plugins.
//!
//! Demonstrating a module-identity bug normally takes a whole dev-server
//! run. The replay driver takes the same sequence of events a build would
//! produce, as a plain text script, and pushes it through a
//! [`PluginContainer`], so a split identity can be shown (or ruled out) from
//! a terminal.
//!
//! Script grammar, one event per line:
//!
//! ```text
//! # comments and blank lines are skipped
//! resolve <specifier> [importer]
//! load <id>
//! transform <id>
//! ```

use crate::error::Error;
use crate::plugin::{HookResult, PluginContainer};

/// One recorded build event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEvent {
    Resolve {
        specifier: String,
        importer: Option<String>,
    },
    Load {
        id: String,
    },
    Transform {
        id: String,
    },
}

/// Parse a replay script. Malformed lines are reported with their 1-based
/// line number.
pub fn parse_script(text: &str) -> Result<Vec<ReplayEvent>, Error> {
    let mut events = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let directive = parts.next().unwrap_or_default();
        let event = match directive {
            "resolve" => ReplayEvent::Resolve {
                specifier: argument(parts.next(), line, "resolve needs a specifier")?,
                importer: parts.next().map(ToString::to_string),
            },
            "load" => ReplayEvent::Load {
                id: argument(parts.next(), line, "load needs an id")?,
            },
            "transform" => ReplayEvent::Transform {
                id: argument(parts.next(), line, "transform needs an id")?,
            },
            other => {
                return Err(Error::Script {
                    line,
                    message: format!("unknown directive {other:?}"),
                })
            }
        };
        events.push(event);
    }

    Ok(events)
}

fn argument(value: Option<&str>, line: usize, message: &str) -> Result<String, Error> {
    value.map(ToString::to_string).ok_or_else(|| Error::Script {
        line,
        message: message.to_string(),
    })
}

/// Drive a full build lifecycle: `build_start`, every event in order,
/// `build_end`. Transform events carry no source; the tracers never read it.
pub fn run_events(container: &PluginContainer, events: &[ReplayEvent]) -> HookResult<()> {
    container.build_start()?;

    for event in events {
        match event {
            ReplayEvent::Resolve {
                specifier,
                importer,
            } => {
                container.resolve_id(specifier, importer.as_deref())?;
            }
            ReplayEvent::Load { id } => {
                container.load(id)?;
            }
            ReplayEvent::Transform { id } => {
                container.transform("", id)?;
            }
        }
    }

    container.build_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{IdentityState, IdentityTracer, InterestFilter, TraceSink};
    use std::path::PathBuf;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let script = "\n# a comment\n  \nload /libs/facet.type.ts\n";
        let events = parse_script(script).unwrap();
        assert_eq!(
            events,
            vec![ReplayEvent::Load {
                id: "/libs/facet.type.ts".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_resolve_with_and_without_importer() {
        let events = parse_script("resolve @org/ui /apps/a.ts\nresolve @org/ui\n").unwrap();
        assert_eq!(
            events[0],
            ReplayEvent::Resolve {
                specifier: "@org/ui".to_string(),
                importer: Some("/apps/a.ts".to_string()),
            }
        );
        assert_eq!(
            events[1],
            ReplayEvent::Resolve {
                specifier: "@org/ui".to_string(),
                importer: None,
            }
        );
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let err = parse_script("load /a.ts\nfrobnicate /b.ts\n").unwrap_err();
        match err {
            Error::Script { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("frobnicate"));
            }
            other => panic!("expected script error, got {other:?}"),
        }

        let err = parse_script("transform\n").unwrap_err();
        assert!(matches!(err, Error::Script { line: 1, .. }));
    }

    #[test]
    fn test_run_events_drives_the_registry() {
        let script = "\
# facet gets two identities, the index stays whole
resolve @myorg/shared-ui /apps/test-app/src/app/app.spec.ts
load /libs/shared/ui/src/lib/facet.type.ts
transform /libs/shared/ui/src/lib/facet.type.ts
transform /apps/test-app/node_modules/.vite/deps/facet.type.ts
transform /libs/shared/ui/src/index.ts
transform /libs/shared/ui/src/index.ts
";
        let events = parse_script(script).unwrap();

        let tracer = IdentityTracer::with_sink(
            InterestFilter::new(["facet", "index"]),
            TraceSink::memory(),
        );
        let registry = tracer.registry();

        let mut container = PluginContainer::new(PathBuf::from("/work"));
        container.add(Box::new(tracer));
        run_events(&container, &events).unwrap();

        let summary = registry.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].basename, "facet.type.ts");
        assert_eq!(summary[0].state(), IdentityState::Split);
        assert_eq!(summary[1].basename, "index.ts");
        assert_eq!(summary[1].state(), IdentityState::Singleton);
    }
}
