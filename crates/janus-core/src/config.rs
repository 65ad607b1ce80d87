use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tracing configuration: which module identifiers are interesting and which
/// filesystem paths the prober should check.
///
/// Marker matching is case-sensitive substring containment; see
/// [`crate::trace::InterestFilter`]. The defaults target a barrel-file enum
/// that kept losing its identity across a workspace-library boundary, which
/// is the reproduction this tool grew out of.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Markers for the resolution/load tracer.
    pub trace_markers: Vec<String>,
    /// Markers for the transform identity tracer.
    pub identity_markers: Vec<String>,
    /// Candidate paths for the path prober, relative to the working directory.
    pub probe_paths: Vec<PathBuf>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            trace_markers: vec![
                "facet".to_string(),
                "shared-ui".to_string(),
                "filter.type".to_string(),
            ],
            identity_markers: vec![
                "facet".to_string(),
                "filter.type".to_string(),
                "index".to_string(),
            ],
            probe_paths: vec![
                PathBuf::from("libs"),
                PathBuf::from("libs/shared/ui/src/lib/facet.type.ts"),
                PathBuf::from("libs/shared/ui/src/index.ts"),
                PathBuf::from("apps/test-app/src/app/filter.type.ts"),
                PathBuf::from("node_modules"),
            ],
        }
    }
}

impl TraceConfig {
    /// Load a config from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
