#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod plugin;
pub mod probe;
pub mod replay;
pub mod trace;
pub mod version;

pub use config::TraceConfig;
pub use error::Error;
pub use plugin::{
    HookResult, LoadResult, Plugin, PluginContainer, PluginContext, PluginEnforce, PluginError,
    ResolveIdResult, TransformResult,
};
pub use probe::ProbeReport;
pub use replay::{parse_script, run_events, ReplayEvent};
pub use trace::{
    IdentityRegistry, IdentityState, IdentityTracer, InterestFilter, ResolveTracer, TraceSink,
};
pub use version::VERSION;
