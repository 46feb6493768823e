//! Package cost analysis for JavaScript/TypeScript sources.
//!
//! This crate defines the engine boundary used by editor integrations:
//! - [`CostAnalyzer`] / [`AnalysisHandle`]: start and detach one analysis
//! - [`EventSink`] / [`Envelope`]: tagged delivery of [`AnalysisEvent`]s
//! - [`FsCostAnalyzer`]: a default engine that resolves packages in
//!   `node_modules` and sums the bytes of every module they pull in

mod analyzer;
mod config;
mod constants;
mod event;
mod graph;
mod parser;
mod resolver;
mod types;

// Re-export public API
pub use analyzer::{AnalysisHandle, CostAnalyzer, FsCostAnalyzer};
pub use config::find_project_root;
pub use constants::{INDEX_FILES, JS_TS_EXTENSIONS, RESOLVE_EXTENSIONS};
pub use event::{AnalysisEvent, Envelope, EventSink, SubscriptionId};
pub use graph::reachable_modules;
pub use parser::{imports_for, parse_imports};
pub use resolver::{resolve, resolve_package};
pub use types::{
    AnalysisRequest, ImportSite, PackageInfo, PackageStatus, SpecKind, is_package_request,
    split_package_request,
};
