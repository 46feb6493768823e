//! Inline import cost annotations for editors.
//!
//! The [`AnnotationController`] reacts to host editor events, starts a
//! [`CostAnalyzer`](importcost_core::CostAnalyzer) run for the active file and
//! turns the analyzer's progress into one inline label per imported package.
//! Hosts plug in through the traits in [`host`].
//!
//! ```no_run
//! use importcost_annotate::{AnnotationController, Config, HostEvent};
//! use importcost_core::FsCostAnalyzer;
//! # use importcost_annotate::host::Workspace;
//! # fn run(workspace: &dyn Workspace) {
//! let mut controller = AnnotationController::new(FsCostAnalyzer::new(None), Config::default());
//! controller.activate(workspace);
//!
//! // From the host's event loop:
//! controller.handle_host_event(workspace, HostEvent::Saved);
//! controller.pump();
//!
//! controller.deactivate();
//! # }
//! ```

mod config;
mod controller;
mod decoration;
pub mod host;
mod utils;

#[cfg(test)]
mod testing;

// Re-export public API
pub use config::{Config, SizeUnits};
pub use controller::{AnalysisState, AnnotationController};
pub use decoration::{decoration_for, format_size, label_for};
pub use host::{
    Decoration, DecorationSpec, Disposable, HostEvent, LabelStyle, TextEditor, Workspace,
};
pub use utils::analyzable_extension;
