//! The surface a host editor exposes to the annotation controller.
//!
//! The host owns buffers and rendering; the controller only calls these
//! traits and keeps the opaque handles they return.

use anyhow::Result;
use serde::Serialize;
use std::{path::PathBuf, rc::Rc};

/// Host notifications that re-trigger analysis of the active file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    ActiveItemChanged,
    Saved,
}

/// Where and what to render for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecorationSpec {
    pub package_name: String,
    /// 0-based row
    pub row: usize,
    /// Column the label is anchored at, the end of the row at render time
    pub column: usize,
    pub label: String,
    pub style: LabelStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    Pending,
    Small,
    Medium,
    Large,
}

pub trait TextEditor {
    /// `None` for buffers that were never saved.
    fn path(&self) -> Option<PathBuf>;

    fn text(&self) -> String;

    fn line_length_for_row(&self, row: usize) -> usize;

    fn add_decoration(&self, spec: &DecorationSpec) -> Result<Box<dyn Decoration>>;
}

/// A rendered inline label.
pub trait Decoration {
    /// Remove the label. Must tolerate repeated calls.
    fn destroy(&mut self);
}

/// A host listener registration.
pub trait Disposable {
    fn dispose(&mut self);
}

pub trait Workspace {
    fn active_editor(&self) -> Option<Rc<dyn TextEditor>>;

    /// Deliver [`HostEvent::ActiveItemChanged`] while the returned registration lives.
    fn on_did_change_active_item(&self) -> Box<dyn Disposable>;

    /// Deliver [`HostEvent::Saved`] for every open and future editor while the
    /// returned registration lives.
    fn observe_saves(&self) -> Box<dyn Disposable>;
}
