//! Events an analysis delivers back to whoever started it.
//!
//! Each analysis gets an [`EventSink`] tagged with a fresh [`SubscriptionId`].
//! Everything it emits arrives on the receiving side as an [`Envelope`], so a
//! consumer can tell a current subscription's events from a superseded one's.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::mpsc::Sender,
};

use crate::types::PackageInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisEvent {
    /// Every package import found in the file, all pending
    Start(Vec<PackageInfo>),
    /// Final size of one package
    Calculated(PackageInfo),
    /// One package could not be costed
    Failed { package: PackageInfo, reason: String },
    /// No further events will follow for this subscription
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub id: SubscriptionId,
    pub file_path: PathBuf,
    pub event: AnalysisEvent,
}

#[derive(Debug, Clone)]
pub struct EventSink {
    id: SubscriptionId,
    file_path: PathBuf,
    tx: Sender<Envelope>,
}

impl EventSink {
    pub fn new(id: SubscriptionId, file_path: PathBuf, tx: Sender<Envelope>) -> Self {
        Self { id, file_path, tx }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Returns false once the receiving side is gone.
    pub fn emit(&self, event: AnalysisEvent) -> bool {
        self.tx.send(Envelope { id: self.id, file_path: self.file_path.clone(), event }).is_ok()
    }
}
