use importcost_core::{
    AnalysisEvent, AnalysisHandle, AnalysisRequest, CostAnalyzer, Envelope, EventSink, PackageInfo,
    SubscriptionId,
};
use log::{debug, info, trace, warn};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    rc::Rc,
    sync::mpsc::{self, Receiver, Sender},
    time::Duration,
};

use crate::{
    config::Config,
    decoration::decoration_for,
    host::{Decoration, Disposable, HostEvent, TextEditor, Workspace},
    utils::analyzable_extension,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    /// Events may still arrive
    Analyzing,
    /// The analyzer reported it is done; decorations reflect the last run
    Idle,
}

struct LiveAnalysis {
    id: SubscriptionId,
    editor: Rc<dyn TextEditor>,
    handle: Box<dyn AnalysisHandle>,
    state: AnalysisState,
}

/// A rendered label and the file it was rendered for.
struct RenderedDecoration {
    file_path: Option<PathBuf>,
    handle: Box<dyn Decoration>,
}

/// Keeps inline import cost labels in sync with the active editor.
///
/// Owns one analyzer subscription per file path and one decoration per
/// package name. Analyzer events are queued on a channel and applied by
/// [`pump`](Self::pump) on the caller's thread; events from a subscription
/// that is no longer registered for its file are dropped.
pub struct AnnotationController<A: CostAnalyzer> {
    analyzer: A,
    config: Config,
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
    next_id: u64,
    analyses: HashMap<PathBuf, LiveAnalysis>,
    decorations: HashMap<String, RenderedDecoration>,
    listeners: Vec<Box<dyn Disposable>>,
}

impl<A: CostAnalyzer> AnnotationController<A> {
    pub fn new(analyzer: A, config: Config) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            analyzer,
            config,
            tx,
            rx,
            next_id: 0,
            analyses: HashMap::new(),
            decorations: HashMap::new(),
            listeners: Vec::new(),
        }
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// Listen for focus changes and saves, then annotate the active editor.
    pub fn activate(&mut self, workspace: &dyn Workspace) {
        info!("Activating import cost annotations");
        self.listeners.push(workspace.on_did_change_active_item());
        self.listeners.push(workspace.observe_saves());
        self.trigger_analysis(workspace.active_editor());
    }

    pub fn handle_host_event(&mut self, workspace: &dyn Workspace, event: HostEvent) {
        debug!("Host event: {:?}", event);
        self.trigger_analysis(workspace.active_editor());
    }

    /// (Re)start analysis of `editor`, detaching any earlier subscription for
    /// the same file first. Editors without a path or with an extension the
    /// analyzer does not support are ignored.
    pub fn trigger_analysis(&mut self, editor: Option<Rc<dyn TextEditor>>) {
        let Some(editor) = editor else {
            trace!("No active editor");
            return;
        };
        let Some(file_path) = editor.path() else {
            trace!("Active editor has no path");
            return;
        };
        let Some(extension) = analyzable_extension(&file_path, &self.analyzer) else {
            trace!("Skipping unsupported file: {}", file_path.display());
            return;
        };

        let content = editor.text();

        if let Some(mut previous) = self.analyses.remove(&file_path) {
            debug!("Detaching analysis {} of {}", previous.id, file_path.display());
            previous.handle.detach();
        }

        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let sink = EventSink::new(id, file_path.clone(), self.tx.clone());
        let request = AnalysisRequest { file_path: file_path.clone(), content, extension };

        match self.analyzer.analyze(request, sink) {
            Ok(handle) => {
                debug!("Started analysis {} of {}", id, file_path.display());
                self.analyses.insert(
                    file_path,
                    LiveAnalysis { id, editor, handle, state: AnalysisState::Analyzing },
                );
            }
            Err(e) => {
                warn!("Failed to analyze {}: {:#}", file_path.display(), e);
                self.clear_file_decorations(&file_path, &HashSet::new());
            }
        }
    }

    /// Apply every queued analyzer event. Returns how many were taken off the queue.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            self.on_analysis_event(envelope);
            handled += 1;
        }
        handled
    }

    /// Like [`pump`](Self::pump), but waits up to `timeout` for the first event.
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(envelope) => {
                self.on_analysis_event(envelope);
                1 + self.pump()
            }
            Err(_) => 0,
        }
    }

    fn on_analysis_event(&mut self, envelope: Envelope) {
        let Envelope { id, file_path, event } = envelope;
        let editor = match self.analyses.get(&file_path) {
            Some(live) if live.id == id => Rc::clone(&live.editor),
            _ => {
                trace!("Dropping event from stale analysis {} of {}", id, file_path.display());
                return;
            }
        };

        match event {
            AnalysisEvent::Start(packages) => {
                debug!("{} packages imported by {}", packages.len(), file_path.display());
                let reported: HashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();
                self.clear_file_decorations(&file_path, &reported);
                for package in &packages {
                    self.render_decoration(editor.as_ref(), package);
                }
            }
            AnalysisEvent::Calculated(package) => {
                self.render_decoration(editor.as_ref(), &package);
            }
            AnalysisEvent::Failed { package, reason } => {
                warn!(
                    "No import cost for '{}' in {}: {}",
                    package.name,
                    file_path.display(),
                    reason
                );
                self.clear_decoration(&package.name);
            }
            AnalysisEvent::Finished => {
                debug!("Analysis {} of {} finished", id, file_path.display());
                if let Some(live) = self.analyses.get_mut(&file_path) {
                    live.state = AnalysisState::Idle;
                }
            }
        }
    }

    /// Replace the label for `package` with one built from its current state.
    pub fn render_decoration(&mut self, editor: &dyn TextEditor, package: &PackageInfo) {
        self.clear_decoration(&package.name);

        let Some(spec) = decoration_for(editor, package, &self.config) else {
            trace!("Nothing to render for '{}'", package.name);
            return;
        };

        match editor.add_decoration(&spec) {
            Ok(handle) => {
                let rendered = RenderedDecoration { file_path: editor.path(), handle };
                self.decorations.insert(package.name.clone(), rendered);
            }
            Err(e) => warn!("Failed to decorate '{}': {:#}", package.name, e),
        }
    }

    pub fn clear_decoration(&mut self, package_name: &str) {
        if let Some(mut decoration) = self.decorations.remove(package_name) {
            trace!("Destroying decoration for '{}'", package_name);
            decoration.handle.destroy();
        }
    }

    /// Destroy labels rendered for `file_path` except those named in `keep`.
    /// Labels of a detached run would otherwise never be updated again.
    fn clear_file_decorations(&mut self, file_path: &Path, keep: &HashSet<&str>) {
        let stale: Vec<String> = self
            .decorations
            .iter()
            .filter(|(name, d)| {
                d.file_path.as_deref() == Some(file_path) && !keep.contains(name.as_str())
            })
            .map(|(name, _)| name.clone())
            .collect();
        if !stale.is_empty() {
            debug!("Clearing {} leftover labels of {}", stale.len(), file_path.display());
        }
        for name in stale {
            self.clear_decoration(&name);
        }
    }

    /// Release every listener, subscription and decoration, then let the
    /// analyzer drop its own resources.
    pub fn deactivate(&mut self) {
        info!(
            "Deactivating: {} listeners, {} analyses, {} decorations",
            self.listeners.len(),
            self.analyses.len(),
            self.decorations.len()
        );

        for mut listener in self.listeners.drain(..) {
            listener.dispose();
        }
        for (path, mut live) in self.analyses.drain() {
            trace!("Detaching analysis {} of {}", live.id, path.display());
            live.handle.detach();
        }
        for (_, mut decoration) in self.decorations.drain() {
            decoration.handle.destroy();
        }

        self.analyzer.clean_up();

        let discarded = self.rx.try_iter().count();
        if discarded > 0 {
            debug!("Discarded {} queued analyzer events", discarded);
        }
    }

    pub fn analysis_state(&self, file_path: &Path) -> Option<AnalysisState> {
        self.analyses.get(file_path).map(|live| live.state)
    }

    /// True when no registered analysis is still running.
    pub fn is_idle(&self) -> bool {
        self.analyses.values().all(|live| live.state == AnalysisState::Idle)
    }

    pub fn live_analyses(&self) -> usize {
        self.analyses.len()
    }

    pub fn decoration_count(&self) -> usize {
        self.decorations.len()
    }

    pub fn has_decoration(&self, package_name: &str) -> bool {
        self.decorations.contains_key(package_name)
    }
}
