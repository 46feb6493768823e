//! In-memory host editor and analyzer used by the unit tests.

use anyhow::{Result, bail};
use importcost_core::{
    AnalysisEvent, AnalysisHandle, AnalysisRequest, CostAnalyzer, EventSink, SubscriptionId,
};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    path::PathBuf,
    rc::Rc,
};

use crate::host::{Decoration, DecorationSpec, Disposable, TextEditor, Workspace};

#[derive(Default)]
pub(crate) struct DecorationStore {
    next_id: u64,
    pub(crate) live: BTreeMap<u64, DecorationSpec>,
    /// destroy() calls per decoration id, repeated calls included
    pub(crate) destroy_calls: BTreeMap<u64, usize>,
    pub(crate) fail: bool,
}

pub(crate) struct FakeEditor {
    path: Option<PathBuf>,
    text: RefCell<String>,
    pub(crate) store: Rc<RefCell<DecorationStore>>,
}

impl FakeEditor {
    pub(crate) fn new(path: &str, text: &str) -> Self {
        Self {
            path: Some(PathBuf::from(path)),
            text: RefCell::new(text.to_string()),
            store: Rc::default(),
        }
    }

    pub(crate) fn unsaved(text: &str) -> Self {
        Self { path: None, ..Self::new("", text) }
    }

    pub(crate) fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
    }

    pub(crate) fn live(&self) -> Vec<DecorationSpec> {
        self.store.borrow().live.values().cloned().collect()
    }

    pub(crate) fn live_for(&self, package: &str) -> Vec<DecorationSpec> {
        self.live().into_iter().filter(|d| d.package_name == package).collect()
    }

    pub(crate) fn created(&self) -> u64 {
        self.store.borrow().next_id
    }
}

impl TextEditor for FakeEditor {
    fn path(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    fn text(&self) -> String {
        self.text.borrow().clone()
    }

    fn line_length_for_row(&self, row: usize) -> usize {
        self.text.borrow().lines().nth(row).map(|l| l.chars().count()).unwrap_or(0)
    }

    fn add_decoration(&self, spec: &DecorationSpec) -> Result<Box<dyn Decoration>> {
        let mut store = self.store.borrow_mut();
        if store.fail {
            bail!("editor closed");
        }
        let id = store.next_id;
        store.next_id += 1;
        store.live.insert(id, spec.clone());
        Ok(Box::new(FakeDecoration { id, store: Rc::clone(&self.store) }))
    }
}

struct FakeDecoration {
    id: u64,
    store: Rc<RefCell<DecorationStore>>,
}

impl Decoration for FakeDecoration {
    fn destroy(&mut self) {
        let mut store = self.store.borrow_mut();
        store.live.remove(&self.id);
        *store.destroy_calls.entry(self.id).or_default() += 1;
    }
}

#[derive(Default)]
pub(crate) struct AnalyzerLog {
    pub(crate) requests: Vec<AnalysisRequest>,
    pub(crate) sinks: Vec<EventSink>,
    pub(crate) detach_calls: BTreeMap<SubscriptionId, usize>,
    pub(crate) clean_ups: usize,
    pub(crate) fail: bool,
}

/// Records every call; tests emit events through the captured sinks.
#[derive(Default, Clone)]
pub(crate) struct FakeAnalyzer {
    pub(crate) log: Rc<RefCell<AnalyzerLog>>,
}

impl FakeAnalyzer {
    pub(crate) fn emit(&self, subscription: usize, event: AnalysisEvent) {
        assert!(self.log.borrow().sinks[subscription].emit(event));
    }

    pub(crate) fn subscriptions(&self) -> usize {
        self.log.borrow().sinks.len()
    }

    pub(crate) fn detach_calls(&self, subscription: usize) -> usize {
        let log = self.log.borrow();
        let id = log.sinks[subscription].id();
        log.detach_calls.get(&id).copied().unwrap_or(0)
    }
}

impl CostAnalyzer for FakeAnalyzer {
    fn analyze(
        &self,
        request: AnalysisRequest,
        sink: EventSink,
    ) -> Result<Box<dyn AnalysisHandle>> {
        let mut log = self.log.borrow_mut();
        if log.fail {
            bail!("analyzer crashed");
        }
        let id = sink.id();
        log.requests.push(request);
        log.sinks.push(sink);
        Ok(Box::new(FakeHandle { id, log: Rc::clone(&self.log) }))
    }

    fn clean_up(&self) {
        self.log.borrow_mut().clean_ups += 1;
    }
}

struct FakeHandle {
    id: SubscriptionId,
    log: Rc<RefCell<AnalyzerLog>>,
}

impl AnalysisHandle for FakeHandle {
    fn detach(&mut self) {
        *self.log.borrow_mut().detach_calls.entry(self.id).or_default() += 1;
    }
}

#[derive(Default)]
pub(crate) struct ListenerLog {
    pub(crate) registered: usize,
    pub(crate) disposed: usize,
}

#[derive(Default)]
pub(crate) struct FakeWorkspace {
    pub(crate) active: RefCell<Option<Rc<dyn TextEditor>>>,
    pub(crate) listeners: Rc<RefCell<ListenerLog>>,
}

impl FakeWorkspace {
    pub(crate) fn focus(&self, editor: &Rc<FakeEditor>) {
        let editor: Rc<dyn TextEditor> = Rc::clone(editor) as Rc<dyn TextEditor>;
        *self.active.borrow_mut() = Some(editor);
    }

    fn listen(&self) -> Box<dyn Disposable> {
        self.listeners.borrow_mut().registered += 1;
        Box::new(FakeListener { log: Rc::clone(&self.listeners) })
    }
}

impl Workspace for FakeWorkspace {
    fn active_editor(&self) -> Option<Rc<dyn TextEditor>> {
        self.active.borrow().clone()
    }

    fn on_did_change_active_item(&self) -> Box<dyn Disposable> {
        self.listen()
    }

    fn observe_saves(&self) -> Box<dyn Disposable> {
        self.listen()
    }
}

struct FakeListener {
    log: Rc<RefCell<ListenerLog>>,
}

impl Disposable for FakeListener {
    fn dispose(&mut self) {
        self.log.borrow_mut().disposed += 1;
    }
}
