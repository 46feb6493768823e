//! A headless host: files loaded into memory, one of them active at a time.

use anyhow::{Context, Result, bail};
use importcost_annotate::{Decoration, DecorationSpec, Disposable, HostEvent, TextEditor, Workspace};
use log::trace;
use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

type Store = Rc<RefCell<BTreeMap<u64, DecorationSpec>>>;

pub struct BufferEditor {
    path: PathBuf,
    text: String,
    decorations: Store,
    next_id: Cell<u64>,
}

impl BufferEditor {
    pub fn open(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Ok(Self::new(path, text))
    }

    pub fn new(path: PathBuf, text: String) -> Self {
        Self { path, text, decorations: Rc::default(), next_id: Cell::new(0) }
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.text.lines().nth(row)
    }

    /// Live decorations, ordered by row.
    pub fn decorations(&self) -> Vec<DecorationSpec> {
        let mut specs: Vec<_> = self.decorations.borrow().values().cloned().collect();
        specs.sort_by_key(|d| (d.row, d.column));
        specs
    }
}

impl TextEditor for BufferEditor {
    fn path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn line_length_for_row(&self, row: usize) -> usize {
        self.line(row).map(|l| l.chars().count()).unwrap_or(0)
    }

    fn add_decoration(&self, spec: &DecorationSpec) -> Result<Box<dyn Decoration>> {
        if self.line(spec.row).is_none() {
            bail!("Row {} is past the end of {}", spec.row, self.path.display());
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        trace!("Decoration {} for '{}' at {}:{}", id, spec.package_name, spec.row, spec.column);
        self.decorations.borrow_mut().insert(id, spec.clone());
        Ok(Box::new(BufferDecoration { id, store: Rc::clone(&self.decorations) }))
    }
}

struct BufferDecoration {
    id: u64,
    store: Store,
}

impl Decoration for BufferDecoration {
    fn destroy(&mut self) {
        self.store.borrow_mut().remove(&self.id);
    }
}

/// Editors opened from the command line; focus moves between them on request.
pub struct ConsoleWorkspace {
    editors: Vec<Rc<BufferEditor>>,
    active: Cell<Option<usize>>,
    listeners: Rc<Cell<usize>>,
}

impl ConsoleWorkspace {
    pub fn new(editors: Vec<Rc<BufferEditor>>) -> Self {
        let active = if editors.is_empty() { None } else { Some(0) };
        Self { editors, active: Cell::new(active), listeners: Rc::default() }
    }

    pub fn editors(&self) -> &[Rc<BufferEditor>] {
        &self.editors
    }

    /// Make editor `index` active. Returns the event to deliver, if anyone listens.
    pub fn focus(&self, index: usize) -> Option<HostEvent> {
        if index >= self.editors.len() || self.active.get() == Some(index) {
            return None;
        }
        self.active.set(Some(index));
        (self.listeners.get() > 0).then_some(HostEvent::ActiveItemChanged)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.get()
    }

    fn listen(&self) -> Box<dyn Disposable> {
        self.listeners.set(self.listeners.get() + 1);
        Box::new(Listener { count: Rc::clone(&self.listeners), disposed: false })
    }
}

impl Workspace for ConsoleWorkspace {
    fn active_editor(&self) -> Option<Rc<dyn TextEditor>> {
        let editor = self.editors.get(self.active.get()?)?;
        Some(Rc::clone(editor) as Rc<dyn TextEditor>)
    }

    fn on_did_change_active_item(&self) -> Box<dyn Disposable> {
        self.listen()
    }

    fn observe_saves(&self) -> Box<dyn Disposable> {
        self.listen()
    }
}

struct Listener {
    count: Rc<Cell<usize>>,
    disposed: bool,
}

impl Disposable for Listener {
    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.count.set(self.count.get() - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use importcost_annotate::LabelStyle;

    fn spec(row: usize, name: &str) -> DecorationSpec {
        DecorationSpec {
            package_name: name.to_string(),
            row,
            column: 0,
            label: "1 B".to_string(),
            style: LabelStyle::Small,
        }
    }

    #[test]
    fn test_decoration_destroy_is_idempotent() {
        let editor = BufferEditor::new(PathBuf::from("/p/a.js"), "a\nb".to_string());
        let mut first = editor.add_decoration(&spec(0, "x")).unwrap();
        let _second = editor.add_decoration(&spec(1, "y")).unwrap();

        first.destroy();
        first.destroy();

        let live = editor.decorations();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].package_name, "y");
    }

    #[test]
    fn test_decoration_past_end_fails() {
        let editor = BufferEditor::new(PathBuf::from("/p/a.js"), "a".to_string());
        assert!(editor.add_decoration(&spec(5, "x")).is_err());
        assert!(editor.decorations().is_empty());
    }

    #[test]
    fn test_line_length() {
        let editor = BufferEditor::new(PathBuf::from("/p/a.js"), "abc\n\nde".to_string());
        assert_eq!(editor.line_length_for_row(0), 3);
        assert_eq!(editor.line_length_for_row(1), 0);
        assert_eq!(editor.line_length_for_row(2), 2);
        assert_eq!(editor.line_length_for_row(9), 0);
    }

    #[test]
    fn test_focus_events_need_listeners() {
        let a = Rc::new(BufferEditor::new(PathBuf::from("/p/a.js"), String::new()));
        let b = Rc::new(BufferEditor::new(PathBuf::from("/p/b.js"), String::new()));
        let workspace = ConsoleWorkspace::new(vec![a, b]);

        assert_eq!(workspace.focus(1), None);
        assert_eq!(workspace.active_editor().unwrap().path(), Some(PathBuf::from("/p/b.js")));

        let mut listener = workspace.on_did_change_active_item();
        assert_eq!(workspace.focus(0), Some(HostEvent::ActiveItemChanged));
        assert_eq!(workspace.focus(0), None);
        assert_eq!(workspace.focus(7), None);

        listener.dispose();
        listener.dispose();
        assert_eq!(workspace.listener_count(), 0);
        assert_eq!(workspace.focus(1), None);
    }
}
