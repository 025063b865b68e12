//! Payload collectors and before-save handlers.
//!
//! Panels register these through a shared `&EditContext`, so both
//! registries use interior mutability. Entries are cloned out before they
//! run, which lets a running collector register or drop others.

use super::EditContext;
use folio_model::MetaMap;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use tracing::{debug, warn};

pub(crate) type Collector = Rc<dyn Fn(&EditContext) -> Option<MetaMap>>;
pub(crate) type BeforeSave = Rc<dyn Fn(&EditContext) -> Result<(), String>>;

/// Handle returned by collector registration; pass it back to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectorHandle(u64);

/// Handle returned by before-save registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeforeSaveHandle(u64);

pub(crate) struct HandlerList<T> {
    next: Cell<u64>,
    entries: RefCell<Vec<(u64, T)>>,
}

impl<T: Clone> HandlerList<T> {
    pub(crate) fn new() -> Self {
        Self {
            next: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, entry: T) -> u64 {
        let id = self.next.get();
        self.next.set(id + 1);
        self.entries.borrow_mut().push((id, entry));
        id
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Registration-ordered copy of the entries.
    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.entries
            .borrow()
            .iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}

impl HandlerList<Collector> {
    pub(crate) fn register(&self, collector: Collector) -> CollectorHandle {
        let handle = CollectorHandle(self.push(collector));
        debug!(collector = handle.0, "Meta payload collector registered");
        handle
    }

    pub(crate) fn unregister(&self, handle: CollectorHandle) -> bool {
        self.remove(handle.0)
    }
}

impl HandlerList<BeforeSave> {
    pub(crate) fn register(&self, handler: BeforeSave) -> BeforeSaveHandle {
        BeforeSaveHandle(self.push(handler))
    }

    pub(crate) fn unregister(&self, handle: BeforeSaveHandle) -> bool {
        self.remove(handle.0)
    }
}

/// Runs every collector in registration order and shallow-merges the
/// partial maps, later collectors overwriting earlier keys.
pub(crate) fn run_collectors(ctx: &EditContext, collectors: Vec<Collector>, isolate: bool) -> MetaMap {
    let mut merged = MetaMap::new();
    for (index, collector) in collectors.into_iter().enumerate() {
        let result = if isolate {
            match catch_unwind(AssertUnwindSafe(|| collector(ctx))) {
                Ok(result) => result,
                Err(payload) => {
                    warn!(
                        collector = index,
                        panic = %panic_message(payload.as_ref()),
                        "Meta payload collector failed; skipping"
                    );
                    None
                }
            }
        } else {
            collector(ctx)
        };
        if let Some(partial) = result {
            merged.extend(partial);
        }
    }
    merged
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
