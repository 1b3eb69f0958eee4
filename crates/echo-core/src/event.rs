//! Change notification.
//!
//! Every structural or value mutation raises one [`ChangeEvent`] (or a short
//! sequence of them). An event is delivered first to the node where the
//! mutation happened and then to each ancestor up to the root, with `source`
//! and `relative_path` rebound at every level.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::EchoObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    ValueChanged,
    TagAdded,
    TagRemoved,
    TagRenamed,
    ListTagAdded,
    ListTagRemoved,
    ListTagMoved,
}

/// Old or new value carried by an event.
#[derive(Debug, Clone)]
pub enum ChangeValue {
    Node(EchoObject),
    Key(String),
    Index(usize),
}

impl ChangeValue {
    pub fn as_node(&self) -> Option<&EchoObject> {
        match self {
            ChangeValue::Node(node) => Some(node),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The node whose subscribers are being notified.
    pub source: EchoObject,
    /// The node that changed. For additions and removals this is the
    /// container; for renames and moves it is the element itself.
    pub changed: EchoObject,
    pub kind: ChangeKind,
    pub old_value: Option<ChangeValue>,
    pub new_value: Option<ChangeValue>,
    /// Absolute path of `changed`.
    pub path: String,
    /// Path of `changed` relative to `source`.
    pub relative_path: String,
}

pub(crate) type Listener = Rc<RefCell<dyn FnMut(&ChangeEvent)>>;

pub(crate) struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
}

impl Default for Listeners {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: BTreeMap::new(),
        }
    }
}

impl EchoObject {
    /// Subscribes to changes on this node and its descendants. Returns an id
    /// for [`EchoObject::off_change`].
    pub fn on_change<F>(&self, listener: F) -> u64
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        let mut data = self.inner.borrow_mut();
        let id = data.listeners.next_id;
        data.listeners.next_id += 1;
        let listener: Listener = Rc::new(RefCell::new(listener));
        data.listeners.entries.insert(id, listener);
        id
    }

    pub fn off_change(&self, id: u64) -> bool {
        self.inner.borrow_mut().listeners.entries.remove(&id).is_some()
    }

    fn listeners_snapshot(&self) -> Vec<Listener> {
        self.inner
            .borrow()
            .listeners
            .entries
            .values()
            .cloned()
            .collect()
    }

    fn any_listener_up(&self) -> bool {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if !node.inner.borrow().listeners.entries.is_empty() {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Raises an event that originates at `self` and bubbles to the root.
    pub(crate) fn raise(
        &self,
        kind: ChangeKind,
        changed: &EchoObject,
        old_value: Option<ChangeValue>,
        new_value: Option<ChangeValue>,
    ) {
        if !self.any_listener_up() {
            return;
        }
        let mut event = ChangeEvent {
            source: self.clone(),
            changed: changed.clone(),
            kind,
            old_value,
            new_value,
            path: changed.path(),
            relative_path: String::new(),
        };
        let mut current = Some(self.clone());
        while let Some(node) = current {
            event.relative_path = EchoObject::relative_path(&node, changed).unwrap_or_default();
            event.source = node.clone();
            for listener in node.listeners_snapshot() {
                // a listener that mutates the tree does not hear its own echo
                if let Ok(mut callback) = listener.try_borrow_mut() {
                    (&mut *callback)(&event);
                }
            }
            current = node.parent();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(node: &EchoObject) -> Rc<RefCell<Vec<ChangeEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        node.on_change(move |event| sink.borrow_mut().push(event.clone()));
        log
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let node = EchoObject::new_compound();
        let log = Rc::new(RefCell::new(0));
        let sink = log.clone();
        let id = node.on_change(move |_| *sink.borrow_mut() += 1);
        node.add("a", 1i32.into()).unwrap();
        assert!(node.off_change(id));
        assert!(!node.off_change(id));
        node.add("b", 1i32.into()).unwrap();
        assert_eq!(*log.borrow(), 1);
    }

    #[test]
    fn events_bubble_with_rebound_source() {
        let root = EchoObject::new_compound();
        let inner = EchoObject::new_compound();
        root.add("inner", inner.clone()).unwrap();
        let root_log = capture(&root);
        let inner_log = capture(&inner);
        inner.add("x", 1i32.into()).unwrap();
        let inner_event = &inner_log.borrow()[0];
        assert!(inner_event.source.ptr_eq(&inner));
        assert_eq!(inner_event.relative_path, "");
        let root_event = &root_log.borrow()[0];
        assert!(root_event.source.ptr_eq(&root));
        assert!(root_event.changed.ptr_eq(&inner));
        assert_eq!(root_event.path, "inner");
        assert_eq!(root_event.relative_path, "inner");
        assert_eq!(root_event.kind, ChangeKind::TagAdded);
    }

    #[test]
    fn reentrant_mutation_does_not_recurse() {
        let root = EchoObject::new_list();
        let target = root.clone();
        let log = Rc::new(RefCell::new(0));
        let sink = log.clone();
        root.on_change(move |_| {
            *sink.borrow_mut() += 1;
            if target.len() < 3 {
                target.list_add(0i32.into()).unwrap();
            }
        });
        root.list_add(0i32.into()).unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(*log.borrow(), 1);
    }
}
