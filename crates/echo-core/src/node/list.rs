use super::{EchoObject, Payload, Slot};
use crate::event::{ChangeKind, ChangeValue};
use crate::EchoError;

impl EchoObject {
    fn with_items_mut<R>(&self, f: impl FnOnce(&mut Vec<EchoObject>) -> R) -> Result<R, EchoError> {
        let found = self.tag_type();
        match &mut self.inner.borrow_mut().payload {
            Payload::List(items) => Ok(f(items)),
            _ => Err(EchoError::Shape {
                expected: "list",
                found,
            }),
        }
    }

    fn require_list(&self) -> Result<(), EchoError> {
        if self.is_list() {
            Ok(())
        } else {
            Err(self.shape_error("list"))
        }
    }

    /// Renumbers elements from `start` on and raises a move event for each.
    fn renumber_from(&self, start: usize, shift_up: bool) {
        let moved: Vec<EchoObject> = match &self.inner.borrow().payload {
            Payload::List(items) => items.iter().skip(start).cloned().collect(),
            _ => return,
        };
        for (offset, item) in moved.into_iter().enumerate() {
            let index = start + offset;
            let previous = if shift_up { index - 1 } else { index + 1 };
            Self::set_slot(&item, Slot::Index(index));
            self.raise(
                ChangeKind::ListTagMoved,
                &item,
                Some(ChangeValue::Index(previous)),
                Some(ChangeValue::Index(index)),
            );
        }
    }

    pub fn list_get(&self, index: usize) -> Option<EchoObject> {
        match &self.inner.borrow().payload {
            Payload::List(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    /// Elements in order.
    pub fn list_items(&self) -> Result<Vec<EchoObject>, EchoError> {
        match &self.inner.borrow().payload {
            Payload::List(items) => Ok(items.clone()),
            _ => Err(self.shape_error("list")),
        }
    }

    /// Appends `value`.
    pub fn list_add(&self, value: EchoObject) -> Result<(), EchoError> {
        self.require_list()?;
        self.check_attachable(&value)?;
        let index = self.with_items_mut(|items| {
            items.push(value.clone());
            items.len() - 1
        })?;
        self.attach(&value, Slot::Index(index));
        self.raise(
            ChangeKind::ListTagAdded,
            self,
            None,
            Some(ChangeValue::Node(value)),
        );
        Ok(())
    }

    /// Inserts `value` at `index`, shifting later elements up. `index` may
    /// equal the length.
    pub fn list_insert(&self, index: usize, value: EchoObject) -> Result<(), EchoError> {
        self.require_list()?;
        self.check_attachable(&value)?;
        self.with_items_mut(|items| {
            if index > items.len() {
                return Err(EchoError::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, value.clone());
            Ok(())
        })??;
        self.attach(&value, Slot::Index(index));
        self.raise(
            ChangeKind::ListTagAdded,
            self,
            None,
            Some(ChangeValue::Node(value)),
        );
        self.renumber_from(index + 1, true);
        Ok(())
    }

    /// Replaces the element at `index`; the old element is detached.
    pub fn list_set(&self, index: usize, value: EchoObject) -> Result<(), EchoError> {
        self.require_list()?;
        self.check_attachable(&value)?;
        let old = self.with_items_mut(|items| {
            let len = items.len();
            items
                .get_mut(index)
                .map(|slot| std::mem::replace(slot, value.clone()))
                .ok_or(EchoError::IndexOutOfRange { index, len })
        })??;
        Self::detach(&old);
        self.attach(&value, Slot::Index(index));
        self.raise(
            ChangeKind::ListTagRemoved,
            self,
            Some(ChangeValue::Node(old)),
            None,
        );
        self.raise(
            ChangeKind::ListTagAdded,
            self,
            None,
            Some(ChangeValue::Node(value)),
        );
        Ok(())
    }

    /// Removes and returns the element at `index`, shifting later elements
    /// down.
    pub fn list_remove_at(&self, index: usize) -> Result<EchoObject, EchoError> {
        let old = self.with_items_mut(|items| {
            if index >= items.len() {
                return Err(EchoError::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            Ok(items.remove(index))
        })??;
        Self::detach(&old);
        self.raise(
            ChangeKind::ListTagRemoved,
            self,
            Some(ChangeValue::Node(old.clone())),
            None,
        );
        self.renumber_from(index, false);
        Ok(old)
    }

    /// Removes the element that is `value` (by identity). Returns whether it
    /// was found.
    pub fn list_remove(&self, value: &EchoObject) -> Result<bool, EchoError> {
        let position = match &self.inner.borrow().payload {
            Payload::List(items) => items.iter().position(|item| item.ptr_eq(value)),
            _ => return Err(self.shape_error("list")),
        };
        match position {
            Some(index) => self.list_remove_at(index).map(|_| true),
            None => Ok(false),
        }
    }
}
