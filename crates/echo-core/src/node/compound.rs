use indexmap::IndexMap;

use super::{EchoObject, Payload, Slot};
use crate::event::{ChangeKind, ChangeValue};
use crate::EchoError;

fn validate_key(key: &str) -> Result<(), EchoError> {
    if key.trim().is_empty() {
        return Err(EchoError::BlankKey);
    }
    Ok(())
}

impl EchoObject {
    fn with_map<R>(&self, f: impl FnOnce(&IndexMap<String, EchoObject>) -> R) -> Result<R, EchoError> {
        match &self.inner.borrow().payload {
            Payload::Compound(map) => Ok(f(map)),
            _ => Err(self.shape_error("compound")),
        }
    }

    fn with_map_mut<R>(
        &self,
        f: impl FnOnce(&mut IndexMap<String, EchoObject>) -> R,
    ) -> Result<R, EchoError> {
        let found = self.tag_type();
        match &mut self.inner.borrow_mut().payload {
            Payload::Compound(map) => Ok(f(map)),
            _ => Err(EchoError::Shape {
                expected: "compound",
                found,
            }),
        }
    }

    /// The child stored under `key`. `None` when absent or when this node is
    /// not a compound.
    pub fn get(&self, key: &str) -> Option<EchoObject> {
        self.with_map(|map| map.get(key).cloned()).ok().flatten()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.with_map(|map| map.contains_key(key)).unwrap_or(false)
    }

    /// Keys in insertion order.
    pub fn names(&self) -> Result<Vec<String>, EchoError> {
        self.with_map(|map| map.keys().cloned().collect())
    }

    /// Entries in insertion order.
    pub fn tags(&self) -> Result<Vec<(String, EchoObject)>, EchoError> {
        self.with_map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Adds a new entry. Fails when the key is blank or taken, or when
    /// `value` is attached elsewhere.
    pub fn add(&self, key: &str, value: EchoObject) -> Result<(), EchoError> {
        validate_key(key)?;
        if !self.is_compound() {
            return Err(self.shape_error("compound"));
        }
        self.check_attachable(&value)?;
        self.with_map_mut(|map| {
            if map.contains_key(key) {
                return Err(EchoError::DuplicateKey(key.to_string()));
            }
            map.insert(key.to_string(), value.clone());
            Ok(())
        })??;
        self.attach(&value, Slot::Key(key.to_string()));
        self.raise(
            ChangeKind::TagAdded,
            self,
            None,
            Some(ChangeValue::Node(value)),
        );
        Ok(())
    }

    /// Inserts or replaces the entry under `key`. A replaced child is detached
    /// and keeps its position in key order.
    pub fn set(&self, key: &str, value: EchoObject) -> Result<(), EchoError> {
        validate_key(key)?;
        if !self.is_compound() {
            return Err(self.shape_error("compound"));
        }
        self.check_attachable(&value)?;
        let old = self.with_map_mut(|map| map.insert(key.to_string(), value.clone()))?;
        if let Some(old) = &old {
            Self::detach(old);
        }
        self.attach(&value, Slot::Key(key.to_string()));
        if let Some(old) = old {
            self.raise(
                ChangeKind::TagRemoved,
                self,
                Some(ChangeValue::Node(old)),
                None,
            );
        }
        self.raise(
            ChangeKind::TagAdded,
            self,
            None,
            Some(ChangeValue::Node(value)),
        );
        Ok(())
    }

    /// Removes the entry under `key`, returning whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool, EchoError> {
        let Some(old) = self.with_map_mut(|map| map.shift_remove(key))? else {
            return Ok(false);
        };
        Self::detach(&old);
        self.raise(
            ChangeKind::TagRemoved,
            self,
            Some(ChangeValue::Node(old)),
            None,
        );
        Ok(true)
    }

    /// Moves the entry under `old` to `new`, keeping its position. Fails when
    /// `old` is absent or `new` is taken, including when they are equal.
    pub fn rename(&self, old: &str, new: &str) -> Result<(), EchoError> {
        validate_key(new)?;
        let child = self.with_map_mut(|map| {
            let Some(index) = map.get_index_of(old) else {
                return Err(EchoError::MissingKey(old.to_string()));
            };
            if map.contains_key(new) {
                return Err(EchoError::DuplicateKey(new.to_string()));
            }
            let Some((_, child)) = map.shift_remove_index(index) else {
                return Err(EchoError::MissingKey(old.to_string()));
            };
            map.shift_insert(index, new.to_string(), child.clone());
            Ok(child)
        })??;
        Self::set_slot(&child, Slot::Key(new.to_string()));
        self.raise(
            ChangeKind::TagRenamed,
            &child,
            Some(ChangeValue::Key(old.to_string())),
            Some(ChangeValue::Key(new.to_string())),
        );
        Ok(())
    }
}
