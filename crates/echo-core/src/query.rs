//! Path lookups and traversals.

use echo_path::{format_path, join_path, parse_index, parse_path};

use crate::node::{Payload, Slot};
use crate::{EchoError, EchoObject};

impl EchoObject {
    fn segment(&self) -> Option<String> {
        self.parent()?;
        match &self.inner.borrow().slot {
            Slot::Key(key) => Some(key.clone()),
            Slot::Index(index) => Some(index.to_string()),
            Slot::Detached => None,
        }
    }

    fn child_at(&self, segment: &str) -> Option<EchoObject> {
        match &self.inner.borrow().payload {
            Payload::List(items) => parse_index(segment).and_then(|i| items.get(i).cloned()),
            Payload::Compound(map) => map.get(segment).cloned(),
            _ => None,
        }
    }

    /// Resolves a `/`-separated path against this node. Blank segments are
    /// ignored, so `""` and `"/"` both resolve to the node itself. Keys
    /// containing `~` or `/` are written `~0` and `~1`.
    pub fn find(&self, path: &str) -> Option<EchoObject> {
        parse_path(path)
            .into_iter()
            .try_fold(self.clone(), |node, segment| node.child_at(&segment))
    }

    /// Absolute path from the root; empty for a root.
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut current = self.clone();
        while let Some(segment) = current.segment() {
            segments.push(segment);
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        segments.reverse();
        format_path(&segments)
    }

    /// Path of `to` relative to its ancestor `from`.
    pub fn relative_path(from: &EchoObject, to: &EchoObject) -> Result<String, EchoError> {
        let mut segments = Vec::new();
        let mut current = to.clone();
        while !current.ptr_eq(from) {
            let segment = current.segment().ok_or(EchoError::Unreachable)?;
            segments.push(segment);
            current = current.parent().ok_or(EchoError::Unreachable)?;
        }
        segments.reverse();
        Ok(format_path(&segments))
    }

    /// Direct children matching `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&EchoObject) -> bool) -> Vec<EchoObject> {
        self.children()
            .into_iter()
            .filter(|child| predicate(child))
            .collect()
    }

    /// Maps every direct child through `f`.
    pub fn select<R>(&self, f: impl FnMut(&EchoObject) -> R) -> Vec<R> {
        self.children().iter().map(f).collect()
    }

    /// Pre-order walk over all descendants (not this node), intermediate
    /// lists and compounds included.
    pub fn walk(&self, visit: &mut impl FnMut(&str, &EchoObject)) {
        self.walk_at("", visit);
    }

    fn walk_at(&self, base: &str, visit: &mut impl FnMut(&str, &EchoObject)) {
        let entries: Vec<(String, EchoObject)> = match &self.inner.borrow().payload {
            Payload::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item.clone()))
                .collect(),
            Payload::Compound(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => return,
        };
        for (segment, child) in entries {
            let path = join_path(base, &segment);
            visit(&path, &child);
            child.walk_at(&path, visit);
        }
    }

    /// Every descendant matching `predicate`, in pre-order.
    pub fn find_all(&self, mut predicate: impl FnMut(&EchoObject) -> bool) -> Vec<EchoObject> {
        let mut found = Vec::new();
        self.walk(&mut |_, node| {
            if predicate(node) {
                found.push(node.clone());
            }
        });
        found
    }

    /// Paths, relative to this node, of every descendant matching `predicate`.
    pub fn paths_to(&self, mut predicate: impl FnMut(&EchoObject) -> bool) -> Vec<String> {
        let mut found = Vec::new();
        self.walk(&mut |path, node| {
            if predicate(node) {
                found.push(path.to_string());
            }
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use crate::{EchoError, EchoObject, TagType};

    fn sample() -> EchoObject {
        let items = EchoObject::from_items([10i32.into(), EchoObject::new_compound()]).unwrap();
        items.list_get(1).unwrap().add("deep", true.into()).unwrap();
        EchoObject::from_entries([("name", "n".into()), ("items", items)]).unwrap()
    }

    #[test]
    fn find_resolves_keys_and_indices() {
        let root = sample();
        assert_eq!(root.find("items/0").unwrap(), EchoObject::from(10i32));
        assert_eq!(root.find("/items/1/deep/").unwrap(), EchoObject::from(true));
        assert!(root.find("").unwrap().ptr_eq(&root));
        assert!(root.find("items/2").is_none());
        assert!(root.find("items/x").is_none());
        assert!(root.find("name/x").is_none());
    }

    #[test]
    fn path_and_relative_path() {
        let root = sample();
        let deep = root.find("items/1/deep").unwrap();
        assert_eq!(deep.path(), "items/1/deep");
        assert_eq!(root.path(), "");
        let items = root.get("items").unwrap();
        assert_eq!(EchoObject::relative_path(&items, &deep).unwrap(), "1/deep");
        assert_eq!(
            EchoObject::relative_path(&deep, &items),
            Err(EchoError::Unreachable)
        );
    }

    #[test]
    fn find_all_includes_intermediate_nodes() {
        let root = sample();
        let paths = root.paths_to(|_| true);
        assert_eq!(paths, vec!["name", "items", "items/0", "items/1", "items/1/deep"]);
        let compounds = root.find_all(|n| n.tag_type() == TagType::Compound);
        assert_eq!(compounds.len(), 1);
    }

    #[test]
    fn filter_and_select_direct_children() {
        let root = sample();
        let strings = root.filter(|n| n.tag_type() == TagType::String);
        assert_eq!(strings.len(), 1);
        let kinds = root.select(|n| n.tag_type());
        assert_eq!(kinds, vec![TagType::String, TagType::List]);
    }
}
