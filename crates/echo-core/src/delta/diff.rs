//! Delta creation: a structural diff between two echo trees.

use echo_path::join_path;
use tracing::debug;

use super::{Delta, DeltaOp};
use crate::{EchoObject, TagType};

// ── Public API ────────────────────────────────────────────────────────────

/// Computes the operations that turn `from` into `to`.
///
/// Applying the result to `from` yields a tree equal to `to`; diffing a tree
/// with an equal tree yields no operations. Lists are compared position by
/// position: a shared prefix is diffed recursively, surplus target elements
/// are appended in ascending order and surplus source elements are removed
/// from the back.
pub fn create_delta(from: &EchoObject, to: &EchoObject) -> Delta {
    let mut ops = Vec::new();
    diff_at_path(&mut ops, "", from, to);
    debug!(operations = ops.len(), "created delta");
    Delta::new(ops)
}

// ── Core recursive differ ─────────────────────────────────────────────────

fn diff_at_path(ops: &mut Vec<DeltaOp>, path: &str, from: &EchoObject, to: &EchoObject) {
    let kind = from.tag_type();
    if kind != to.tag_type() {
        set_value(ops, path, to);
        return;
    }
    match kind {
        TagType::Compound => diff_compound(ops, path, from, to),
        TagType::List => diff_list(ops, path, from, to),
        _ => {
            if from != to {
                set_value(ops, path, to);
            }
        }
    }
}

fn set_value(ops: &mut Vec<DeltaOp>, path: &str, to: &EchoObject) {
    ops.push(DeltaOp::SetValue {
        path: path.to_string(),
        value: to.deep_clone(),
    });
}

fn diff_compound(ops: &mut Vec<DeltaOp>, path: &str, from: &EchoObject, to: &EchoObject) {
    let from_tags = from.tags().unwrap_or_default();
    // Remove or recurse, in source key order
    for (key, from_child) in &from_tags {
        match to.get(key) {
            None => ops.push(DeltaOp::RemoveCompoundTag {
                path: path.to_string(),
                key: key.clone(),
            }),
            Some(to_child) => diff_at_path(ops, &join_path(path, key), from_child, &to_child),
        }
    }
    // Add keys only present in the target
    for (key, to_child) in to.tags().unwrap_or_default() {
        if !from.contains(&key) {
            ops.push(DeltaOp::AddCompoundTag {
                path: path.to_string(),
                key,
                value: to_child.deep_clone(),
            });
        }
    }
}

fn diff_list(ops: &mut Vec<DeltaOp>, path: &str, from: &EchoObject, to: &EchoObject) {
    let from_items = from.list_items().unwrap_or_default();
    let to_items = to.list_items().unwrap_or_default();
    let shared = from_items.len().min(to_items.len());
    for (index, (a, b)) in from_items.iter().zip(&to_items).enumerate() {
        diff_at_path(ops, &join_path(path, &index.to_string()), a, b);
    }
    for (index, item) in to_items.iter().enumerate().skip(shared) {
        ops.push(DeltaOp::AddListItem {
            path: path.to_string(),
            index,
            value: item.deep_clone(),
        });
    }
    // Remove from the end to avoid index shifting
    for index in (shared..from_items.len()).rev() {
        ops.push(DeltaOp::RemoveListItem {
            path: path.to_string(),
            index,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(health: i32, extra: Option<(&str, i32)>) -> EchoObject {
        let node = EchoObject::from_entries([("Health", EchoObject::from(health))]).unwrap();
        if let Some((key, value)) = extra {
            node.add(key, value.into()).unwrap();
        }
        node
    }

    #[test]
    fn equal_trees_have_empty_delta() {
        let a = player(1, Some(("x", 2)));
        assert!(create_delta(&a, &a.deep_clone()).is_empty());
    }

    #[test]
    fn kind_change_is_a_set_value() {
        let from = EchoObject::from(1i32);
        let to = EchoObject::from(1i64);
        let delta = create_delta(&from, &to);
        assert_eq!(
            delta.operations(),
            &[DeltaOp::SetValue {
                path: "".into(),
                value: 1i64.into()
            }]
        );
    }

    #[test]
    fn compound_changes_in_source_order_then_additions() {
        let from = player(100, Some(("Old", 1)));
        let to = player(75, Some(("Mana", 10)));
        let kinds: Vec<_> = create_delta(&from, &to)
            .operations()
            .iter()
            .map(DeltaOp::kind_name)
            .collect();
        assert_eq!(kinds, vec!["SetValue", "RemoveCompoundTag", "AddCompoundTag"]);
    }

    #[test]
    fn list_tail_removed_from_the_back() {
        let from = EchoObject::from_items((0..4).map(EchoObject::from)).unwrap();
        let to = EchoObject::from_items((0..2).map(EchoObject::from)).unwrap();
        let delta = create_delta(&from, &to);
        assert_eq!(
            delta.operations(),
            &[
                DeltaOp::RemoveListItem {
                    path: "".into(),
                    index: 3
                },
                DeltaOp::RemoveListItem {
                    path: "".into(),
                    index: 2
                },
            ]
        );
    }
}
