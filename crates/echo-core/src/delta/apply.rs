//! Delta replay.

use echo_path::{parse_index, split_parent};
use tracing::{debug, trace};

use super::{Delta, DeltaOp};
use crate::{DeltaError, EchoObject, TagType};

// ── Path navigation ───────────────────────────────────────────────────────

fn resolve(root: &EchoObject, path: &str) -> Result<EchoObject, DeltaError> {
    root.find(path)
        .ok_or_else(|| DeltaError::UnresolvedPath(path.to_string()))
}

fn resolve_compound(root: &EchoObject, path: &str) -> Result<EchoObject, DeltaError> {
    let target = resolve(root, path)?;
    if target.tag_type() != TagType::Compound {
        return Err(DeltaError::NotCompound(path.to_string()));
    }
    Ok(target)
}

fn resolve_list(root: &EchoObject, path: &str) -> Result<EchoObject, DeltaError> {
    let target = resolve(root, path)?;
    if target.tag_type() != TagType::List {
        return Err(DeltaError::NotList(path.to_string()));
    }
    Ok(target)
}

// ── Individual operation applicators ─────────────────────────────────────

fn apply_set(root: &EchoObject, path: &str, value: &EchoObject) -> Result<(), DeltaError> {
    let Some((parent_path, leaf)) = split_parent(path) else {
        trace!(kind = %value.tag_type(), "replacing root");
        root.replace_contents(value);
        return Ok(());
    };
    let parent = resolve(root, &parent_path)?;
    match parent.tag_type() {
        TagType::Compound => parent.set(&leaf, value.deep_clone())?,
        TagType::List => {
            let index = parse_index(&leaf)
                .ok_or_else(|| DeltaError::UnresolvedPath(path.to_string()))?;
            parent.list_set(index, value.deep_clone())?;
        }
        _ => return Err(DeltaError::UnresolvedPath(path.to_string())),
    }
    Ok(())
}

fn apply_op(root: &EchoObject, op: &DeltaOp) -> Result<(), DeltaError> {
    trace!(kind = op.kind_name(), path = op.path(), "applying delta operation");
    match op {
        DeltaOp::SetValue { path, value } => apply_set(root, path, value),
        DeltaOp::AddCompoundTag { path, key, value } => {
            resolve_compound(root, path)?.add(key, value.deep_clone())?;
            Ok(())
        }
        DeltaOp::RemoveCompoundTag { path, key } => {
            resolve_compound(root, path)?.remove(key)?;
            Ok(())
        }
        DeltaOp::AddListItem { path, index, value } => {
            resolve_list(root, path)?.list_insert(*index, value.deep_clone())?;
            Ok(())
        }
        DeltaOp::RemoveListItem { path, index } => {
            resolve_list(root, path)?.list_remove_at(*index)?;
            Ok(())
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────

/// Replays `delta` against a deep copy of `baseline` and returns the copy.
/// The baseline is never modified.
pub fn apply_delta(baseline: &EchoObject, delta: &Delta) -> Result<EchoObject, DeltaError> {
    let root = baseline.deep_clone();
    for op in delta.operations() {
        apply_op(&root, op)?;
    }
    debug!(operations = delta.len(), "applied delta");
    Ok(root)
}

/// Same as [`apply_delta`] for a delta stored in tree form.
pub fn apply_delta_tree(baseline: &EchoObject, tree: &EchoObject) -> Result<EchoObject, DeltaError> {
    apply_delta(baseline, &Delta::from_echo(tree)?)
}
