//! Tree diff and patch.
//!
//! [`create_delta`] computes an ordered list of [`DeltaOp`]s that turns one
//! tree into another; [`apply_delta`] replays them against a copy of a
//! baseline. A delta can itself be stored as an echo tree (see
//! [`Delta::to_echo`]) so it travels through the same codecs as any other
//! value.

mod apply;
mod diff;

pub use apply::{apply_delta, apply_delta_tree};
pub use diff::create_delta;

use crate::{DeltaError, EchoObject, TagType};

pub const OPERATIONS_KEY: &str = "Operations";
pub const KIND_KEY: &str = "Kind";
pub const PATH_KEY: &str = "Path";
pub const KEY_KEY: &str = "Key";
pub const INDEX_KEY: &str = "Index";
pub const VALUE_KEY: &str = "Value";

/// One edit. `path` always addresses the container being edited, except for
/// [`DeltaOp::SetValue`] where it addresses the replaced node itself.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaOp {
    SetValue { path: String, value: EchoObject },
    AddCompoundTag { path: String, key: String, value: EchoObject },
    RemoveCompoundTag { path: String, key: String },
    AddListItem { path: String, index: usize, value: EchoObject },
    RemoveListItem { path: String, index: usize },
}

impl DeltaOp {
    pub fn kind_name(&self) -> &'static str {
        match self {
            DeltaOp::SetValue { .. } => "SetValue",
            DeltaOp::AddCompoundTag { .. } => "AddCompoundTag",
            DeltaOp::RemoveCompoundTag { .. } => "RemoveCompoundTag",
            DeltaOp::AddListItem { .. } => "AddListItem",
            DeltaOp::RemoveListItem { .. } => "RemoveListItem",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            DeltaOp::SetValue { path, .. }
            | DeltaOp::AddCompoundTag { path, .. }
            | DeltaOp::RemoveCompoundTag { path, .. }
            | DeltaOp::AddListItem { path, .. }
            | DeltaOp::RemoveListItem { path, .. } => path,
        }
    }

    fn to_echo(&self) -> EchoObject {
        let mut entries: Vec<(&str, EchoObject)> = vec![
            (KIND_KEY, self.kind_name().into()),
            (PATH_KEY, self.path().into()),
        ];
        match self {
            DeltaOp::SetValue { value, .. } => entries.push((VALUE_KEY, value.deep_clone())),
            DeltaOp::AddCompoundTag { key, value, .. } => {
                entries.push((KEY_KEY, key.as_str().into()));
                entries.push((VALUE_KEY, value.deep_clone()));
            }
            DeltaOp::RemoveCompoundTag { key, .. } => entries.push((KEY_KEY, key.as_str().into())),
            DeltaOp::AddListItem { index, value, .. } => {
                entries.push((INDEX_KEY, index_node(*index)));
                entries.push((VALUE_KEY, value.deep_clone()));
            }
            DeltaOp::RemoveListItem { index, .. } => entries.push((INDEX_KEY, index_node(*index))),
        }
        EchoObject::build_compound(entries)
    }

    fn from_echo(node: &EchoObject) -> Result<Self, DeltaError> {
        if node.tag_type() != TagType::Compound {
            return Err(DeltaError::Malformed(format!(
                "operation must be a compound, found {}",
                node.tag_type()
            )));
        }
        let kind = required_string(node, KIND_KEY)?;
        let path = required_string(node, PATH_KEY)?;
        Ok(match kind.as_str() {
            "SetValue" => DeltaOp::SetValue {
                path,
                value: required_value(node)?,
            },
            "AddCompoundTag" => DeltaOp::AddCompoundTag {
                path,
                key: required_string(node, KEY_KEY)?,
                value: required_value(node)?,
            },
            "RemoveCompoundTag" => DeltaOp::RemoveCompoundTag {
                path,
                key: required_string(node, KEY_KEY)?,
            },
            "AddListItem" => DeltaOp::AddListItem {
                path,
                index: required_index(node)?,
                value: required_value(node)?,
            },
            "RemoveListItem" => DeltaOp::RemoveListItem {
                path,
                index: required_index(node)?,
            },
            _ => return Err(DeltaError::UnknownOperation(kind)),
        })
    }
}

fn index_node(index: usize) -> EchoObject {
    i64::try_from(index).map_or_else(|_| EchoObject::from(index as u64), EchoObject::from)
}

fn required_string(node: &EchoObject, key: &str) -> Result<String, DeltaError> {
    node.get(key)
        .filter(|field| field.tag_type() == TagType::String)
        .and_then(|field| field.try_value::<String>())
        .ok_or_else(|| DeltaError::Malformed(format!("missing string field `{key}`")))
}

fn required_index(node: &EchoObject) -> Result<usize, DeltaError> {
    node.get(INDEX_KEY)
        .filter(|field| field.tag_type().is_numeric())
        .and_then(|field| field.try_value::<usize>())
        .ok_or_else(|| DeltaError::Malformed(format!("missing index field `{INDEX_KEY}`")))
}

fn required_value(node: &EchoObject) -> Result<EchoObject, DeltaError> {
    node.get(VALUE_KEY)
        .map(|value| value.deep_clone())
        .ok_or_else(|| DeltaError::Malformed(format!("missing field `{VALUE_KEY}`")))
}

/// Ordered list of edits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    operations: Vec<DeltaOp>,
}

impl Delta {
    pub fn new(operations: Vec<DeltaOp>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[DeltaOp] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<DeltaOp> {
        self.operations
    }

    pub fn push(&mut self, op: DeltaOp) {
        self.operations.push(op);
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Stores the delta as `{ "Operations": [ { "Kind", "Path", ... } ] }`.
    pub fn to_echo(&self) -> EchoObject {
        let operations = EchoObject::build_list(self.operations.iter().map(DeltaOp::to_echo).collect());
        EchoObject::build_compound(vec![(OPERATIONS_KEY, operations)])
    }

    pub fn from_echo(tree: &EchoObject) -> Result<Self, DeltaError> {
        let operations = tree
            .get(OPERATIONS_KEY)
            .filter(EchoObject::is_list)
            .ok_or_else(|| DeltaError::Malformed(format!("missing list `{OPERATIONS_KEY}`")))?;
        let operations = operations
            .children()
            .iter()
            .map(DeltaOp::from_echo)
            .collect::<Result<_, _>>()?;
        Ok(Self { operations })
    }
}

impl From<Vec<DeltaOp>> for Delta {
    fn from(operations: Vec<DeltaOp>) -> Self {
        Self::new(operations)
    }
}

impl IntoIterator for Delta {
    type Item = DeltaOp;
    type IntoIter = std::vec::IntoIter<DeltaOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_form_preserves_operations() {
        let delta = Delta::new(vec![
            DeltaOp::SetValue {
                path: "a".into(),
                value: 1i32.into(),
            },
            DeltaOp::AddCompoundTag {
                path: "".into(),
                key: "k".into(),
                value: EchoObject::null(),
            },
            DeltaOp::RemoveListItem {
                path: "list".into(),
                index: 3,
            },
        ]);
        let tree = delta.to_echo();
        let ops = tree.get(OPERATIONS_KEY).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops.find("2/Index").unwrap().tag_type(), TagType::Long);
        assert_eq!(ops.find("0/Kind").unwrap(), EchoObject::from("SetValue"));
        assert_eq!(Delta::from_echo(&tree).unwrap(), delta);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let op = EchoObject::from_entries([("Kind", "Shuffle".into()), ("Path", "".into())]).unwrap();
        let tree = EchoObject::from_entries([("Operations", EchoObject::from_items([op]).unwrap())]).unwrap();
        assert_eq!(
            Delta::from_echo(&tree),
            Err(DeltaError::UnknownOperation("Shuffle".into()))
        );
    }

    #[test]
    fn missing_operations_list_is_malformed() {
        let tree = EchoObject::new_compound();
        assert!(matches!(Delta::from_echo(&tree), Err(DeltaError::Malformed(_))));
    }
}
