//! Node handle, payload storage and structural identity.

mod compound;
mod list;

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use bigdecimal::BigDecimal;
use indexmap::IndexMap;

use crate::event::{ChangeKind, ChangeValue, Listeners};
use crate::{EchoError, TagType};

pub(crate) type NodeRef = Rc<RefCell<NodeData>>;
pub(crate) type WeakNodeRef = Weak<RefCell<NodeData>>;

/// Where a node is stored inside its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    Detached,
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Null,
    Byte(u8),
    SByte(i8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    String(String),
    ByteArray(Vec<u8>),
    Bool(bool),
    List(Vec<EchoObject>),
    Compound(IndexMap<String, EchoObject>),
}

impl Payload {
    pub(crate) fn tag_type(&self) -> TagType {
        match self {
            Payload::Null => TagType::Null,
            Payload::Byte(_) => TagType::Byte,
            Payload::SByte(_) => TagType::SByte,
            Payload::Short(_) => TagType::Short,
            Payload::UShort(_) => TagType::UShort,
            Payload::Int(_) => TagType::Int,
            Payload::UInt(_) => TagType::UInt,
            Payload::Long(_) => TagType::Long,
            Payload::ULong(_) => TagType::ULong,
            Payload::Float(_) => TagType::Float,
            Payload::Double(_) => TagType::Double,
            Payload::Decimal(_) => TagType::Decimal,
            Payload::String(_) => TagType::String,
            Payload::ByteArray(_) => TagType::ByteArray,
            Payload::Bool(_) => TagType::Bool,
            Payload::List(_) => TagType::List,
            Payload::Compound(_) => TagType::Compound,
        }
    }

    fn children(&self) -> Vec<EchoObject> {
        match self {
            Payload::List(items) => items.clone(),
            Payload::Compound(map) => map.values().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

pub(crate) struct NodeData {
    pub(crate) payload: Payload,
    pub(crate) parent: Option<WeakNodeRef>,
    pub(crate) slot: Slot,
    pub(crate) listeners: Listeners,
}

/// A node of an echo tree.
///
/// `EchoObject` is a cheap handle: [`Clone`] shares the node, it does not
/// copy it. Use [`EchoObject::deep_clone`] for an independent, detached copy.
///
/// Equality and hashing are structural. Two nodes are equal when they have the
/// same [`TagType`] and equal contents; compounds compare without regard to
/// key order and a NaN float is never equal to anything, itself included.
#[derive(Clone)]
pub struct EchoObject {
    pub(crate) inner: NodeRef,
}

impl EchoObject {
    pub(crate) fn from_payload(payload: Payload) -> Self {
        let node = EchoObject {
            inner: Rc::new(RefCell::new(NodeData {
                payload,
                parent: None,
                slot: Slot::Detached,
                listeners: Listeners::default(),
            })),
        };
        node.adopt_children();
        node
    }

    /// Builds a compound from freshly created, detached nodes. Later entries
    /// replace earlier ones with the same key.
    pub(crate) fn build_compound<K: Into<String>>(entries: Vec<(K, EchoObject)>) -> Self {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::from_payload(Payload::Compound(map))
    }

    pub(crate) fn build_list(items: Vec<EchoObject>) -> Self {
        Self::from_payload(Payload::List(items))
    }

    pub fn null() -> Self {
        Self::from_payload(Payload::Null)
    }

    pub fn new_compound() -> Self {
        Self::from_payload(Payload::Compound(IndexMap::new()))
    }

    pub fn new_list() -> Self {
        Self::from_payload(Payload::List(Vec::new()))
    }

    /// Builds a compound from `entries`, validating them like [`EchoObject::add`].
    pub fn from_entries<K: AsRef<str>>(
        entries: impl IntoIterator<Item = (K, EchoObject)>,
    ) -> Result<Self, EchoError> {
        let node = Self::new_compound();
        for (key, value) in entries {
            node.add(key.as_ref(), value)?;
        }
        Ok(node)
    }

    /// Builds a list from `items`, validating them like [`EchoObject::list_add`].
    pub fn from_items(items: impl IntoIterator<Item = EchoObject>) -> Result<Self, EchoError> {
        let node = Self::new_list();
        for item in items {
            node.list_add(item)?;
        }
        Ok(node)
    }

    pub fn tag_type(&self) -> TagType {
        self.inner.borrow().payload.tag_type()
    }

    pub fn is_null(&self) -> bool {
        self.tag_type() == TagType::Null
    }

    pub fn is_compound(&self) -> bool {
        self.tag_type() == TagType::Compound
    }

    pub fn is_list(&self) -> bool {
        self.tag_type() == TagType::List
    }

    /// True when both handles refer to the same node.
    pub fn ptr_eq(&self, other: &EchoObject) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn parent(&self) -> Option<EchoObject> {
        let data = self.inner.borrow();
        data.parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| EchoObject { inner })
    }

    pub fn has_parent(&self) -> bool {
        self.parent().is_some()
    }

    /// The key this node is stored under, when its parent is a compound.
    pub fn compound_key(&self) -> Option<String> {
        if !self.has_parent() {
            return None;
        }
        match &self.inner.borrow().slot {
            Slot::Key(key) => Some(key.clone()),
            _ => None,
        }
    }

    /// The position of this node, when its parent is a list.
    pub fn list_index(&self) -> Option<usize> {
        if !self.has_parent() {
            return None;
        }
        match self.inner.borrow().slot {
            Slot::Index(index) => Some(index),
            _ => None,
        }
    }

    /// Number of list elements or compound entries; zero for primitives.
    pub fn len(&self) -> usize {
        match &self.inner.borrow().payload {
            Payload::List(items) => items.len(),
            Payload::Compound(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct children in storage order.
    pub fn children(&self) -> Vec<EchoObject> {
        self.inner.borrow().payload.children()
    }

    /// Independent copy of the whole subtree. The copy has no parent and no
    /// listeners, and no events are raised.
    pub fn deep_clone(&self) -> EchoObject {
        let payload = {
            let data = self.inner.borrow();
            match &data.payload {
                Payload::List(items) => Payload::List(items.iter().map(Self::deep_clone).collect()),
                Payload::Compound(map) => Payload::Compound(
                    map.iter()
                        .map(|(k, v)| (k.clone(), v.deep_clone()))
                        .collect(),
                ),
                other => other.clone(),
            }
        };
        Self::from_payload(payload)
    }

    /// Replaces a primitive value with another primitive, possibly of a
    /// different kind. Raises [`ChangeKind::ValueChanged`].
    pub fn set_value(&self, value: impl Into<EchoObject>) -> Result<(), EchoError> {
        let value = value.into();
        let found = self.tag_type();
        if found.is_container() {
            return Err(EchoError::Shape {
                expected: "primitive",
                found,
            });
        }
        let new_payload = {
            let data = value.inner.borrow();
            if data.payload.tag_type().is_container() {
                return Err(EchoError::NotPrimitive(data.payload.tag_type()));
            }
            data.payload.clone()
        };
        let old_payload = std::mem::replace(&mut self.inner.borrow_mut().payload, new_payload.clone());
        self.raise(
            ChangeKind::ValueChanged,
            self,
            Some(ChangeValue::Node(Self::from_payload(old_payload))),
            Some(ChangeValue::Node(Self::from_payload(new_payload))),
        );
        Ok(())
    }

    /// Replaces the whole contents of this node with a deep copy of `value`,
    /// keeping the node's identity, parent and slot. The kind may change.
    /// Raises [`ChangeKind::ValueChanged`].
    pub fn replace_contents(&self, value: &EchoObject) {
        let copy = value.deep_clone();
        let new_payload = std::mem::replace(&mut copy.inner.borrow_mut().payload, Payload::Null);
        let old_payload = std::mem::replace(&mut self.inner.borrow_mut().payload, new_payload);
        // the old children now hang off the snapshot
        let old = Self::from_payload(old_payload);
        self.adopt_children();
        self.raise(
            ChangeKind::ValueChanged,
            self,
            Some(ChangeValue::Node(old)),
            Some(ChangeValue::Node(value.deep_clone())),
        );
    }

    /// Points every child's parent link and slot at this node.
    fn adopt_children(&self) {
        let children: Vec<(Slot, EchoObject)> = match &self.inner.borrow().payload {
            Payload::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (Slot::Index(i), item.clone()))
                .collect(),
            Payload::Compound(map) => map
                .iter()
                .map(|(k, v)| (Slot::Key(k.clone()), v.clone()))
                .collect(),
            _ => return,
        };
        for (slot, child) in children {
            self.attach(&child, slot);
        }
    }

    pub(crate) fn attach(&self, child: &EchoObject, slot: Slot) {
        let mut data = child.inner.borrow_mut();
        data.parent = Some(Rc::downgrade(&self.inner));
        data.slot = slot;
    }

    pub(crate) fn detach(child: &EchoObject) {
        let mut data = child.inner.borrow_mut();
        data.parent = None;
        data.slot = Slot::Detached;
    }

    pub(crate) fn set_slot(child: &EchoObject, slot: Slot) {
        child.inner.borrow_mut().slot = slot;
    }

    /// Rejects values that are already attached, and values that are this
    /// node or one of its ancestors.
    pub(crate) fn check_attachable(&self, value: &EchoObject) -> Result<(), EchoError> {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.ptr_eq(value) {
                return Err(EchoError::SelfAttachment);
            }
            current = node.parent();
        }
        if value.has_parent() {
            return Err(EchoError::AlreadyAttached);
        }
        Ok(())
    }

    pub(crate) fn shape_error(&self, expected: &'static str) -> EchoError {
        EchoError::Shape {
            expected,
            found: self.tag_type(),
        }
    }
}

impl Default for EchoObject {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for EchoObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(data) => fmt::Debug::fmt(&data.payload, f),
            Err(_) => f.write_str("<borrowed>"),
        }
    }
}

fn payload_eq(a: &Payload, b: &Payload) -> bool {
    match (a, b) {
        (Payload::Null, Payload::Null) => true,
        (Payload::Byte(a), Payload::Byte(b)) => a == b,
        (Payload::SByte(a), Payload::SByte(b)) => a == b,
        (Payload::Short(a), Payload::Short(b)) => a == b,
        (Payload::UShort(a), Payload::UShort(b)) => a == b,
        (Payload::Int(a), Payload::Int(b)) => a == b,
        (Payload::UInt(a), Payload::UInt(b)) => a == b,
        (Payload::Long(a), Payload::Long(b)) => a == b,
        (Payload::ULong(a), Payload::ULong(b)) => a == b,
        (Payload::Float(a), Payload::Float(b)) => a == b,
        (Payload::Double(a), Payload::Double(b)) => a == b,
        (Payload::Decimal(a), Payload::Decimal(b)) => a == b,
        (Payload::String(a), Payload::String(b)) => a == b,
        (Payload::ByteArray(a), Payload::ByteArray(b)) => a == b,
        (Payload::Bool(a), Payload::Bool(b)) => a == b,
        (Payload::List(a), Payload::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
        }
        (Payload::Compound(a), Payload::Compound(b)) => {
            a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v == w))
        }
        _ => false,
    }
}

impl PartialEq for EchoObject {
    fn eq(&self, other: &Self) -> bool {
        let a = self.inner.borrow();
        let b = other.inner.borrow();
        payload_eq(&a.payload, &b.payload)
    }
}

fn hash_float<H: Hasher>(value: f64, state: &mut H) {
    // 0.0 and -0.0 compare equal
    let value = if value == 0.0 { 0.0 } else { value };
    state.write_u64(value.to_bits());
}

impl Hash for EchoObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let data = self.inner.borrow();
        state.write_u8(data.payload.tag_type().as_u8());
        match &data.payload {
            Payload::Null => {}
            Payload::Byte(v) => v.hash(state),
            Payload::SByte(v) => v.hash(state),
            Payload::Short(v) => v.hash(state),
            Payload::UShort(v) => v.hash(state),
            Payload::Int(v) => v.hash(state),
            Payload::UInt(v) => v.hash(state),
            Payload::Long(v) => v.hash(state),
            Payload::ULong(v) => v.hash(state),
            Payload::Float(v) => hash_float(f64::from(*v), state),
            Payload::Double(v) => hash_float(*v, state),
            Payload::Decimal(v) => v.normalized().hash(state),
            Payload::String(v) => v.hash(state),
            Payload::ByteArray(v) => v.hash(state),
            Payload::Bool(v) => v.hash(state),
            Payload::List(items) => {
                state.write_usize(items.len());
                for item in items {
                    item.hash(state);
                }
            }
            Payload::Compound(map) => {
                let mut sum = 0u64;
                for (key, value) in map {
                    let mut entry = DefaultHasher::new();
                    key.hash(&mut entry);
                    value.hash(&mut entry);
                    sum = sum.wrapping_add(entry.finish());
                }
                state.write_usize(map.len());
                state.write_u64(sum);
            }
        }
    }
}

macro_rules! from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for EchoObject {
                fn from(value: $ty) -> Self {
                    EchoObject::from_payload(Payload::$variant(value))
                }
            }
        )*
    };
}

from_primitive! {
    u8 => Byte,
    i8 => SByte,
    i16 => Short,
    u16 => UShort,
    i32 => Int,
    u32 => UInt,
    i64 => Long,
    u64 => ULong,
    f32 => Float,
    f64 => Double,
    BigDecimal => Decimal,
    String => String,
    Vec<u8> => ByteArray,
    bool => Bool,
}

impl From<&str> for EchoObject {
    fn from(value: &str) -> Self {
        EchoObject::from_payload(Payload::String(value.to_string()))
    }
}

impl From<&[u8]> for EchoObject {
    fn from(value: &[u8]) -> Self {
        EchoObject::from_payload(Payload::ByteArray(value.to_vec()))
    }
}

impl<T: Into<EchoObject>> From<Option<T>> for EchoObject {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(EchoObject::null, Into::into)
    }
}

/// Read access to primitive payloads, used by the value coercions and the
/// codecs.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Byte(u8),
    SByte(i8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    String(String),
    ByteArray(Vec<u8>),
    Bool(bool),
}

impl EchoObject {
    /// Snapshot of the primitive value, or `None` for lists and compounds.
    pub fn primitive(&self) -> Option<Primitive> {
        Some(match &self.inner.borrow().payload {
            Payload::Null => Primitive::Null,
            Payload::Byte(v) => Primitive::Byte(*v),
            Payload::SByte(v) => Primitive::SByte(*v),
            Payload::Short(v) => Primitive::Short(*v),
            Payload::UShort(v) => Primitive::UShort(*v),
            Payload::Int(v) => Primitive::Int(*v),
            Payload::UInt(v) => Primitive::UInt(*v),
            Payload::Long(v) => Primitive::Long(*v),
            Payload::ULong(v) => Primitive::ULong(*v),
            Payload::Float(v) => Primitive::Float(*v),
            Payload::Double(v) => Primitive::Double(*v),
            Payload::Decimal(v) => Primitive::Decimal(v.clone()),
            Payload::String(v) => Primitive::String(v.clone()),
            Payload::ByteArray(v) => Primitive::ByteArray(v.clone()),
            Payload::Bool(v) => Primitive::Bool(*v),
            Payload::List(_) | Payload::Compound(_) => return None,
        })
    }
}

impl From<Primitive> for EchoObject {
    fn from(value: Primitive) -> Self {
        EchoObject::from_payload(match value {
            Primitive::Null => Payload::Null,
            Primitive::Byte(v) => Payload::Byte(v),
            Primitive::SByte(v) => Payload::SByte(v),
            Primitive::Short(v) => Payload::Short(v),
            Primitive::UShort(v) => Payload::UShort(v),
            Primitive::Int(v) => Payload::Int(v),
            Primitive::UInt(v) => Payload::UInt(v),
            Primitive::Long(v) => Payload::Long(v),
            Primitive::ULong(v) => Payload::ULong(v),
            Primitive::Float(v) => Payload::Float(v),
            Primitive::Double(v) => Payload::Double(v),
            Primitive::Decimal(v) => Payload::Decimal(v),
            Primitive::String(v) => Payload::String(v),
            Primitive::ByteArray(v) => Payload::ByteArray(v),
            Primitive::Bool(v) => Payload::Bool(v),
        })
    }
}
