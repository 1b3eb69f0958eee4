use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::SerializeError;

/// Runtime identity of a type: its [`TypeId`] plus a readable name.
///
/// Two infos are equal when their ids are; the name is only for messages.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The declared type of a slot that may hold any value.
    pub fn dynamic() -> Self {
        Self::of::<dyn Reflect>()
    }

    pub fn is_dynamic(&self) -> bool {
        *self == Self::dynamic()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A value whose concrete type can be inspected at runtime.
///
/// Implemented for every `'static` type.
pub trait Reflect: Any {
    fn type_info(&self) -> TypeInfo;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> Reflect for T {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Unboxes a reflected value as `T`.
pub fn downcast<T: Any>(value: Box<dyn Reflect>) -> Result<T, SerializeError> {
    let found = (*value).type_info();
    <dyn Reflect as Reflect>::into_any(value)
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| SerializeError::mismatch(std::any::type_name::<T>(), found.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_values_report_inner_type() {
        let value: Box<dyn Reflect> = Box::new(5i32);
        assert_eq!((*value).type_info(), TypeInfo::of::<i32>());
        assert_eq!(downcast::<i32>(value).unwrap(), 5);
    }

    #[test]
    fn downcast_mismatch_names_both_types() {
        let value: Box<dyn Reflect> = Box::new("x".to_string());
        let err = downcast::<i32>(value).unwrap_err();
        assert!(err.to_string().contains("i32"));
        assert!(err.to_string().contains("String"));
    }

    #[test]
    fn dynamic_is_distinct() {
        assert!(TypeInfo::dynamic().is_dynamic());
        assert!(!TypeInfo::of::<i32>().is_dynamic());
    }
}
