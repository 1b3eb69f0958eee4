use std::any::Any;

use crate::{Reflect, TypeInfo};

pub type FieldGetter = fn(&dyn Any) -> Option<&dyn Reflect>;
pub type FieldSetter = fn(&mut dyn Any, Box<dyn Reflect>) -> bool;
pub type FieldGuard = fn(&dyn Any) -> Option<bool>;

/// One serialized field of a struct.
///
/// `get` returns `None` for an absent optional value, which is written as
/// null. `set` returns `false` when the owner or value has the wrong type.
/// A `guard` that returns `Some(false)` skips the field on write; `None`
/// means the guard could not decide and the field is written.
#[derive(Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub declared: TypeInfo,
    pub get: FieldGetter,
    pub set: FieldSetter,
    pub aliases: Vec<&'static str>,
    pub guard: Option<FieldGuard>,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, declared: TypeInfo, get: FieldGetter, set: FieldSetter) -> Self {
        Self {
            name,
            declared,
            get,
            set,
            aliases: Vec::new(),
            guard: None,
        }
    }

    /// Former names, tried in order when `name` is missing on read.
    pub fn with_aliases(mut self, aliases: &[&'static str]) -> Self {
        self.aliases.extend_from_slice(aliases);
        self
    }

    pub fn with_guard(mut self, guard: FieldGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub(crate) fn should_write(&self, owner: &dyn Any) -> bool {
        self.guard.and_then(|guard| guard(owner)).unwrap_or(true)
    }
}

/// How to create and walk a struct. Built once per type and cached by the
/// [`TypeRegistry`](crate::TypeRegistry).
pub struct TypeDescriptor {
    pub create: fn() -> Box<dyn Reflect>,
    pub fields: Vec<FieldDescriptor>,
}

fn create_default<T: Default + Any>() -> Box<dyn Reflect> {
    Box::new(T::default())
}

impl TypeDescriptor {
    pub fn new<T: Default + Any>(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            create: create_default::<T>,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Builds a [`FieldDescriptor`] for a struct field.
///
/// ```
/// use echo_serializer::{field, FieldDescriptor, Reflect};
///
/// #[derive(Default)]
/// struct Item {
///     count: u32,
///     label: Option<String>,
///     payload: Option<Box<dyn Reflect>>,
/// }
///
/// let fields: Vec<FieldDescriptor> = vec![
///     field!(Item, "Count", count: u32),
///     field!(Item, "Label", label?: String),
///     field!(Item, "Payload", payload dyn),
/// ];
/// assert_eq!(fields[1].name, "Label");
/// ```
///
/// `name?: T` is an `Option<T>` field written as null when absent; `name dyn`
/// is an `Option<Box<dyn Reflect>>` field whose declared type is dynamic, so
/// its values always carry a type envelope under the default mode.
#[macro_export]
macro_rules! field {
    ($owner:ty, $name:literal, $field:ident : $ty:ty) => {
        $crate::FieldDescriptor::new(
            $name,
            $crate::TypeInfo::of::<$ty>(),
            |owner: &dyn ::std::any::Any| {
                owner
                    .downcast_ref::<$owner>()
                    .map(|owner| &owner.$field as &dyn $crate::Reflect)
            },
            |owner: &mut dyn ::std::any::Any, value: ::std::boxed::Box<dyn $crate::Reflect>| {
                match (owner.downcast_mut::<$owner>(), $crate::downcast::<$ty>(value)) {
                    (Some(owner), Ok(value)) => {
                        owner.$field = value;
                        true
                    }
                    _ => false,
                }
            },
        )
    };
    ($owner:ty, $name:literal, $field:ident ? : $ty:ty) => {
        $crate::FieldDescriptor::new(
            $name,
            $crate::TypeInfo::of::<$ty>(),
            |owner: &dyn ::std::any::Any| {
                owner
                    .downcast_ref::<$owner>()
                    .and_then(|owner| owner.$field.as_ref())
                    .map(|value| value as &dyn $crate::Reflect)
            },
            |owner: &mut dyn ::std::any::Any, value: ::std::boxed::Box<dyn $crate::Reflect>| {
                match (owner.downcast_mut::<$owner>(), $crate::downcast::<$ty>(value)) {
                    (Some(owner), Ok(value)) => {
                        owner.$field = Some(value);
                        true
                    }
                    _ => false,
                }
            },
        )
    };
    ($owner:ty, $name:literal, $field:ident dyn) => {
        $crate::FieldDescriptor::new(
            $name,
            $crate::TypeInfo::dynamic(),
            |owner: &dyn ::std::any::Any| {
                owner
                    .downcast_ref::<$owner>()
                    .and_then(|owner| owner.$field.as_deref())
            },
            |owner: &mut dyn ::std::any::Any, value: ::std::boxed::Box<dyn $crate::Reflect>| {
                match owner.downcast_mut::<$owner>() {
                    Some(owner) => {
                        owner.$field = Some(value);
                        true
                    }
                    None => false,
                }
            },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        a: i32,
        b: Option<String>,
        c: Option<Box<dyn Reflect>>,
    }

    #[test]
    fn generated_accessors_read_and_write() {
        let a = crate::field!(Sample, "A", a: i32);
        let b = crate::field!(Sample, "B", b?: String);
        let c = crate::field!(Sample, "C", c dyn);
        let mut sample = Sample::default();

        assert!((a.set)(&mut sample, Box::new(4i32)));
        assert!(!(a.set)(&mut sample, Box::new(4i64)));
        assert_eq!(sample.a, 4);
        assert!((b.get)(&sample).is_none());
        assert!((b.set)(&mut sample, Box::new("x".to_string())));
        let value = (b.get)(&sample).unwrap();
        assert_eq!(value.as_any().downcast_ref::<String>().map(String::as_str), Some("x"));

        assert!((c.set)(&mut sample, Box::new(1.5f64)));
        assert_eq!((c.get)(&sample).unwrap().type_info(), TypeInfo::of::<f64>());
        assert!(c.declared.is_dynamic());
    }

    #[test]
    fn guards_default_to_writing() {
        let always = crate::field!(Sample, "A", a: i32);
        assert!(always.should_write(&Sample::default()));
        let undecided = always.clone().with_guard(|_| None);
        assert!(undecided.should_write(&Sample::default()));
        let positive_only = always.with_guard(|owner| {
            owner.downcast_ref::<Sample>().map(|sample| sample.a > 0)
        });
        assert!(!positive_only.should_write(&Sample::default()));
    }
}
