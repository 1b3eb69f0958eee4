use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use uuid::Uuid;

use crate::ContextError;

/// When a type envelope is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeMode {
    /// Only when the runtime type differs from the declared type.
    #[default]
    Auto,
    /// Always.
    Aggressive,
    /// Never.
    None,
}

/// State for one top-level serialize or deserialize call.
///
/// Tracks shared-object identity so cycles and repeated references are
/// written once, and collects foreign dependencies into nestable scopes.
/// Contexts are not shared between calls.
pub struct SerializationContext {
    mode: TypeMode,
    object_to_id: HashMap<usize, u32>,
    id_to_object: HashMap<u32, Rc<dyn Any>>,
    next_id: u32,
    dependency_scopes: Vec<HashSet<Uuid>>,
}

impl SerializationContext {
    /// Id 0 is reserved for null; the first registered object gets 1.
    pub const NULL_ID: u32 = 0;

    pub fn new(mode: TypeMode) -> Self {
        Self {
            mode,
            object_to_id: HashMap::new(),
            id_to_object: HashMap::new(),
            next_id: Self::NULL_ID + 1,
            dependency_scopes: Vec::new(),
        }
    }

    pub fn mode(&self) -> TypeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TypeMode) {
        self.mode = mode;
    }

    /// Id previously assigned to the object at `address`.
    pub fn id_of(&self, address: usize) -> Option<u32> {
        self.object_to_id.get(&address).copied()
    }

    pub fn object_for(&self, id: u32) -> Option<Rc<dyn Any>> {
        self.id_to_object.get(&id).cloned()
    }

    /// Assigns the next free id to `object`. The context keeps the object
    /// alive so its address cannot be reused during the call.
    pub fn register(&mut self, address: usize, object: Rc<dyn Any>) -> u32 {
        if let Some(id) = self.id_of(address) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.object_to_id.insert(address, id);
        self.id_to_object.insert(id, object);
        id
    }

    /// Records an object read back under a stored id.
    pub fn register_with_id(&mut self, id: u32, address: usize, object: Rc<dyn Any>) {
        self.object_to_id.insert(address, id);
        self.id_to_object.insert(id, object);
        self.next_id = self.next_id.max(id.saturating_add(1));
    }

    /// Number of objects with an assigned id.
    pub fn object_count(&self) -> usize {
        self.id_to_object.len()
    }

    /// Forgets all identities; dependency scopes are kept.
    pub fn clear_identities(&mut self) {
        self.object_to_id.clear();
        self.id_to_object.clear();
        self.next_id = Self::NULL_ID + 1;
    }

    pub fn begin_dependency_scope(&mut self) {
        self.dependency_scopes.push(HashSet::new());
    }

    pub fn has_dependency_scope(&self) -> bool {
        !self.dependency_scopes.is_empty()
    }

    pub fn dependency_depth(&self) -> usize {
        self.dependency_scopes.len()
    }

    /// Adds to the innermost open scope.
    pub fn add_dependency(&mut self, id: Uuid) -> Result<(), ContextError> {
        let scope = self
            .dependency_scopes
            .last_mut()
            .ok_or(ContextError::NoOpenScope)?;
        scope.insert(id);
        Ok(())
    }

    /// Closes the innermost scope and returns what it collected.
    pub fn end_dependency_scope(&mut self) -> Result<HashSet<Uuid>, ContextError> {
        self.dependency_scopes.pop().ok_or(ContextError::NoOpenScope)
    }
}

impl Default for SerializationContext {
    fn default() -> Self {
        Self::new(TypeMode::default())
    }
}
