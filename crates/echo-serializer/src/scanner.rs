use echo_core::{EchoObject, TagType};
use uuid::Uuid;

use crate::{SerializationContext, SerializeError, DEPENDENCY_KEY};

/// Collects foreign references embedded in a pre-built tree.
pub trait DependencyScanner: Send + Sync {
    fn scan(&self, node: &EchoObject, ctx: &mut SerializationContext) -> Result<(), SerializeError>;
}

/// Records every UUID string stored under a given key (`$dep` by default)
/// into the innermost open dependency scope. Does nothing when no scope is
/// open.
#[derive(Debug, Clone)]
pub struct KeyDependencyScanner {
    key: String,
}

impl KeyDependencyScanner {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for KeyDependencyScanner {
    fn default() -> Self {
        Self::new(DEPENDENCY_KEY)
    }
}

impl DependencyScanner for KeyDependencyScanner {
    fn scan(&self, node: &EchoObject, ctx: &mut SerializationContext) -> Result<(), SerializeError> {
        if !ctx.has_dependency_scope() {
            return Ok(());
        }
        let mut found = Vec::new();
        node.walk(&mut |_, child| {
            if child.tag_type() != TagType::String {
                return;
            }
            if child.compound_key().as_deref() != Some(self.key.as_str()) {
                return;
            }
            if let Some(id) = child
                .try_value::<String>()
                .and_then(|text| Uuid::parse_str(&text).ok())
            {
                found.push(id);
            }
        });
        for id in found {
            ctx.add_dependency(id)?;
        }
        Ok(())
    }
}
