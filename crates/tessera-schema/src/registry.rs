//! Fully-qualified-name index over a descriptor set.
//!
//! The [`TypeRegistry`] walks every file in a [`DescriptorSet`] once,
//! indexing top-level and nested messages and enums under their
//! fully-qualified names (`<package>.<Outer>.<Inner>`). The resolver
//! looks types up here; it never walks the raw set itself.

use std::collections::HashMap;

use crate::descriptor::{DescriptorSet, EnumDescriptor, MessageDescriptor};
use crate::error::{SchemaError, SchemaResult};

/// Name index over one descriptor set.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    messages: HashMap<String, MessageDescriptor>,
    enums: HashMap<String, EnumDescriptor>,
}

impl TypeRegistry {
    /// Builds a registry from a descriptor set.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateType`] if two types share a
    /// fully-qualified name.
    pub fn from_set(set: &DescriptorSet) -> SchemaResult<Self> {
        let mut registry = Self::default();
        for file in &set.files {
            for message in &file.messages {
                registry.index_message(&file.package, message)?;
            }
            for e in &file.enums {
                registry.index_enum(&file.package, e)?;
            }
        }
        Ok(registry)
    }

    fn index_message(&mut self, prefix: &str, message: &MessageDescriptor) -> SchemaResult<()> {
        let fqn = qualify(prefix, &message.name);
        for nested in &message.messages {
            self.index_message(&fqn, nested)?;
        }
        for e in &message.enums {
            self.index_enum(&fqn, e)?;
        }
        if self.messages.insert(fqn.clone(), message.clone()).is_some() {
            return Err(SchemaError::DuplicateType(fqn));
        }
        Ok(())
    }

    fn index_enum(&mut self, prefix: &str, e: &EnumDescriptor) -> SchemaResult<()> {
        let fqn = qualify(prefix, &e.name);
        if self.enums.insert(fqn.clone(), e.clone()).is_some() {
            return Err(SchemaError::DuplicateType(fqn));
        }
        Ok(())
    }

    /// Looks up a message descriptor by fully-qualified name.
    #[must_use]
    pub fn message(&self, fqn: &str) -> Option<&MessageDescriptor> {
        self.messages.get(fqn)
    }

    /// Looks up an enum descriptor by fully-qualified name.
    #[must_use]
    pub fn enum_type(&self, fqn: &str) -> Option<&EnumDescriptor> {
        self.enums.get(fqn)
    }

    /// Number of indexed message types.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Number of indexed enum types.
    #[must_use]
    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }
}

/// Joins a package or outer-type prefix with a declared name.
#[must_use]
pub fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
