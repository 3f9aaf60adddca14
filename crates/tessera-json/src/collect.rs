//! Property collection.
//!
//! Pairs a resolved object/union's properties with the concrete values
//! of a live instance, in property (declaration) order. Walks each
//! property's field path through the instance:
//!
//! - an absent field at any segment skips the property (and everything
//!   under it) — that is "no value to emit", not an error
//! - a present non-final segment must be message-typed; anything else
//!   is an instance/schema inconsistency
//! - synthetic grouping properties have no path of their own; the
//!   collector recurses into the grouping's members against the same
//!   instance and keeps the grouping only when at least one member is
//!   populated

use tessera_schema::{MessageValue, Property, Value};

use crate::error::{join_key, CodecError, CodecResult};

/// One collected property: the schema property paired with either its
/// leaf value or, for groupings, its populated members.
#[derive(Debug)]
pub struct CollectedProperty<'a> {
    pub property: &'a Property,
    pub entry: CollectedEntry<'a>,
}

/// The populated side of a collected property.
#[derive(Debug)]
pub enum CollectedEntry<'a> {
    /// A directly-addressed value.
    Value(&'a Value),
    /// Populated members of a synthetic grouping.
    Group(Vec<CollectedProperty<'a>>),
}

/// Collects the populated properties of `instance`, in property order.
///
/// # Errors
///
/// Returns [`CodecError::InvalidValue`] when a non-final path segment
/// resolves to a non-message value.
pub fn collect<'a>(
    properties: &'a [Property],
    instance: &'a MessageValue,
    path: &str,
) -> CodecResult<Vec<CollectedProperty<'a>>> {
    let mut out = Vec::new();
    for property in properties {
        if property.is_group() {
            let children = collect(group_members(property)?, instance, path)?;
            if !children.is_empty() {
                out.push(CollectedProperty {
                    property,
                    entry: CollectedEntry::Group(children),
                });
            }
            continue;
        }

        if let Some(value) = walk_path(instance, property, path)? {
            out.push(CollectedProperty {
                property,
                entry: CollectedEntry::Value(value),
            });
        }
    }
    Ok(out)
}

/// The member property list of a synthetic grouping property.
fn group_members(property: &Property) -> CodecResult<&[Property]> {
    match &property.schema {
        tessera_schema::Schema::Union(u) => Ok(&u.properties),
        other => Err(CodecError::InvalidValue {
            path: property.json_name.clone(),
            message: format!("grouping property resolved to {}", other.kind_name()),
        }),
    }
}

/// Walks a property's field path through the instance.
fn walk_path<'a>(
    instance: &'a MessageValue,
    property: &Property,
    path: &str,
) -> CodecResult<Option<&'a Value>> {
    let mut current = instance;
    let last = property.field_path.len() - 1;
    for (i, segment) in property.field_path.iter().enumerate() {
        match current.get(segment.number) {
            None => return Ok(None),
            Some(value) if i == last => return Ok(Some(value)),
            Some(Value::Message(nested)) => current = nested,
            Some(other) => {
                return Err(CodecError::InvalidValue {
                    path: join_key(path, &property.json_name),
                    message: format!(
                        "intermediate field {} is {}, expected a message",
                        segment.number,
                        other.kind_name()
                    ),
                })
            }
        }
    }
    Ok(None)
}
