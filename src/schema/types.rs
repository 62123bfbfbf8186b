//! Declared field types.
//!
//! A [`TypeDescriptor`] is either a single [`FieldType`] or an ordered union of
//! them. Type names written as text are normalized to one canonical vocabulary
//! before comparison, so `integer` and `int` describe the same field.

use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::value::{Value, ValueKind};

use super::Schema;

/// One nominal type a field may hold.
#[derive(Debug, Clone)]
pub enum FieldType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Map,
    /// Another schema. Plain maps supplied for this type are bound with it.
    Schema(Arc<Schema>),
}

impl FieldType {
    /// Parses a single type name, normalizing aliases.
    ///
    /// Only scalar and container names are recognized; nested schemas are
    /// declared with [`FieldType::Schema`].
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim() {
            "null" | "NULL" => Ok(FieldType::Null),
            "bool" | "boolean" => Ok(FieldType::Bool),
            "int" | "integer" => Ok(FieldType::Int),
            "float" | "double" => Ok(FieldType::Float),
            "string" => Ok(FieldType::String),
            "array" | "list" => Ok(FieldType::Array),
            "map" | "object" | "dict" => Ok(FieldType::Map),
            other => Err(ConfigError::UnknownType(other.to_string())),
        }
    }

    /// Does a value of runtime type `kind` satisfy this type?
    pub fn accepts(&self, kind: ValueKind) -> bool {
        matches!(
            (self, kind),
            (FieldType::Null, ValueKind::Null)
                | (FieldType::Bool, ValueKind::Bool)
                | (FieldType::Int, ValueKind::Int)
                | (FieldType::Float, ValueKind::Float)
                | (FieldType::String, ValueKind::String)
                | (FieldType::Array, ValueKind::Array)
                | (FieldType::Map, ValueKind::Map)
        )
    }

    /// The canonical name used in diagnostics.
    pub fn name(&self) -> &str {
        match self {
            FieldType::Null => "null",
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::String => "string",
            FieldType::Array => "array",
            FieldType::Map => "map",
            FieldType::Schema(schema) => schema.name(),
        }
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldType::Schema(a), FieldType::Schema(b)) => a.name() == b.name(),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Arc<Schema>> for FieldType {
    fn from(schema: Arc<Schema>) -> Self {
        FieldType::Schema(schema)
    }
}

impl From<&Arc<Schema>> for FieldType {
    fn from(schema: &Arc<Schema>) -> Self {
        FieldType::Schema(Arc::clone(schema))
    }
}

/// The declared type of a field: one type or a union of alternatives.
///
/// # Example
///
/// ```rust
/// use structbind::{FieldType, TypeDescriptor, Value};
///
/// let id: TypeDescriptor = "int|string".parse().unwrap();
/// assert!(id.admits(&Value::from(7)));
/// assert!(id.admits(&Value::from("seven")));
/// assert!(!id.admits(&Value::from(7.0)));
/// assert_eq!(id.to_string(), "int|string");
///
/// let amount = TypeDescriptor::from(FieldType::Float);
/// assert_eq!(amount.to_string(), "float");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Single(FieldType),
    Union(Vec<FieldType>),
}

impl TypeDescriptor {
    /// Builds a union from its alternatives, in declaration order.
    ///
    /// A one-element union collapses to [`TypeDescriptor::Single`].
    pub fn union(alternatives: impl IntoIterator<Item = FieldType>) -> Self {
        let mut alternatives: Vec<FieldType> = alternatives.into_iter().collect();
        if alternatives.len() == 1 {
            TypeDescriptor::Single(alternatives.remove(0))
        } else {
            TypeDescriptor::Union(alternatives)
        }
    }

    /// Does a value of runtime type `kind` satisfy this descriptor?
    ///
    /// This is exact category matching, there is no coercion: an `int`
    /// value does not satisfy `float`.
    pub fn matches(&self, kind: ValueKind) -> bool {
        match self {
            TypeDescriptor::Single(ty) => ty.accepts(kind),
            TypeDescriptor::Union(alternatives) => alternatives.iter().any(|ty| ty.accepts(kind)),
        }
    }

    /// Does `value` satisfy this descriptor?
    ///
    /// Bound instances of any schema are always admitted; they were checked by
    /// their own bind.
    pub fn admits(&self, value: &Value) -> bool {
        matches!(value, Value::Object(_)) || self.matches(value.kind())
    }

    /// The nested schema, when the descriptor is a single schema type.
    pub fn nested_schema(&self) -> Option<&Arc<Schema>> {
        match self {
            TypeDescriptor::Single(FieldType::Schema(schema)) => Some(schema),
            _ => None,
        }
    }

    /// The alternatives in declaration order.
    pub fn alternatives(&self) -> &[FieldType] {
        match self {
            TypeDescriptor::Single(ty) => std::slice::from_ref(ty),
            TypeDescriptor::Union(alternatives) => alternatives,
        }
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ty) in self.alternatives().iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{}", ty)?;
        }
        Ok(())
    }
}

impl FromStr for TypeDescriptor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let alternatives = s
            .split('|')
            .map(FieldType::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypeDescriptor::union(alternatives))
    }
}

impl From<FieldType> for TypeDescriptor {
    fn from(ty: FieldType) -> Self {
        TypeDescriptor::Single(ty)
    }
}

impl From<Arc<Schema>> for TypeDescriptor {
    fn from(schema: Arc<Schema>) -> Self {
        TypeDescriptor::Single(FieldType::Schema(schema))
    }
}

impl From<&Arc<Schema>> for TypeDescriptor {
    fn from(schema: &Arc<Schema>) -> Self {
        TypeDescriptor::Single(FieldType::from(schema))
    }
}

impl From<Vec<FieldType>> for TypeDescriptor {
    fn from(alternatives: Vec<FieldType>) -> Self {
        TypeDescriptor::union(alternatives)
    }
}
