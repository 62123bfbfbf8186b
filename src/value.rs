//! Untyped input values.
//!
//! This module provides [`Value`], the closed set of values a bind input may
//! carry, together with the runtime type inspection ([`ValueKind`]) the binder
//! compares against declared descriptors, and the suspended-computation
//! contract ([`Suspended`], [`Lazy`]).

use std::any::Any;
use std::fmt::{self, Display};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::schema::Instance;

/// An ordered mapping from field name to value.
///
/// Used both for bind inputs and for an instance's assigned fields. Iteration
/// order is insertion order.
pub type Fields = IndexMap<String, Value>;

/// A deferred value producer supplied in place of a concrete field value.
///
/// Any `Fn() -> Value` closure satisfies this contract. The binder forces each
/// suspended input exactly once, before any type comparison.
pub trait Suspended: Send + Sync {
    /// Produces the final value.
    fn force(&self) -> Value;
}

impl<F> Suspended for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn force(&self) -> Value {
        self()
    }
}

/// A shareable handle to a suspended computation.
#[derive(Clone)]
pub struct Lazy(Arc<dyn Suspended>);

impl Lazy {
    /// Wraps a deferred value producer.
    pub fn new<S: Suspended + 'static>(producer: S) -> Self {
        Self(Arc::new(producer))
    }

    /// Runs the producer.
    pub fn force(&self) -> Value {
        self.0.force()
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lazy(..)")
    }
}

/// An opaque host handle (file, socket, connection...).
///
/// Resources can be bound like any other value but have no plain
/// representation, so flattening an instance that holds one fails.
#[derive(Clone)]
pub struct Resource {
    label: String,
    handle: Arc<dyn Any + Send + Sync>,
}

impl Resource {
    /// Wraps a host handle under a descriptive label.
    pub fn new<T: Any + Send + Sync>(label: impl Into<String>, handle: T) -> Self {
        Self {
            label: label.into(),
            handle: Arc::new(handle),
        }
    }

    /// The label given at construction.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Borrows the handle as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.handle.downcast_ref::<T>()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource({})", self.label)
    }
}

/// The runtime type category of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Map,
    Object,
    Resource,
    Closure,
}

impl ValueKind {
    /// The canonical name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
            ValueKind::Object => "object",
            ValueKind::Resource => "resource",
            ValueKind::Closure => "closure",
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A loosely-typed value supplied to, or held by, a bound instance.
///
/// # Example
///
/// ```rust
/// use structbind::{Value, ValueKind};
/// use serde_json::json;
///
/// assert_eq!(Value::from(42).kind(), ValueKind::Int);
/// assert_eq!(Value::from(json!(2.5)).kind(), ValueKind::Float);
///
/// let lazy = Value::lazy(|| Value::from("resolved"));
/// assert!(lazy.is_lazy());
/// assert_eq!(lazy.resolve(), Value::from("resolved"));
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(Fields),
    /// A bound instance of another schema.
    Object(Instance),
    Resource(Resource),
    /// A suspended computation that has not been forced.
    Lazy(Lazy),
}

impl Value {
    /// Wraps a closure as a suspended computation.
    pub fn lazy<F>(producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Value::Lazy(Lazy::new(producer))
    }

    /// Runtime type inspection.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
            Value::Object(_) => ValueKind::Object,
            Value::Resource(_) => ValueKind::Resource,
            Value::Lazy(_) => ValueKind::Closure,
        }
    }

    /// Is this a suspended computation?
    pub fn is_lazy(&self) -> bool {
        matches!(self, Value::Lazy(_))
    }

    /// Forces a suspended computation, or returns the value unchanged.
    ///
    /// Forcing happens once: if the producer itself returns a suspended
    /// computation, that result is returned as-is.
    pub fn resolve(self) -> Value {
        match self {
            Value::Lazy(lazy) => lazy.force(),
            other => other,
        }
    }

    /// Returns the nested instance, if this value is one.
    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Returns the string slice, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, if this value is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float, if this value is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Resource(a), Value::Resource(b)) => Arc::ptr_eq(&a.handle, &b.handle),
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Fields> for Value {
    fn from(v: Fields) -> Self {
        Value::Map(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Value::Object(v)
    }
}

impl From<Resource> for Value {
    fn from(v: Resource) -> Self {
        Value::Resource(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Converts parsed JSON into bind input.
///
/// Integers that fit in `i64` become [`Value::Int`]. Larger unsigned integers
/// become [`Value::Float`], so they bind as `float` and lose precision when
/// flattened back out.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(fields_from_json(map)),
        }
    }
}

/// Converts a JSON object into bind input, preserving key order.
pub fn fields_from_json(map: serde_json::Map<String, serde_json::Value>) -> Fields {
    map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}
