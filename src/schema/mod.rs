//! Schema declarations and the `make` entry point.
//!
//! A [`Schema`] is a named, ordered table of declared fields. It is declared in
//! exactly one of two styles:
//!
//! - **Fixed**: fields are constructor parameters ([`Schema::param`]). Every
//!   instance is built from all of them and is immutable afterwards.
//! - **Open**: fields are assignable members ([`Schema::field`]). Instances may
//!   be partially populated and can be modified with [`Instance::set`].
//!
//! # Example
//!
//! ```rust
//! use structbind::{FieldType, Schema};
//! use serde_json::json;
//!
//! let payment = Schema::new("Payment")
//!     .field("id", FieldType::Int)
//!     .field("amount", FieldType::Float)
//!     .build();
//!
//! let instance = payment.make_json(&json!({"id": 1, "amount": 2.5}), true).unwrap();
//! assert_eq!(instance.to_array().unwrap()["amount"], json!(2.5));
//! ```

mod instance;
mod types;

use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, warn};

use crate::binder::Binder;
use crate::diagnostics::DiagnosticContext;
use crate::error::{BindError, ConfigError};
use crate::value::{fields_from_json, Fields, Value};

pub use instance::{Inspection, Instance, WARNING_KEY};
pub use types::{FieldType, TypeDescriptor};

/// Strictness used when the caller does not choose one.
pub const DEFAULT_STRICT: bool = true;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// The declaration style of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Constructor parameters, immutable instances.
    Fixed,
    /// Assignable fields, partially populated instances.
    Open,
}

/// Definition of a declared field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    ty: TypeDescriptor,
    default: Option<Value>,
    param: bool,
}

impl FieldDef {
    /// The declared type descriptor.
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// The default value, if any.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// True if the field was declared as a constructor parameter.
    pub fn is_param(&self) -> bool {
        self.param
    }

    /// True if construction fails without a value for this field.
    pub fn is_required(&self) -> bool {
        self.param && self.default.is_none()
    }
}

/// A named structural type with declared fields.
///
/// Build one with the fluent methods, then call [`Schema::build`] to share it.
/// The declaration is checked by [`Schema::check_structure`] on every bind.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: IndexMap<String, FieldDef>,
    params: Vec<String>,
    duplicates: Vec<String>,
}

impl Schema {
    /// Starts a declaration with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            params: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    /// Declares a required constructor parameter.
    pub fn param(self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.declare(name.into(), ty.into(), None, true)
    }

    /// Declares a constructor parameter that falls back to `default`.
    pub fn param_with_default(
        self,
        name: impl Into<String>,
        ty: impl Into<TypeDescriptor>,
        default: impl Into<Value>,
    ) -> Self {
        self.declare(name.into(), ty.into(), Some(default.into()), true)
    }

    /// Declares an openly assignable field.
    pub fn field(self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.declare(name.into(), ty.into(), None, false)
    }

    /// Declares an openly assignable field initialized to `default`.
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        ty: impl Into<TypeDescriptor>,
        default: impl Into<Value>,
    ) -> Self {
        self.declare(name.into(), ty.into(), Some(default.into()), false)
    }

    fn declare(
        mut self,
        name: String,
        ty: TypeDescriptor,
        default: Option<Value>,
        param: bool,
    ) -> Self {
        if self.fields.contains_key(&name) {
            self.duplicates.push(name);
            return self;
        }
        if param {
            self.params.push(name.clone());
        }
        self.fields.insert(name, FieldDef { ty, default, param });
        self
    }

    /// Finishes the declaration.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The schema identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a declared field.
    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// True if `name` is a declared field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDef)> {
        self.fields.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Constructor parameter names in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Fixed if any constructor parameter is declared, open otherwise.
    pub fn style(&self) -> Style {
        if self.params.is_empty() {
            Style::Open
        } else {
            Style::Fixed
        }
    }

    /// Verifies that this schema can be bound at all.
    ///
    /// Fails if the schema declares constructor parameters together with more
    /// open fields than parameters, if a name is not an identifier, or if a
    /// field was declared twice.
    pub fn check_structure(&self) -> Result<(), ConfigError> {
        if !self.params.is_empty() && self.fields.len() > self.params.len() {
            return Err(ConfigError::MixedStructure {
                schema: self.name.clone(),
                params: self.params.len(),
                fields: self.fields.len() - self.params.len(),
            });
        }
        if let Some(property) = self.duplicates.first() {
            return Err(ConfigError::DuplicateField {
                schema: self.name.clone(),
                property: property.clone(),
            });
        }
        std::iter::once(self.name.as_str())
            .chain(self.fields.keys().map(String::as_str))
            .find(|name| !IDENTIFIER.is_match(name))
            .map_or(Ok(()), |name| Err(ConfigError::InvalidName(name.to_string())))
    }

    /// Binds `data` in the process-wide diagnostic context.
    ///
    /// See [`Schema::make_in`].
    pub fn make<I, K, V>(self: &Arc<Self>, data: I, strict: bool) -> Result<Instance, BindError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.make_in(DiagnosticContext::global(), data, strict)
    }

    /// Binds a JSON object in the process-wide diagnostic context.
    ///
    /// Anything other than a JSON object binds as empty input.
    pub fn make_json(
        self: &Arc<Self>,
        data: &serde_json::Value,
        strict: bool,
    ) -> Result<Instance, BindError> {
        let fields = data
            .as_object()
            .cloned()
            .map(fields_from_json)
            .unwrap_or_default();
        self.make(fields, strict)
    }

    /// Binds `data` against this schema, recording diagnostics in `context`.
    ///
    /// Lenient binds (`strict == false`) always produce an instance unless the
    /// schema is ill-formed or fixed-style construction fails; unknown fields
    /// are dropped and mismatched values are left out of the instance. Strict
    /// binds check every field and then fail with [`BindError::Rejected`] if
    /// anything was recorded.
    ///
    /// # Errors
    ///
    /// - [`BindError::Config`] if the declaration mixes styles, regardless of
    ///   strictness.
    /// - [`BindError::Rejected`] for a strict bind with unknown fields or type
    ///   mismatches.
    /// - [`BindError::Construction`] if a fixed-style parameter has no usable
    ///   value.
    pub fn make_in<I, K, V>(
        self: &Arc<Self>,
        context: &Arc<DiagnosticContext>,
        data: I,
        strict: bool,
    ) -> Result<Instance, BindError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let data: Fields = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        context.set_strict(&self.name, strict);

        if let Err(error) = self.check_structure() {
            warn!(schema = %self.name, %error, "refusing to bind ill-formed schema");
            return Err(error.into());
        }

        let bound = Binder::new(self, context).bind(data, strict)?;

        if strict {
            let messages = context.errors(&self.name);
            if !messages.is_empty() {
                warn!(schema = %self.name, errors = messages.len(), "strict bind rejected");
                return Err(BindError::Rejected {
                    schema: self.name.clone(),
                    messages,
                });
            }
        }

        let values = match self.style() {
            Style::Fixed => self.construct(bound)?,
            Style::Open => self.assign(bound),
        };
        debug!(schema = %self.name, assigned = values.len(), "instance constructed");

        Ok(Instance::new(Arc::clone(self), values, Arc::clone(context)))
    }

    /// Fixed-style construction: one value per parameter, in declaration order.
    fn construct(&self, mut args: Fields) -> Result<Fields, BindError> {
        let mut values = Fields::with_capacity(self.params.len());

        for name in &self.params {
            let Some(def) = self.fields.get(name) else {
                continue;
            };
            let value = match args.shift_remove(name) {
                Some(value) if def.ty.admits(&value) => value,
                Some(value) => def.default.clone().ok_or_else(|| BindError::Construction {
                    schema: self.name.clone(),
                    message: format!(
                        "argument ${} must be {}, {} given",
                        name,
                        def.ty,
                        value.kind()
                    ),
                })?,
                None => def.default.clone().ok_or_else(|| BindError::Construction {
                    schema: self.name.clone(),
                    message: format!("missing required argument ${}", name),
                })?,
            };
            values.insert(name.clone(), value);
        }

        if let Some(extra) = args.keys().next() {
            return Err(BindError::Construction {
                schema: self.name.clone(),
                message: format!("unknown named argument ${}", extra),
            });
        }

        Ok(values)
    }

    /// Open-style construction: defaults first, then each admitted input value.
    fn assign(&self, bound: Fields) -> Fields {
        let mut values: Fields = self
            .fields
            .iter()
            .filter_map(|(name, def)| def.default.clone().map(|d| (name.clone(), d)))
            .collect();

        for (key, value) in bound {
            if let Some(def) = self.fields.get(&key) {
                if def.ty.admits(&value) {
                    values.insert(key, value);
                }
            }
        }

        values
    }
}

/// A Rust type that acts as a concrete schema.
///
/// Implementors supply the declaration; `make` and `make_default` come for free.
///
/// ```rust
/// use std::sync::{Arc, OnceLock};
/// use structbind::{Dto, FieldType, Schema};
///
/// struct Point;
///
/// impl Dto for Point {
///     fn schema() -> Arc<Schema> {
///         static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
///         SCHEMA
///             .get_or_init(|| {
///                 Schema::new("Point")
///                     .param("x", FieldType::Int)
///                     .param("y", FieldType::Int)
///                     .build()
///             })
///             .clone()
///     }
/// }
///
/// let point = Point::make_default([("x", 1), ("y", 2)]).unwrap();
/// assert_eq!(point.get("y").and_then(|v| v.as_i64()), Some(2));
/// ```
pub trait Dto {
    /// The schema declaration for this type.
    fn schema() -> Arc<Schema>;

    /// Binds `data` against [`Dto::schema`].
    fn make<I, K, V>(data: I, strict: bool) -> Result<Instance, BindError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::schema().make(data, strict)
    }

    /// Binds `data` with [`DEFAULT_STRICT`].
    fn make_default<I, K, V>(data: I) -> Result<Instance, BindError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::make(data, DEFAULT_STRICT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_payment() -> Arc<Schema> {
        Schema::new("Payment")
            .field("id", FieldType::Int)
            .field("amount", FieldType::Float)
            .field_with_default("currency", FieldType::String, "EUR")
            .build()
    }

    #[test]
    fn test_style_detection() {
        assert_eq!(open_payment().style(), Style::Open);
        let fixed = Schema::new("Point").param("x", FieldType::Int).build();
        assert_eq!(fixed.style(), Style::Fixed);
        assert_eq!(Schema::new("Empty").build().style(), Style::Open);
    }

    #[test]
    fn test_mixed_structure_rejected() {
        let mixed = Schema::new("Mixed")
            .param("id", FieldType::Int)
            .field("note", FieldType::String);

        assert_eq!(
            mixed.check_structure(),
            Err(ConfigError::MixedStructure {
                schema: "Mixed".to_string(),
                params: 1,
                fields: 1,
            })
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let schema = Schema::new("Dup")
            .field("a", FieldType::Int)
            .field("a", FieldType::String);

        assert!(matches!(
            schema.check_structure(),
            Err(ConfigError::DuplicateField { .. })
        ));
        assert_eq!(schema.field_def("a").map(|d| d.ty().to_string()), Some("int".into()));
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert_eq!(
            Schema::new("Bad Name").check_structure(),
            Err(ConfigError::InvalidName("Bad Name".to_string()))
        );
        assert_eq!(
            Schema::new("Ok").field("9lives", FieldType::Int).check_structure(),
            Err(ConfigError::InvalidName("9lives".to_string()))
        );
    }

    #[test]
    fn test_required_params() {
        let schema = Schema::new("Point")
            .param("x", FieldType::Int)
            .param_with_default("y", FieldType::Int, 0);

        assert!(schema.field_def("x").unwrap().is_required());
        assert!(!schema.field_def("y").unwrap().is_required());
        assert_eq!(schema.params(), &["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_construct_missing_argument() {
        let schema = Schema::new("Point").param("x", FieldType::Int).param("y", FieldType::Int);
        let mut args = Fields::new();
        args.insert("x".to_string(), Value::from(1));

        let error = schema.construct(args).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Cannot construct Point: missing required argument $y"
        );
    }

    #[test]
    fn test_construct_uses_declared_order() {
        let schema = Schema::new("Point").param("x", FieldType::Int).param("y", FieldType::Int);
        let mut args = Fields::new();
        args.insert("y".to_string(), Value::from(2));
        args.insert("x".to_string(), Value::from(1));

        let values = schema.construct(args).unwrap();
        let keys: Vec<_> = values.keys().cloned().collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn test_construct_rejects_extra_arguments() {
        let schema = Schema::new("Point").param("x", FieldType::Int);
        let mut args = Fields::new();
        args.insert("x".to_string(), Value::from(1));
        args.insert("z".to_string(), Value::from(3));

        assert!(matches!(
            schema.construct(args),
            Err(BindError::Construction { .. })
        ));
    }

    #[test]
    fn test_assign_applies_defaults_and_skips_mismatches() {
        let schema = open_payment();
        let mut bound = Fields::new();
        bound.insert("id".to_string(), Value::from(1));
        bound.insert("amount".to_string(), Value::from("bad"));

        let values = schema.assign(bound);
        assert_eq!(values.get("currency"), Some(&Value::from("EUR")));
        assert_eq!(values.get("id"), Some(&Value::from(1)));
        assert!(values.get("amount").is_none());
    }
}
