//! Bound schema instances.

use std::fmt::{self, Display};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};

use crate::diagnostics::DiagnosticContext;
use crate::error::{BindError, FieldError};
use crate::value::{Fields, Value};

use super::{Schema, Style};

/// Key of the synthetic entry [`Instance::errors`] adds when diagnostics were
/// never enabled for the instance's schema.
///
/// It is not an identifier, so it never collides with a schema identity.
pub const WARNING_KEY: &str = "@warning";

/// A populated instance of a [`Schema`].
///
/// Instances remember the diagnostic context they were bound in. `is_valid`
/// and `errors` read that context, so they describe the latest bind of every
/// schema in it, not this instance alone.
#[derive(Clone)]
pub struct Instance {
    schema: Arc<Schema>,
    values: Fields,
    context: Arc<DiagnosticContext>,
}

impl Instance {
    pub(crate) fn new(schema: Arc<Schema>, values: Fields, context: Arc<DiagnosticContext>) -> Self {
        Self {
            schema,
            values,
            context,
        }
    }

    /// The schema this instance was bound against.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The schema identity.
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Returns the value assigned to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// All assigned values in assignment order.
    pub fn values(&self) -> &Fields {
        &self.values
    }

    /// Names of the currently assigned fields.
    pub fn assigned_fields(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    /// Assigns a field on an open-style instance.
    ///
    /// Suspended computations are forced before the type check.
    ///
    /// # Errors
    ///
    /// - [`BindError::Immutable`] for fixed-style instances.
    /// - [`BindError::Field`] if `name` is not declared or `value` does not
    ///   satisfy its descriptor.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), BindError> {
        if self.schema.style() == Style::Fixed {
            return Err(BindError::Immutable {
                schema: self.name().to_string(),
                property: name.to_string(),
            });
        }
        let def = self
            .schema
            .field_def(name)
            .ok_or_else(|| FieldError::unknown(self.name(), name))?;

        let value = value.into().resolve();
        if !def.ty().admits(&value) {
            return Err(FieldError::mismatch(
                self.name(),
                name,
                def.ty().to_string(),
                value.kind().name(),
            )
            .into());
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Flattens the instance into plain JSON values.
    ///
    /// Nested instances become nested objects. Unassigned fields are omitted.
    ///
    /// # Errors
    ///
    /// [`BindError::Flatten`] if any value is a resource, an unforced suspended
    /// computation, or a non-finite float.
    pub fn to_array(&self) -> Result<Map<String, JsonValue>, BindError> {
        let mut out = Map::new();
        for (name, value) in &self.values {
            out.insert(name.clone(), flatten(self.name(), name, value)?);
        }
        Ok(out)
    }

    /// True iff the diagnostic context holds no errors for any schema.
    pub fn is_valid(&self) -> bool {
        self.context.is_clean()
    }

    /// Every recorded error list, keyed by schema identity.
    ///
    /// If diagnostics were never enabled for this schema (it has only been
    /// bound strictly), a [`WARNING_KEY`] entry explains that detail is only
    /// collected by lenient binds.
    pub fn errors(&self) -> IndexMap<String, Vec<String>> {
        let mut errors = self.context.all_errors();
        if !self.context.is_enabled(self.name()) {
            errors.insert(
                WARNING_KEY.to_string(),
                vec![format!(
                    "Diagnostics for {} are only recorded by lenient binds; bind with strict = false to inspect them",
                    self.name()
                )],
            );
        }
        errors
    }

    /// A read-only snapshot for dump and inspection tooling.
    pub fn inspect(&self) -> Inspection {
        let name = self.name();
        let assigned: Vec<String> = self.values.keys().cloned().collect();
        let input: Vec<String> = self
            .context
            .properties(name)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default();
        let not_assigned = input
            .iter()
            .filter(|key| !self.values.contains_key(key.as_str()))
            .cloned()
            .collect();

        Inspection {
            schema: name.to_string(),
            assigned,
            input,
            not_assigned,
            strict: self.context.strict(name),
            diagnostics_enabled: self.context.is_enabled(name),
            errors: self.context.errors(name),
        }
    }

    /// Consumes the instance, returning its values.
    pub fn into_values(self) -> Fields {
        self.values
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("schema", &self.schema.name())
            .field("values", &self.values)
            .finish()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.values == other.values
    }
}

fn flatten(schema: &str, path: &str, value: &Value) -> Result<JsonValue, BindError> {
    let fail = |reason: &str| BindError::Flatten {
        schema: schema.to_string(),
        path: path.to_string(),
        reason: reason.to_string(),
    };

    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(n) => JsonValue::from(*n),
        Value::Float(n) => Number::from_f64(*n)
            .map(JsonValue::Number)
            .ok_or_else(|| fail("non-finite float"))?,
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Array(items) => JsonValue::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| flatten(schema, &format!("{}[{}]", path, i), item))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), flatten(schema, &format!("{}.{}", path, k), v)?)))
                .collect::<Result<_, BindError>>()?,
        ),
        Value::Object(instance) => JsonValue::Object(instance.to_array()?),
        Value::Resource(resource) => {
            return Err(fail(&format!(
                "resource '{}' has no plain representation",
                resource.label()
            )))
        }
        Value::Lazy(_) => return Err(fail("suspended computation was never forced")),
    })
}

/// The read-only snapshot returned by [`Instance::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// Schema identity.
    pub schema: String,
    /// Fields currently assigned on the instance.
    pub assigned: Vec<String>,
    /// Keys of the last recorded lenient bind input.
    pub input: Vec<String>,
    /// Input keys that did not end up on the instance.
    pub not_assigned: Vec<String>,
    /// Strictness of the last bind, if the schema was ever bound.
    pub strict: Option<bool>,
    /// Whether a lenient bind ever enabled diagnostics for the schema.
    pub diagnostics_enabled: bool,
    /// Current error list for the schema identity.
    pub errors: Vec<String>,
}

impl Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.schema)?;
        writeln!(f, "  assigned: [{}]", self.assigned.join(", "))?;
        writeln!(f, "  input: [{}]", self.input.join(", "))?;
        writeln!(f, "  not assigned: [{}]", self.not_assigned.join(", "))?;
        match self.strict {
            Some(strict) => writeln!(f, "  strict: {}", strict)?,
            None => writeln!(f, "  strict: unknown")?,
        }
        writeln!(f, "  diagnostics: {}", if self.diagnostics_enabled { "on" } else { "off" })?;
        for error in &self.errors {
            writeln!(f, "  - {}", error)?;
        }
        Ok(())
    }
}
