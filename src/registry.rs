//! Schema registry for named schema storage.
//!
//! This module provides the [`SchemaRegistry`] type that stores schemas by
//! identity, rejects ill-formed declarations when they are registered, and
//! binds input against a schema looked up by name.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::diagnostics::DiagnosticContext;
use crate::error::BindError;
use crate::schema::{Instance, Schema, DEFAULT_STRICT};
use crate::value::{fields_from_json, Value};

/// Type alias for the schema storage map.
type SchemaMap = Arc<RwLock<HashMap<String, Arc<Schema>>>>;

/// A thread-safe registry of schemas.
///
/// The mixed-structure guard runs once, at registration, instead of waiting
/// for the first bind. Each registry binds in one [`DiagnosticContext`]; by
/// default that is the process-wide one, use [`SchemaRegistry::with_context`]
/// to give a registry its own.
///
/// # Thread Safety
///
/// The registry uses `Arc<RwLock<...>>` for thread-safe access:
/// - Multiple threads can bind concurrently (read-only access)
/// - Registration operations are serialized (write access)
///
/// Concurrent binds of the same schema still share that schema's diagnostic
/// entry; see [`crate::diagnostics`].
///
/// # Example
///
/// ```rust
/// use structbind::{FieldType, Schema, SchemaRegistry};
/// use serde_json::json;
///
/// let registry = SchemaRegistry::new();
/// registry
///     .register(Schema::new("User").field("name", FieldType::String).build())
///     .unwrap();
///
/// let user = registry.make_json("User", &json!({"name": "Alice"}), true).unwrap();
/// assert_eq!(user.get("name").and_then(|v| v.as_str()), Some("Alice"));
/// ```
pub struct SchemaRegistry {
    schemas: SchemaMap,
    context: Arc<DiagnosticContext>,
    default_strict: bool,
}

impl SchemaRegistry {
    /// Creates an empty registry bound to the process-wide context.
    pub fn new() -> Self {
        Self {
            schemas: Arc::new(RwLock::new(HashMap::new())),
            context: Arc::clone(DiagnosticContext::global()),
            default_strict: DEFAULT_STRICT,
        }
    }

    /// Records diagnostics in `context` instead of the process-wide one.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use structbind::{DiagnosticContext, SchemaRegistry};
    ///
    /// let context = Arc::new(DiagnosticContext::new());
    /// let registry = SchemaRegistry::new().with_context(Arc::clone(&context));
    /// assert!(Arc::ptr_eq(registry.context(), &context));
    /// ```
    pub fn with_context(mut self, context: Arc<DiagnosticContext>) -> Self {
        self.context = context;
        self
    }

    /// Sets the strictness used by [`SchemaRegistry::make_default`].
    pub fn with_default_strict(mut self, strict: bool) -> Self {
        self.default_strict = strict;
        self
    }

    /// The diagnostic context this registry binds in.
    pub fn context(&self) -> &Arc<DiagnosticContext> {
        &self.context
    }

    /// Registers a schema under its own name.
    ///
    /// # Errors
    ///
    /// - `RegistryError::InvalidSchema` if the declaration fails
    ///   [`Schema::check_structure`].
    /// - `RegistryError::DuplicateName` if the name is already registered.
    ///
    /// # Example
    ///
    /// ```rust
    /// use structbind::{FieldType, Schema, SchemaRegistry};
    ///
    /// let registry = SchemaRegistry::new();
    /// let point = Schema::new("Point").param("x", FieldType::Int).build();
    ///
    /// registry.register(point.clone()).unwrap();
    /// assert!(registry.register(point).is_err());
    ///
    /// let mixed = Schema::new("Mixed")
    ///     .param("x", FieldType::Int)
    ///     .field("label", FieldType::String)
    ///     .build();
    /// assert!(registry.register(mixed).is_err());
    /// ```
    pub fn register(&self, schema: Arc<Schema>) -> Result<(), RegistryError> {
        schema
            .check_structure()
            .map_err(|e| RegistryError::InvalidSchema(e.into()))?;

        let name = schema.name().to_string();
        let mut schemas = self.schemas.write();

        if schemas.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        debug!(schema = %name, fields = schema.fields().count(), "schema registered");
        schemas.insert(name, schema);
        Ok(())
    }

    /// Retrieves a schema by name.
    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.read().get(name).cloned()
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.schemas.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Binds `data` against the named schema.
    ///
    /// # Errors
    ///
    /// `RegistryError::SchemaNotFound` for unknown names, otherwise any
    /// [`BindError`] from [`Schema::make_in`] wrapped in `RegistryError::Bind`.
    pub fn make<I, K, V>(&self, name: &str, data: I, strict: bool) -> Result<Instance, RegistryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let schema = self
            .get(name)
            .ok_or_else(|| RegistryError::SchemaNotFound(name.to_string()))?;
        Ok(schema.make_in(&self.context, data, strict)?)
    }

    /// Binds `data` with the registry's default strictness.
    pub fn make_default<I, K, V>(&self, name: &str, data: I) -> Result<Instance, RegistryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.make(name, data, self.default_strict)
    }

    /// Binds a JSON object against the named schema.
    ///
    /// # Errors
    ///
    /// `RegistryError::NotAnObject` if `data` is not a JSON object.
    pub fn make_json(
        &self,
        name: &str,
        data: &serde_json::Value,
        strict: bool,
    ) -> Result<Instance, RegistryError> {
        let object = data
            .as_object()
            .cloned()
            .ok_or_else(|| RegistryError::NotAnObject(name.to_string()))?;
        self.make(name, fields_from_json(object), strict)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SchemaRegistry {
    fn clone(&self) -> Self {
        Self {
            schemas: Arc::clone(&self.schemas),
            context: Arc::clone(&self.context),
            default_strict: self.default_strict,
        }
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Attempted to register a schema with a name that already exists.
    #[error("schema '{0}' already registered")]
    DuplicateName(String),

    /// Attempted to bind with a schema name that doesn't exist.
    #[error("schema '{0}' not found")]
    SchemaNotFound(String),

    /// The schema failed its structural check at registration.
    #[error("invalid schema: {0}")]
    InvalidSchema(BindError),

    /// Binding failed.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// JSON input for the schema was not an object.
    #[error("input for schema '{0}' is not a JSON object")]
    NotAnObject(String),
}
