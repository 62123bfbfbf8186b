//! Fatal binding errors.

use super::FieldError;

/// A schema declaration that can never bind, whatever the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The schema declares constructor parameters and extra open fields.
    #[error(
        "Schema {schema} mixes {params} constructor parameter(s) with {fields} open field(s); \
         declare either constructor parameters or open fields, not both"
    )]
    MixedStructure {
        schema: String,
        params: usize,
        fields: usize,
    },

    /// A schema or field name is not an identifier.
    #[error("'{0}' is not a valid identifier")]
    InvalidName(String),

    /// The same field name was declared twice.
    #[error("Schema {schema} declares property ${property} more than once")]
    DuplicateField { schema: String, property: String },

    /// A type descriptor named a type outside the canonical vocabulary.
    #[error("unknown type name '{0}'")]
    UnknownType(String),
}

/// Errors raised by `make`, `set` and `to_array`.
///
/// Unknown-field and type-mismatch diagnostics are not errors on their own:
/// lenient binds accumulate them in the diagnostic context. Only a strict bind
/// escalates them into [`BindError::Rejected`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    /// The schema itself is ill-formed. Raised regardless of strictness.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A strict bind found unknown fields or type mismatches.
    ///
    /// The display form is every accumulated message, newline-separated.
    #[error("{}", .messages.join("\n"))]
    Rejected {
        schema: String,
        messages: Vec<String>,
    },

    /// Fixed-style construction was invoked with missing or extra arguments.
    #[error("Cannot construct {schema}: {message}")]
    Construction { schema: String, message: String },

    /// Attempted to assign a field on a fixed-style instance.
    #[error("Cannot modify property {schema}::${property}: {schema} is immutable")]
    Immutable { schema: String, property: String },

    /// A field value has no plain representation.
    #[error("Cannot flatten {schema}::${path}: {reason}")]
    Flatten {
        schema: String,
        path: String,
        reason: String,
    },

    /// A single field assignment was rejected.
    #[error(transparent)]
    Field(#[from] FieldError),
}

impl BindError {
    /// Returns the diagnostic messages carried by a strict rejection.
    pub fn messages(&self) -> &[String] {
        match self {
            BindError::Rejected { messages, .. } => messages,
            _ => &[],
        }
    }

    /// True for errors that indicate an ill-formed schema rather than bad input.
    pub fn is_config(&self) -> bool {
        matches!(self, BindError::Config(_))
    }
}
