//! Per-field binding diagnostics.
//!
//! This module provides [`FieldError`] for a single unknown-field or
//! type-mismatch diagnostic and [`FieldErrors`] for accumulating several.

use std::fmt::{self, Display};

use stillwater::prelude::*;

/// What went wrong with a single input key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// The schema declares no field with this name.
    Unknown,
    /// The value's runtime type does not satisfy the declared descriptor.
    Mismatch {
        /// The declared descriptor, alternatives joined by `|`.
        expected: String,
        /// The runtime type name of the supplied value.
        got: String,
    },
}

/// A single binding diagnostic with full context.
///
/// `FieldError` records which schema and which input key failed, and why.
/// Its `Display` output is the exact message stored in the diagnostic context:
///
/// - `Property User::$extra doesn't exist!`
/// - `Property User::$amount must be float, but string given!`
///
/// # Example
///
/// ```rust
/// use structbind::FieldError;
///
/// let error = FieldError::mismatch("Payment", "amount", "float", "string");
///
/// assert_eq!(error.code(), "type_mismatch");
/// assert_eq!(
///     error.to_string(),
///     "Property Payment::$amount must be float, but string given!"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Identity of the schema that was being bound.
    pub schema: String,
    /// The input key the diagnostic refers to.
    pub property: String,
    /// The failure itself.
    pub kind: FieldErrorKind,
}

impl FieldError {
    /// Creates an unknown-property diagnostic.
    pub fn unknown(schema: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            property: property.into(),
            kind: FieldErrorKind::Unknown,
        }
    }

    /// Creates a type-mismatch diagnostic.
    pub fn mismatch(
        schema: impl Into<String>,
        property: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            property: property.into(),
            kind: FieldErrorKind::Mismatch {
                expected: expected.into(),
                got: got.into(),
            },
        }
    }

    /// Machine-readable error code (`unknown_property` or `type_mismatch`).
    pub fn code(&self) -> &'static str {
        match self.kind {
            FieldErrorKind::Unknown => "unknown_property",
            FieldErrorKind::Mismatch { .. } => "type_mismatch",
        }
    }

    /// Returns the expected descriptor for mismatches.
    pub fn expected(&self) -> Option<&str> {
        match &self.kind {
            FieldErrorKind::Mismatch { expected, .. } => Some(expected),
            FieldErrorKind::Unknown => None,
        }
    }

    /// Returns the runtime type name that was given, for mismatches.
    pub fn got(&self) -> Option<&str> {
        match &self.kind {
            FieldErrorKind::Mismatch { got, .. } => Some(got),
            FieldErrorKind::Unknown => None,
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Property {}::${}", self.schema, self.property)?;
        match &self.kind {
            FieldErrorKind::Unknown => write!(f, " doesn't exist!"),
            FieldErrorKind::Mismatch { expected, got } => {
                write!(f, " must be {}, but {} given!", expected, got)
            }
        }
    }
}

impl std::error::Error for FieldError {}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<FieldError>();
    assert_sync::<FieldError>();
};

/// A non-empty collection of field diagnostics.
///
/// `FieldErrors` wraps a `NonEmptyVec<FieldError>` so that a
/// `Validation<_, FieldErrors>` failure always carries at least one diagnostic.
/// It implements `Semigroup`, which is how the binder folds the per-key checks
/// together without stopping at the first failure.
///
/// ```rust
/// use structbind::{FieldError, FieldErrors};
/// use stillwater::prelude::*;
///
/// let a = FieldErrors::single(FieldError::unknown("User", "nickname"));
/// let b = FieldErrors::single(FieldError::mismatch("User", "id", "int", "string"));
///
/// assert_eq!(a.combine(b).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldErrors(NonEmptyVec<FieldError>);

impl FieldErrors {
    /// Creates a `FieldErrors` containing a single diagnostic.
    pub fn single(error: FieldError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Returns the number of diagnostics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the collection is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Returns the first diagnostic.
    pub fn first(&self) -> &FieldError {
        self.0.head()
    }

    /// Returns all diagnostics with the given code.
    pub fn with_code(&self, code: &str) -> Vec<&FieldError> {
        self.0.iter().filter(|e| e.code() == code).collect()
    }

    /// Converts this collection into a `Vec<FieldError>`.
    pub fn into_vec(self) -> Vec<FieldError> {
        self.0.into_vec()
    }

    /// Returns the display form of every diagnostic, in order.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl Semigroup for FieldErrors {
    fn combine(self, other: Self) -> Self {
        FieldErrors(self.0.combine(other.0))
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

impl IntoIterator for FieldErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}
