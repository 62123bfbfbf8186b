//! Error types for binding failures.
//!
//! This module provides per-field diagnostics ([`FieldError`], [`FieldErrors`])
//! and the fatal errors a bind or flatten can raise ([`BindError`],
//! [`ConfigError`]).

mod bind_error;
mod field_error;

pub use bind_error::{BindError, ConfigError};
pub use field_error::{FieldError, FieldErrorKind, FieldErrors};
