//! # Structbind
//!
//! Binds loosely-typed field maps (HTTP payloads, config, inter-service
//! messages) onto declared schemas, reporting every unknown field and type
//! mismatch instead of failing on the first one.
//!
//! ## Overview
//!
//! A [`Schema`] declares named, typed fields. [`Schema::make`] reconciles an
//! input map against it:
//!
//! - **lenient** binds (`strict = false`) always return an [`Instance`]; unknown
//!   fields are dropped, mismatched values are left out, and the problems are
//!   recorded in a [`DiagnosticContext`] for [`Instance::is_valid`] and
//!   [`Instance::errors`] to report.
//! - **strict** binds check every field, then fail with a single
//!   [`BindError::Rejected`] listing all problems.
//!
//! ## Core Types
//!
//! - [`Schema`]: fixed-style (constructor parameters) or open-style (assignable
//!   fields) declaration
//! - [`Value`]: the untyped input values, including suspended computations
//! - [`Binder`]: the reconciliation algorithm
//! - [`DiagnosticContext`]: per-schema record of the last bind
//! - [`Instance`]: the bound result, with `to_array` flattening
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use structbind::{DiagnosticContext, FieldType, Schema};
//! use serde_json::json;
//!
//! let payment = Schema::new("Payment")
//!     .field("id", FieldType::Int)
//!     .field("amount", FieldType::Float)
//!     .build();
//! let context = Arc::new(DiagnosticContext::new());
//!
//! // Lenient: an instance comes back, the mismatch is recorded
//! let instance = payment
//!     .make_in(&context, [("id", json!(1)), ("amount", json!("bad"))], false)
//!     .unwrap();
//! assert!(!instance.is_valid());
//! assert!(instance.get("amount").is_none());
//!
//! // Strict: every problem is reported at once
//! let error = payment
//!     .make_in(&context, [("id", json!(1)), ("extra", json!("x"))], true)
//!     .unwrap_err();
//! assert!(error.to_string().contains("doesn't exist"));
//! ```

pub mod binder;
pub mod diagnostics;
pub mod error;
pub mod registry;
pub mod schema;
pub mod value;

pub use binder::Binder;
pub use diagnostics::{DiagnosticContext, DiagnosticEntry};
pub use error::{BindError, ConfigError, FieldError, FieldErrorKind, FieldErrors};
pub use registry::{RegistryError, SchemaRegistry};
pub use schema::{
    Dto, FieldDef, FieldType, Inspection, Instance, Schema, Style, TypeDescriptor,
    DEFAULT_STRICT, WARNING_KEY,
};
pub use value::{fields_from_json, Fields, Lazy, Resource, Suspended, Value, ValueKind};
