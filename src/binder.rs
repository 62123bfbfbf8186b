//! Reconciles bind input against a schema's declared fields.
//!
//! The [`Binder`] never fails on bad input by itself: unknown fields and type
//! mismatches are accumulated and written to the [`DiagnosticContext`]. Whether
//! those diagnostics become an error is decided by the caller
//! ([`Schema::make_in`](crate::Schema::make_in)).

use std::sync::Arc;

use stillwater::prelude::*;
use stillwater::Validation;
use tracing::{debug, trace};

use crate::diagnostics::DiagnosticContext;
use crate::error::{BindError, FieldError, FieldErrors};
use crate::schema::{FieldDef, Schema};
use crate::value::{Fields, Value};

/// Binds input for one schema inside one diagnostic context.
pub struct Binder<'a> {
    schema: &'a Arc<Schema>,
    context: &'a Arc<DiagnosticContext>,
}

impl<'a> Binder<'a> {
    /// Creates a binder that records diagnostics for `schema` in `context`.
    pub fn new(schema: &'a Arc<Schema>, context: &'a Arc<DiagnosticContext>) -> Self {
        Self { schema, context }
    }

    /// Reconciles `input` against the schema.
    ///
    /// 1. Every suspended computation in `input` is forced, in input order,
    ///    whether or not its key is declared.
    /// 2. Lenient binds enable diagnostics for the schema, reset its entry and
    ///    record the resolved input. Strict binds only reset the entry.
    /// 3. Each key is checked. Unknown keys are reported, then dropped when
    ///    lenient and kept when strict. Declared keys whose value's runtime
    ///    type does not satisfy the descriptor are reported and kept.
    /// 4. The resolved, possibly pruned, input is returned. Diagnostics live
    ///    only in the context.
    ///
    /// Bound instances are never reported as mismatches. A plain map supplied
    /// for a field declared as another schema is bound with that schema first;
    /// if that nested bind is rejected, its messages are reported against the
    /// field.
    ///
    /// # Errors
    ///
    /// Only fatal errors from a nested bind (ill-formed nested schema, failed
    /// nested construction) are returned. Diagnostics found for earlier keys
    /// are recorded before the error is returned.
    pub fn bind(&self, input: Fields, strict: bool) -> Result<Fields, BindError> {
        let id = self.schema.name();
        debug!(schema = id, strict, keys = input.len(), "binding");

        let resolved: Fields = input
            .into_iter()
            .map(|(key, value)| {
                if value.is_lazy() {
                    trace!(schema = id, property = %key, "forcing suspended value");
                }
                (key, value.resolve())
            })
            .collect();

        if strict {
            self.context.reset(id);
        } else {
            self.context.enable(id);
            self.context.reset(id);
            self.context.set_strict(id, false);
            self.context.set_properties(id, resolved.clone());
        }

        let mut result = Fields::with_capacity(resolved.len());
        let mut errors: Option<FieldErrors> = None;

        for (key, value) in resolved {
            let check = match self.schema.field_def(&key) {
                None => {
                    let error = FieldError::unknown(id, key.as_str());
                    if strict {
                        result.insert(key, value);
                    }
                    Validation::Failure(FieldErrors::single(error))
                }
                Some(def) => match self.check_field(&key, def, value, strict) {
                    Ok((value, check)) => {
                        result.insert(key, value);
                        check
                    }
                    Err(fatal) => {
                        if let Some(errors) = errors {
                            self.context.extend_errors(id, errors.messages());
                        }
                        debug!(schema = id, property = %key, error = %fatal, "nested bind failed");
                        return Err(fatal);
                    }
                },
            };

            if let Validation::Failure(found) = check {
                errors = Some(match errors {
                    Some(acc) => acc.combine(found),
                    None => found,
                });
            }
        }

        let error_count = errors.as_ref().map_or(0, FieldErrors::len);
        if let Some(errors) = errors {
            self.context.extend_errors(id, errors.messages());
        }
        debug!(schema = id, strict, kept = result.len(), errors = error_count, "bound");

        Ok(result)
    }

    /// Checks one declared field, binding nested maps on the way.
    fn check_field(
        &self,
        key: &str,
        def: &FieldDef,
        value: Value,
        strict: bool,
    ) -> Result<(Value, Validation<(), FieldErrors>), BindError> {
        let nested = match (def.ty().nested_schema(), &value) {
            (Some(nested), Value::Map(fields)) => {
                Some(nested.make_in(self.context, fields.clone(), strict))
            }
            _ => None,
        };

        match nested {
            Some(Ok(instance)) => Ok((Value::Object(instance), Validation::Success(()))),
            Some(Err(BindError::Rejected { messages, .. })) => {
                let error = FieldError::mismatch(
                    self.schema.name(),
                    key,
                    def.ty().to_string(),
                    format!("invalid map ({})", messages.join("; ")),
                );
                Ok((value, Validation::Failure(FieldErrors::single(error))))
            }
            Some(Err(fatal)) => Err(fatal),
            None => {
                let check = self.compare(key, def, &value);
                Ok((value, check))
            }
        }
    }

    /// Single dispatch of the value's runtime type against the descriptor.
    fn compare(&self, key: &str, def: &FieldDef, value: &Value) -> Validation<(), FieldErrors> {
        if def.ty().admits(value) {
            Validation::Success(())
        } else {
            Validation::Failure(FieldErrors::single(FieldError::mismatch(
                self.schema.name(),
                key,
                def.ty().to_string(),
                value.kind().name(),
            )))
        }
    }
}
