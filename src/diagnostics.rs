//! Diagnostic context for binding history.
//!
//! This module provides the [`DiagnosticContext`] that records, per schema
//! identity, the strictness of the last bind, the last lenient input, and the
//! errors that bind produced. The record lives beside instances rather than in
//! them.
//!
//! # Shared state
//!
//! Entries are keyed by schema identity only. Every bind of a schema in a
//! context resets that schema's entry, so the entry always describes the most
//! recent bind, whichever instance or thread it came from. Two overlapping binds
//! of the same schema in one context (concurrent requests, or a lenient outer
//! bind that binds a nested schema already bound elsewhere) overwrite each
//! other's diagnostics. Individual operations are atomic; a bind as a whole is
//! not. To isolate a logical validation pass, give it its own context with
//! [`Schema::make_in`](crate::Schema::make_in).

use std::sync::{Arc, OnceLock};

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;

use crate::value::Fields;

/// What the context remembers about one schema identity.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEntry {
    /// Strictness of the last bind.
    pub strict: bool,
    /// Resolved input of the last lenient bind.
    pub properties: Fields,
    /// Errors of the last bind, in detection order.
    pub errors: Vec<String>,
}

impl Default for DiagnosticEntry {
    fn default() -> Self {
        Self {
            strict: crate::schema::DEFAULT_STRICT,
            properties: Fields::new(),
            errors: Vec::new(),
        }
    }
}

/// A keyed store of [`DiagnosticEntry`] records.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use structbind::{DiagnosticContext, FieldType, Schema};
///
/// let context = Arc::new(DiagnosticContext::new());
/// let user = Schema::new("User").field("id", FieldType::Int).build();
///
/// let instance = user.make_in(&context, [("id", "one")], false).unwrap();
///
/// assert!(!instance.is_valid());
/// assert_eq!(
///     context.errors("User"),
///     vec!["Property User::$id must be int, but string given!"]
/// );
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticContext {
    entries: RwLock<IndexMap<String, DiagnosticEntry>>,
    enabled: RwLock<IndexSet<String>>,
}

static GLOBAL: OnceLock<Arc<DiagnosticContext>> = OnceLock::new();

impl DiagnosticContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide context used by [`Schema::make`](crate::Schema::make).
    pub fn global() -> &'static Arc<DiagnosticContext> {
        GLOBAL.get_or_init(|| Arc::new(DiagnosticContext::new()))
    }

    /// Clears the errors and property snapshot for `id`, creating the entry
    /// if needed. Strictness is kept.
    pub fn reset(&self, id: &str) {
        let mut entries = self.entries.write();
        let entry = entries.entry(id.to_string()).or_default();
        entry.errors.clear();
        entry.properties.clear();
    }

    /// Turns on diagnostic collection for `id`. Lenient binds call this.
    pub fn enable(&self, id: &str) {
        self.enabled.write().insert(id.to_string());
    }

    /// Turns diagnostic collection for `id` back off.
    pub fn disable(&self, id: &str) {
        self.enabled.write().shift_remove(id);
    }

    /// True once `id` has been enabled and not disabled since.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.read().contains(id)
    }

    /// Records the strictness of the current bind.
    pub fn set_strict(&self, id: &str, strict: bool) {
        self.entries.write().entry(id.to_string()).or_default().strict = strict;
    }

    /// Records the resolved input of the current bind.
    pub fn set_properties(&self, id: &str, properties: Fields) {
        self.entries.write().entry(id.to_string()).or_default().properties = properties;
    }

    /// Appends one error message.
    pub fn push_error(&self, id: &str, message: impl Into<String>) {
        self.entries
            .write()
            .entry(id.to_string())
            .or_default()
            .errors
            .push(message.into());
    }

    /// Appends several error messages in order.
    pub fn extend_errors<I>(&self, id: &str, messages: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.entries
            .write()
            .entry(id.to_string())
            .or_default()
            .errors
            .extend(messages);
    }

    /// A copy of the entry for `id`.
    pub fn entry(&self, id: &str) -> Option<DiagnosticEntry> {
        self.entries.read().get(id).cloned()
    }

    /// Errors recorded for `id`; empty if it was never bound.
    pub fn errors(&self, id: &str) -> Vec<String> {
        self.entries
            .read()
            .get(id)
            .map(|entry| entry.errors.clone())
            .unwrap_or_default()
    }

    /// Error lists of every identity ever touched, in first-touch order.
    pub fn all_errors(&self) -> IndexMap<String, Vec<String>> {
        self.entries
            .read()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.errors.clone()))
            .collect()
    }

    /// The property snapshot for `id`.
    pub fn properties(&self, id: &str) -> Option<Fields> {
        self.entries.read().get(id).map(|entry| entry.properties.clone())
    }

    /// The strictness of the last bind of `id`.
    pub fn strict(&self, id: &str) -> Option<bool> {
        self.entries.read().get(id).map(|entry| entry.strict)
    }

    /// True iff no identity has any recorded error.
    pub fn is_clean(&self) -> bool {
        self.entries.read().values().all(|entry| entry.errors.is_empty())
    }

    /// Forgets every entry and enablement flag.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.enabled.write().clear();
    }
}
