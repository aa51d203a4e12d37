//! Action dispatch.
//!
//! The registry owns every declared [`Action`] and the static
//! [`HandlerCatalog`] they resolve against. `invoke` validates supplied
//! arguments, calls the handler, and wraps whatever comes back in an
//! [`Envelope`]. Application errors become error envelopes; they are never
//! propagated as `Err` and never take the process down.

use async_trait::async_trait;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::action::{Action, ArgValue, ArgumentMap};
use crate::error::{CoreError, CoreResult};

// ============================================================================
// HANDLERS
// ============================================================================

/// An operational handler an action dispatches to.
///
/// Handlers report their own success or failure inside the returned value;
/// the registry treats any returned value as a successful call.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Number of positional arguments the handler takes.
    fn arity(&self) -> usize;

    async fn call(&self, args: Vec<ArgValue>) -> Value;
}

/// Static name → handler table, built once at startup.
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler, replacing any previous entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn with(mut self, name: impl Into<String>, handler: Arc<dyn ActionHandler>) -> Self {
        self.insert(name, handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ActionHandler>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCatalog")
            .field("handlers", &self.names())
            .finish()
    }
}

/// Catalog name for a configured script path: its file stem.
///
/// `adapter_scripts/power_on.py` → `power_on`.
pub fn handler_name_for_path(script_path: &str) -> String {
    Path::new(script_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| script_path.to_string())
}

// ============================================================================
// ENVELOPE
// ============================================================================

pub const STATUS_OK: &str = "OK";
pub const STATUS_APPLICATION_ERROR: &str = "application error";

/// Application-level dispatch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchError {
    ModuleNotFound,
    UnexpectedFormat,
    UnexpectedArgument,
    HandlerFailure,
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::ModuleNotFound => "module not found",
            DispatchError::UnexpectedFormat => "unexpected format",
            DispatchError::UnexpectedArgument => "unexpected argument",
            DispatchError::HandlerFailure => "handler failure",
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Response body of every action invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub status: String,
    pub response: Value,
}

impl Envelope {
    pub fn ok(response: Value) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            response,
        }
    }

    pub fn error(error: DispatchError) -> Self {
        Self {
            status: STATUS_APPLICATION_ERROR.to_string(),
            response: Value::String(error.kind().to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Declared actions plus the catalog they dispatch into.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: Vec<Action>,
    by_name: HashMap<String, usize>,
    route_shapes: HashSet<String>,
    catalog: HandlerCatalog,
}

impl ActionRegistry {
    pub fn new(catalog: HandlerCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Register an action.
    ///
    /// Names and routes must be unique. A handler missing from the catalog
    /// is allowed here and reported per call as `module not found`.
    pub fn register(&mut self, action: Action) -> CoreResult<()> {
        if self.by_name.contains_key(&action.name) {
            return Err(CoreError::DuplicateAction { name: action.name });
        }
        let shape = action.route_shape();
        if self.route_shapes.contains(&shape) {
            return Err(CoreError::DuplicateRoute {
                route: action.route_template(),
            });
        }
        if !self.catalog.contains(&action.handler) {
            warn!(
                action = %action.name,
                handler = %action.handler,
                "Action handler is not in the catalog"
            );
        }

        self.route_shapes.insert(shape);
        self.by_name.insert(action.name.clone(), self.actions.len());
        self.actions.push(action);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.by_name.get(name).map(|&idx| &self.actions[idx])
    }

    /// Registered actions in registration order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn catalog(&self) -> &HandlerCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Invoke an action by name.
    ///
    /// Only an unknown action name is an `Err`; everything else is reported
    /// through the returned envelope.
    pub async fn invoke(&self, name: &str, args: ArgumentMap) -> CoreResult<Envelope> {
        let action = self.get(name).ok_or_else(|| CoreError::ActionNotFound {
            name: name.to_string(),
        })?;

        let envelope = match self.dispatch(action, args).await {
            Ok(response) => Envelope::ok(response),
            Err(err) => {
                warn!(action = %action.name, error = %err, "Action dispatch failed");
                Envelope::error(err)
            }
        };
        Ok(envelope)
    }

    async fn dispatch(
        &self,
        action: &Action,
        mut args: ArgumentMap,
    ) -> Result<Value, DispatchError> {
        if args.keys().any(|name| action.argument(name).is_none()) {
            return Err(DispatchError::UnexpectedArgument);
        }

        let handler = self
            .catalog
            .get(&action.handler)
            .ok_or(DispatchError::ModuleNotFound)?;

        if handler.arity() != action.arguments.len() {
            return Err(DispatchError::UnexpectedFormat);
        }
        let positional = action
            .arguments
            .iter()
            .map(|spec| args.remove(&spec.name))
            .collect::<Option<Vec<_>>>()
            .ok_or(DispatchError::UnexpectedFormat)?;

        debug!(action = %action.name, args = ?positional, "Invoking action handler");
        AssertUnwindSafe(handler.call(positional))
            .catch_unwind()
            .await
            .map_err(|_| DispatchError::HandlerFailure)
    }
}
