//! Global and per-stage variable scopes.
//!
//! Variables are referenced from expressions as `var.<name>`. A stage sees
//! every global variable plus its own, and its own always win:
//!
//! ```hcl
//! variables { region = "us-east-1" }
//!
//! stage "deploy" {
//!   variables { region = "eu-west-1" }
//!   run "push" { command = "deploy --region ${var.region}" }  # eu-west-1
//! }
//! ```
//!
//! Scopes only grow. Values are visible to expressions decoded after the
//! insert, never before.

use hcl::eval::Context;
use hcl::{Map, Value};
use serde::Serialize;
use tracing::debug;

use crate::Subject;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::schema;

/// Name under which the effective variables are exposed to expressions.
pub const VARIABLE_NAMESPACE: &str = "var";

/// Which scope a lookup or insert targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Global,
    Stage(&'a str),
}

impl<'a> Scope<'a> {
    pub fn stage_name(&self) -> Option<&'a str> {
        match *self {
            Scope::Global => None,
            Scope::Stage(name) => Some(name),
        }
    }
}

/// Two-level variable store owned by one decoded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Variables {
    global_variables: Map<String, Value>,
    stage_variables: Map<String, Map<String, Value>>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a global variable, replacing any earlier value.
    pub fn insert_global(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        debug!(scope = "global", name = %name, "Inserting variable");
        self.global_variables.insert(name, value);
    }

    /// Set a variable in `stage`'s scope, creating the scope on first use.
    pub fn insert_stage(&mut self, stage: &str, name: impl Into<String>, value: Value) {
        let name = name.into();
        debug!(scope = "stage", stage = %stage, name = %name, "Inserting variable");
        self.stage_variables
            .entry(stage.to_string())
            .or_default()
            .insert(name, value);
    }

    pub fn insert(&mut self, scope: Scope<'_>, name: impl Into<String>, value: Value) {
        match scope {
            Scope::Global => self.insert_global(name, value),
            Scope::Stage(stage) => self.insert_stage(stage, name, value),
        }
    }

    pub fn global_variables(&self) -> &Map<String, Value> {
        &self.global_variables
    }

    pub fn stage_variables(&self) -> &Map<String, Map<String, Value>> {
        &self.stage_variables
    }

    /// Variables declared directly in `stage`, if it has a scope yet.
    pub fn stage(&self, stage: &str) -> Option<&Map<String, Value>> {
        self.stage_variables.get(stage)
    }

    /// Look up one variable. Stage lookups fall back to the global scope.
    pub fn resolve(&self, name: &str, scope: Scope<'_>) -> Option<&Value> {
        match scope {
            Scope::Global => self.global_variables.get(name),
            Scope::Stage(stage) => self
                .stage(stage)
                .and_then(|vars| vars.get(name))
                .or_else(|| self.global_variables.get(name)),
        }
    }

    /// The flattened mapping an expression in `stage` evaluates against:
    /// all globals, overlaid with the stage's own variables.
    pub fn effective_variables(&self, stage: Option<&str>) -> Map<String, Value> {
        let mut scope = self.global_variables.clone();
        if let Some(stage_vars) = stage.and_then(|s| self.stage(s)) {
            for (name, value) in stage_vars {
                scope.insert(name.clone(), value.clone());
            }
        }
        scope
    }

    /// Evaluation context exposing [`Variables::effective_variables`] as
    /// `var`. With no variables at all the context is empty.
    pub fn effective_context(&self, stage: Option<&str>) -> Context<'static> {
        let scope = self.effective_variables(stage);
        let mut ctx = Context::new();
        if !scope.is_empty() {
            ctx.declare_var(VARIABLE_NAMESPACE, Value::Object(scope));
        }
        ctx
    }
}

/// Decode a `variables` block into `scope`.
///
/// Attributes are evaluated in source order, each against a context built
/// just before it, so an attribute may reference one defined above it in
/// the same block. Attributes that fail to evaluate are reported and not
/// inserted.
pub fn decode_variables_block(
    block: &hcl::Block,
    variables: &mut Variables,
    scope: Scope<'_>,
    parent: &Subject,
) -> Diagnostics {
    use hcl::eval::Evaluate;

    let subject = parent.block(block);
    let (attrs, mut diags) = schema::just_attributes(block.body(), &subject);

    for attr in attrs {
        let ctx = variables.effective_context(scope.stage_name());
        match attr.expr().evaluate(&ctx) {
            Ok(value) => variables.insert(scope, attr.key(), value),
            Err(err) => diags.push(
                Diagnostic::error(
                    "Invalid variable value",
                    format!("Variable {:?} could not be evaluated: {}", attr.key(), err),
                )
                .with_subject(&subject.child(attr.key())),
            ),
        }
    }

    diags
}
