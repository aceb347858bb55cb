// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::ast::{BindingKind, Command, Expression, Pipeline, PipelineDeclarations};
use crate::error::Error;
use crate::options::{MissingKey, Options};
use crate::set::Namespace;
use crate::telemetry;
use crate::value::Value;

/// Signature implemented by helper functions invoked from templates.
pub type Function = dyn Fn(&mut EvalContext, &[Value]) -> Result<Value, Error> + Send + Sync;

static NULL: Value = Value::Null;

/// Registry that maps helper names to callable functions.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    map: Arc<HashMap<String, Arc<Function>>>,
    /// Helpers whose arguments are evaluated left to right only until one
    /// has this truthiness, like Go's `and` and `or`.
    stops: Arc<HashMap<String, bool>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.function_names())
            .finish()
    }
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a new builder for constructing registries.
    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder::new()
    }

    /// Fetches a helper function by name.
    pub fn get(&self, name: &str) -> Option<Arc<Function>> {
        self.map.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// The truthiness that ends argument evaluation for `name`, if the
    /// helper was registered with [`FunctionRegistryBuilder::register_short_circuit`].
    pub fn short_circuit(&self, name: &str) -> Option<bool> {
        self.stops.get(name).copied()
    }

    /// Reports whether the registry contains no helper functions.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns a sorted list of the registered function names.
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Collects helpers before freezing them into an immutable [`FunctionRegistry`].
///
/// Templates resolve helper names while they are parsed, so everything a
/// template calls has to be registered before the registry is handed to the
/// template set.
#[derive(Default)]
pub struct FunctionRegistryBuilder {
    map: HashMap<String, Arc<Function>>,
    stops: HashMap<String, bool>,
}

impl FunctionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a helper function under the provided name, replacing any
    /// previous helper with that name.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&mut EvalContext, &[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        let name = name.into();
        self.stops.remove(&name);
        self.map.insert(name, Arc::new(func));
        self
    }

    /// Registers a helper whose arguments are evaluated lazily: evaluation
    /// stops at the first argument whose truthiness equals `stop_on`, and
    /// `func` only receives the arguments evaluated so far. `and` stops on
    /// `false`, `or` on `true`.
    pub fn register_short_circuit<F>(
        &mut self,
        name: impl Into<String>,
        stop_on: bool,
        func: F,
    ) -> &mut Self
    where
        F: Fn(&mut EvalContext, &[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        let name = name.into();
        self.stops.insert(name.clone(), stop_on);
        self.map.insert(name, Arc::new(func));
        self
    }

    /// Copies every helper from `other` into the builder.
    pub fn extend(&mut self, other: &FunctionRegistry) -> &mut Self {
        for (key, value) in other.map.iter() {
            self.stops.remove(key);
            self.map.insert(key.clone(), value.clone());
        }
        for (key, stop_on) in other.stops.iter() {
            self.stops.insert(key.clone(), *stop_on);
        }
        self
    }

    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            map: Arc::new(self.map),
            stops: Arc::new(self.stops),
        }
    }
}

/// Execution state threaded through template evaluation and handed to
/// helper functions.
pub struct EvalContext {
    dots: Vec<Value>,
    root: Value,
    scopes: Vec<Vec<(String, Value)>>,
    functions: FunctionRegistry,
    namespace: Arc<Namespace>,
    options: Options,
    depth: usize,
}

impl EvalContext {
    /// Creates a standalone context with default options, mainly for calling
    /// helpers outside of a template.
    pub fn new(data: Value, functions: FunctionRegistry) -> Self {
        Self::with_namespace(data, functions, Namespace::detached(), 0)
    }

    pub(crate) fn with_namespace(
        data: Value,
        functions: FunctionRegistry,
        namespace: Arc<Namespace>,
        depth: usize,
    ) -> Self {
        let options = namespace.options();
        Self {
            dots: vec![data.clone()],
            scopes: vec![vec![("$".to_string(), data.clone())]],
            root: data,
            functions,
            namespace,
            options,
            depth,
        }
    }

    /// Current value of `.`.
    pub fn dot(&self) -> &Value {
        self.dots.last().unwrap_or(&self.root)
    }

    /// The data the template was executed with, i.e. `$`.
    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn push_dot(&mut self, value: Value) {
        self.dots.push(value);
    }

    pub fn pop_dot(&mut self) {
        if self.dots.len() > 1 {
            self.dots.pop();
        }
    }

    /// Opens a variable scope; declarations made until the matching
    /// [`pop_scope`](Self::pop_scope) disappear with it.
    pub fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Binds `name` in the innermost scope.
    pub fn declare(&mut self, name: &str, value: Value) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        match scope.iter_mut().rev().find(|(existing, _)| existing == name) {
            Some(slot) => slot.1 = value,
            None => scope.push((name.to_string(), value)),
        }
    }

    /// Overwrites the innermost visible binding of `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), Error> {
        let slot = self
            .scopes
            .iter_mut()
            .rev()
            .flat_map(|scope| scope.iter_mut().rev())
            .find(|(existing, _)| existing == name)
            .ok_or_else(|| Error::execute(format!("undefined variable \"{name}\""), None))?;
        slot.1 = value;
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Retrieves a helper function by name, if registered.
    pub fn function(&self, name: &str) -> Option<Arc<Function>> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Number of `template`/`include` frames above this context.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }

    /// Invokes a registered helper, reporting failures as
    /// `error calling <name>: ...`.
    pub fn call_function(&mut self, name: &str, args: &[Value]) -> Result<Value, Error> {
        let func = self
            .function(name)
            .ok_or_else(|| Error::execute(format!("function \"{name}\" not defined"), None))?;
        let result = func(self, args);
        telemetry::record_helper_invocation(name, result.is_ok());
        result.map_err(|err| err.context(format!("error calling {name}")))
    }

    /// Evaluates a pipeline and applies its `:=` / `=` bindings.
    pub fn eval_pipeline(&mut self, pipeline: &Pipeline) -> Result<Value, Error> {
        let value = self.eval_pipeline_value(pipeline)?;
        if let Some(decls) = &pipeline.declarations {
            self.bind(decls, [value.clone()])?;
        }
        Ok(value)
    }

    /// Evaluates a pipeline, ignoring any declarations it carries.
    pub(crate) fn eval_pipeline_value(&mut self, pipeline: &Pipeline) -> Result<Value, Error> {
        let mut value = None;
        for command in &pipeline.commands {
            value = Some(self.eval_command(command, value.take())?);
        }
        value.ok_or_else(|| Error::execute_with_span("missing value for command", pipeline.span))
    }

    /// Binds `values` to the declared variables in order.
    pub(crate) fn bind(
        &mut self,
        decls: &PipelineDeclarations,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<(), Error> {
        for (name, value) in decls.variables.iter().zip(values) {
            match decls.kind {
                BindingKind::Declare => self.declare(name, value),
                BindingKind::Assign => self.assign(name, value)?,
            }
        }
        Ok(())
    }

    fn eval_command(&mut self, command: &Command, piped: Option<Value>) -> Result<Value, Error> {
        let result = match &command.target {
            Expression::Function(name) => {
                let stop_on = self.functions.short_circuit(name);
                let mut args: SmallVec<[Value; 4]> =
                    SmallVec::with_capacity(command.args.len() + usize::from(piped.is_some()));
                let mut decided = false;
                for arg in &command.args {
                    let value = self.eval_expression(arg)?;
                    decided = stop_on == Some(value.is_truthy());
                    args.push(value);
                    if decided {
                        break;
                    }
                }
                if !decided {
                    args.extend(piped);
                }
                self.call_function(name, &args)
            }
            target if piped.is_none() && command.args.is_empty() => self.eval_expression(target),
            target => Err(Error::execute(
                format!("can't give argument to non-function {target}"),
                None,
            )),
        };
        result.map_err(|err| err.or_span(command.span))
    }

    fn eval_expression(&mut self, expr: &Expression) -> Result<Value, Error> {
        match expr {
            Expression::Function(name) => self.call_function(name, &[]),
            Expression::Dot => Ok(self.dot().clone()),
            Expression::Field(path) => self.walk(self.dot(), path).cloned(),
            Expression::Variable { name, path } => {
                let value = self
                    .variable(name)
                    .ok_or_else(|| Error::execute(format!("undefined variable \"{name}\""), None))?;
                self.walk(value, path).cloned()
            }
            Expression::Chain { base, path } => {
                let value = self.eval_expression(base)?;
                self.walk(&value, path).cloned()
            }
            Expression::Pipeline(pipeline) => self.eval_pipeline_value(pipeline),
            Expression::String(value) => Ok(Value::String(value.clone())),
            Expression::Int(value) => Ok(Value::Int(*value)),
            Expression::Float(value) => Ok(Value::Float(*value)),
            Expression::Bool(flag) => Ok(Value::Bool(*flag)),
            Expression::Nil => Ok(Value::Null),
        }
    }

    fn walk<'v>(&self, mut value: &'v Value, path: &[String]) -> Result<&'v Value, Error> {
        for key in path {
            value = self.field(value, key)?;
        }
        Ok(value)
    }

    /// Resolves `.key` on `value` according to the missing-key policy.
    pub fn field<'v>(&self, value: &'v Value, key: &str) -> Result<&'v Value, Error> {
        match value {
            Value::Map(map) => match map.get(key) {
                Some(found) => Ok(found),
                None if self.options.missing_key == MissingKey::Zero => Ok(&NULL),
                None => Err(Error::execute(
                    format!("map has no entry for key \"{key}\""),
                    None,
                )),
            },
            Value::Null => Err(Error::execute(
                format!("nil pointer evaluating interface {{}}.{key}"),
                None,
            )),
            other => Err(Error::execute(
                format!("can't evaluate field {key} in type {}", other.kind()),
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use serde_json::json;

    fn registry_with_echo() -> FunctionRegistry {
        let mut builder = FunctionRegistry::builder();
        builder.register("echo", |_, args| {
            Ok(Value::List(args.to_vec()))
        });
        builder.register("boom", |_, _| Err(Error::execute("kaboom", None)));
        builder.build()
    }

    fn command(target: Expression, args: Vec<Expression>) -> Command {
        Command {
            span: Span::new(0, 1),
            target,
            args,
        }
    }

    fn pipeline(commands: Vec<Command>) -> Pipeline {
        Pipeline {
            span: Span::new(0, 1),
            declarations: None,
            commands,
        }
    }

    #[test]
    fn registry_lists_sorted_names() {
        let registry = registry_with_echo();
        assert_eq!(registry.function_names(), vec!["boom", "echo"]);
        assert!(registry.contains("echo"));
        assert!(!FunctionRegistry::empty().contains("echo"));
    }

    #[test]
    fn piped_value_becomes_last_argument() {
        let mut ctx = EvalContext::new(Value::Null, registry_with_echo());
        let value = ctx
            .eval_pipeline(&pipeline(vec![
                command(Expression::Int(1), Vec::new()),
                command(
                    Expression::Function("echo".into()),
                    vec![Expression::String("a".into())],
                ),
            ]))
            .unwrap();
        assert_eq!(value, Value::List(vec![Value::from("a"), Value::Int(1)]));
    }

    #[test]
    fn later_registration_clears_short_circuit() {
        let mut builder = FunctionRegistry::builder();
        builder.register_short_circuit("and", false, |_, _| Ok(Value::Null));
        let lazy = builder.build();
        assert_eq!(lazy.short_circuit("and"), Some(false));

        let mut builder = FunctionRegistry::builder();
        builder.extend(&lazy).register("and", |_, _| Ok(Value::Null));
        let eager = builder.build();
        assert_eq!(eager.short_circuit("and"), None);
        assert!(eager.contains("and"));
    }

    #[test]
    fn helper_errors_name_the_helper() {
        let mut ctx = EvalContext::new(Value::Null, registry_with_echo());
        let err = ctx
            .eval_pipeline(&pipeline(vec![command(
                Expression::Function("boom".into()),
                Vec::new(),
            )]))
            .unwrap_err();
        assert!(err.is_execute());
        assert_eq!(err.message(), "error calling boom: kaboom");
        assert_eq!(err.span(), Some(Span::new(0, 1)));
    }

    #[test]
    fn missing_keys_follow_policy() {
        let data = Value::from(json!({"present": {"inner": 1}}));
        let ctx = EvalContext::new(data.clone(), FunctionRegistry::empty());
        let err = ctx.field(&data, "absent").unwrap_err();
        assert_eq!(err.message(), "map has no entry for key \"absent\"");

        let mut lenient = EvalContext::new(data.clone(), FunctionRegistry::empty());
        lenient.options = Options::default().with_missing_key(MissingKey::Zero);
        assert_eq!(lenient.field(&data, "absent").unwrap(), &Value::Null);
        let err = lenient
            .walk(&data, &["absent".to_string(), "deeper".to_string()])
            .unwrap_err();
        assert!(err.message().contains("nil pointer evaluating"));
    }

    #[test]
    fn field_on_scalar_is_an_error() {
        let ctx = EvalContext::new(Value::Null, FunctionRegistry::empty());
        let err = ctx.field(&Value::Int(3), "x").unwrap_err();
        assert_eq!(err.message(), "can't evaluate field x in type int");
    }

    #[test]
    fn scopes_shadow_and_restore() {
        let mut ctx = EvalContext::new(Value::from("root"), FunctionRegistry::empty());
        ctx.declare("$x", Value::Int(1));
        ctx.push_scope();
        ctx.declare("$x", Value::Int(2));
        assert_eq!(ctx.variable("$x"), Some(&Value::Int(2)));
        ctx.pop_scope();
        assert_eq!(ctx.variable("$x"), Some(&Value::Int(1)));

        ctx.push_scope();
        ctx.assign("$x", Value::Int(5)).unwrap();
        ctx.pop_scope();
        assert_eq!(ctx.variable("$x"), Some(&Value::Int(5)));
        assert!(ctx.assign("$nope", Value::Null).is_err());
        assert_eq!(ctx.variable("$"), Some(&Value::from("root")));
    }

    #[test]
    fn dot_stack_never_underflows() {
        let mut ctx = EvalContext::new(Value::Int(1), FunctionRegistry::empty());
        ctx.push_dot(Value::Int(2));
        assert_eq!(ctx.dot(), &Value::Int(2));
        ctx.pop_dot();
        ctx.pop_dot();
        assert_eq!(ctx.dot(), &Value::Int(1));
    }
}
