// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Parse units: named collections of templates that can refer to each other.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Instant;

use crate::ast::Ast;
use crate::error::Error;
use crate::exec::{self, WriterOutput};
use crate::options::Options;
use crate::parser;
use crate::runtime::{EvalContext, FunctionRegistry};
use crate::telemetry;
use crate::value::Value;

/// Shared storage behind a [`TemplateSet`] and its handles.
#[derive(Debug, Default)]
pub(crate) struct Namespace {
    state: RwLock<NamespaceState>,
}

#[derive(Debug, Default)]
struct NamespaceState {
    templates: BTreeMap<String, Arc<Compiled>>,
    options: Options,
}

impl Namespace {
    fn new(options: Options) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(NamespaceState {
                templates: BTreeMap::new(),
                options,
            }),
        })
    }

    /// An empty namespace for contexts that are not tied to a set.
    pub(crate) fn detached() -> Arc<Self> {
        Self::new(Options::default())
    }

    fn read(&self) -> RwLockReadGuard<'_, NamespaceState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, NamespaceState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<Compiled>> {
        self.read().templates.get(name).cloned()
    }

    pub(crate) fn options(&self) -> Options {
        self.read().options
    }
}

/// One named template body together with what it needs to run.
#[derive(Debug)]
pub(crate) struct Compiled {
    pub(crate) ast: Ast,
    /// Full source of the parse call that produced `ast`; spans index into it.
    pub(crate) source: Arc<str>,
    /// Helpers in force when the template was parsed.
    pub(crate) functions: FunctionRegistry,
}

impl Compiled {
    pub(crate) fn name(&self) -> &str {
        &self.ast.name
    }
}

/// A parsed template bound to the set it was parsed in.
///
/// Cloning is cheap; clones share the compiled tree and the namespace.
#[derive(Clone)]
pub struct Template {
    compiled: Arc<Compiled>,
    namespace: Arc<Namespace>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name())
            .field("source", &self.source())
            .finish()
    }
}

impl Template {
    /// Parses a standalone template without helper functions.
    pub fn parse_str(name: &str, source: &str) -> Result<Self, Error> {
        Self::parse_with_functions(name, source, FunctionRegistry::empty())
    }

    /// Parses a standalone template in a fresh set using `functions`.
    pub fn parse_with_functions(
        name: &str,
        source: &str,
        functions: FunctionRegistry,
    ) -> Result<Self, Error> {
        TemplateSet::new(name).with_functions(functions).parse(source)
    }

    pub fn name(&self) -> &str {
        self.compiled.name()
    }

    /// Source text of the parse call this template came from.
    pub fn source(&self) -> &str {
        &self.compiled.source
    }

    pub fn ast(&self) -> &Ast {
        &self.compiled.ast
    }

    /// Helpers this template was parsed against.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.compiled.functions
    }

    /// Returns a canonical string representation of the parsed template, similar to Go's
    /// `parse.Tree.Root.String()` output.
    pub fn to_template_string(&self) -> String {
        self.compiled.ast.to_string()
    }

    /// Executes the template against `data`, streaming output to `writer`.
    pub fn execute<W: io::Write>(&self, writer: W, data: &Value) -> Result<(), Error> {
        let started = Instant::now();
        let mut output = WriterOutput::new(writer);
        let result = exec::execute(&self.compiled, &self.namespace, data.clone(), 0, &mut output)
            .and_then(|()| output.flush());
        telemetry::record_render(
            self.name(),
            self.compiled.source.len(),
            started.elapsed(),
            result.is_ok(),
        );
        result
    }

    /// Executes the template into a `String`.
    pub fn render(&self, data: &Value) -> Result<String, Error> {
        let started = Instant::now();
        let mut output = String::new();
        let result = exec::execute(&self.compiled, &self.namespace, data.clone(), 0, &mut output);
        telemetry::record_render(
            self.name(),
            self.compiled.source.len(),
            started.elapsed(),
            result.is_ok(),
        );
        result.map(|()| output)
    }

    /// Executes the template into a `String` one level below `parent`.
    ///
    /// This is what helpers such as `include` use: the nesting depth carries
    /// over from `parent` and the call fails once the set's `max_depth` would
    /// be exceeded.
    pub fn render_nested(&self, parent: &EvalContext, data: Value) -> Result<String, Error> {
        let depth = parent.depth() + 1;
        let max_depth = self.namespace.options().max_depth;
        if depth > max_depth {
            return Err(Error::execute(
                format!("exceeded maximum template depth ({max_depth})"),
                None,
            ));
        }
        let mut output = String::new();
        let result = exec::execute(&self.compiled, &self.namespace, data, depth, &mut output);
        telemetry::record_nested_execution(self.name(), "include", depth, result.is_ok());
        result.map(|()| output)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.compiled.ast.fmt(f)
    }
}

/// Weak reference to a [`TemplateSet`]'s namespace.
///
/// A handle can be taken before anything is parsed, which lets helper
/// closures look up templates from the very set they are registered in
/// without keeping that set alive.
#[derive(Clone, Debug)]
pub struct TemplateHandle {
    namespace: Weak<Namespace>,
}

impl TemplateHandle {
    /// Finds a template by name; `None` when it is unknown or the set is gone.
    pub fn lookup(&self, name: &str) -> Option<Template> {
        let namespace = self.namespace.upgrade()?;
        let compiled = namespace.get(name)?;
        Some(Template {
            compiled,
            namespace,
        })
    }
}

/// A named namespace of templates sharing one helper registry and one set of
/// options, the counterpart of a Go `*template.Template` and its associated
/// templates.
///
/// ```
/// use stencil_engine::{TemplateSet, Value};
///
/// let mut set = TemplateSet::new("page");
/// set.parse(r#"{{define "greeting"}}hello {{.}}{{end}}"#).unwrap();
/// let page = set.parse(r#"{{template "greeting" .name}}!"#).unwrap();
///
/// let data: Value = [("name", "world")].into_iter().collect();
/// assert_eq!(page.render(&data).unwrap(), "hello world!");
/// ```
#[derive(Debug)]
pub struct TemplateSet {
    name: String,
    functions: FunctionRegistry,
    namespace: Arc<Namespace>,
}

impl TemplateSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: FunctionRegistry::empty(),
            namespace: Namespace::new(Options::default()),
        }
    }

    /// Sets the helpers used by subsequent `parse` calls. Templates already
    /// parsed keep the registry they were parsed with.
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn set_functions(&mut self, functions: FunctionRegistry) {
        self.functions = functions;
    }

    pub fn with_options(self, options: Options) -> Self {
        self.namespace.write().options = options;
        self
    }

    /// Applies a Go option string, e.g. `missingkey=zero`.
    pub fn option(&mut self, option: &str) -> Result<&mut Self, Error> {
        let mut options = self.namespace.options();
        options.apply(option)?;
        self.namespace.write().options = options;
        Ok(self)
    }

    pub fn options(&self) -> Options {
        self.namespace.options()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn handle(&self) -> TemplateHandle {
        TemplateHandle {
            namespace: Arc::downgrade(&self.namespace),
        }
    }

    /// Parses `source` into the set.
    ///
    /// Every `define`/`block` in the source is added under its own name,
    /// replacing earlier definitions from previous calls. The main body is
    /// stored under the set's name unless it is empty and a template of that
    /// name already exists.
    pub fn parse(&mut self, source: &str) -> Result<Template, Error> {
        let unit = parser::parse(&self.name, source, &self.functions)?;
        let source: Arc<str> = Arc::from(source);

        let mut state = self.namespace.write();
        for ast in unit.definitions {
            let compiled = Compiled {
                ast,
                source: source.clone(),
                functions: self.functions.clone(),
            };
            state
                .templates
                .insert(compiled.name().to_string(), Arc::new(compiled));
        }

        let main_name = unit.main.name.clone();
        if !unit.main.is_empty_body() || !state.templates.contains_key(&main_name) {
            let compiled = Compiled {
                ast: unit.main,
                source,
                functions: self.functions.clone(),
            };
            state.templates.insert(main_name.clone(), Arc::new(compiled));
        }

        let compiled = state
            .templates
            .get(&main_name)
            .cloned()
            .ok_or_else(|| Error::parse(format!("template \"{main_name}\" was not stored"), None))?;
        Ok(Template {
            compiled,
            namespace: self.namespace.clone(),
        })
    }

    pub fn lookup(&self, name: &str) -> Option<Template> {
        self.namespace.get(name).map(|compiled| Template {
            compiled,
            namespace: self.namespace.clone(),
        })
    }

    /// Names of every template in the set, sorted.
    pub fn template_names(&self) -> Vec<String> {
        self.namespace.read().templates.keys().cloned().collect()
    }

    /// Executes the set's main template.
    pub fn execute<W: io::Write>(&self, writer: W, data: &Value) -> Result<(), Error> {
        self.main()?.execute(writer, data)
    }

    /// Executes the named template from the set.
    pub fn execute_template<W: io::Write>(
        &self,
        writer: W,
        name: &str,
        data: &Value,
    ) -> Result<(), Error> {
        self.named(name)?.execute(writer, data)
    }

    pub fn render(&self, data: &Value) -> Result<String, Error> {
        self.main()?.render(data)
    }

    pub fn render_template(&self, name: &str, data: &Value) -> Result<String, Error> {
        self.named(name)?.render(data)
    }

    fn main(&self) -> Result<Template, Error> {
        self.lookup(&self.name).ok_or_else(|| {
            Error::execute(
                format!("\"{}\" is an incomplete or empty template", self.name),
                None,
            )
        })
    }

    fn named(&self, name: &str) -> Result<Template, Error> {
        self.lookup(name).ok_or_else(|| {
            Error::execute(
                format!(
                    "no template \"{name}\" associated with template \"{}\"",
                    self.name
                ),
                None,
            )
        })
    }
}
