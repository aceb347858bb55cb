// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::io;
use std::sync::Arc;

use crate::ast::{Block, IfNode, Node, Pipeline, RangeNode, Span, TemplateNode, WithNode};
use crate::error::Error;
use crate::runtime::EvalContext;
use crate::set::{Compiled, Namespace};
use crate::telemetry;
use crate::value::Value;

/// Sink for rendered text.
pub(crate) trait Output {
    fn write_str(&mut self, text: &str) -> Result<(), Error>;
}

impl Output for String {
    fn write_str(&mut self, text: &str) -> Result<(), Error> {
        self.push_str(text);
        Ok(())
    }
}

pub(crate) struct WriterOutput<W> {
    writer: W,
}

impl<W: io::Write> WriterOutput<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { writer }
    }

    pub(crate) fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush().map_err(write_error)
    }
}

impl<W: io::Write> Output for WriterOutput<W> {
    fn write_str(&mut self, text: &str) -> Result<(), Error> {
        self.writer.write_all(text.as_bytes()).map_err(write_error)
    }
}

fn write_error(err: io::Error) -> Error {
    Error::execute(format!("write failed: {err}"), None).with_source(err)
}

/// Runs `compiled` with `data` as both `.` and `$`.
pub(crate) fn execute(
    compiled: &Compiled,
    namespace: &Arc<Namespace>,
    data: Value,
    depth: usize,
    out: &mut dyn Output,
) -> Result<(), Error> {
    let ctx = EvalContext::with_namespace(
        data,
        compiled.functions.clone(),
        namespace.clone(),
        depth,
    );
    let mut executor = Executor { compiled, ctx, out };
    executor.render_block(&compiled.ast.root)
}

struct Executor<'a> {
    compiled: &'a Compiled,
    ctx: EvalContext,
    out: &'a mut dyn Output,
}

impl Executor<'_> {
    fn render_block(&mut self, block: &Block) -> Result<(), Error> {
        for node in &block.nodes {
            self.render_node(node)?;
        }
        Ok(())
    }

    fn render_node(&mut self, node: &Node) -> Result<(), Error> {
        match node {
            Node::Text(text) => self.out.write_str(&text.text),
            Node::Comment(_) => Ok(()),
            Node::Action(action) => {
                let value = self.pipeline(&action.pipeline)?;
                // declarations print nothing
                if action.pipeline.declarations.is_some() {
                    return Ok(());
                }
                self.print(&value)
            }
            Node::If(node) => self.render_if(node),
            Node::Range(node) => self.render_range(node),
            Node::With(node) => self.render_with(node),
            Node::Template(node) => self.render_template(node),
        }
    }

    fn print(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::String(text) => self.out.write_str(text),
            other => self.out.write_str(&other.to_string()),
        }
    }

    /// Prefixes `err` with `template:line` of the action at `span`.
    fn locate(&self, err: Error, span: Span) -> Error {
        let source = self.compiled.source.as_bytes();
        let end = span.start.min(source.len());
        let line = source[..end].iter().filter(|byte| **byte == b'\n').count() + 1;
        err.or_span(span)
            .context(format!("{}:{line}", self.compiled.name()))
    }

    fn pipeline(&mut self, pipeline: &Pipeline) -> Result<Value, Error> {
        self.ctx
            .eval_pipeline(pipeline)
            .map_err(|err| self.locate(err, pipeline.span))
    }

    fn pipeline_value(&mut self, pipeline: &Pipeline) -> Result<Value, Error> {
        self.ctx
            .eval_pipeline_value(pipeline)
            .map_err(|err| self.locate(err, pipeline.span))
    }

    fn render_if(&mut self, node: &IfNode) -> Result<(), Error> {
        self.ctx.push_scope();
        let result = self.render_if_branches(node);
        self.ctx.pop_scope();
        result
    }

    fn render_if_branches(&mut self, node: &IfNode) -> Result<(), Error> {
        if self.pipeline(&node.pipeline)?.is_truthy() {
            return self.render_block(&node.then_block);
        }
        for branch in &node.else_if_branches {
            if self.pipeline(&branch.pipeline)?.is_truthy() {
                return self.render_block(&branch.block);
            }
        }
        match &node.else_block {
            Some(block) => self.render_block(block),
            None => Ok(()),
        }
    }

    fn render_with(&mut self, node: &WithNode) -> Result<(), Error> {
        self.ctx.push_scope();
        let result = match self.pipeline(&node.pipeline) {
            Ok(value) if value.is_truthy() => {
                self.ctx.push_dot(value);
                let result = self.render_block(&node.then_block);
                self.ctx.pop_dot();
                result
            }
            Ok(_) => match &node.else_block {
                Some(block) => self.render_block(block),
                None => Ok(()),
            },
            Err(err) => Err(err),
        };
        self.ctx.pop_scope();
        result
    }

    fn render_range(&mut self, node: &RangeNode) -> Result<(), Error> {
        let value = self.pipeline_value(&node.pipeline)?;
        let items: Vec<(Value, Value)> = match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| (Value::from(idx), item))
                .collect(),
            Value::Map(map) => map
                .into_iter()
                .map(|(key, item)| (Value::String(key), item))
                .collect(),
            Value::Int(count) => {
                if node
                    .pipeline
                    .declarations
                    .as_ref()
                    .is_some_and(|decls| decls.variables.len() > 1)
                {
                    return Err(self.locate(
                        Error::execute("can't use two variables when ranging over an int", None),
                        node.pipeline.span,
                    ));
                }
                (0..count.max(0))
                    .map(|idx| (Value::Int(idx), Value::Int(idx)))
                    .collect()
            }
            Value::Null => Vec::new(),
            other => {
                return Err(self.locate(
                    Error::execute(format!("range can't iterate over {other}"), None),
                    node.pipeline.span,
                ));
            }
        };

        if items.is_empty() {
            return match &node.else_block {
                Some(block) => self.render_block(block),
                None => Ok(()),
            };
        }

        self.ctx.push_scope();
        let result = self.render_range_items(node, items);
        self.ctx.pop_scope();
        result
    }

    fn render_range_items(
        &mut self,
        node: &RangeNode,
        items: Vec<(Value, Value)>,
    ) -> Result<(), Error> {
        for (key, item) in items {
            if let Some(decls) = &node.pipeline.declarations {
                let bound = if decls.variables.len() > 1 {
                    vec![key, item.clone()]
                } else {
                    vec![item.clone()]
                };
                self.ctx
                    .bind(decls, bound)
                    .map_err(|err| self.locate(err, node.pipeline.span))?;
            }

            self.ctx.push_dot(item);
            self.ctx.push_scope();
            let result = self.render_block(&node.then_block);
            self.ctx.pop_scope();
            self.ctx.pop_dot();
            result?;
        }
        Ok(())
    }

    fn render_template(&mut self, node: &TemplateNode) -> Result<(), Error> {
        let data = match &node.pipeline {
            Some(pipeline) => self.pipeline(pipeline)?,
            None => Value::Null,
        };

        let Some(target) = self.ctx.namespace().get(&node.name) else {
            return Err(self.locate(
                Error::execute(
                    format!(
                        "no template \"{}\" associated with template \"{}\"",
                        node.name,
                        self.compiled.name()
                    ),
                    None,
                ),
                node.span,
            ));
        };

        let depth = self.ctx.depth() + 1;
        let max_depth = self.ctx.options().max_depth;
        if depth > max_depth {
            return Err(self.locate(
                Error::execute(format!("exceeded maximum template depth ({max_depth})"), None),
                node.span,
            ));
        }

        let namespace = self.ctx.namespace().clone();
        let result = execute(&target, &namespace, data, depth, &mut *self.out);
        telemetry::record_nested_execution(&node.name, "template", depth, result.is_ok());
        result
    }
}
