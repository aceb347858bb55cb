// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fmt;

use crate::value::format_float;

/// Byte offsets into the original template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Parsed body of one named template.
#[derive(Debug, Clone)]
pub struct Ast {
    pub name: String,
    pub root: Block,
}

impl Ast {
    pub fn new(name: impl Into<String>, root: Block) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// True when the body holds nothing but whitespace and comments.
    pub fn is_empty_body(&self) -> bool {
        self.root.nodes.iter().all(|node| match node {
            Node::Text(text) => text.text.trim().is_empty(),
            Node::Comment(_) => true,
            _ => false,
        })
    }
}

/// A sequential block of nodes (Go's `parse.ListNode`).
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub nodes: Vec<Node>,
}

impl Block {
    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Node {
    Text(TextNode),
    Action(ActionNode),
    Comment(CommentNode),
    If(IfNode),
    Range(RangeNode),
    With(WithNode),
    Template(TemplateNode),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Text(node) => node.span,
            Node::Action(node) => node.span,
            Node::Comment(node) => node.span,
            Node::If(node) => node.span,
            Node::Range(node) => node.span,
            Node::With(node) => node.span,
            Node::Template(node) => node.span,
        }
    }
}

/// Literal text, already trimmed where trim markers asked for it.
#[derive(Debug, Clone)]
pub struct TextNode {
    pub span: Span,
    pub text: String,
}

/// `{{pipeline}}`
#[derive(Debug, Clone)]
pub struct ActionNode {
    pub span: Span,
    pub pipeline: Pipeline,
}

/// `{{/* ... */}}`; `text` keeps the delimiters.
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct IfNode {
    pub span: Span,
    pub pipeline: Pipeline,
    pub then_block: Block,
    pub else_if_branches: Vec<ElseIfBranch>,
    pub else_block: Option<Block>,
}

/// One `{{else if ...}}` arm of an [`IfNode`].
#[derive(Debug, Clone)]
pub struct ElseIfBranch {
    pub span: Span,
    pub pipeline: Pipeline,
    pub block: Block,
}

#[derive(Debug, Clone)]
pub struct RangeNode {
    pub span: Span,
    pub pipeline: Pipeline,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

#[derive(Debug, Clone)]
pub struct WithNode {
    pub span: Span,
    pub pipeline: Pipeline,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

/// `{{template "name" pipeline}}`, also produced by `{{block}}`.
#[derive(Debug, Clone)]
pub struct TemplateNode {
    pub span: Span,
    pub name: String,
    pub pipeline: Option<Pipeline>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    pub span: Span,
    pub declarations: Option<PipelineDeclarations>,
    pub commands: Vec<Command>,
}

/// Variables leading a pipeline, e.g. `$k, $v :=`.
#[derive(Debug, Clone)]
pub struct PipelineDeclarations {
    pub kind: BindingKind,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Declare,
    Assign,
}

/// A pipeline stage: an operand followed by its arguments.
#[derive(Debug, Clone)]
pub struct Command {
    pub span: Span,
    pub target: Expression,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Expression {
    /// Helper function name.
    Function(String),
    /// `.`
    Dot,
    /// `.a.b`, relative to dot.
    Field(Vec<String>),
    /// `$`, `$x` or `$x.a.b`.
    Variable { name: String, path: Vec<String> },
    /// Field access on a parenthesised pipeline, `(pipeline).a`.
    Chain {
        base: Box<Expression>,
        path: Vec<String>,
    },
    /// Parenthesised pipeline.
    Pipeline(Pipeline),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
}

impl Expression {
    pub fn is_function(&self) -> bool {
        matches!(self, Expression::Function(_))
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt(f)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            node.fmt(f)?;
        }
        Ok(())
    }
}

fn write_else(f: &mut fmt::Formatter<'_>, else_block: Option<&Block>) -> fmt::Result {
    if let Some(block) = else_block {
        write!(f, "{{{{else}}}}{block}")?;
    }
    f.write_str("{{end}}")
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(node) => f.write_str(&node.text),
            Node::Comment(node) => write!(f, "{{{{{}}}}}", node.text),
            Node::Action(node) => write!(f, "{{{{{}}}}}", node.pipeline),
            Node::If(node) => {
                write!(f, "{{{{if {}}}}}{}", node.pipeline, node.then_block)?;
                for branch in &node.else_if_branches {
                    write!(f, "{{{{else if {}}}}}{}", branch.pipeline, branch.block)?;
                }
                write_else(f, node.else_block.as_ref())
            }
            Node::Range(node) => {
                write!(f, "{{{{range {}}}}}{}", node.pipeline, node.then_block)?;
                write_else(f, node.else_block.as_ref())
            }
            Node::With(node) => {
                write!(f, "{{{{with {}}}}}{}", node.pipeline, node.then_block)?;
                write_else(f, node.else_block.as_ref())
            }
            Node::Template(node) => {
                write!(f, "{{{{template {}", quote(&node.name))?;
                if let Some(pipeline) = &node.pipeline {
                    write!(f, " {pipeline}")?;
                }
                f.write_str("}}")
            }
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(decls) = &self.declarations {
            let op = match decls.kind {
                BindingKind::Declare => ":=",
                BindingKind::Assign => "=",
            };
            write!(f, "{} {op} ", decls.variables.join(", "))?;
        }
        for (idx, command) in self.commands.iter().enumerate() {
            if idx > 0 {
                f.write_str(" | ")?;
            }
            command.target.fmt(f)?;
            for arg in &command.args {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Function(name) => f.write_str(name),
            Expression::Dot => f.write_str("."),
            Expression::Field(path) => write_path(f, path),
            Expression::Variable { name, path } => {
                f.write_str(name)?;
                write_path(f, path)
            }
            Expression::Chain { base, path } => {
                base.fmt(f)?;
                write_path(f, path)
            }
            Expression::Pipeline(pipeline) => write!(f, "({pipeline})"),
            Expression::String(value) => f.write_str(&quote(value)),
            Expression::Int(value) => write!(f, "{value}"),
            Expression::Float(value) => f.write_str(&format_float(*value)),
            Expression::Bool(flag) => write!(f, "{flag}"),
            Expression::Nil => f.write_str("nil"),
        }
    }
}

fn write_path(f: &mut fmt::Formatter<'_>, path: &[String]) -> fmt::Result {
    for segment in path {
        write!(f, ".{segment}")?;
    }
    Ok(())
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
