// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::HashSet;

use crate::ast::{
    ActionNode, Ast, BindingKind, Block, Command, CommentNode, ElseIfBranch, Expression, IfNode,
    Node, Pipeline, PipelineDeclarations, RangeNode, Span, TemplateNode, TextNode, WithNode,
};
use crate::error::Error;
use crate::lexer::{self, Keyword, Token, TokenKind};
use crate::runtime::FunctionRegistry;

/// Everything one call to `parse` produced: the main body plus every
/// `define`/`block` found in the source, in source order.
#[derive(Debug)]
pub(crate) struct ParsedUnit {
    pub main: Ast,
    pub definitions: Vec<Ast>,
}

/// Parses `source` as template `name`.
///
/// Parsing runs in two passes. `scan` splits the source into text, comment
/// and action segments and applies the `{{- ` / ` -}}` trim markers, so the
/// tree builder never has to revisit text it already emitted. The second pass
/// is a recursive descent over those segments where every control structure
/// consumes its own `{{else}}`/`{{end}}` terminators.
///
/// Function names are resolved against `functions` here, the way Go does, so
/// a template can only call helpers that were registered before it was parsed.
pub(crate) fn parse(
    name: &str,
    source: &str,
    functions: &FunctionRegistry,
) -> Result<ParsedUnit, Error> {
    let segments = scan(source).map_err(|err| locate(name, source, err))?;
    let mut parser = Parser {
        name,
        source,
        segments,
        pos: 0,
        functions,
        vars: vec!["$".to_string()],
        depth: 0,
        in_definition: false,
        definitions: Vec::new(),
        defined: HashSet::new(),
    };

    let (root, terminator) = parser.parse_list()?;
    match terminator {
        Terminator::Eof => {}
        Terminator::End(span) => return Err(parser.error(span, "unexpected {{end}}")),
        Terminator::Else { span, .. } => return Err(parser.error(span, "unexpected {{else}}")),
    }

    let main = Ast::new(name, root);
    if parser.defined.contains(name) && !main.is_empty_body() {
        return Err(parser.error(
            Span::new(0, 0),
            format!("multiple definition of template \"{name}\""),
        ));
    }

    Ok(ParsedUnit {
        main,
        definitions: parser.definitions,
    })
}

fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end]
        .iter()
        .filter(|byte| **byte == b'\n')
        .count()
        + 1
}

fn locate(name: &str, source: &str, err: Error) -> Error {
    let line = err.span().map_or(1, |span| line_of(source, span.start));
    err.context(format!("{name}:{line}"))
}

fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

#[derive(Debug, Clone)]
enum Segment<'a> {
    Text { span: Span, text: &'a str },
    Comment { span: Span, text: &'a str },
    Action { span: Span, body: &'a str, offset: usize },
}

fn scan(source: &str) -> Result<Vec<Segment<'_>>, Error> {
    let mut segments = Vec::new();
    let mut cursor = 0usize;
    let mut trim_next = false;

    loop {
        let open = source[cursor..].find("{{").map(|idx| cursor + idx);
        let mut text_start = cursor;
        let mut text = &source[cursor..open.unwrap_or(source.len())];
        if trim_next {
            let trimmed = text.trim_start_matches(is_space);
            text_start += text.len() - trimmed.len();
            text = trimmed;
        }

        let Some(open) = open else {
            if !text.is_empty() {
                segments.push(Segment::Text {
                    span: Span::new(text_start, text_start + text.len()),
                    text,
                });
            }
            return Ok(segments);
        };

        let mut body_start = open + 2;
        let trim_left = has_left_trim(&source[body_start..]);
        if trim_left {
            text = text.trim_end_matches(is_space);
            body_start += 1;
        }
        if !text.is_empty() {
            segments.push(Segment::Text {
                span: Span::new(text_start, text_start + text.len()),
                text,
            });
        }

        let Some(close) = find_close(source.as_bytes(), body_start) else {
            let span = Span::new(open, source.len());
            return Err(if source[body_start..].trim_start().starts_with("/*") {
                Error::parse_with_span("unclosed comment", span)
            } else {
                Error::parse_with_span("unclosed action", span)
            });
        };

        let trim_right = has_right_trim(&source[body_start..close]);
        let body_end = if trim_right { close - 1 } else { close };
        let raw = &source[body_start..body_end];
        let leading = raw.len() - raw.trim_start_matches(is_space).len();
        let body = raw.trim_matches(is_space);
        let span = Span::new(open, close + 2);

        if body.starts_with("/*") {
            if body.len() < 4 || !body.ends_with("*/") {
                return Err(Error::parse_with_span("unclosed comment", span));
            }
            segments.push(Segment::Comment { span, text: body });
        } else {
            segments.push(Segment::Action {
                span,
                body,
                offset: body_start + leading,
            });
        }

        cursor = close + 2;
        trim_next = trim_right;
    }
}

/// `{{- ` only counts as a trim marker when whitespace follows the dash,
/// otherwise `{{-3}}` would lose its sign.
fn has_left_trim(after_open: &str) -> bool {
    let mut chars = after_open.chars();
    chars.next() == Some('-') && chars.next().is_some_and(is_space)
}

fn has_right_trim(inner: &str) -> bool {
    let mut chars = inner.chars().rev();
    chars.next() == Some('-') && chars.next().is_some_and(is_space)
}

/// Finds the `}}` closing the action that starts at `from`, skipping over
/// string literals, raw strings and comments.
fn find_close(bytes: &[u8], from: usize) -> Option<usize> {
    let mut idx = from;
    while idx + 1 < bytes.len() {
        match bytes[idx] {
            b'"' => {
                idx += 1;
                while idx < bytes.len() && bytes[idx] != b'"' && bytes[idx] != b'\n' {
                    idx += if bytes[idx] == b'\\' { 2 } else { 1 };
                }
                idx += 1;
            }
            b'\'' => {
                idx += 1;
                while idx < bytes.len() && bytes[idx] != b'\'' && bytes[idx] != b'\n' {
                    idx += if bytes[idx] == b'\\' { 2 } else { 1 };
                }
                idx += 1;
            }
            b'`' => {
                idx += 1;
                while idx < bytes.len() && bytes[idx] != b'`' {
                    idx += 1;
                }
                idx += 1;
            }
            b'/' if bytes[idx + 1] == b'*' => {
                idx += 2;
                while idx + 1 < bytes.len() && !(bytes[idx] == b'*' && bytes[idx + 1] == b'/') {
                    idx += 1;
                }
                idx += 2;
            }
            b'}' if bytes[idx + 1] == b'}' => return Some(idx),
            _ => idx += 1,
        }
    }
    None
}

#[derive(Debug)]
enum Terminator {
    Eof,
    End(Span),
    Else { span: Span, tokens: Vec<Token> },
}

/// Where a pipeline appears; decides which declarations it may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Command,
    If,
    Range,
    With,
    Template,
    Block,
    Nested,
}

impl Context {
    fn as_str(self) -> &'static str {
        match self {
            Context::Command | Context::Nested => "command",
            Context::If => "if",
            Context::Range => "range",
            Context::With => "with",
            Context::Template => "template clause",
            Context::Block => "block clause",
        }
    }

    fn max_declarations(self) -> usize {
        match self {
            Context::Range => 2,
            Context::Command | Context::If | Context::With => 1,
            Context::Template | Context::Block | Context::Nested => 0,
        }
    }
}

struct Cursor<'t> {
    tokens: &'t [Token],
    index: usize,
    fallback: Span,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [Token], fallback: Span) -> Self {
        Self {
            tokens,
            index: 0,
            fallback,
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.index)
    }

    fn peek_at(&self, ahead: usize) -> Option<&'t Token> {
        self.tokens.get(self.index + ahead)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.index)?;
        self.index += 1;
        Some(token)
    }

    fn previous_end(&self) -> usize {
        self.index
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map_or(self.fallback.start, |token| token.span.end)
    }

    fn span_since(&self, start: usize) -> Span {
        Span::new(start, self.previous_end())
    }
}

struct Parser<'a> {
    name: &'a str,
    source: &'a str,
    segments: Vec<Segment<'a>>,
    pos: usize,
    functions: &'a FunctionRegistry,
    /// Variables in scope, innermost last; `$` is always first.
    vars: Vec<String>,
    /// Nesting of if/range/with around the current position.
    depth: usize,
    in_definition: bool,
    definitions: Vec<Ast>,
    defined: HashSet<String>,
}

impl<'a> Parser<'a> {
    fn error(&self, span: Span, message: impl Into<String>) -> Error {
        locate(
            self.name,
            self.source,
            Error::parse_with_span(message, span),
        )
    }

    fn parse_list(&mut self) -> Result<(Block, Terminator), Error> {
        let mut block = Block::default();
        while let Some(segment) = self.segments.get(self.pos).cloned() {
            self.pos += 1;
            match segment {
                Segment::Text { span, text } => block.push(Node::Text(TextNode {
                    span,
                    text: text.to_string(),
                })),
                Segment::Comment { span, text } => block.push(Node::Comment(CommentNode {
                    span,
                    text: text.to_string(),
                })),
                Segment::Action { span, body, offset } => {
                    let tokens = lexer::lex_action(body, offset)
                        .map_err(|err| locate(self.name, self.source, err))?;
                    let Some(head) = tokens.first().map(|token| token.kind.clone()) else {
                        return Err(self.error(span, "missing value for command"));
                    };
                    match head {
                        TokenKind::Keyword(Keyword::If) => {
                            let node = self.parse_if(span, &tokens)?;
                            block.push(node);
                        }
                        TokenKind::Keyword(Keyword::Range) => {
                            let node = self.parse_control(Context::Range, span, &tokens)?;
                            block.push(node);
                        }
                        TokenKind::Keyword(Keyword::With) => {
                            let node = self.parse_control(Context::With, span, &tokens)?;
                            block.push(node);
                        }
                        TokenKind::Keyword(Keyword::Template) => {
                            let node = self.parse_template_call(span, &tokens)?;
                            block.push(node);
                        }
                        TokenKind::Keyword(Keyword::Block) => {
                            let node = self.parse_block(span, &tokens)?;
                            block.push(node);
                        }
                        TokenKind::Keyword(Keyword::Define) => self.parse_define(span, &tokens)?,
                        TokenKind::Keyword(Keyword::Else) => {
                            return Ok((block, Terminator::Else { span, tokens }));
                        }
                        TokenKind::Keyword(Keyword::End) => {
                            if let Some(extra) = tokens.get(1) {
                                return Err(self.error(extra.span, "unexpected tokens after end"));
                            }
                            return Ok((block, Terminator::End(span)));
                        }
                        _ => {
                            let pipeline = self.pipeline(&tokens, span, Context::Command)?;
                            block.push(Node::Action(ActionNode { span, pipeline }));
                        }
                    }
                }
            }
        }
        Ok((block, Terminator::Eof))
    }

    fn expect_end(&self, open: Span, terminator: Terminator) -> Result<Span, Error> {
        match terminator {
            Terminator::End(span) => Ok(span),
            Terminator::Else { span, .. } => Err(self.error(span, "expected end; found {{else}}")),
            Terminator::Eof => Err(self.error(open, "unexpected EOF")),
        }
    }

    fn parse_if(&mut self, open: Span, tokens: &[Token]) -> Result<Node, Error> {
        let mark = self.vars.len();
        self.depth += 1;

        let pipeline = self.pipeline(&tokens[1..], open, Context::If)?;
        let (then_block, mut terminator) = self.parse_list()?;
        let mut else_if_branches = Vec::new();
        let mut else_block = None;

        let end = loop {
            match terminator {
                Terminator::Else { tokens, .. } if tokens.len() == 1 => {
                    let (block, next) = self.parse_list()?;
                    else_block = Some(block);
                    break self.expect_end(open, next)?;
                }
                Terminator::Else { span, tokens } => {
                    if tokens[1].kind != TokenKind::Keyword(Keyword::If) {
                        return Err(self.error(
                            tokens[1].span,
                            "invalid else-if: expected 'if' after 'else'",
                        ));
                    }
                    let branch_pipeline = self.pipeline(&tokens[2..], span, Context::If)?;
                    let (block, next) = self.parse_list()?;
                    else_if_branches.push(ElseIfBranch {
                        span,
                        pipeline: branch_pipeline,
                        block,
                    });
                    terminator = next;
                }
                other => break self.expect_end(open, other)?,
            }
        };

        self.vars.truncate(mark);
        self.depth -= 1;
        Ok(Node::If(IfNode {
            span: open.to(end),
            pipeline,
            then_block,
            else_if_branches,
            else_block,
        }))
    }

    /// `range` and `with`: pipeline, body, optional plain `{{else}}`.
    fn parse_control(
        &mut self,
        context: Context,
        open: Span,
        tokens: &[Token],
    ) -> Result<Node, Error> {
        let mark = self.vars.len();
        self.depth += 1;

        let pipeline = self.pipeline(&tokens[1..], open, context)?;
        let (then_block, terminator) = self.parse_list()?;
        let (else_block, end) = match terminator {
            Terminator::Else { tokens, .. } => {
                if let Some(extra) = tokens.get(1) {
                    return Err(self.error(
                        extra.span,
                        format!("unexpected {} after else in {}", extra.kind, context.as_str()),
                    ));
                }
                let (block, next) = self.parse_list()?;
                (Some(block), self.expect_end(open, next)?)
            }
            other => (None, self.expect_end(open, other)?),
        };

        self.vars.truncate(mark);
        self.depth -= 1;
        let span = open.to(end);
        Ok(match context {
            Context::Range => Node::Range(RangeNode {
                span,
                pipeline,
                then_block,
                else_block,
            }),
            _ => Node::With(WithNode {
                span,
                pipeline,
                then_block,
                else_block,
            }),
        })
    }

    fn template_name(&self, open: Span, tokens: &[Token], context: Context) -> Result<String, Error> {
        match tokens.get(1).map(|token| &token.kind) {
            Some(TokenKind::StringLiteral(name)) => Ok(name.clone()),
            Some(other) => Err(self.error(
                tokens[1].span,
                format!("unexpected {other} in {}", context.as_str()),
            )),
            None => Err(self.error(open, format!("missing name in {}", context.as_str()))),
        }
    }

    fn parse_template_call(&mut self, open: Span, tokens: &[Token]) -> Result<Node, Error> {
        let name = self.template_name(open, tokens, Context::Template)?;
        let pipeline = if tokens.len() > 2 {
            Some(self.pipeline(&tokens[2..], open, Context::Template)?)
        } else {
            None
        };
        Ok(Node::Template(TemplateNode {
            span: open,
            name,
            pipeline,
        }))
    }

    fn parse_block(&mut self, open: Span, tokens: &[Token]) -> Result<Node, Error> {
        let name = self.template_name(open, tokens, Context::Block)?;
        let pipeline = self.pipeline(&tokens[2..], open, Context::Block)?;
        let body = self.parse_definition_body(open)?;
        self.add_definition(open, Ast::new(name.clone(), body))?;
        Ok(Node::Template(TemplateNode {
            span: open,
            name,
            pipeline: Some(pipeline),
        }))
    }

    fn parse_define(&mut self, open: Span, tokens: &[Token]) -> Result<(), Error> {
        if self.depth > 0 || self.in_definition {
            return Err(self.error(open, "{{define}} is only allowed at the top level"));
        }
        let name = self.template_name(open, tokens, Context::Template)?;
        if let Some(extra) = tokens.get(2) {
            return Err(self.error(extra.span, "unexpected tokens after define name"));
        }
        let body = self.parse_definition_body(open)?;
        self.add_definition(open, Ast::new(name, body))
    }

    /// Parses up to the matching `{{end}}` with a fresh variable scope, since
    /// a definition executes against its own `$`.
    fn parse_definition_body(&mut self, open: Span) -> Result<Block, Error> {
        let saved_vars = std::mem::replace(&mut self.vars, vec!["$".to_string()]);
        let saved_depth = std::mem::replace(&mut self.depth, 0);
        let saved_flag = std::mem::replace(&mut self.in_definition, true);

        let parsed = self.parse_list();

        self.vars = saved_vars;
        self.depth = saved_depth;
        self.in_definition = saved_flag;

        let (body, terminator) = parsed?;
        self.expect_end(open, terminator)?;
        Ok(body)
    }

    fn add_definition(&mut self, open: Span, ast: Ast) -> Result<(), Error> {
        if !self.defined.insert(ast.name.clone()) {
            return Err(self.error(
                open,
                format!("multiple definition of template \"{}\"", ast.name),
            ));
        }
        self.definitions.push(ast);
        Ok(())
    }

    fn pipeline(
        &mut self,
        tokens: &[Token],
        fallback: Span,
        context: Context,
    ) -> Result<Pipeline, Error> {
        if tokens.is_empty() {
            return Err(self.error(
                fallback,
                format!("missing value for {}", context.as_str()),
            ));
        }
        let mut cursor = Cursor::new(tokens, fallback);
        self.parse_pipeline(&mut cursor, context)
    }

    fn parse_pipeline(&mut self, cursor: &mut Cursor<'_>, context: Context) -> Result<Pipeline, Error> {
        let start = cursor.peek().map_or(cursor.fallback.start, |token| token.span.start);
        let declarations = self.parse_declarations(cursor, context)?;

        let mut commands = Vec::new();
        loop {
            commands.push(self.parse_command(cursor)?);
            match cursor.peek().map(|token| &token.kind) {
                Some(TokenKind::Pipe) => {
                    cursor.next();
                }
                Some(TokenKind::RightParen) if context == Context::Nested => break,
                None if context != Context::Nested => break,
                None => {
                    return Err(self.error(cursor.span_since(start), "unclosed left paren"));
                }
                Some(other) => {
                    let span = cursor.peek().map_or(cursor.fallback, |token| token.span);
                    return Err(self.error(span, format!("unexpected {other} in operand")));
                }
            }
        }

        for (idx, command) in commands.iter().enumerate() {
            let is_function = command.target.is_function();
            if idx > 0 && !is_function {
                return Err(self.error(
                    command.span,
                    format!("cannot pipe into non-function {}", command.target),
                ));
            }
            if !is_function && !command.args.is_empty() {
                return Err(self.error(
                    command.span,
                    format!("can't give argument to non-function {}", command.target),
                ));
            }
            if matches!(command.target, Expression::Nil) {
                return Err(self.error(command.span, "nil is not a command"));
            }
        }

        if let Some(decls) = &declarations {
            if decls.kind == BindingKind::Declare {
                self.vars.extend(decls.variables.iter().cloned());
            }
        }

        Ok(Pipeline {
            span: cursor.span_since(start),
            declarations,
            commands,
        })
    }

    fn parse_declarations(
        &mut self,
        cursor: &mut Cursor<'_>,
        context: Context,
    ) -> Result<Option<PipelineDeclarations>, Error> {
        let mut names = Vec::new();
        let mut ahead = 0;
        let kind = loop {
            match cursor.peek_at(ahead).map(|token| &token.kind) {
                Some(TokenKind::Variable(name)) => names.push((name.clone(), ahead)),
                _ => return Ok(None),
            }
            match cursor.peek_at(ahead + 1).map(|token| &token.kind) {
                Some(TokenKind::Comma) => ahead += 2,
                Some(TokenKind::Declare) => break BindingKind::Declare,
                Some(TokenKind::Assign) => break BindingKind::Assign,
                _ => return Ok(None),
            }
        };

        let first_span = cursor.peek().map_or(cursor.fallback, |token| token.span);
        if names.len() > context.max_declarations() {
            return Err(self.error(
                first_span,
                format!("too many declarations in {}", context.as_str()),
            ));
        }
        if kind == BindingKind::Assign {
            for (name, offset) in &names {
                if !self.vars.contains(name) {
                    let span = cursor.peek_at(*offset).map_or(first_span, |token| token.span);
                    return Err(self.error(span, format!("undefined variable \"{name}\"")));
                }
            }
        }

        // skip the variables, the commas and the := / =
        cursor.index += ahead + 2;
        Ok(Some(PipelineDeclarations {
            kind,
            variables: names.into_iter().map(|(name, _)| name).collect(),
        }))
    }

    fn parse_command(&mut self, cursor: &mut Cursor<'_>) -> Result<Command, Error> {
        let start = cursor.peek().map_or(cursor.fallback.start, |token| token.span.start);
        let target = self.parse_operand(cursor)?;
        let mut args = Vec::new();
        while let Some(token) = cursor.peek() {
            if matches!(token.kind, TokenKind::Pipe | TokenKind::RightParen) {
                break;
            }
            args.push(self.parse_operand(cursor)?);
        }
        Ok(Command {
            span: cursor.span_since(start),
            target,
            args,
        })
    }

    fn parse_operand(&mut self, cursor: &mut Cursor<'_>) -> Result<Expression, Error> {
        let Some(token) = cursor.next() else {
            return Err(self.error(cursor.fallback, "missing value for command"));
        };

        let base = match &token.kind {
            TokenKind::Identifier(name) => {
                if !self.functions.contains(name) {
                    return Err(self.error(token.span, format!("function \"{name}\" not defined")));
                }
                Expression::Function(name.clone())
            }
            TokenKind::Keyword(Keyword::True) => Expression::Bool(true),
            TokenKind::Keyword(Keyword::False) => Expression::Bool(false),
            TokenKind::Keyword(Keyword::Nil) => Expression::Nil,
            TokenKind::Keyword(keyword) => {
                return Err(self.error(
                    token.span,
                    format!("unexpected keyword \"{}\" in command", keyword.as_str()),
                ));
            }
            TokenKind::Dot => Expression::Dot,
            TokenKind::Field(name) => Expression::Field(vec![name.clone()]),
            TokenKind::Variable(name) => {
                if !self.vars.contains(name) {
                    return Err(self.error(token.span, format!("undefined variable \"{name}\"")));
                }
                Expression::Variable {
                    name: name.clone(),
                    path: Vec::new(),
                }
            }
            TokenKind::StringLiteral(value) => Expression::String(value.clone()),
            TokenKind::CharLiteral(ch) => Expression::Int(i64::from(u32::from(*ch))),
            TokenKind::NumberLiteral(text) => parse_number(text)
                .ok_or_else(|| self.error(token.span, format!("bad number syntax: {text}")))?,
            TokenKind::LeftParen => {
                let pipeline = self.parse_pipeline(cursor, Context::Nested)?;
                // parse_pipeline stops on the closing paren
                cursor.next();
                Expression::Pipeline(pipeline)
            }
            other => {
                return Err(self.error(token.span, format!("unexpected {other} in operand")));
            }
        };

        self.parse_field_chain(cursor, base)
    }

    /// Collects `.a.b` segments written directly after an operand.
    fn parse_field_chain(
        &mut self,
        cursor: &mut Cursor<'_>,
        base: Expression,
    ) -> Result<Expression, Error> {
        let mut segments = Vec::new();
        while let Some(token) = cursor.peek() {
            let TokenKind::Field(name) = &token.kind else {
                break;
            };
            if token.span.start != cursor.previous_end() {
                break;
            }
            segments.push(name.clone());
            cursor.next();
        }
        if segments.is_empty() {
            return Ok(base);
        }

        Ok(match base {
            Expression::Field(mut path) => {
                path.extend(segments);
                Expression::Field(path)
            }
            Expression::Variable { name, mut path } => {
                path.extend(segments);
                Expression::Variable { name, path }
            }
            Expression::Pipeline(_) | Expression::Function(_) => Expression::Chain {
                base: Box::new(base),
                path: segments,
            },
            other => {
                let span = cursor.span_since(cursor.previous_end());
                return Err(self.error(span, format!("unexpected field access on {other}")));
            }
        })
    }
}

fn parse_number(text: &str) -> Option<Expression> {
    let cleaned = text.replace('_', "");
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        let value = i64::from_str_radix(hex, 16).ok()?;
        return Some(Expression::Int(if negative { -value } else { value }));
    }

    if !digits.contains(['.', 'e', 'E']) {
        if let Ok(value) = digits.parse::<i64>() {
            return Some(Expression::Int(if negative { -value } else { value }));
        }
    }

    let value = digits.parse::<f64>().ok()?;
    Some(Expression::Float(if negative { -value } else { value }))
}
