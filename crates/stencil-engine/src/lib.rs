#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Parser and evaluator for Go `text/template` syntax.
//!
//! Templates are parsed into a [`TemplateSet`], the unit inside which
//! `{{define}}`, `{{block}}` and `{{template}}` resolve names. Helper functions
//! come from a [`FunctionRegistry`] that is captured when a template is
//! parsed; unknown helpers are rejected at parse time, as in Go.
//!
//! ```
//! use stencil_engine::{FunctionRegistryBuilder, TemplateSet, Value};
//!
//! let mut builder = FunctionRegistryBuilder::new();
//! builder.register("shout", |_ctx, args| {
//!     let text = args.first().map(ToString::to_string).unwrap_or_default();
//!     Ok(Value::from(text.to_uppercase()))
//! });
//!
//! let mut set = TemplateSet::new("greeting").with_functions(builder.build());
//! let template = set.parse("{{ .name | shout }}!").unwrap();
//!
//! let data: Value = [("name", "stencil")].into_iter().collect();
//! assert_eq!(template.render(&data).unwrap(), "STENCIL!");
//! ```
//!
//! Map iteration always follows key order because [`Value::Map`] is a
//! `BTreeMap`.

pub mod ast;
mod error;
mod exec;
pub mod lexer;
mod options;
mod parser;
mod runtime;
mod set;
pub mod telemetry;
mod value;

pub use ast::{
    ActionNode, Ast, BindingKind, Block, Command, CommentNode, ElseIfBranch, Expression, IfNode,
    Node, Pipeline, PipelineDeclarations, RangeNode, Span, TemplateNode, TextNode, WithNode,
};
pub use error::Error;
pub use lexer::{Keyword, Token, TokenKind};
pub use options::{MissingKey, Options, DEFAULT_MAX_DEPTH};
pub use runtime::{EvalContext, Function, FunctionRegistry, FunctionRegistryBuilder};
pub use set::{Template, TemplateHandle, TemplateSet};
pub use value::{format_float, Map, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_registry() -> FunctionRegistry {
        let mut builder = FunctionRegistryBuilder::new();
        builder.register("echo", |_, args| Ok(args.first().cloned().unwrap_or_default()));
        builder.build()
    }

    #[test]
    fn to_template_string_is_canonical() {
        let tmpl = Template::parse_with_functions(
            "canon",
            "{{- if .x -}} a {{- else -}} b {{- end }}{{/* note */}}{{ echo  .y }}",
            echo_registry(),
        )
        .unwrap();
        assert_eq!(
            tmpl.to_template_string(),
            "{{if .x}}a{{else}}b{{end}}{{/* note */}}{{echo .y}}"
        );
        assert_eq!(tmpl.to_string(), tmpl.to_template_string());
    }

    #[test]
    fn parse_errors_and_execute_errors_are_distinct() {
        let err = Template::parse_str("bad", "{{ if }}").unwrap_err();
        assert!(err.is_parse());
        assert!(!err.is_execute());
        assert_eq!(err.message(), "bad:1: missing value for if");

        let tmpl = Template::parse_str("ok", "{{ .a.b }}").unwrap();
        let err = tmpl.render(&Value::from(json!({"a": 1}))).unwrap_err();
        assert!(err.is_execute());
    }

    #[test]
    fn trim_markers_remove_surrounding_whitespace() {
        let tmpl = Template::parse_str("trim", "a  \n\t{{- .x -}}\r\n  b").unwrap();
        let out = tmpl.render(&Value::from(json!({"x": "-"}))).unwrap();
        assert_eq!(out, "a-b");
    }

    #[test]
    fn comments_render_nothing() {
        let tmpl = Template::parse_str("c", "a{{/* hidden */}}b {{- /* trimmed */ -}} c").unwrap();
        assert_eq!(tmpl.render(&Value::Null).unwrap(), "abc");
    }

    #[test]
    fn prints_values_like_go() {
        let tmpl = Template::parse_str("p", "{{.n}} {{.f}} {{.l}} {{.m}} [{{.z}}]").unwrap();
        let data = Value::from(json!({
            "n": 3,
            "f": 1.5,
            "l": [1, "a", null],
            "m": {"b": 2, "a": 1},
            "z": null
        }));
        assert_eq!(
            tmpl.render(&data).unwrap(),
            "3 1.5 [1 a <nil>] map[a:1 b:2] []"
        );
    }

    #[test]
    fn variables_and_parenthesised_chains() {
        let tmpl = Template::parse_with_functions(
            "vars",
            "{{ $c := .config }}{{ $c.name }}/{{ (echo .config).name }}/{{ $.config.name }}",
            echo_registry(),
        )
        .unwrap();
        let out = tmpl
            .render(&Value::from(json!({"config": {"name": "svc"}})))
            .unwrap();
        assert_eq!(out, "svc/svc/svc");
    }

    #[test]
    fn function_names_are_listed() {
        let tmpl = Template::parse_with_functions("f", "{{ echo 1 }}", echo_registry()).unwrap();
        assert_eq!(tmpl.functions().function_names(), vec!["echo"]);
    }
}
