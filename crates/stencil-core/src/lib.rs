#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The helpers Go predefines for `text/template`, plus Helm's `include`.

mod builtins;
mod format;
mod include;

pub use format::{go_quote, sprint, sprintf};
pub use include::{include_function, install_include};
pub use stencil_engine::{
    Error, EvalContext, Function, FunctionRegistry, FunctionRegistryBuilder, MissingKey, Options,
    Template, TemplateHandle, TemplateSet, Value,
};

use builtins::{
    builtin_and, builtin_call, builtin_eq, builtin_ge, builtin_gt, builtin_index, builtin_le,
    builtin_len, builtin_lt, builtin_ne, builtin_not, builtin_or, builtin_slice,
};
use format::{
    builtin_html, builtin_js, builtin_print, builtin_printf, builtin_println, builtin_urlquery,
};

/// Builds a registry holding the helper set Go's `text/template` exposes by
/// default.
pub fn text_template_functions() -> FunctionRegistry {
    let mut builder = FunctionRegistryBuilder::new();
    install_text_template_functions(&mut builder);
    builder.build()
}

/// Installs the standard Go text/template helper functions into an existing registry builder.
pub fn install_text_template_functions(builder: &mut FunctionRegistryBuilder) {
    builder
        .register_short_circuit("and", false, builtin_and)
        .register_short_circuit("or", true, builtin_or)
        .register("call", builtin_call)
        .register("html", builtin_html)
        .register("eq", builtin_eq)
        .register("ge", builtin_ge)
        .register("gt", builtin_gt)
        .register("index", builtin_index)
        .register("js", builtin_js)
        .register("len", builtin_len)
        .register("le", builtin_le)
        .register("lt", builtin_lt)
        .register("ne", builtin_ne)
        .register("not", builtin_not)
        .register("print", builtin_print)
        .register("println", builtin_println)
        .register("printf", builtin_printf)
        .register("slice", builtin_slice)
        .register("urlquery", builtin_urlquery);
}

/// A [`TemplateSet`] with the Go builtins and an `include` bound to the set
/// itself.
pub fn text_template_set(name: impl Into<String>) -> TemplateSet {
    let mut set = TemplateSet::new(name);
    let mut builder = FunctionRegistryBuilder::new();
    install_text_template_functions(&mut builder);
    install_include(&mut builder, set.handle());
    set.set_functions(builder.build());
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, data: serde_json::Value) -> Result<String, Error> {
        Template::parse_with_functions("test", source, text_template_functions())?
            .render(&Value::from(data))
    }

    #[test]
    fn registry_lists_every_go_builtin() {
        let names = text_template_functions().function_names();
        for name in [
            "and", "call", "eq", "ge", "gt", "html", "index", "js", "le", "len", "lt", "ne",
            "not", "or", "print", "printf", "println", "slice", "urlquery",
        ] {
            assert!(names.iter().any(|n| n == name), "missing {name}");
        }
    }

    #[test]
    fn call_invokes_registered_function() {
        let mut builder = FunctionRegistryBuilder::new();
        install_text_template_functions(&mut builder);
        builder.register("greet", |_ctx, args| {
            let name = args.first().and_then(Value::as_str).unwrap_or("friend");
            Ok(Value::String(format!("Hello, {name}!")))
        });
        let tmpl =
            Template::parse_with_functions("call", r#"{{call "greet" "Rust"}}"#, builder.build())
                .unwrap();
        assert_eq!(tmpl.render(&Value::Null).unwrap(), "Hello, Rust!");
    }

    #[test]
    fn comparisons_in_conditions() {
        let out = render(
            r#"{{ if eq .env "prod" "staging" }}live{{ else }}dev{{ end }}/{{ if lt .n 3.5 }}small{{ end }}"#,
            json!({"env": "staging", "n": 2}),
        )
        .unwrap();
        assert_eq!(out, "live/small");
    }

    #[test]
    fn helper_errors_name_the_helper() {
        let err = render(r#"{{ lt "a" 1 }}"#, json!({})).unwrap_err();
        assert!(err.is_execute());
        assert!(
            err.message().contains("error calling lt: incompatible types for comparison"),
            "{}",
            err.message()
        );
    }

    #[test]
    fn and_or_stop_at_the_deciding_operand() {
        let out = render(
            r#"{{ if and .a .a.b }}yes{{ else }}no{{ end }}|{{ or .x .a.b }}|{{ and 1 .x }}"#,
            json!({"a": null, "x": "hit"}),
        )
        .unwrap();
        assert_eq!(out, "no|hit|hit");

        let err = render(r#"{{ and 1 .a.b }}"#, json!({"a": null})).unwrap_err();
        assert!(err.message().contains("nil pointer evaluating"), "{err}");
    }

    #[test]
    fn printf_pipes_last_argument() {
        let out = render(r#"{{ .n | printf "%03d" }}"#, json!({"n": 7})).unwrap();
        assert_eq!(out, "007");
    }

    #[test]
    fn text_template_set_binds_include_to_itself() {
        let mut set = text_template_set("page");
        set.parse(r#"{{define "row"}}{{ printf "%-3s|" . }}{{end}}"#)
            .unwrap();
        let page = set
            .parse(r#"{{ range . }}{{ include "row" . }}{{ end }}"#)
            .unwrap();
        let out = page.render(&Value::from(json!(["a", "bb"]))).unwrap();
        assert_eq!(out, "a  |bb |");
    }
}
