// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Helm-style `include`: execute a named template and return its output.
//!
//! `{{template}}` can only write into the surrounding output, so its result
//! cannot be piped (`{{ include "labels" . | indent 4 }}`). `include` buffers
//! the named template's output and hands it back as a string instead.

use stencil_engine::{Error, EvalContext, FunctionRegistryBuilder, TemplateHandle, Value};

use crate::builtins::expect_args;

/// Builds an `include` helper that resolves names through `handle`.
///
/// The handle is usually taken from the very [`TemplateSet`] the helper is
/// registered in, before anything is parsed into it:
///
/// ```
/// use stencil_core::{include_function, FunctionRegistryBuilder, TemplateSet, Value};
///
/// let mut set = TemplateSet::new("page");
/// let mut builder = FunctionRegistryBuilder::new();
/// builder.register("include", include_function(set.handle()));
/// set.set_functions(builder.build());
///
/// let page = set
///     .parse(r#"{{define "who"}}{{.}}{{end}}[{{ include "who" .name }}]"#)
///     .unwrap();
/// let data: Value = [("name", "gopher")].into_iter().collect();
/// assert_eq!(page.render(&data).unwrap(), "[gopher]");
/// ```
///
/// [`TemplateSet`]: stencil_engine::TemplateSet
pub fn include_function(
    handle: TemplateHandle,
) -> impl Fn(&mut EvalContext, &[Value]) -> Result<Value, Error> + Send + Sync + 'static {
    move |ctx, args| {
        expect_args("include", args, 2)?;
        let name = args[0].as_str().ok_or_else(|| {
            Error::execute(
                format!("include name must be a string, got {}", args[0].kind()),
                None,
            )
        })?;
        let template = handle
            .lookup(name)
            .ok_or_else(|| Error::execute(format!("template \"{name}\" not found"), None))?;
        template
            .render_nested(ctx, args[1].clone())
            .map(Value::String)
            .map_err(|err| err.context(format!("include \"{name}\"")))
    }
}

/// Registers `include` bound to `handle` on `builder`.
pub fn install_include(builder: &mut FunctionRegistryBuilder, handle: TemplateHandle) {
    builder.register("include", include_function(handle));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stencil_engine::{Options, TemplateSet};

    fn set_with_include(name: &str) -> TemplateSet {
        let mut set = TemplateSet::new(name);
        let mut builder = FunctionRegistryBuilder::new();
        install_include(&mut builder, set.handle());
        set.set_functions(builder.build());
        set
    }

    #[test]
    fn include_returns_rendered_text() {
        let mut set = set_with_include("main");
        let tmpl = set
            .parse(r#"{{define "pair"}}{{.k}}={{.v}}{{end}}<{{ include "pair" . }}>"#)
            .unwrap();
        let out = tmpl
            .render(&Value::from(json!({"k": "a", "v": 1})))
            .unwrap();
        assert_eq!(out, "<a=1>");
    }

    #[test]
    fn missing_template_is_an_error_not_empty_output() {
        let mut set = set_with_include("main");
        let tmpl = set.parse(r#"x{{ include "nope" . }}y"#).unwrap();
        let err = tmpl.render(&Value::Null).unwrap_err();
        assert!(err.is_execute());
        assert!(
            err.message().contains("template \"nope\" not found"),
            "{}",
            err.message()
        );
    }

    #[test]
    fn argument_count_is_checked() {
        let mut set = set_with_include("main");
        let tmpl = set.parse(r#"{{ include "x" }}"#).unwrap();
        let err = tmpl.render(&Value::Null).unwrap_err();
        assert!(err
            .message()
            .contains("wrong number of args for include: want 2 got 1"));
    }

    #[test]
    fn nested_failures_name_the_included_template() {
        let mut set = set_with_include("main");
        let tmpl = set
            .parse(r#"{{define "inner"}}{{.missing}}{{end}}{{ include "inner" . }}"#)
            .unwrap();
        let err = tmpl.render(&Value::from(json!({}))).unwrap_err();
        assert!(
            err.message().contains("include \"inner\""),
            "{}",
            err.message()
        );
        assert!(err.message().contains("map has no entry for key \"missing\""));
    }

    #[test]
    fn self_inclusion_stops_at_max_depth() {
        let mut set = set_with_include("main").with_options(Options::default().with_max_depth(5));
        let tmpl = set
            .parse(r#"{{define "loop"}}{{ include "loop" . }}{{end}}{{ include "loop" . }}"#)
            .unwrap();
        let err = tmpl.render(&Value::Null).unwrap_err();
        assert!(err
            .message()
            .contains("exceeded maximum template depth (5)"));
    }

    #[test]
    fn dropped_set_makes_lookups_fail() {
        let set = TemplateSet::new("gone");
        let handle = set.handle();
        drop(set);
        let mut builder = FunctionRegistryBuilder::new();
        install_include(&mut builder, handle);
        let tmpl = stencil_engine::Template::parse_with_functions(
            "orphan",
            r#"{{ include "gone" . }}"#,
            builder.build(),
        )
        .unwrap();
        assert!(tmpl.render(&Value::Null).is_err());
    }
}
