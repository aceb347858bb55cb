// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::sync::Arc;
use std::thread;

use serde_json::json;
use stencil_engine::{
    Error, FunctionRegistry, FunctionRegistryBuilder, MissingKey, Options, TemplateHandle,
    TemplateSet, Value,
};

/// A minimal `include` built on a handle, the way helper crates wire it.
fn registry_with_include(handle: TemplateHandle) -> FunctionRegistry {
    let mut builder = FunctionRegistryBuilder::new();
    builder.register("include", move |ctx, args| {
        let name = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| Error::execute("include expects a template name", None))?;
        let data = args.get(1).cloned().unwrap_or_default();
        let template = handle
            .lookup(name)
            .ok_or_else(|| Error::execute(format!("template \"{name}\" not found"), None))?;
        template.render_nested(ctx, data).map(Value::from)
    });
    builder.build()
}

#[test]
fn helpers_can_reach_their_own_set() {
    let mut set = TemplateSet::new("page");
    let handle = set.handle();
    set.set_functions(registry_with_include(handle));

    let template = set
        .parse(r#"{{define "name"}}{{.first}} {{.last}}{{end}}Hello, {{include "name" .}}!"#)
        .unwrap();
    let data = Value::from(json!({"first": "Ada", "last": "Lovelace"}));
    assert_eq!(template.render(&data).unwrap(), "Hello, Ada Lovelace!");
}

#[test]
fn include_recursion_is_bounded() {
    let mut set = TemplateSet::new("page").with_options(Options::default().with_max_depth(8));
    let handle = set.handle();
    set.set_functions(registry_with_include(handle));
    set.parse(r#"{{define "self"}}{{include "self" .}}{{end}}{{include "self" .}}"#)
        .unwrap();

    let err = set.render(&Value::Null).unwrap_err();
    assert!(err.is_execute());
    assert!(err.to_string().contains("exceeded maximum template depth (8)"));
}

#[test]
fn templates_parsed_in_separate_calls_see_each_other() {
    let mut set = TemplateSet::new("main");
    set.parse(r#"{{define "a"}}A{{template "b" .}}{{end}}"#).unwrap();
    set.parse(r#"{{define "b"}}B{{end}}"#).unwrap();
    let main = set.parse(r#"{{template "a" .}}"#).unwrap();
    assert_eq!(main.render(&Value::Null).unwrap(), "AB");
    assert_eq!(set.template_names(), vec!["a", "b", "main"]);
}

#[test]
fn execute_template_by_name_streams() {
    let mut set = TemplateSet::new("main");
    set.parse(r#"{{define "list"}}{{range .}}- {{.}}{{"\n"}}{{end}}{{end}}"#)
        .unwrap();
    let mut out = Vec::new();
    set.execute_template(&mut out, "list", &Value::from(json!(["a", "b"])))
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "- a\n- b\n");
}

#[test]
fn lenient_sets_treat_missing_keys_as_empty() {
    let mut strict = TemplateSet::new("strict");
    strict.parse("{{ .nope }}").unwrap();
    assert!(strict.render(&Value::from(json!({}))).is_err());

    let mut lenient =
        TemplateSet::new("lenient").with_options(Options::default().with_missing_key(MissingKey::Zero));
    lenient.parse("[{{ .nope }}]").unwrap();
    assert_eq!(lenient.render(&Value::from(json!({}))).unwrap(), "[]");
}

#[test]
fn templates_render_from_many_threads() {
    let mut set = TemplateSet::new("shared");
    let template = Arc::new(set.parse("{{ range . }}{{ . }}{{ end }}").unwrap());

    let workers: Vec<_> = (0..4)
        .map(|idx| {
            let template = Arc::clone(&template);
            thread::spawn(move || template.render(&Value::from(json!([idx, idx]))))
        })
        .collect();
    for (idx, worker) in workers.into_iter().enumerate() {
        let rendered = worker.join().expect("worker panicked").unwrap();
        assert_eq!(rendered, format!("{idx}{idx}"));
    }
}
