// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Builds a set by hand: builtins, a project helper and `include`, all
//! registered before the first parse.

use serde_json::json;
use stencil_core::{
    install_include, install_text_template_functions, FunctionRegistryBuilder, TemplateSet, Value,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let set = TemplateSet::new("custom");

    let mut builder = FunctionRegistryBuilder::new();
    install_text_template_functions(&mut builder);
    builder.register("shout", |_ctx, args| {
        let input = args.first().and_then(Value::as_str).unwrap_or("");
        Ok(Value::String(format!("{}!", input.to_uppercase())))
    });
    // The handle resolves names in `set`, including ones parsed later.
    install_include(&mut builder, set.handle());

    let mut set = set.with_functions(builder.build());
    set.parse(r#"{{ define "banner" }}{{ shout . }}{{ end }}"#)?;
    let template = set.parse(r#"{{ include "banner" .phrase }} ({{ len .phrase }} bytes)"#)?;
    let output = template.render(&Value::from(json!({"phrase": "hello core"})))?;

    println!("{output}");
    assert_eq!(output, "HELLO CORE! (10 bytes)");
    Ok(())
}
