// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The escaping and printing builtins, following
//! https://pkg.go.dev/text/template#hdr-Functions

use stencil_core::{text_template_functions, Template, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let functions = text_template_functions();
    let samples = [
        ("html", r#"{{html "<b>\"Bob\"</b>"}}"#),
        ("js", r#"{{js "</script>"}}"#),
        ("urlquery", r#"{{urlquery "Hello, world!"}}"#),
        ("print", r#"{{print "Hello" 23}}"#),
        ("println", r#"{{println "Hello" 23}}"#),
        ("printf", r#"{{printf "%-8s|%5.2f" "pi" 3.14159}}"#),
        ("slice", r#"{{slice "gopher" 1 3}}"#),
        ("call", r#"{{call "print" "world"}}"#),
    ];

    for (name, source) in samples {
        let template = Template::parse_with_functions(name, source, functions.clone())?;
        let output = template.render(&Value::Null)?;
        println!("{name} => {output:?}");
    }
    Ok(())
}
