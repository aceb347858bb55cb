// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Ranges over a map of maps: keys come out sorted and `.` is rebound to
//! each value for the body of the loop.

use std::io;

use serde_json::json;
use stencil_sprig::{TemplateSet, Value};

const ENV: &str = r#"{{- range $k, $v := .Env }}
.dot.key = {{ .key }}
$k       = {{ $k }}
$v.value = {{ $v.value }}
-- 
{{- end }}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut set = TemplateSet::new("demo");
    let template = set.parse(ENV)?;

    let data = Value::from(json!({
        "Env": {
            "FOO": {"key": "FOO", "value": "bar"},
            "BUZ": {"key": "BUZ", "value": "baz"}
        }
    }));
    template.execute(io::stdout().lock(), &data)?;
    println!();
    Ok(())
}
