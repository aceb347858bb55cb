// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Renders a manifest fragment whose labels come from a named template,
//! the way Helm charts use `include ... | nindent`.

use std::io;

use stencil_sprig::{helm_template_set, Value};

const MANIFEST: &str = r#"
{{- define "labels.helper" -}}
extra: true
{{- end -}}
metadata:
  labels: {{ include "labels.helper" . | nindent 4 }}
	# static siblings must still parse
	app.kubernetes.io/name: app
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The set hands `include` a handle to itself before parsing.
    let mut set = helm_template_set("demo");
    let template = set.parse(MANIFEST)?;

    let data = Value::Map(Default::default());
    template.execute(io::stdout().lock(), &data)?;
    Ok(())
}
