#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! A subset of the `sprig` helper library for stencil templates, and a
//! Helm-flavoured [`TemplateSet`] constructor.
//!
//! ```
//! use stencil_sprig::{helm_template_set, Value};
//!
//! let mut set = helm_template_set("chart");
//! let page = set
//!     .parse(concat!(
//!         r#"{{- define "name" -}}{{ .name | default "app" | lower }}{{- end -}}"#,
//!         r#"name: {{ include "name" . | quote }}"#,
//!     ))
//!     .unwrap();
//! let data: Value = [("name", "Web")].into_iter().collect();
//! assert_eq!(page.render(&data).unwrap(), r#"name: "web""#);
//! ```

use once_cell::sync::Lazy;
use stencil_core::{install_include, install_text_template_functions};
pub use stencil_core::{
    FunctionRegistry, FunctionRegistryBuilder, MissingKey, Options, Template, TemplateHandle,
    TemplateSet, Value,
};

mod functions;

static SPRIG_FUNCTIONS: Lazy<FunctionRegistry> = Lazy::new(|| {
    let mut builder = FunctionRegistryBuilder::new();
    install_all(&mut builder);
    builder.build()
});

/// Installs both the Go text/template compatibility helpers and the Sprig
/// extensions into the provided registry builder, core helpers first.
pub fn install_all(builder: &mut FunctionRegistryBuilder) {
    install_text_template_functions(builder);
    install_sprig_functions(builder);
}

/// Registers the sprig helpers into an existing function registry builder.
pub fn install_sprig_functions(builder: &mut FunctionRegistryBuilder) {
    functions::install_all(builder);
}

/// Returns a registry populated with the Go core helpers plus sprig extensions.
pub fn sprig_functions() -> FunctionRegistry {
    SPRIG_FUNCTIONS.clone()
}

/// A set configured the way Helm renders charts: Go builtins, the sprig
/// helpers, an `include` that resolves names inside this very set, and
/// `missingkey=zero`.
///
/// The registry is complete before anything is parsed, so every template
/// parsed into the set can use `include`.
pub fn helm_template_set(name: impl Into<String>) -> TemplateSet {
    let set = TemplateSet::new(name)
        .with_options(Options::default().with_missing_key(MissingKey::Zero));
    let mut builder = FunctionRegistryBuilder::new();
    builder.extend(&SPRIG_FUNCTIONS);
    install_include(&mut builder, set.handle());
    set.with_functions(builder.build())
}
