// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use stencil_sprig::{helm_template_set, Value};

#[derive(Debug, Deserialize)]
struct SprigCase {
    name: String,
    template: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    expected: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn load_cases() -> Vec<SprigCase> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir
        .parent()
        .and_then(|crates| crates.parent())
        .expect("workspace root missing");
    let bytes = fs::read(root.join("test-cases/stencil-sprig.json")).expect("missing sprig cases");
    serde_json::from_slice(&bytes).expect("invalid sprig cases")
}

#[test]
fn sprig_cases_render_like_helm() {
    for case in load_cases() {
        let mut set = helm_template_set(case.name.as_str());
        let template = set
            .parse(&case.template)
            .unwrap_or_else(|err| panic!("parse {} failed: {}", case.name, err));

        match (template.render(&case.data), case.error) {
            (Ok(output), None) => {
                let expected = case.expected.unwrap_or_default();
                assert_eq!(output, expected, "case {} mismatch", case.name);
            }
            (Ok(output), Some(expected_err)) => panic!(
                "{} expected error '{}' but rendered '{}'",
                case.name, expected_err, output
            ),
            (Err(err), Some(expected_err)) => assert!(
                err.to_string().contains(&expected_err),
                "{} expected error containing '{}', got '{}'",
                case.name,
                expected_err,
                err
            ),
            (Err(err), None) => panic!("render {} failed: {}", case.name, err),
        }
    }
}
