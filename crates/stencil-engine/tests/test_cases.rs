// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use stencil_engine::{FunctionRegistry, Template, Value};

#[derive(Debug, Deserialize)]
struct EngineCase {
    name: String,
    template: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    expected: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn load_cases() -> Vec<EngineCase> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir
        .parent()
        .and_then(|crates| crates.parent())
        .expect("workspace root missing");
    let path = root.join("test-cases/stencil-engine.json");
    let bytes = fs::read(&path).expect("missing engine test cases");
    serde_json::from_slice(&bytes).expect("invalid engine test cases")
}

#[test]
fn engine_test_cases_align_with_go_semantics() {
    for case in load_cases() {
        let parsed =
            Template::parse_with_functions(&case.name, &case.template, FunctionRegistry::empty());

        let template = match (parsed, case.error.as_ref()) {
            (Ok(template), _) => template,
            (Err(err), Some(expected_err)) => {
                assert!(
                    err.is_parse(),
                    "{} expected a parse error, got {err}",
                    case.name
                );
                assert!(
                    err.to_string().contains(expected_err),
                    "{} expected parse error containing '{}', got '{}'",
                    case.name,
                    expected_err,
                    err
                );
                continue;
            }
            (Err(err), None) => panic!("parse {} failed: {}", case.name, err),
        };

        match (template.render(&case.data), case.error.as_ref()) {
            (Ok(output), Some(expected_err)) => panic!(
                "{} expected error '{}' but rendered '{}'",
                case.name, expected_err, output
            ),
            (Err(err), Some(expected_err)) => {
                assert!(err.is_execute(), "{} expected an execution error", case.name);
                assert!(
                    err.to_string().contains(expected_err),
                    "{} expected error containing '{}', got '{}'",
                    case.name,
                    expected_err,
                    err
                );
            }
            (Err(err), None) => panic!("render {} failed: {}", case.name, err),
            (Ok(output), None) => {
                let expected = case.expected.unwrap_or_default();
                assert_eq!(output, expected, "case {} mismatch", case.name);
            }
        }
    }
}
