// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use stencil_core::{text_template_set, Error, Value};

/// One row of `test-cases/stencil-core.json`. Exactly one of `expected`,
/// `error` and `parse_error` describes the outcome.
#[derive(Debug, Deserialize)]
struct Fixture {
    name: String,
    template: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    expected: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    parse_error: Option<String>,
}

fn fixtures() -> Vec<Fixture> {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
    let bytes = fs::read(root.join("test-cases/stencil-core.json")).expect("test cases file missing");
    serde_json::from_slice(&bytes).expect("invalid test cases json")
}

fn assert_mentions(case: &str, err: &Error, needle: &str) {
    assert!(
        err.to_string().contains(needle),
        "{case}: expected error containing '{needle}', got '{err}'"
    );
}

#[test]
fn fixtures_render_like_text_template() {
    for case in fixtures() {
        let mut set = text_template_set(case.name.as_str());
        let parsed = set.parse(&case.template);

        if let Some(needle) = &case.parse_error {
            let err = parsed.expect_err(&format!("{} should not parse", case.name));
            assert!(err.is_parse(), "{}: {err}", case.name);
            assert_mentions(&case.name, &err, needle);
            continue;
        }

        let template = parsed.unwrap_or_else(|err| panic!("parse {} failed: {err}", case.name));
        match (&case.error, template.render(&case.data)) {
            (Some(needle), Err(err)) => {
                assert!(err.is_execute(), "{}: {err}", case.name);
                assert_mentions(&case.name, &err, needle);
            }
            (Some(needle), Ok(output)) => {
                panic!("{} expected error '{needle}' but rendered '{output}'", case.name)
            }
            (None, Ok(output)) => assert_eq!(
                output,
                case.expected.clone().unwrap_or_default(),
                "fixture {} rendered incorrectly",
                case.name
            ),
            (None, Err(err)) => panic!("render {} failed: {err}", case.name),
        }
    }
}
