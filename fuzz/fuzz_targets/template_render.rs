#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use serde_json::json;
use stencil_sprig::{helm_template_set, Value};

static DATA: Lazy<Value> = Lazy::new(|| {
    Value::from(json!({
        "name": "fuzz",
        "items": [1, "two", null, {"k": 3.5}],
        "env": {"B": {"v": 1}, "A": {"v": 2}}
    }))
});

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Each input gets its own set so `include` only sees its own defines.
    let mut set = helm_template_set("fuzz-render");
    if let Ok(template) = set.parse(source) {
        let _ = template.render(&DATA);
    }
});
