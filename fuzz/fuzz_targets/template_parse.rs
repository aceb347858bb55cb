#![no_main]

use libfuzzer_sys::fuzz_target;
use stencil_engine::TemplateSet;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let mut set = TemplateSet::new("fuzz-parse");
        if let Ok(template) = set.parse(source) {
            // The canonical form must parse again.
            let canonical = template.to_template_string();
            let _ = TemplateSet::new("fuzz-reparse").parse(&canonical);
        }
    }
});
