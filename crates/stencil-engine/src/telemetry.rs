// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Optional OpenTelemetry instrumentation.
//!
//! Everything here compiles to no-ops unless the `telemetry` feature is on,
//! and even then nothing is recorded until [`enable`] is called.
#![cfg_attr(not(feature = "telemetry"), allow(dead_code))]

#[cfg(feature = "telemetry")]
mod otel {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::OnceLock;
    use std::time::Duration;

    use opentelemetry::global;
    use opentelemetry::metrics::{Counter, Histogram};
    use opentelemetry::trace::{Span as _, SpanKind, Tracer};
    use opentelemetry::KeyValue;

    const METER_NAME: &str = "stencil_engine";
    const TRACER_NAME: &str = "stencil_engine";

    static ENABLED: AtomicBool = AtomicBool::new(false);
    static HANDLES: OnceLock<Handles> = OnceLock::new();

    struct Handles {
        tracer: global::BoxedTracer,
        render_hist: Histogram<f64>,
        render_counter: Counter<u64>,
        helper_counter: Counter<u64>,
        nested_counter: Counter<u64>,
    }

    impl Handles {
        fn new() -> Self {
            let meter = global::meter(METER_NAME);
            let render_hist = meter
                .f64_histogram("stencil.render.duration_ms")
                .with_description("Render duration in milliseconds")
                .init();
            let render_counter = meter
                .u64_counter("stencil.render.count")
                .with_description("Number of top-level template executions")
                .init();
            let helper_counter = meter
                .u64_counter("stencil.helper.count")
                .with_description("Number of helper invocations")
                .init();
            let nested_counter = meter
                .u64_counter("stencil.nested.count")
                .with_description("Number of nested template or include executions")
                .init();
            Self {
                tracer: global::tracer(TRACER_NAME),
                render_hist,
                render_counter,
                helper_counter,
                nested_counter,
            }
        }
    }

    fn handles() -> &'static Handles {
        HANDLES.get_or_init(Handles::new)
    }

    pub fn enable() {
        ENABLED.store(true, Ordering::Relaxed);
    }

    pub fn disable() {
        ENABLED.store(false, Ordering::Relaxed);
    }

    fn enabled() -> bool {
        ENABLED.load(Ordering::Relaxed)
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn record_render(template: &str, template_len: usize, duration: Duration, success: bool) {
        if !enabled() {
            return;
        }
        let hs = handles();
        let duration_ms = duration.as_secs_f64() * 1_000.0;
        let attrs = [
            KeyValue::new("template.name", template.to_string()),
            KeyValue::new("template.length", template_len as i64),
            KeyValue::new("render.success", success),
        ];
        hs.render_counter.add(1, &attrs);
        hs.render_hist.record(duration_ms, &attrs);
        let mut span = hs
            .tracer
            .span_builder("Template::execute")
            .with_kind(SpanKind::Internal)
            .start(&hs.tracer);
        span.set_attribute(KeyValue::new("template.name", template.to_string()));
        span.set_attribute(KeyValue::new("render.duration_ms", duration_ms));
        span.set_attribute(KeyValue::new("render.success", success));
        span.end();
    }

    pub fn record_helper_invocation(name: &str, success: bool) {
        if !enabled() {
            return;
        }
        let attrs = [
            KeyValue::new("helper.name", name.to_string()),
            KeyValue::new("helper.success", success),
        ];
        handles().helper_counter.add(1, &attrs);
    }

    pub fn record_nested_execution(name: &str, via: &'static str, depth: usize, success: bool) {
        if !enabled() {
            return;
        }
        let attrs = [
            KeyValue::new("template.name", name.to_string()),
            KeyValue::new("nested.via", via),
            KeyValue::new("nested.depth", i64::try_from(depth).unwrap_or(i64::MAX)),
            KeyValue::new("nested.success", success),
        ];
        handles().nested_counter.add(1, &attrs);
    }
}

#[cfg(not(feature = "telemetry"))]
mod otel {
    use std::time::Duration;

    pub fn enable() {}
    pub fn disable() {}
    pub fn record_render(
        _template: &str,
        _template_len: usize,
        _duration: Duration,
        _success: bool,
    ) {
    }
    pub fn record_helper_invocation(_name: &str, _success: bool) {}
    pub fn record_nested_execution(_name: &str, _via: &'static str, _depth: usize, _success: bool) {
    }
}

pub use otel::{
    disable, enable, record_helper_invocation, record_nested_execution, record_render,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TemplateSet, Value};

    #[test]
    fn recording_is_safe_with_or_without_a_provider() {
        record_render("idle", 0, std::time::Duration::ZERO, true);
        enable();
        let mut set = TemplateSet::new("traced");
        set.parse("{{define \"inner\"}}in{{end}}[{{template \"inner\"}}]")
            .unwrap();
        assert_eq!(set.render(&Value::Null).unwrap(), "[in]");
        record_nested_execution("inner", "include", 1, false);
        disable();
    }
}
