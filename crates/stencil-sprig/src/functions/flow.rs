// SPDX-License-Identifier: Apache-2.0 OR MIT
use stencil_core::sprint;
use stencil_engine::{Error, EvalContext, FunctionRegistryBuilder, Value};

use super::{expect_exact_args, expect_min_args, expect_string, is_empty};

pub fn register(builder: &mut FunctionRegistryBuilder) {
    builder
        .register("default", default)
        .register("coalesce", coalesce)
        .register("ternary", ternary)
        .register("empty", empty)
        .register("fail", fail)
        .register("fromJson", from_json)
        .register("mustFromJson", must_from_json)
        .register("toJson", to_json)
        .register("mustToJson", must_to_json)
        .register("toPrettyJson", to_pretty_json)
        .register("mustToPrettyJson", must_to_pretty_json)
        .register("toRawJson", to_raw_json)
        .register("mustToRawJson", must_to_raw_json);
}

/// `default fallback value`: `value` unless it is empty. With the value
/// omitted the fallback is returned.
pub fn default(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_min_args("default", args, 1)?;
    match args.get(1) {
        Some(candidate) if !is_empty(candidate) => Ok(candidate.clone()),
        _ => Ok(args[0].clone()),
    }
}

pub fn coalesce(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    Ok(args
        .iter()
        .find(|value| !is_empty(value))
        .cloned()
        .unwrap_or_default())
}

/// `ternary when_true when_false condition`
pub fn ternary(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("ternary", args, 3)?;
    if args[2].is_truthy() {
        Ok(args[0].clone())
    } else {
        Ok(args[1].clone())
    }
}

pub fn empty(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("empty", args, 1)?;
    Ok(Value::Bool(is_empty(&args[0])))
}

pub fn fail(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("fail", args, 1)?;
    Err(Error::execute(sprint(args), None))
}

pub fn from_json(ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("fromJson", args, 1)?;
    Ok(must_from_json(ctx, args).unwrap_or_default())
}

pub fn must_from_json(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("mustFromJson", args, 1)?;
    let text = expect_string("mustFromJson", &args[0], 1)?;
    serde_json::from_str::<serde_json::Value>(&text)
        .map(Value::from)
        .map_err(|err| Error::execute(format!("mustFromJson failed: {err}"), None).with_source(err))
}

#[derive(Clone, Copy)]
enum JsonStyle {
    Compact,
    Pretty,
    Raw,
}

/// Go's `json.Marshal` escapes `<`, `>` and `&`; those bytes only ever occur
/// inside string literals of the serialised text.
fn escape_html_bytes(text: &str) -> String {
    text.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn serialize_json(value: &Value, style: JsonStyle) -> Result<String, serde_json::Error> {
    match style {
        JsonStyle::Compact => serde_json::to_string(value).map(|text| escape_html_bytes(&text)),
        JsonStyle::Pretty => {
            serde_json::to_string_pretty(value).map(|text| escape_html_bytes(&text))
        }
        JsonStyle::Raw => serde_json::to_string(value),
    }
}

fn json_helper(
    name: &'static str,
    args: &[Value],
    style: JsonStyle,
    must: bool,
) -> Result<Value, Error> {
    expect_exact_args(name, args, 1)?;
    match serialize_json(&args[0], style) {
        Ok(text) => Ok(Value::String(text)),
        Err(err) if must => {
            Err(Error::execute(format!("{name} failed: {err}"), None).with_source(err))
        }
        Err(_) => Ok(Value::String(String::new())),
    }
}

pub fn to_json(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    json_helper("toJson", args, JsonStyle::Compact, false)
}

pub fn must_to_json(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    json_helper("mustToJson", args, JsonStyle::Compact, true)
}

pub fn to_pretty_json(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    json_helper("toPrettyJson", args, JsonStyle::Pretty, false)
}

pub fn must_to_pretty_json(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    json_helper("mustToPrettyJson", args, JsonStyle::Pretty, true)
}

pub fn to_raw_json(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    json_helper("toRawJson", args, JsonStyle::Raw, false)
}

pub fn must_to_raw_json(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    json_helper("mustToRawJson", args, JsonStyle::Raw, true)
}
