// SPDX-License-Identifier: Apache-2.0 OR MIT
use stencil_engine::{Error, EvalContext, FunctionRegistryBuilder, Value};

use super::{expect_exact_args, expect_list, expect_min_args, expect_string, is_empty};

pub fn register(builder: &mut FunctionRegistryBuilder) {
    builder
        .register("list", list)
        .register("first", first)
        .register("last", last)
        .register("rest", rest)
        .register("initial", initial)
        .register("append", append)
        .register("prepend", prepend)
        .register("concat", concat)
        .register("reverse", reverse)
        .register("compact", compact)
        .register("uniq", uniq)
        .register("without", without)
        .register("has", has)
        .register("join", join)
        .register("splitList", split_list);
}

pub fn list(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::List(args.to_vec()))
}

fn single_list(name: &'static str, args: &[Value]) -> Result<Vec<Value>, Error> {
    expect_exact_args(name, args, 1)?;
    Ok(expect_list(name, &args[0], 1)?)
}

pub fn first(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let items = single_list("first", args)?;
    Ok(items.into_iter().next().unwrap_or_default())
}

pub fn last(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let items = single_list("last", args)?;
    Ok(items.into_iter().next_back().unwrap_or_default())
}

pub fn rest(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let items = single_list("rest", args)?;
    Ok(Value::List(items.into_iter().skip(1).collect()))
}

pub fn initial(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let mut items = single_list("initial", args)?;
    items.pop();
    Ok(Value::List(items))
}

/// `append list value`
pub fn append(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("append", args, 2)?;
    let mut items = expect_list("append", &args[0], 1)?;
    items.push(args[1].clone());
    Ok(Value::List(items))
}

/// `prepend list value`
pub fn prepend(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("prepend", args, 2)?;
    let mut items = expect_list("prepend", &args[0], 1)?;
    items.insert(0, args[1].clone());
    Ok(Value::List(items))
}

pub fn concat(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let mut combined = Vec::new();
    for (idx, value) in args.iter().enumerate() {
        combined.extend(expect_list("concat", value, idx + 1)?);
    }
    Ok(Value::List(combined))
}

pub fn reverse(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let mut items = single_list("reverse", args)?;
    items.reverse();
    Ok(Value::List(items))
}

pub fn compact(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let items = single_list("compact", args)?;
    Ok(Value::List(
        items.into_iter().filter(|value| !is_empty(value)).collect(),
    ))
}

pub fn uniq(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let items = single_list("uniq", args)?;
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for value in items {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    Ok(Value::List(out))
}

/// `without list drop...`
pub fn without(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_min_args("without", args, 1)?;
    let items = expect_list("without", &args[0], 1)?;
    let dropped = &args[1..];
    Ok(Value::List(
        items
            .into_iter()
            .filter(|item| !dropped.contains(item))
            .collect(),
    ))
}

/// `has needle list`
pub fn has(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("has", args, 2)?;
    let items = expect_list("has", &args[1], 2)?;
    Ok(Value::Bool(items.contains(&args[0])))
}

/// `join sep list`; nil items are skipped and a scalar joins as itself.
pub fn join(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("join", args, 2)?;
    let sep = expect_string("join", &args[0], 1)?;
    let parts: Vec<String> = match &args[1] {
        Value::List(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(ToString::to_string)
            .collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    };
    Ok(Value::String(parts.join(&sep)))
}

/// `splitList sep text`
pub fn split_list(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("splitList", args, 2)?;
    let sep = expect_string("splitList", &args[0], 1)?;
    let text = expect_string("splitList", &args[1], 2)?;
    let parts: Vec<Value> = if sep.is_empty() {
        text.chars().map(|ch| Value::String(ch.to_string())).collect()
    } else {
        text.split(sep.as_str()).map(Value::from).collect()
    };
    Ok(Value::List(parts))
}
