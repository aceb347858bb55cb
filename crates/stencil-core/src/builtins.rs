// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Logic, comparison and collection builtins.

use std::cmp::Ordering;

use stencil_engine::{Error, EvalContext, Value};

static NULL: Value = Value::Null;

pub(crate) fn expect_args(name: &str, args: &[Value], want: usize) -> Result<(), Error> {
    if args.len() == want {
        Ok(())
    } else {
        Err(Error::execute(
            format!("wrong number of args for {name}: want {want} got {}", args.len()),
            None,
        ))
    }
}

fn expect_at_least(name: &str, args: &[Value], want: usize) -> Result<(), Error> {
    if args.len() >= want {
        Ok(())
    } else {
        Err(Error::execute(
            format!(
                "wrong number of args for {name}: want at least {want} got {}",
                args.len()
            ),
            None,
        ))
    }
}

/// `and x y...`: the first falsy argument, or the last one.
pub(crate) fn builtin_and(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_at_least("and", args, 1)?;
    Ok(args
        .iter()
        .find(|value| !value.is_truthy())
        .or_else(|| args.last())
        .cloned()
        .unwrap_or_default())
}

/// `or x y...`: the first truthy argument, or the last one.
pub(crate) fn builtin_or(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_at_least("or", args, 1)?;
    Ok(args
        .iter()
        .find(|value| value.is_truthy())
        .or_else(|| args.last())
        .cloned()
        .unwrap_or_default())
}

pub(crate) fn builtin_not(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_args("not", args, 1)?;
    Ok(Value::Bool(!args[0].is_truthy()))
}

pub(crate) fn builtin_len(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_args("len", args, 1)?;
    let len = match &args[0] {
        Value::String(text) => text.len(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        Value::Null => return Err(Error::execute("len of nil pointer", None)),
        other => {
            return Err(Error::execute(
                format!("len of type {}", other.kind()),
                None,
            ))
        }
    };
    Ok(Value::from(len))
}

fn integer_index(value: &Value) -> Result<i64, Error> {
    value.as_i64().ok_or_else(|| {
        Error::execute(
            format!("cannot index slice/array with type {}", value.kind()),
            None,
        )
    })
}

fn checked_position(index: i64, cap: usize) -> Result<usize, Error> {
    usize::try_from(index)
        .ok()
        .filter(|idx| *idx <= cap)
        .ok_or_else(|| Error::execute(format!("index out of range: {index}"), None))
}

/// `index x 1 2 3` is `x[1][2][3]`; a missing map key yields `Null`.
pub(crate) fn builtin_index(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_at_least("index", args, 1)?;
    let mut current = &args[0];
    for key in &args[1..] {
        current = match current {
            Value::Map(map) => match key {
                Value::String(name) => map.get(name).unwrap_or(&NULL),
                Value::Null => &NULL,
                other => {
                    return Err(Error::execute(
                        format!("value has type {}; should be string", other.kind()),
                        None,
                    ))
                }
            },
            Value::List(items) => {
                let idx = integer_index(key)?;
                let pos = checked_position(idx, items.len())?;
                items
                    .get(pos)
                    .ok_or_else(|| Error::execute(format!("index out of range: {idx}"), None))?
            }
            Value::Null => return Err(Error::execute("index of untyped nil", None)),
            other => {
                return Err(Error::execute(
                    format!("can't index item of type {}", other.kind()),
                    None,
                ))
            }
        };
    }
    Ok(current.clone())
}

/// `slice x 1 2` is `x[1:2]` for strings and lists.
pub(crate) fn builtin_slice(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_at_least("slice", args, 1)?;
    let indices = &args[1..];
    if indices.len() > 2 {
        return Err(Error::execute(
            format!("too many slice indexes: {}", indices.len()),
            None,
        ));
    }

    let len = match &args[0] {
        Value::String(text) => text.len(),
        Value::List(items) => items.len(),
        Value::Null => return Err(Error::execute("slice of untyped nil", None)),
        other => {
            return Err(Error::execute(
                format!("can't slice item of type {}", other.kind()),
                None,
            ))
        }
    };

    let mut bounds = [0usize, len];
    for (slot, index) in bounds.iter_mut().zip(indices) {
        *slot = checked_position(integer_index(index)?, len)?;
    }
    let [start, end] = bounds;
    if start > end {
        return Err(Error::execute(
            format!("invalid slice index: {start} > {end}"),
            None,
        ));
    }

    match &args[0] {
        Value::String(text) => text
            .get(start..end)
            .map(Value::from)
            .ok_or_else(|| Error::execute("slice indices not on char boundaries", None)),
        Value::List(items) => Ok(Value::List(items[start..end].to_vec())),
        _ => Ok(Value::Null),
    }
}

/// `call "name" args...` invokes a helper from the template's own registry.
pub(crate) fn builtin_call(ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_at_least("call", args, 1)?;
    let name = args[0].as_str().ok_or_else(|| {
        Error::execute(
            format!("non-function of type {} passed to call", args[0].kind()),
            None,
        )
    })?;
    let func = ctx
        .function(name)
        .ok_or_else(|| Error::execute(format!("function \"{name}\" not defined"), None))?;
    func(ctx, &args[1..])
}

enum Basic<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(&'a str),
}

fn basic(value: &Value) -> Result<Basic<'_>, Error> {
    match value {
        Value::Int(n) => Ok(Basic::Int(*n)),
        Value::Float(f) => Ok(Basic::Float(*f)),
        Value::Bool(flag) => Ok(Basic::Bool(*flag)),
        Value::String(text) => Ok(Basic::String(text)),
        Value::Null => Err(Error::execute("invalid type for comparison", None)),
        Value::List(_) | Value::Map(_) => Err(Error::execute("non-comparable type", None)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn compare(lhs: &Value, rhs: &Value) -> Result<Option<Ordering>, Error> {
    let ordering = match (basic(lhs)?, basic(rhs)?) {
        (Basic::Int(a), Basic::Int(b)) => a.partial_cmp(&b),
        (Basic::Int(a), Basic::Float(b)) => (a as f64).partial_cmp(&b),
        (Basic::Float(a), Basic::Int(b)) => a.partial_cmp(&(b as f64)),
        (Basic::Float(a), Basic::Float(b)) => a.partial_cmp(&b),
        (Basic::String(a), Basic::String(b)) => a.partial_cmp(b),
        (Basic::Bool(a), Basic::Bool(b)) => a.partial_cmp(&b),
        _ => return Err(Error::execute("incompatible types for comparison", None)),
    };
    Ok(ordering)
}

fn equal(lhs: &Value, rhs: &Value) -> Result<bool, Error> {
    match (lhs, rhs) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        _ => Ok(compare(lhs, rhs)? == Some(Ordering::Equal)),
    }
}

/// `eq a b c...` is `a == b || a == c || ...`.
pub(crate) fn builtin_eq(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_at_least("eq", args, 2)?;
    for candidate in &args[1..] {
        if equal(&args[0], candidate)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

pub(crate) fn builtin_ne(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_args("ne", args, 2)?;
    Ok(Value::Bool(!equal(&args[0], &args[1])?))
}

fn ordered(name: &str, args: &[Value], accept: fn(Ordering) -> bool) -> Result<Value, Error> {
    expect_args(name, args, 2)?;
    if matches!((&args[0], &args[1]), (Value::Bool(_), Value::Bool(_))) {
        return Err(Error::execute("invalid type for comparison", None));
    }
    Ok(Value::Bool(compare(&args[0], &args[1])?.is_some_and(accept)))
}

pub(crate) fn builtin_lt(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    ordered("lt", args, Ordering::is_lt)
}

pub(crate) fn builtin_le(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    ordered("le", args, Ordering::is_le)
}

pub(crate) fn builtin_gt(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    ordered("gt", args, Ordering::is_gt)
}

pub(crate) fn builtin_ge(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    ordered("ge", args, Ordering::is_ge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stencil_engine::FunctionRegistry;

    fn ctx() -> EvalContext {
        EvalContext::new(Value::Null, FunctionRegistry::empty())
    }

    fn values(data: serde_json::Value) -> Vec<Value> {
        match Value::from(data) {
            Value::List(items) => items,
            other => vec![other],
        }
    }

    #[test]
    fn and_or_return_operands() {
        let mut ctx = ctx();
        assert_eq!(
            builtin_and(&mut ctx, &values(json!([1, 0, 2]))).unwrap(),
            Value::Int(0)
        );
        assert_eq!(
            builtin_and(&mut ctx, &values(json!([1, "x"]))).unwrap(),
            Value::from("x")
        );
        assert_eq!(
            builtin_or(&mut ctx, &values(json!(["", null, "y"]))).unwrap(),
            Value::from("y")
        );
        assert!(builtin_or(&mut ctx, &[]).is_err());
    }

    #[test]
    fn index_walks_nested_containers() {
        let mut ctx = ctx();
        let data = Value::from(json!({"a": [10, {"b": "deep"}]}));
        let args = vec![data.clone(), Value::from("a"), Value::Int(1), Value::from("b")];
        assert_eq!(builtin_index(&mut ctx, &args).unwrap(), Value::from("deep"));

        let missing = vec![data.clone(), Value::from("zzz")];
        assert_eq!(builtin_index(&mut ctx, &missing).unwrap(), Value::Null);

        let out_of_range = vec![data, Value::from("a"), Value::Int(5)];
        let err = builtin_index(&mut ctx, &out_of_range).unwrap_err();
        assert_eq!(err.message(), "index out of range: 5");
    }

    #[test]
    fn slice_checks_bounds() {
        let mut ctx = ctx();
        let word = Value::from("rustacean");
        assert_eq!(
            builtin_slice(&mut ctx, &[word.clone(), Value::Int(1), Value::Int(3)]).unwrap(),
            Value::from("us")
        );
        assert_eq!(
            builtin_slice(&mut ctx, &[word.clone(), Value::Int(5)]).unwrap(),
            Value::from("cean")
        );
        let err = builtin_slice(&mut ctx, &[word, Value::Int(3), Value::Int(1)]).unwrap_err();
        assert_eq!(err.message(), "invalid slice index: 3 > 1");

        let list = Value::from(json!([1, 2, 3]));
        assert_eq!(
            builtin_slice(&mut ctx, &[list.clone(), Value::Int(1)]).unwrap(),
            Value::from(json!([2, 3]))
        );
        assert!(builtin_slice(&mut ctx, &[list, Value::Int(-1)]).is_err());
    }

    #[test]
    fn len_rejects_scalars() {
        let mut ctx = ctx();
        assert_eq!(
            builtin_len(&mut ctx, &[Value::from("héllo")]).unwrap(),
            Value::Int(6)
        );
        assert!(builtin_len(&mut ctx, &[Value::Int(3)]).is_err());
        assert!(builtin_len(&mut ctx, &[Value::Null]).is_err());
    }

    #[test]
    fn eq_matches_any_candidate() {
        let mut ctx = ctx();
        assert_eq!(
            builtin_eq(&mut ctx, &values(json!(["b", "a", "b"]))).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            builtin_eq(&mut ctx, &[Value::Int(2), Value::Float(2.0)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            builtin_eq(&mut ctx, &[Value::Null, Value::from("x")]).unwrap(),
            Value::Bool(false)
        );
        let err = builtin_eq(&mut ctx, &[Value::Int(1), Value::from("1")]).unwrap_err();
        assert_eq!(err.message(), "incompatible types for comparison");
        assert!(builtin_eq(&mut ctx, &values(json!([[1], [1]]))).is_err());
    }

    #[test]
    fn ordering_builtins() {
        let mut ctx = ctx();
        assert_eq!(
            builtin_lt(&mut ctx, &[Value::Int(1), Value::Float(1.5)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            builtin_ge(&mut ctx, &[Value::from("b"), Value::from("a")]).unwrap(),
            Value::Bool(true)
        );
        assert!(builtin_gt(&mut ctx, &[Value::Bool(true), Value::Bool(false)]).is_err());
        assert!(builtin_le(&mut ctx, &[Value::Int(1)]).is_err());
    }
}
