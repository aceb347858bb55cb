// SPDX-License-Identifier: Apache-2.0 OR MIT
#[cfg(test)]
use stencil_engine::{EvalContext, FunctionRegistry};
use stencil_engine::{Error, FunctionRegistryBuilder, Map, Value};
use thiserror::Error;

mod dict;
mod flow;
mod lists;
mod strings;

pub fn install_all(builder: &mut FunctionRegistryBuilder) {
    flow::register(builder);
    strings::register(builder);
    lists::register(builder);
    dict::register(builder);
}

/// Argument validation failures shared by every sprig helper.
#[derive(Debug, Error)]
pub(crate) enum ArgError {
    #[error("{name} expected at least {min} arguments, got {got}")]
    TooFew {
        name: &'static str,
        min: usize,
        got: usize,
    },
    #[error("{name} expected {expected} argument{}, got {got}", plural(.expected))]
    Count {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{name} argument {position} must be {want}, got {got}")]
    Type {
        name: &'static str,
        position: usize,
        want: &'static str,
        got: &'static str,
    },
}

fn plural(count: &usize) -> &'static str {
    if *count == 1 {
        ""
    } else {
        "s"
    }
}

impl From<ArgError> for Error {
    fn from(err: ArgError) -> Self {
        Error::execute(err.to_string(), None)
    }
}

pub(crate) fn expect_min_args(name: &'static str, args: &[Value], min: usize) -> Result<(), ArgError> {
    if args.len() < min {
        return Err(ArgError::TooFew {
            name,
            min,
            got: args.len(),
        });
    }
    Ok(())
}

pub(crate) fn expect_exact_args(
    name: &'static str,
    args: &[Value],
    expected: usize,
) -> Result<(), ArgError> {
    if args.len() != expected {
        return Err(ArgError::Count {
            name,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// Go's `strval`: scalars convert, `nil` becomes the empty string.
pub(crate) fn expect_string(
    name: &'static str,
    value: &Value,
    position: usize,
) -> Result<String, ArgError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(value.to_string()),
        other => Err(ArgError::Type {
            name,
            position,
            want: "coercible to string",
            got: other.kind(),
        }),
    }
}

/// Lists pass through; `nil` counts as the empty list.
pub(crate) fn expect_list(
    name: &'static str,
    value: &Value,
    position: usize,
) -> Result<Vec<Value>, ArgError> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Null => Ok(Vec::new()),
        other => Err(ArgError::Type {
            name,
            position,
            want: "a list",
            got: other.kind(),
        }),
    }
}

pub(crate) fn expect_map(
    name: &'static str,
    value: &Value,
    position: usize,
) -> Result<Map, ArgError> {
    match value {
        Value::Map(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(ArgError::Type {
            name,
            position,
            want: "a dict",
            got: other.kind(),
        }),
    }
}

pub(crate) fn expect_int(
    name: &'static str,
    value: &Value,
    position: usize,
) -> Result<i64, ArgError> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .ok_or(ArgError::Type {
            name,
            position,
            want: "an integer",
            got: value.kind(),
        })
}

pub(crate) fn expect_usize(
    name: &'static str,
    value: &Value,
    position: usize,
) -> Result<usize, ArgError> {
    let n = expect_int(name, value, position)?;
    usize::try_from(n).map_err(|_| ArgError::Type {
        name,
        position,
        want: "a non-negative integer",
        got: value.kind(),
    })
}

/// Sprig's `empty`: the Go zero value of the operand's type.
pub(crate) fn is_empty(value: &Value) -> bool {
    !value.is_truthy()
}

/// Byte offsets of the char range `[start, end)`, clamped to `text`.
pub(crate) fn char_range(text: &str, start: usize, end: Option<usize>) -> (usize, usize) {
    let mut offsets: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
    offsets.push(text.len());
    let total = offsets.len() - 1;
    let start = start.min(total);
    let end = end.map_or(total, |end| end.clamp(start, total));
    (offsets[start], offsets[end])
}

#[cfg(test)]
pub(crate) fn empty_context() -> EvalContext {
    EvalContext::new(Value::Null, FunctionRegistry::empty())
}

#[cfg(test)]
pub(crate) fn values(data: serde_json::Value) -> Vec<Value> {
    match Value::from(data) {
        Value::List(items) => items,
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_errors_read_like_sprig() {
        let err: Error = ArgError::Count {
            name: "ternary",
            expected: 3,
            got: 2,
        }
        .into();
        assert!(err.is_execute());
        assert_eq!(err.message(), "ternary expected 3 arguments, got 2");

        let err = expect_list("first", &Value::from("x"), 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "first argument 1 must be a list, got string"
        );
    }

    #[test]
    fn char_range_clamps() {
        assert_eq!(char_range("héllo", 1, Some(4)), (1, 5));
        assert_eq!(char_range("abc", 5, None), (3, 3));
        assert_eq!(char_range("abc", 2, Some(1)), (2, 2));
    }

    #[test]
    fn integers_accept_numeric_strings() {
        assert_eq!(expect_int("trunc", &Value::from("12"), 1).unwrap(), 12);
        assert!(expect_usize("repeat", &Value::Int(-1), 1).is_err());
    }
}
