// SPDX-License-Identifier: Apache-2.0 OR MIT
use heck::{ToKebabCase, ToSnakeCase, ToUpperCamelCase};
use stencil_core::go_quote;
use stencil_engine::{Error, EvalContext, FunctionRegistryBuilder, Value};

use super::{char_range, expect_exact_args, expect_int, expect_min_args, expect_string, expect_usize};

pub fn register(builder: &mut FunctionRegistryBuilder) {
    builder
        .register("upper", upper)
        .register("lower", lower)
        .register("title", title)
        .register("trim", trim)
        .register("trimAll", trim_all)
        .register("trimPrefix", trim_prefix)
        .register("trimSuffix", trim_suffix)
        .register("hasPrefix", has_prefix)
        .register("hasSuffix", has_suffix)
        .register("contains", contains)
        .register("replace", replace)
        .register("substr", substr)
        .register("trunc", trunc)
        .register("indent", indent)
        .register("nindent", nindent)
        .register("nospace", nospace)
        .register("repeat", repeat)
        .register("cat", cat)
        .register("quote", quote)
        .register("squote", squote)
        .register("toString", to_string)
        .register("snakecase", snakecase)
        .register("camelcase", camelcase)
        .register("kebabcase", kebabcase);
}

fn unary(
    name: &'static str,
    args: &[Value],
    apply: impl FnOnce(String) -> String,
) -> Result<Value, Error> {
    expect_exact_args(name, args, 1)?;
    let input = expect_string(name, &args[0], 1)?;
    Ok(Value::String(apply(input)))
}

/// Two-string helpers whose subject comes last, so it can be piped in.
fn binary<T: Into<Value>>(
    name: &'static str,
    args: &[Value],
    apply: impl FnOnce(&str, &str) -> T,
) -> Result<Value, Error> {
    expect_exact_args(name, args, 2)?;
    let operand = expect_string(name, &args[0], 1)?;
    let subject = expect_string(name, &args[1], 2)?;
    Ok(apply(&operand, &subject).into())
}

pub fn upper(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    unary("upper", args, |s| s.to_uppercase())
}

pub fn lower(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    unary("lower", args, |s| s.to_lowercase())
}

/// Go's `strings.Title`: the first letter of every word is upper-cased and
/// the rest is left alone.
pub fn title(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    unary("title", args, |input| {
        let mut result = String::with_capacity(input.len());
        let mut at_word_start = true;
        for ch in input.chars() {
            if at_word_start && ch.is_alphanumeric() {
                result.extend(ch.to_uppercase());
            } else {
                result.push(ch);
            }
            at_word_start = !(ch.is_alphanumeric() || ch == '_' || ch == '\'');
        }
        result
    })
}

pub fn trim(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    unary("trim", args, |s| s.trim().to_string())
}

pub fn trim_all(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    binary("trimAll", args, |cutset, input| {
        input.trim_matches(|c| cutset.contains(c)).to_string()
    })
}

pub fn trim_prefix(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    binary("trimPrefix", args, |prefix, input| {
        input.strip_prefix(prefix).unwrap_or(input).to_string()
    })
}

pub fn trim_suffix(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    binary("trimSuffix", args, |suffix, input| {
        input.strip_suffix(suffix).unwrap_or(input).to_string()
    })
}

pub fn has_prefix(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    binary("hasPrefix", args, |prefix, input| input.starts_with(prefix))
}

pub fn has_suffix(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    binary("hasSuffix", args, |suffix, input| input.ends_with(suffix))
}

pub fn contains(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    binary("contains", args, |needle, haystack| haystack.contains(needle))
}

/// `replace old new text`
pub fn replace(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("replace", args, 3)?;
    let old = expect_string("replace", &args[0], 1)?;
    let new = expect_string("replace", &args[1], 2)?;
    let text = expect_string("replace", &args[2], 3)?;
    Ok(Value::String(text.replace(&old, &new)))
}

/// `substr start end text`; a negative start means 0 and a negative end
/// means the end of the text.
pub fn substr(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("substr", args, 3)?;
    let start = expect_int("substr", &args[0], 1)?;
    let end = expect_int("substr", &args[1], 2)?;
    let text = expect_string("substr", &args[2], 3)?;
    let start = usize::try_from(start).unwrap_or(0);
    let end = usize::try_from(end).ok();
    let (from, to) = char_range(&text, start, end);
    Ok(Value::from(&text[from..to]))
}

/// `trunc n text` keeps the first `n` chars, or the last `-n` when negative.
pub fn trunc(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("trunc", args, 2)?;
    let length = expect_int("trunc", &args[0], 1)?;
    let text = expect_string("trunc", &args[1], 2)?;
    let total = text.chars().count();
    let keep = usize::try_from(length.unsigned_abs()).unwrap_or(usize::MAX);
    let (from, to) = if length >= 0 {
        char_range(&text, 0, Some(keep))
    } else {
        char_range(&text, total.saturating_sub(keep), None)
    };
    Ok(Value::from(&text[from..to]))
}

/// Prefixes every line, including empty ones, with `n` spaces.
pub fn indent(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("indent", args, 2)?;
    let spaces = expect_usize("indent", &args[0], 1)?;
    let input = expect_string("indent", &args[1], 2)?;
    let pad = " ".repeat(spaces);
    let mut result = String::with_capacity(input.len() + pad.len());
    result.push_str(&pad);
    result.push_str(&input.replace('\n', &format!("\n{pad}")));
    Ok(Value::String(result))
}

/// `indent` preceded by a newline.
pub fn nindent(ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("nindent", args, 2)?;
    let indented = indent(ctx, args)?;
    Ok(Value::String(format!("\n{indented}")))
}

pub fn nospace(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    unary("nospace", args, |s| {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    })
}

pub fn repeat(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("repeat", args, 2)?;
    let count = expect_usize("repeat", &args[0], 1)?;
    let s = expect_string("repeat", &args[1], 2)?;
    Ok(Value::String(s.repeat(count)))
}

fn non_null(args: &[Value]) -> impl Iterator<Item = &Value> {
    args.iter().filter(|value| !value.is_null())
}

/// Joins the non-nil operands with spaces.
pub fn cat(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let parts: Vec<String> = non_null(args).map(ToString::to_string).collect();
    Ok(Value::String(parts.join(" ")))
}

pub fn quote(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let parts: Vec<String> = non_null(args)
        .map(|value| go_quote(&value.to_string()))
        .collect();
    Ok(Value::String(parts.join(" ")))
}

pub fn squote(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let parts: Vec<String> = non_null(args).map(|value| format!("'{value}'")).collect();
    Ok(Value::String(parts.join(" ")))
}

pub fn to_string(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_min_args("toString", args, 1)?;
    Ok(Value::String(args[0].to_string()))
}

pub fn snakecase(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    unary("snakecase", args, |s| s.to_snake_case())
}

pub fn camelcase(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    unary("camelcase", args, |s| s.to_upper_camel_case())
}

pub fn kebabcase(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    unary("kebabcase", args, |s| s.to_kebab_case())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{empty_context, values};
    use serde_json::json;

    #[test]
    fn title_keeps_inner_case() {
        let mut ctx = empty_context();
        let out = title(&mut ctx, &values(json!("hello wORLD-wide"))).unwrap();
        assert_eq!(out, Value::from("Hello WORLD-Wide"));
    }

    #[test]
    fn substr_and_trunc_count_chars() {
        let mut ctx = empty_context();
        assert_eq!(
            substr(&mut ctx, &values(json!([1, 4, "héllo"]))).unwrap(),
            Value::from("éll")
        );
        assert_eq!(
            substr(&mut ctx, &values(json!([2, -1, "héllo"]))).unwrap(),
            Value::from("llo")
        );
        assert_eq!(
            trunc(&mut ctx, &values(json!([3, "héllo"]))).unwrap(),
            Value::from("hél")
        );
        assert_eq!(
            trunc(&mut ctx, &values(json!([-2, "héllo"]))).unwrap(),
            Value::from("lo")
        );
    }

    #[test]
    fn indent_pads_every_line() {
        let mut ctx = empty_context();
        assert_eq!(
            indent(&mut ctx, &values(json!([2, "a\n\nb"]))).unwrap(),
            Value::from("  a\n  \n  b")
        );
        assert_eq!(
            nindent(&mut ctx, &values(json!([4, "extra: true"]))).unwrap(),
            Value::from("\n    extra: true")
        );
    }

    #[test]
    fn cat_and_quotes_skip_nil() {
        let mut ctx = empty_context();
        assert_eq!(
            cat(&mut ctx, &values(json!([null, "foo", 1]))).unwrap(),
            Value::from("foo 1")
        );
        assert_eq!(
            quote(&mut ctx, &values(json!(["a\"b", null, 2]))).unwrap(),
            Value::from("\"a\\\"b\" \"2\"")
        );
        assert_eq!(
            squote(&mut ctx, &values(json!(["foo", 123]))).unwrap(),
            Value::from("'foo' '123'")
        );
    }

    #[test]
    fn case_conversions() {
        let mut ctx = empty_context();
        assert_eq!(
            snakecase(&mut ctx, &values(json!("FirstName"))).unwrap(),
            Value::from("first_name")
        );
        assert_eq!(
            camelcase(&mut ctx, &values(json!("first_name"))).unwrap(),
            Value::from("FirstName")
        );
        assert_eq!(
            kebabcase(&mut ctx, &values(json!("First Name"))).unwrap(),
            Value::from("first-name")
        );
    }

    #[test]
    fn wrong_arity_is_reported() {
        let mut ctx = empty_context();
        let err = trim_prefix(&mut ctx, &values(json!("only"))).unwrap_err();
        assert_eq!(err.message(), "trimPrefix expected 2 arguments, got 1");
    }
}
