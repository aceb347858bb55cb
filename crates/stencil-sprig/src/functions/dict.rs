// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::btree_map::Entry;

use stencil_engine::{Error, EvalContext, FunctionRegistryBuilder, Map, Value};

use super::{expect_exact_args, expect_map, expect_min_args, expect_string, ArgError};

pub fn register(builder: &mut FunctionRegistryBuilder) {
    builder
        .register("dict", dict)
        .register("get", get)
        .register("set", set)
        .register("unset", unset)
        .register("hasKey", has_key)
        .register("keys", keys)
        .register("values", values)
        .register("merge", merge)
        .register("mergeOverwrite", merge_overwrite)
        .register("pick", pick)
        .register("omit", omit)
        .register("dig", dig);
}

/// `dict k1 v1 k2 v2 ...`; a trailing key without a value maps to `""`.
pub fn dict(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let mut map = Map::new();
    for (idx, pair) in args.chunks(2).enumerate() {
        let key = expect_string("dict", &pair[0], idx * 2 + 1)?;
        let value = pair.get(1).cloned().unwrap_or_else(|| Value::from(""));
        map.insert(key, value);
    }
    Ok(Value::Map(map))
}

/// Missing keys read as `""`.
pub fn get(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("get", args, 2)?;
    let map = expect_map("get", &args[0], 1)?;
    let key = expect_string("get", &args[1], 2)?;
    Ok(map.get(&key).cloned().unwrap_or_else(|| Value::from("")))
}

/// Values are immutable, so `set` and `unset` return the updated dict.
pub fn set(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("set", args, 3)?;
    let mut map = expect_map("set", &args[0], 1)?;
    let key = expect_string("set", &args[1], 2)?;
    map.insert(key, args[2].clone());
    Ok(Value::Map(map))
}

pub fn unset(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("unset", args, 2)?;
    let mut map = expect_map("unset", &args[0], 1)?;
    let key = expect_string("unset", &args[1], 2)?;
    map.remove(&key);
    Ok(Value::Map(map))
}

pub fn has_key(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("hasKey", args, 2)?;
    let map = expect_map("hasKey", &args[0], 1)?;
    let key = expect_string("hasKey", &args[1], 2)?;
    Ok(Value::Bool(map.contains_key(&key)))
}

/// Keys of every given dict, sorted.
pub fn keys(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let mut keys = Vec::new();
    for (idx, value) in args.iter().enumerate() {
        keys.extend(expect_map("keys", value, idx + 1)?.into_keys());
    }
    keys.sort();
    Ok(Value::List(keys.into_iter().map(Value::String).collect()))
}

/// Values in key order.
pub fn values(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_exact_args("values", args, 1)?;
    let map = expect_map("values", &args[0], 1)?;
    Ok(Value::List(map.into_values().collect()))
}

/// Deep merge of `src` into `dst`; nested dicts merge recursively and, unless
/// `overwrite` is set, keys already present in `dst` win.
fn merge_into(dst: &mut Map, src: Map, overwrite: bool) {
    for (key, incoming) in src {
        match dst.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), incoming) {
                (Value::Map(existing), Value::Map(nested)) => {
                    merge_into(existing, nested, overwrite);
                }
                (existing, incoming) => {
                    if overwrite || existing.is_null() {
                        *existing = incoming;
                    }
                }
            },
        }
    }
}

fn merge_with(name: &'static str, args: &[Value], overwrite: bool) -> Result<Value, Error> {
    expect_min_args(name, args, 1)?;
    let mut result = expect_map(name, &args[0], 1)?;
    for (idx, value) in args[1..].iter().enumerate() {
        let src = expect_map(name, value, idx + 2)?;
        merge_into(&mut result, src, overwrite);
    }
    Ok(Value::Map(result))
}

/// `merge dst src...`: the destination takes precedence.
pub fn merge(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    merge_with("merge", args, false)
}

/// `mergeOverwrite dst src...`: later sources take precedence.
pub fn merge_overwrite(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    merge_with("mergeOverwrite", args, true)
}

fn key_list(name: &'static str, args: &[Value]) -> Result<Vec<String>, ArgError> {
    args.iter()
        .enumerate()
        .map(|(idx, key)| expect_string(name, key, idx + 2))
        .collect()
}

pub fn pick(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_min_args("pick", args, 1)?;
    let map = expect_map("pick", &args[0], 1)?;
    let wanted = key_list("pick", &args[1..])?;
    Ok(Value::Map(
        map.into_iter()
            .filter(|(key, _)| wanted.contains(key))
            .collect(),
    ))
}

pub fn omit(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_min_args("omit", args, 1)?;
    let map = expect_map("omit", &args[0], 1)?;
    let dropped = key_list("omit", &args[1..])?;
    Ok(Value::Map(
        map.into_iter()
            .filter(|(key, _)| !dropped.contains(key))
            .collect(),
    ))
}

/// `dig "a" "b" default dict` walks nested dicts, returning `default` as
/// soon as a key is missing.
pub fn dig(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    expect_min_args("dig", args, 3)?;
    let (path, rest) = args.split_at(args.len() - 2);
    let fallback = &rest[0];
    let mut current = &rest[1];
    for (idx, key) in path.iter().enumerate() {
        let key = expect_string("dig", key, idx + 1)?;
        match current.get(&key) {
            Some(next) => current = next,
            None => return Ok(fallback.clone()),
        }
    }
    Ok(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{empty_context, values as args};
    use serde_json::json;

    #[test]
    fn dict_pairs_keys_and_values() {
        let mut ctx = empty_context();
        let out = dict(&mut ctx, &args(json!(["a", 1, "b", [true], "dangling"]))).unwrap();
        assert_eq!(out, Value::from(json!({"a": 1, "b": [true], "dangling": ""})));
    }

    #[test]
    fn get_set_unset() {
        let mut ctx = empty_context();
        let base = Value::from(json!({"a": 1}));
        assert_eq!(get(&mut ctx, &[base.clone(), "a".into()]).unwrap(), Value::Int(1));
        assert_eq!(get(&mut ctx, &[base.clone(), "z".into()]).unwrap(), Value::from(""));
        let updated = set(&mut ctx, &[base.clone(), "b".into(), 2i64.into()]).unwrap();
        assert_eq!(updated, Value::from(json!({"a": 1, "b": 2})));
        let removed = unset(&mut ctx, &[updated, "a".into()]).unwrap();
        assert_eq!(removed, Value::from(json!({"b": 2})));
    }

    #[test]
    fn merge_prefers_destination_and_recurses() {
        let mut ctx = empty_context();
        let dst = Value::from(json!({"a": 1, "nested": {"x": 1}, "empty": null}));
        let src = Value::from(json!({"a": 2, "b": 3, "nested": {"x": 9, "y": 2}, "empty": "filled"}));
        let merged = merge(&mut ctx, &[dst.clone(), src.clone()]).unwrap();
        assert_eq!(
            merged,
            Value::from(json!({"a": 1, "b": 3, "nested": {"x": 1, "y": 2}, "empty": "filled"}))
        );
        let overwritten = merge_overwrite(&mut ctx, &[dst, src]).unwrap();
        assert_eq!(
            overwritten,
            Value::from(json!({"a": 2, "b": 3, "nested": {"x": 9, "y": 2}, "empty": "filled"}))
        );
    }

    #[test]
    fn pick_omit_keys_values() {
        let mut ctx = empty_context();
        let base = Value::from(json!({"c": 3, "a": 1, "b": 2}));
        assert_eq!(
            pick(&mut ctx, &[base.clone(), "a".into(), "c".into()]).unwrap(),
            Value::from(json!({"a": 1, "c": 3}))
        );
        assert_eq!(
            omit(&mut ctx, &[base.clone(), "a".into()]).unwrap(),
            Value::from(json!({"b": 2, "c": 3}))
        );
        assert_eq!(
            keys(&mut ctx, &[base.clone()]).unwrap(),
            Value::from(json!(["a", "b", "c"]))
        );
        assert_eq!(values(&mut ctx, &[base]).unwrap(), Value::from(json!([1, 2, 3])));
    }

    #[test]
    fn dig_falls_back_on_missing_path() {
        let mut ctx = empty_context();
        let data = Value::from(json!({"a": {"b": {"c": "deep"}}}));
        assert_eq!(
            dig(&mut ctx, &["a".into(), "b".into(), "c".into(), "fb".into(), data.clone()]).unwrap(),
            Value::from("deep")
        );
        assert_eq!(
            dig(&mut ctx, &["a".into(), "x".into(), "fb".into(), data]).unwrap(),
            Value::from("fb")
        );
    }
}
