// SPDX-License-Identifier: Apache-2.0 OR MIT
//! `fmt`-style printing helpers and the escaping builtins.

use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Chars;

use stencil_engine::{format_float, Error, EvalContext, Value};

/// Formats one operand like Go's `%v`; unlike template output, nil prints
/// as `<nil>`.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => "<nil>".to_string(),
        other => other.to_string(),
    }
}

/// Go's `fmt.Sprint`: operands are concatenated, with a space added between
/// two operands when neither is a string.
pub fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (idx, arg) in args.iter().enumerate() {
        if idx > 0 && !matches!(arg, Value::String(_)) && !matches!(args[idx - 1], Value::String(_))
        {
            out.push(' ');
        }
        out.push_str(&display(arg));
    }
    out
}

fn sprintln(args: &[Value]) -> String {
    let mut out = args.iter().map(display).collect::<Vec<_>>().join(" ");
    out.push('\n');
    out
}

/// Go's `strconv.Quote`.
pub fn go_quote(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    out.push('"');
    for ch in input.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let code = c as u32;
                if code > 0xFFFF {
                    let _ = write!(out, "\\U{code:08x}");
                } else {
                    let _ = write!(out, "\\u{code:04x}");
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn go_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "<nil>",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Float(_) => "float64",
        Value::String(_) => "string",
        Value::List(_) => "[]interface {}",
        Value::Map(_) => "map[string]interface {}",
    }
}

/// `%!verb(type=value)`, Go's marker for a verb that does not fit its operand.
fn bad_verb(verb: char, value: &Value) -> String {
    match value {
        Value::Null => format!("%!{verb}(<nil>)"),
        other => format!("%!{verb}({}={})", go_type(other), display(other)),
    }
}

#[derive(Debug, Default)]
struct Spec {
    minus: bool,
    plus: bool,
    space: bool,
    zero: bool,
    sharp: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

impl Spec {
    fn parse(chars: &mut Peekable<Chars<'_>>) -> Self {
        let mut spec = Spec::default();
        while let Some(flag) = chars.next_if(|&ch| matches!(ch, '-' | '+' | ' ' | '0' | '#')) {
            match flag {
                '-' => spec.minus = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                _ => spec.sharp = true,
            }
        }
        spec.width = Self::number(chars);
        if chars.next_if_eq(&'.').is_some() {
            spec.precision = Some(Self::number(chars).unwrap_or(0));
        }
        spec
    }

    fn number(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
        let mut value: Option<usize> = None;
        while let Some(digit) = chars.next_if(char::is_ascii_digit) {
            let digit = digit.to_digit(10).map_or(0, |d| d as usize);
            value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit));
        }
        value
    }

    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        }
    }

    /// Pads `body` to the width; numbers may zero-pad after their sign.
    fn pad(&self, sign: &str, body: &str, numeric: bool) -> String {
        let len = sign.chars().count() + body.chars().count();
        let fill = self.width.unwrap_or(0).saturating_sub(len);
        if fill == 0 {
            return format!("{sign}{body}");
        }
        if self.minus {
            format!("{sign}{body}{}", " ".repeat(fill))
        } else if self.zero && numeric {
            format!("{sign}{}{body}", "0".repeat(fill))
        } else {
            format!("{}{sign}{body}", " ".repeat(fill))
        }
    }

    fn pad_text(&self, text: &str) -> String {
        let text = match self.precision {
            Some(limit) => text.chars().take(limit).collect::<String>(),
            None => text.to_string(),
        };
        self.pad("", &text, false)
    }

    #[allow(clippy::cast_precision_loss)]
    fn format(&self, verb: char, value: &Value) -> String {
        match (verb, value) {
            ('v', Value::Float(f)) => self.float(*f, 'g'),
            ('v', Value::Int(n)) => self.integer(*n, 10, false),
            ('v', Value::String(text)) if self.sharp => self.pad_text(&go_quote(text)),
            ('v', other) => self.pad_text(&display(other)),
            ('s', Value::String(text)) => self.pad_text(text),
            ('s', Value::List(_) | Value::Map(_)) => self.pad_text(&display(value)),
            ('q', Value::String(text)) => self.pad("", &go_quote(text), false),
            ('t', Value::Bool(flag)) => self.pad("", &flag.to_string(), false),
            ('d', Value::Int(n)) => self.integer(*n, 10, false),
            ('d', Value::Float(f)) if f.fract() == 0.0 => {
                value.as_i64().map_or_else(|| bad_verb(verb, value), |n| self.integer(n, 10, false))
            }
            ('b', Value::Int(n)) => self.integer(*n, 2, false),
            ('o', Value::Int(n)) => self.integer(*n, 8, false),
            ('x', Value::Int(n)) => self.integer(*n, 16, false),
            ('X', Value::Int(n)) => self.integer(*n, 16, true),
            ('x' | 'X', Value::String(text)) => {
                let mut hex = String::with_capacity(text.len() * 2);
                for byte in text.bytes() {
                    let _ = write!(hex, "{byte:02x}");
                }
                if verb == 'X' {
                    hex = hex.to_uppercase();
                }
                self.pad("", &hex, false)
            }
            ('c', Value::Int(n)) => u32::try_from(*n)
                .ok()
                .and_then(char::from_u32)
                .map_or_else(|| bad_verb(verb, value), |ch| self.pad_text(&ch.to_string())),
            ('e' | 'E' | 'f' | 'F' | 'g' | 'G', Value::Float(f)) => self.float(*f, verb),
            ('e' | 'E' | 'f' | 'F' | 'g' | 'G', Value::Int(n)) => self.float(*n as f64, verb),
            _ => bad_verb(verb, value),
        }
    }

    fn integer(&self, value: i64, radix: u32, upper: bool) -> String {
        let magnitude = value.unsigned_abs();
        let mut digits = match radix {
            2 => format!("{magnitude:b}"),
            8 => format!("{magnitude:o}"),
            16 if upper => format!("{magnitude:X}"),
            16 => format!("{magnitude:x}"),
            _ => magnitude.to_string(),
        };
        if let Some(precision) = self.precision {
            if digits.len() < precision {
                digits = format!("{}{digits}", "0".repeat(precision - digits.len()));
            }
        }
        if self.sharp {
            let prefix = match radix {
                2 => "0b",
                8 => "0",
                16 if upper => "0X",
                16 => "0x",
                _ => "",
            };
            digits = format!("{prefix}{digits}");
        }
        self.pad(self.sign(value < 0), &digits, self.precision.is_none())
    }

    fn float(&self, value: f64, verb: char) -> String {
        if !value.is_finite() {
            let body = if value.is_nan() { "NaN" } else { "Inf" };
            let sign = if value.is_nan() {
                self.sign(false)
            } else {
                self.sign(value < 0.0)
            };
            return self.pad(sign, body, false);
        }
        let magnitude = value.abs();
        let body = match verb {
            'f' | 'F' => format!("{magnitude:.*}", self.precision.unwrap_or(6)),
            'e' | 'E' => {
                let text = exponent_form(magnitude, self.precision.unwrap_or(6));
                if verb == 'E' {
                    text.to_uppercase()
                } else {
                    text
                }
            }
            _ => {
                let text = match self.precision {
                    Some(precision) => general_form(magnitude, precision.max(1)),
                    None => format_float(magnitude),
                };
                if verb == 'G' {
                    text.to_uppercase()
                } else {
                    text
                }
            }
        };
        self.pad(self.sign(value.is_sign_negative() && value != 0.0), &body, true)
    }
}

/// `1.500000e+00` style output.
fn exponent_form(value: f64, precision: usize) -> String {
    let rendered = format!("{value:.precision$e}");
    let (mantissa, exponent) = rendered.split_once('e').unwrap_or((rendered.as_str(), "0"));
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(rest) => ('-', rest),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// `%.Ng`: `precision` significant digits, exponent form for large or small
/// magnitudes, trailing zeros removed.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn general_form(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i64;
    if exponent < -4 || exponent >= precision as i64 {
        let text = exponent_form(value, precision - 1);
        let (mantissa, exp) = text.split_once('e').unwrap_or((text.as_str(), ""));
        return format!("{}e{exp}", trim_fraction(mantissa));
    }
    let decimals = usize::try_from(precision as i64 - 1 - exponent).unwrap_or(0);
    trim_fraction(&format!("{value:.decimals$}")).to_string()
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Go's `fmt.Sprintf` for the verbs templates commonly use, including the
/// `%!v(MISSING)`, `%!(EXTRA ...)` and `%!(NOVERB)` markers.
pub fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut next_arg = 0usize;

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        if chars.next_if_eq(&'%').is_some() {
            out.push('%');
            continue;
        }
        let spec = Spec::parse(&mut chars);
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        match args.get(next_arg) {
            Some(value) => {
                out.push_str(&spec.format(verb, value));
                next_arg += 1;
            }
            None => {
                let _ = write!(out, "%!{verb}(MISSING)");
            }
        }
    }

    if next_arg < args.len() {
        let extras: Vec<String> = args[next_arg..]
            .iter()
            .map(|value| match value {
                Value::Null => "<nil>".to_string(),
                other => format!("{}={}", go_type(other), display(other)),
            })
            .collect();
        let _ = write!(out, "%!(EXTRA {})", extras.join(", "));
    }
    out
}

pub(crate) fn builtin_print(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(sprint(args)))
}

pub(crate) fn builtin_println(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(sprintln(args)))
}

pub(crate) fn builtin_printf(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    let Some((format, rest)) = args.split_first() else {
        return Err(Error::execute(
            "wrong number of args for printf: want at least 1 got 0",
            None,
        ));
    };
    let format = format.as_str().ok_or_else(|| {
        Error::execute(
            format!("printf format must be a string, got {}", format.kind()),
            None,
        )
    })?;
    Ok(Value::String(sprintf(format, rest)))
}

/// Escaping builtins take any operands and escape their `Sprint` form,
/// except that a single string is escaped as is.
fn escape_operands(args: &[Value]) -> String {
    match args {
        [Value::String(text)] => text.clone(),
        _ => sprint(args),
    }
}

pub(crate) fn builtin_html(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(escape_html(&escape_operands(args))))
}

pub(crate) fn builtin_js(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(escape_js(&escape_operands(args))))
}

pub(crate) fn builtin_urlquery(_ctx: &mut EvalContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(escape_urlquery(&escape_operands(args))))
}

fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&#34;"),
            '\'' => output.push_str("&#39;"),
            '\0' => output.push('\u{FFFD}'),
            _ => output.push(ch),
        }
    }
    output
}

fn escape_js(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => output.push_str("\\\\"),
            '\'' => output.push_str("\\'"),
            '"' => output.push_str("\\\""),
            '<' => output.push_str("\\u003C"),
            '>' => output.push_str("\\u003E"),
            '&' => output.push_str("\\u0026"),
            '=' => output.push_str("\\u003D"),
            c if (c as u32) < 0x20 || c.is_control() => {
                let _ = write!(output, "\\u{:04X}", c as u32);
            }
            c => output.push(c),
        }
    }
    output
}

fn escape_urlquery(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                output.push(char::from(byte));
            }
            b' ' => output.push('+'),
            _ => {
                let _ = write!(output, "%{byte:02X}");
            }
        }
    }
    output
}
