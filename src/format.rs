//! printf-style message interpolation.
//!
//! Supported verbs: `%s` plain text, `%d` number, `%i` integer, `%f` float,
//! `%j` JSON, `%o`/`%O` structured inspect, and `%%` for a literal percent
//! sign. A verb without a matching argument stays in the output as-is, and
//! arguments left over after the template is consumed are appended,
//! separated by spaces. Formatting never fails.
//!
//! Numeric verbs differ in how they read text: `%d` converts the whole
//! value (`"0x10"` is 16, `""` is 0), while `%i` and `%f` read the longest
//! integer or float prefix (`"42px"` is 42, `"1.5kg"` is 1.5).
//!
//! Structured output is `util.inspect`-like: `{ id: 7, tags: [ 'a' ] }`,
//! strings in single quotes, or double quotes when they contain one. Unlike
//! `util.inspect` there is no line wrapping and no depth limit. `%j` writes
//! compact JSON.

use crate::arg::{Arg, Fault, TraceProxy};
use serde_json::Value;

/// A format argument as seen by the formatter.
///
/// Faults with a stack trace are swapped for a [`TraceProxy`]; everything
/// else is formatted directly.
pub enum Operand<'a> {
    Value(&'a Value),
    Trace(TraceProxy<'a>),
    Fault(&'a dyn Fault),
}

impl<'a> From<&'a Arg> for Operand<'a> {
    fn from(arg: &'a Arg) -> Self {
        match arg {
            Arg::Value(value) => Operand::Value(value),
            Arg::Error(fault) => match TraceProxy::new(fault.as_ref()) {
                Some(proxy) => Operand::Trace(proxy),
                None => Operand::Fault(fault.as_ref()),
            },
        }
    }
}

impl Operand<'_> {
    fn text(&self) -> String {
        match self {
            Operand::Value(Value::String(s)) => s.clone(),
            Operand::Value(value) => inspect_value(value),
            Operand::Trace(proxy) => proxy.to_string(),
            Operand::Fault(fault) => fault.description(),
        }
    }

    fn inspect(&self) -> String {
        match self {
            Operand::Value(value) => inspect_value(value),
            Operand::Trace(proxy) => format!("{:?}", proxy),
            Operand::Fault(fault) => format!("[{}]", fault.description()),
        }
    }

    fn json(&self) -> String {
        match self {
            Operand::Value(value) => value.to_string(),
            _ => self.inspect(),
        }
    }

    /// `%d`: numeric conversion of the whole value.
    fn decimal(&self) -> String {
        match self {
            Operand::Value(Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
            Operand::Value(Value::Number(n)) => float_text(n.as_f64().unwrap_or(f64::NAN)),
            Operand::Value(Value::String(s)) => float_text(to_number(s)),
            Operand::Value(Value::Bool(b)) => u8::from(*b).to_string(),
            Operand::Value(Value::Null) => "0".to_string(),
            _ => float_text(f64::NAN),
        }
    }

    /// `%i`: leading integer prefix of the text.
    fn integer(&self) -> String {
        match self {
            Operand::Value(Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
            Operand::Value(Value::Number(n)) => float_text(n.as_f64().unwrap_or(f64::NAN).trunc()),
            Operand::Value(Value::String(s)) => float_text(parse_int(s)),
            _ => float_text(f64::NAN),
        }
    }

    /// `%f`: leading floating-point prefix of the text.
    fn float(&self) -> String {
        match self {
            Operand::Value(Value::Number(n)) => number_text(n),
            Operand::Value(Value::String(s)) => float_text(parse_float(s)),
            _ => float_text(f64::NAN),
        }
    }

    /// Rendering of a leftover argument: strings raw, anything else inspected.
    fn trailing(&self) -> String {
        match self {
            Operand::Value(Value::String(s)) => s.clone(),
            _ => self.inspect(),
        }
    }

    fn render(&self, verb: char) -> String {
        match verb {
            's' => self.text(),
            'd' => self.decimal(),
            'i' => self.integer(),
            'f' => self.float(),
            'j' => self.json(),
            _ => self.inspect(),
        }
    }
}

fn inspect_value(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(inspect_value).collect();
            format!("[ {} ]", items.join(", "))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| {
                    let key = if is_identifier(key) { key.clone() } else { quote(key) };
                    format!("{}: {}", key, inspect_value(value))
                })
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
    }
}

/// Single quotes unless the text contains them; then double quotes, then
/// backticks, and escaped single quotes as the last resort.
fn quote(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else if !s.contains('`') {
        format!("`{}`", s)
    } else {
        format!("'{}'", s.replace('\'', "\\'"))
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn split_sign(s: &str) -> (f64, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (-1.0, rest)
    } else {
        (1.0, s.strip_prefix('+').unwrap_or(s))
    }
}

fn radix_value(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

fn leading_digits(bytes: &[u8], from: usize) -> usize {
    bytes
        .get(from..)
        .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
}

/// Whole-text numeric conversion: blank is zero, `0x`/`0o`/`0b` prefixes
/// select a radix, anything unparsable is NaN.
fn to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(rest) = t.strip_prefix(prefix) {
            return radix_value(rest, radix).unwrap_or(f64::NAN);
        }
    }
    let (sign, body) = split_sign(t);
    if body == "Infinity" {
        return sign * f64::INFINITY;
    }
    // Rust also accepts `inf` and `nan`, which are not numbers here
    if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return f64::NAN;
    }
    t.parse().unwrap_or(f64::NAN)
}

/// Integer prefix, decimal or `0x` hexadecimal. No digits is NaN.
fn parse_int(s: &str) -> f64 {
    let (sign, body) = split_sign(s.trim_start());
    let (body, radix) = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(rest) => (rest, 16),
        None => (body, 10),
    };
    let end = body.find(|c: char| !c.is_digit(radix)).unwrap_or(body.len());
    radix_value(&body[..end], radix).map_or(f64::NAN, |value| sign * value)
}

/// Longest decimal floating-point prefix. No digits is NaN.
fn parse_float(s: &str) -> f64 {
    let (sign, body) = split_sign(s.trim_start());
    if body.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    let bytes = body.as_bytes();
    let int_digits = leading_digits(bytes, 0);
    let mut end = int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = leading_digits(bytes, end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return f64::NAN;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = leading_digits(bytes, exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    body[..end].parse::<f64>().map_or(f64::NAN, |value| sign * value)
}

fn number_text(n: &serde_json::Number) -> String {
    if n.is_f64() {
        float_text(n.as_f64().unwrap_or(f64::NAN))
    } else {
        n.to_string()
    }
}

fn float_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        value.to_string()
    }
}

fn is_verb(c: char) -> bool {
    matches!(c, 's' | 'd' | 'i' | 'f' | 'j' | 'o' | 'O')
}

/// Interpolate `operands` into `template`.
///
/// With no operands at all the template is returned verbatim, `%%`
/// included.
pub fn format(template: &str, operands: &[Operand<'_>]) -> String {
    if operands.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len() + 16 * operands.len());
    let mut next = 0;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(verb) if is_verb(verb) => {
                chars.next();
                match operands.get(next) {
                    Some(operand) => {
                        out.push_str(&operand.render(verb));
                        next += 1;
                    }
                    None => {
                        out.push('%');
                        out.push(verb);
                    }
                }
            }
            // unknown verb or trailing '%'
            _ => out.push('%'),
        }
    }

    for operand in &operands[next..] {
        out.push(' ');
        out.push_str(&operand.trailing());
    }

    out
}

/// Format `template` with `args`, substituting trace proxies for faults.
pub fn interpolate(template: &str, args: &[Arg]) -> String {
    let operands: Vec<Operand<'_>> = args.iter().map(Operand::from).collect();
    format(template, &operands)
}

/// Structured rendering of a single argument, as `%o` would produce it.
pub fn inspect(arg: &Arg) -> String {
    Operand::from(arg).inspect()
}
