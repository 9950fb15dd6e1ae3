//! Conversion of template values to text

use serde_json::Value;

use crate::parser::ast::{Align, Conversion, FormatSpec, FormatType, Sign};

/// Display form of a value: strings verbatim, containers with quoted strings
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => repr(other),
    }
}

/// Quoted form of a value
pub fn repr(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{:?}", s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(repr).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let items: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{:?}: {}", k, repr(v)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
    }
}

/// Like [`repr`] with every non-ASCII character escaped
pub fn ascii(value: &Value) -> String {
    let mut out = String::new();
    for c in repr(value).chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let code = c as u32;
            if code <= 0xff {
                out.push_str(&format!("\\x{:02x}", code));
            } else if code <= 0xffff {
                out.push_str(&format!("\\u{:04x}", code));
            } else {
                out.push_str(&format!("\\U{:08x}", code));
            }
        }
    }
    out
}

pub fn convert(value: &Value, conversion: Conversion) -> Value {
    Value::String(match conversion {
        Conversion::Str => display(value),
        Conversion::Repr => repr(value),
        Conversion::Ascii => ascii(value),
    })
}

/// Apply a format spec to a value. Errors carry a human-readable reason.
pub fn apply_spec(value: &Value, spec: &FormatSpec) -> Result<String, String> {
    if spec.is_empty() {
        return Ok(display(value));
    }
    match value {
        Value::String(s) => format_str(s, spec),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                format_int(i128::from(i), spec)
            } else if let Some(u) = n.as_u64() {
                format_int(i128::from(u), spec)
            } else {
                format_float(n.as_f64().unwrap_or(f64::NAN), spec)
            }
        }
        Value::Bool(b) => format_str(&b.to_string(), spec),
        other => Err(format!(
            "format spec is not supported for {}",
            kind_name(other)
        )),
    }
}

pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn format_str(s: &str, spec: &FormatSpec) -> Result<String, String> {
    if !matches!(spec.format_type, None | Some(FormatType::Str)) {
        return Err("unknown format code for a string".to_string());
    }
    if spec.sign.is_some() {
        return Err("sign not allowed in string format specifier".to_string());
    }
    if spec.alternate {
        return Err("alternate form (#) not allowed in string format specifier".to_string());
    }
    if spec.align == Some(Align::AfterSign) {
        return Err("'=' alignment not allowed in string format specifier".to_string());
    }

    let body: String = match spec.precision {
        Some(precision) => s.chars().take(precision).collect(),
        None => s.to_string(),
    };
    let fill = spec.fill.unwrap_or(if spec.zero { '0' } else { ' ' });
    Ok(pad("", &body, spec.width, fill, spec.align.unwrap_or(Align::Left)))
}

fn format_int(i: i128, spec: &FormatSpec) -> Result<String, String> {
    let digits = match spec.format_type {
        None | Some(FormatType::Decimal) => {
            if spec.precision.is_some() {
                return Err("precision not allowed in integer format specifier".to_string());
            }
            i.unsigned_abs().to_string()
        }
        Some(FormatType::HexLower) => format!("{:x}", i.unsigned_abs()),
        Some(FormatType::HexUpper) => format!("{:X}", i.unsigned_abs()),
        Some(FormatType::Octal) => format!("{:o}", i.unsigned_abs()),
        Some(FormatType::Binary) => format!("{:b}", i.unsigned_abs()),
        Some(FormatType::Fixed | FormatType::FixedUpper | FormatType::Percent) => {
            return format_float(i as f64, spec)
        }
        Some(FormatType::Str) => {
            return Err("unknown format code 's' for a number".to_string());
        }
    };

    let prefix = match (spec.alternate, spec.format_type) {
        (true, Some(FormatType::HexLower)) => "0x",
        (true, Some(FormatType::HexUpper)) => "0X",
        (true, Some(FormatType::Octal)) => "0o",
        (true, Some(FormatType::Binary)) => "0b",
        _ => "",
    };
    let sign = sign_str(i < 0, spec.sign);
    Ok(pad_number(&format!("{}{}", sign, prefix), &digits, spec))
}

fn format_float(f: f64, spec: &FormatSpec) -> Result<String, String> {
    let precision = spec.precision.unwrap_or(6);
    let (scaled, suffix) = match spec.format_type {
        Some(FormatType::Percent) => (f * 100.0, "%"),
        None | Some(FormatType::Fixed | FormatType::FixedUpper) => (f, ""),
        Some(_) => return Err("unknown format code for a float".to_string()),
    };

    let digits = if scaled.is_nan() {
        "nan".to_string()
    } else if scaled.is_infinite() {
        "inf".to_string()
    } else if spec.format_type.is_none() && spec.precision.is_none() {
        format!("{}", scaled.abs())
    } else {
        format!("{:.*}", precision, scaled.abs())
    };
    let digits = if spec.format_type == Some(FormatType::FixedUpper) {
        digits.to_uppercase()
    } else {
        digits
    };

    let negative = scaled.is_sign_negative() && !scaled.is_nan();
    let sign = sign_str(negative, spec.sign);
    Ok(pad_number(sign, &format!("{}{}", digits, suffix), spec))
}

fn sign_str(negative: bool, sign: Option<Sign>) -> &'static str {
    match (negative, sign) {
        (true, _) => "-",
        (false, Some(Sign::Plus)) => "+",
        (false, Some(Sign::Space)) => " ",
        (false, _) => "",
    }
}

fn pad_number(prefix: &str, digits: &str, spec: &FormatSpec) -> String {
    let (fill, align) = if spec.zero && spec.fill.is_none() && spec.align.is_none() {
        ('0', Align::AfterSign)
    } else {
        (spec.fill.unwrap_or(' '), spec.align.unwrap_or(Align::Right))
    };
    pad(prefix, digits, spec.width, fill, align)
}

fn pad(prefix: &str, body: &str, width: Option<usize>, fill: char, align: Align) -> String {
    let len = prefix.chars().count() + body.chars().count();
    let missing = width.unwrap_or(0).saturating_sub(len);
    let filler = |n: usize| fill.to_string().repeat(n);
    match align {
        Align::Left => format!("{}{}{}", prefix, body, filler(missing)),
        Align::Right => format!("{}{}{}", filler(missing), prefix, body),
        Align::Center => {
            let left = missing / 2;
            format!("{}{}{}{}", filler(left), prefix, body, filler(missing - left))
        }
        Align::AfterSign => format!("{}{}{}", prefix, filler(missing), body),
    }
}
