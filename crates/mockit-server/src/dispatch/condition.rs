//! Condition evaluation: first substring match over the serialized body.

use crate::config::{Condition, ConditionResponse};
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;
use std::io;

/// A condition that matched, with the response it selects.
#[derive(Debug, Clone, Copy)]
pub struct MatchedCondition<'a> {
    pub index: usize,
    pub condition: &'a Condition,
    pub response: &'a ConditionResponse,
}

/// Render a request body in the form conditions are matched against.
///
/// JSON bodies are re-serialized compactly with their key order kept, so
/// `{ "role" : "admin" }` and `{"role":"admin"}` compare the same. Numbers
/// are written the way JavaScript's `JSON.stringify` writes them (`1.0` as
/// `1`, `1e21` as `1e+21`), which is the text route authors write conditions
/// against. An empty body reads as `{}`. Anything that is not JSON is used
/// as text.
pub fn serialize_body(body: &[u8]) -> String {
    if body.iter().all(u8::is_ascii_whitespace) {
        return "{}".to_string();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value) => to_js_string(&value).unwrap_or_else(|_| value.to_string()),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

fn to_js_string(value: &Value) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    value.serialize(&mut Serializer::with_formatter(&mut out, JsNumberFormatter))?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Compact JSON whose floats follow ECMAScript `Number::toString`.
struct JsNumberFormatter;

impl Formatter for JsNumberFormatter {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(js_number(value).as_bytes())
    }
}

fn js_number(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        // Shortest round-trip digits, no exponent and no trailing `.0`
        return value.to_string();
    }

    let exponent = format!("{value:e}");
    match exponent.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => exponent,
    }
}

/// Find the first condition, in declared order, contained in `body`.
///
/// Blank conditions and conditions without a response are never selected.
pub fn evaluate<'a>(conditions: &'a [Condition], body: &str) -> Option<MatchedCondition<'a>> {
    conditions
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.condition.is_empty())
        .find_map(|(index, condition)| {
            let response = condition.responses.first()?;
            body.contains(condition.condition.as_str())
                .then_some(MatchedCondition {
                    index,
                    condition,
                    response,
                })
        })
}
