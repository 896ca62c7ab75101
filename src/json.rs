// JSON coercion of arbitrary values

use crate::value::{Value, encode_base64};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::hash::BuildHasher;
use std::time::SystemTime;

/// Conversion into a tree that any JSON encoder accepts
///
/// Implementations must never fail: anything that has no JSON shape of its
/// own is rendered as a string.
pub trait ToJsonValue {
    fn to_json_value(&self) -> JsonValue;
}

/// Coerce `object` into a fresh JSON value tree
///
/// Non-finite floats become `null`, timestamps become ISO-8601 UTC strings with
/// millisecond precision, byte sequences become Base64 and map keys are
/// rendered through `Display`. Applying it to its own output is a no-op.
pub fn json_value<T: ToJsonValue + ?Sized>(object: &T) -> JsonValue {
    object.to_json_value()
}

/// ISO-8601 UTC rendering with millisecond precision, e.g. `2024-01-02T03:04:05.006Z`
pub fn iso8601_millis(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn float(f: f64) -> JsonValue {
    Number::from_f64(f).map(JsonValue::Number).unwrap_or(JsonValue::Null)
}

/// Borrowed byte sequence, coerced to Base64
#[derive(Debug, Clone, Copy)]
pub struct Bytes<'a>(pub &'a [u8]);

/// Any `Display` type the coercer has no shape for; coerced to its string form
#[derive(Debug, Clone)]
pub struct Displayed<T>(pub T);

impl ToJsonValue for Value {
    fn to_json_value(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => float(*f),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Bytes(bytes) => JsonValue::String(encode_base64(bytes)),
            Value::Date(date) => JsonValue::String(iso8601_millis(date)),
            Value::Array(items) => items.to_json_value(),
            Value::Map(map) => map.to_json_value(),
        }
    }
}

impl ToJsonValue for JsonValue {
    fn to_json_value(&self) -> JsonValue {
        self.clone()
    }
}

impl ToJsonValue for () {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::Null
    }
}

impl ToJsonValue for bool {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::Bool(*self)
    }
}

macro_rules! integer_to_json {
    ($($t:ty),*) => {
        $(
            impl ToJsonValue for $t {
                fn to_json_value(&self) -> JsonValue {
                    JsonValue::from(*self)
                }
            }
        )*
    };
}

integer_to_json!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ToJsonValue for f32 {
    fn to_json_value(&self) -> JsonValue {
        float(f64::from(*self))
    }
}

impl ToJsonValue for f64 {
    fn to_json_value(&self) -> JsonValue {
        float(*self)
    }
}

impl ToJsonValue for char {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::String(self.to_string())
    }
}

impl ToJsonValue for str {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::String(self.to_string())
    }
}

impl ToJsonValue for String {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::String(self.clone())
    }
}

impl<T: ToJsonValue + ?Sized> ToJsonValue for &T {
    fn to_json_value(&self) -> JsonValue {
        (**self).to_json_value()
    }
}

impl<T: ToJsonValue + ?Sized> ToJsonValue for Box<T> {
    fn to_json_value(&self) -> JsonValue {
        (**self).to_json_value()
    }
}

impl<T: ToJsonValue> ToJsonValue for Option<T> {
    fn to_json_value(&self) -> JsonValue {
        match self {
            Some(v) => v.to_json_value(),
            None => JsonValue::Null,
        }
    }
}

impl<T: ToJsonValue> ToJsonValue for [T] {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::Array(self.iter().map(ToJsonValue::to_json_value).collect())
    }
}

impl<T: ToJsonValue> ToJsonValue for Vec<T> {
    fn to_json_value(&self) -> JsonValue {
        self.as_slice().to_json_value()
    }
}

impl<K: Display, V: ToJsonValue> ToJsonValue for BTreeMap<K, V> {
    fn to_json_value(&self) -> JsonValue {
        object_from(self.iter())
    }
}

impl<K: Display, V: ToJsonValue, S: BuildHasher> ToJsonValue for HashMap<K, V, S> {
    fn to_json_value(&self) -> JsonValue {
        object_from(self.iter())
    }
}

fn object_from<'a, K, V, I>(entries: I) -> JsonValue
where
    K: Display + 'a,
    V: ToJsonValue + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    let map: Map<String, JsonValue> = entries.map(|(k, v)| (k.to_string(), v.to_json_value())).collect();
    JsonValue::Object(map)
}

impl ToJsonValue for DateTime<Utc> {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::String(iso8601_millis(self))
    }
}

impl ToJsonValue for SystemTime {
    fn to_json_value(&self) -> JsonValue {
        DateTime::<Utc>::from(*self).to_json_value()
    }
}

impl ToJsonValue for Bytes<'_> {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::String(encode_base64(self.0))
    }
}

impl<T: Display> ToJsonValue for Displayed<T> {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::String(self.0.to_string())
    }
}
