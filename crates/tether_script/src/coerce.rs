//! Value conversion between host and script
//!
//! Host sequences and mappings cross as their live proxies, host functions
//! as their unique wrapper, and proxies or wrappers coming back resolve to
//! the original host handle. Script-native arrays are copied, script plain
//! objects stay live as [`ScriptObject`] references.

use crate::error::{Error, Result, Translate};
use crate::function::{self, Callback, ScriptFunction};
use crate::proxy;
use crate::realm::{Handle, Realm};
use crate::value::{ErrorValue, HostSequence, ScriptObject, Value};
use chrono::{DateTime, Utc};
use tether_core::number;

/// Nesting limit when copying script arrays into the host.
const MAX_DEPTH: usize = 512;

pub(crate) fn to_js<'js>(realm: &Realm<'js>, value: &Value) -> Result<rquickjs::Value<'js>> {
    let ctx = realm.ctx().clone();
    Ok(match value {
        Value::Undefined => rquickjs::Value::new_undefined(ctx),
        Value::Null => rquickjs::Value::new_null(ctx),
        Value::Boolean(b) => rquickjs::Value::new_bool(ctx, *b),
        Value::Number(n) => rquickjs::Value::new_number(ctx, *n),
        Value::String(s) => rquickjs::String::from_str(ctx, s).translate(realm)?.into_value(),
        Value::Array(seq) => proxy::array_proxy(realm, seq)?.into_value(),
        Value::Plain(object) => proxy::object_proxy(realm, object)?.into_value(),
        Value::Function(Callback::Host(host)) => function::host_wrapper(realm, host)?.into_value(),
        Value::Function(Callback::Script(script)) => script.restore(realm)?.into_value(),
        Value::Date(date) => realm.helper("makeDate", (date.timestamp_millis() as f64,))?,
        Value::Error(err) => realm.helper(
            "makeError",
            (err.name.as_str(), err.message.as_str(), err.stack.as_deref(), None::<f64>),
        )?,
        Value::Object(object) => object.restore(realm)?.into_value(),
    })
}

pub(crate) fn from_js<'js>(realm: &Realm<'js>, value: rquickjs::Value<'js>) -> Result<Value> {
    convert(realm, value, 0)
}

fn convert<'js>(realm: &Realm<'js>, value: rquickjs::Value<'js>, depth: usize) -> Result<Value> {
    if value.is_undefined() {
        return Ok(Value::Undefined);
    }
    if value.is_null() {
        return Ok(Value::Null);
    }
    if let Some(b) = value.as_bool() {
        return Ok(Value::Boolean(b));
    }
    if let Some(n) = value.as_number() {
        return Ok(Value::Number(n));
    }
    if let Some(s) = value.as_string() {
        return Ok(Value::String(s.to_string().translate(realm)?));
    }
    if value.is_function() || value.is_object() {
        return convert_object(realm, value, depth);
    }
    Err(Error::conversion(
        "TypeError",
        format!("cannot convert a {:?} value to a host value", value.type_of()),
    ))
}

fn convert_object<'js>(realm: &Realm<'js>, value: rquickjs::Value<'js>, depth: usize) -> Result<Value> {
    let id: f64 = realm.helper("identify", (value.clone(),))?;
    if id >= 0.0 {
        match realm.shared().resolve(id as u64) {
            Some(Handle::Sequence(seq)) => return Ok(Value::Array(seq)),
            Some(Handle::Object(object)) => return Ok(Value::Plain(object)),
            Some(Handle::Function(host)) => return Ok(Value::Function(Callback::Host(host))),
            None => tracing::warn!(id, "proxy outlived its host handle"),
        }
    }

    if let Some(function) = value.clone().into_function() {
        return Ok(Value::Function(Callback::Script(ScriptFunction::capture(realm, function)?)));
    }

    let kind: String = realm.helper("kindOf", (value.clone(),))?;
    match kind.as_str() {
        "array" => copy_array(realm, value, depth),
        "date" => {
            let millis: f64 = realm.helper("dateValue", (value,))?;
            if !millis.is_finite() {
                return Err(Error::conversion("RangeError", "invalid Date cannot cross into the host"));
            }
            DateTime::<Utc>::from_timestamp_millis(millis as i64)
                .map(Value::Date)
                .ok_or_else(|| Error::conversion("RangeError", format!("date out of range: {millis}")))
        }
        "error" => {
            let object = value
                .into_object()
                .ok_or_else(|| Error::conversion("TypeError", "expected an error object"))?;
            let name: Option<String> = object.get("name").translate(realm)?;
            let message: Option<String> = object.get("message").translate(realm)?;
            let stack: Option<String> = object.get("stack").translate(realm)?;
            Ok(Value::Error(ErrorValue {
                name: name.unwrap_or_else(|| "Error".to_string()),
                message: message.unwrap_or_default(),
                stack,
            }))
        }
        _ => {
            let object = value
                .into_object()
                .ok_or_else(|| Error::conversion("TypeError", "expected an object"))?;
            Ok(Value::Object(ScriptObject::capture(realm, object)?))
        }
    }
}

fn copy_array<'js>(realm: &Realm<'js>, value: rquickjs::Value<'js>, depth: usize) -> Result<Value> {
    if depth >= MAX_DEPTH {
        return Err(Error::conversion("RangeError", "array nesting too deep to cross into the host"));
    }
    let object = value
        .into_object()
        .ok_or_else(|| Error::conversion("TypeError", "expected an array"))?;
    let len: f64 = object.get("length").translate(realm)?;
    let len = number::array_length(len)
        .filter(|&len| len <= realm.max_array_length())
        .ok_or_else(Error::invalid_array_length)?;
    // `length` is script-controlled; grow as elements are read
    let mut items = Vec::new();
    for index in 0..len {
        let item: rquickjs::Value<'js> = object.get(index as u32).translate(realm)?;
        items.push(convert(realm, item, depth + 1)?);
    }
    Ok(Value::Array(HostSequence::from(items)))
}
