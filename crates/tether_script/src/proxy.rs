//! Script-side proxies for host collections
//!
//! Each host sequence or mapping is represented in the script by exactly one
//! `Proxy`, created on first conversion and found again through the weak
//! registry kept by the bridge intrinsics. The proxy traps call back into
//! the host through a single dispatch function per handle.

use crate::array::{ArrayProxy, Outcome};
use crate::error::{self, Error, Result, Translate};
use crate::iter;
use crate::realm::{HandleRef, Realm};
use crate::value::{HostSequence, PlainObject, ScriptObject, Value};
use rquickjs::function::Rest;
use rquickjs::{Array, Ctx, Function, Object};
use std::fmt;
use tether_core::number;

/// Script value registered under `id`, if it is still alive.
pub(crate) fn lookup<'js>(realm: &Realm<'js>, id: u64) -> Result<Option<rquickjs::Value<'js>>> {
    let found: rquickjs::Value<'js> = realm.helper("lookup", (id as f64,))?;
    Ok((!found.is_undefined()).then_some(found))
}

/// A host sequence paired with its script proxy.
///
/// Two handles are equal when they refer to the same script object.
#[derive(Clone)]
pub struct ScriptArrayHandle {
    sequence: HostSequence,
    object: ScriptObject,
}

impl ScriptArrayHandle {
    pub(crate) fn new(sequence: HostSequence, object: ScriptObject) -> Self {
        Self { sequence, object }
    }

    pub fn sequence(&self) -> &HostSequence {
        &self.sequence
    }

    pub fn object(&self) -> &ScriptObject {
        &self.object
    }

    /// The proxy as a value that can be handed back to the script.
    pub fn to_value(&self) -> Value {
        Value::Array(self.sequence.clone())
    }
}

impl PartialEq for ScriptArrayHandle {
    fn eq(&self, other: &Self) -> bool {
        self.object.id() == other.object.id()
    }
}

impl fmt::Debug for ScriptArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptArrayHandle")
            .field("sequence", &self.sequence.id())
            .field("object", &self.object.id())
            .finish()
    }
}

// ============================================================================
// ARRAY PROXY
// ============================================================================

/// The unique Array proxy for `sequence`, created on first use.
pub(crate) fn array_proxy<'js>(realm: &Realm<'js>, sequence: &HostSequence) -> Result<Object<'js>> {
    if let Some(existing) = lookup(realm, sequence.id())?.and_then(|v| v.into_object()) {
        return Ok(existing);
    }

    let shared = realm.shared().clone();
    let target = sequence.clone();
    let dispatch = Function::new(
        realm.ctx().clone(),
        move |ctx: Ctx<'js>, op: String, args: Rest<rquickjs::Value<'js>>| {
            let realm = Realm::new(ctx, shared.clone());
            array_trap(&realm, &target, &op, args.0).map_err(|err| error::throw(&realm, err))
        },
    )
    .translate(realm)?;

    let proxy: Object<'js> =
        realm.helper("makeArray", (sequence.id() as f64, dispatch, ArrayProxy::METHODS.to_vec()))?;
    realm.shared().track(sequence.id(), HandleRef::Sequence(sequence.downgrade()));
    tracing::debug!(id = sequence.id(), len = sequence.len(), "created array proxy");
    Ok(proxy)
}

fn array_trap<'js>(
    realm: &Realm<'js>,
    sequence: &HostSequence,
    op: &str,
    args: Vec<rquickjs::Value<'js>>,
) -> Result<rquickjs::Value<'js>> {
    tracing::trace!(id = sequence.id(), op, "array trap");
    let mut args = args.into_iter();
    let undefined = || rquickjs::Value::new_undefined(realm.ctx().clone());

    match op {
        "length" => realm.to_js(&Value::from(sequence.len())),
        "get" => {
            let index = index_arg(args.next());
            realm.to_js(&sequence.get(index).unwrap_or_default())
        }
        "set" => {
            let index = index_arg(args.next());
            let value = realm.from_js(args.next().unwrap_or_else(undefined))?;
            if index >= sequence.len() && index >= realm.max_array_length() {
                return Err(Error::invalid_array_length());
            }
            sequence.set(index, value)?;
            Ok(undefined())
        }
        "delete" => {
            let index = index_arg(args.next());
            if index < sequence.len() {
                sequence.set(index, Value::Undefined)?;
            }
            Ok(undefined())
        }
        "setLength" => {
            let requested = realm.from_js(args.next().unwrap_or_else(undefined))?.to_number();
            let len = number::array_length(requested)
                .filter(|&len| len <= sequence.len() || len <= realm.max_array_length())
                .ok_or_else(Error::invalid_array_length)?;
            sequence.set_length(len)?;
            Ok(undefined())
        }
        "call" => {
            let method = args
                .next()
                .and_then(|v| v.as_string().and_then(|s| s.to_string().ok()))
                .unwrap_or_default();
            let args = args.map(|arg| realm.from_js(arg)).collect::<Result<Vec<_>>>()?;
            match ArrayProxy::new(realm, sequence.clone()).call(&method, &args)? {
                Outcome::Value(value) => realm.to_js(&value),
                Outcome::Cursor(cursor) => iter::cursor_object(realm, cursor),
            }
        }
        other => Err(Error::script("InternalError", format!("unknown array trap: {other}"))),
    }
}

fn index_arg(value: Option<rquickjs::Value<'_>>) -> usize {
    value.and_then(|v| v.as_number()).map(|n| n as usize).unwrap_or(0)
}

// ============================================================================
// OBJECT PROXY
// ============================================================================

/// The unique object proxy for `object`, created on first use.
pub(crate) fn object_proxy<'js>(realm: &Realm<'js>, object: &PlainObject) -> Result<Object<'js>> {
    if let Some(existing) = lookup(realm, object.id())?.and_then(|v| v.into_object()) {
        return Ok(existing);
    }

    let shared = realm.shared().clone();
    let target = object.clone();
    let dispatch = Function::new(
        realm.ctx().clone(),
        move |ctx: Ctx<'js>, op: String, args: Rest<rquickjs::Value<'js>>| {
            let realm = Realm::new(ctx, shared.clone());
            object_trap(&realm, &target, &op, args.0).map_err(|err| error::throw(&realm, err))
        },
    )
    .translate(realm)?;

    let proxy: Object<'js> = realm.helper("makeObject", (object.id() as f64, dispatch))?;
    realm.shared().track(object.id(), HandleRef::Object(object.downgrade()));
    tracing::debug!(id = object.id(), keys = object.len(), "created object proxy");
    Ok(proxy)
}

fn object_trap<'js>(
    realm: &Realm<'js>,
    object: &PlainObject,
    op: &str,
    args: Vec<rquickjs::Value<'js>>,
) -> Result<rquickjs::Value<'js>> {
    let mut args = args.into_iter();
    let key = args
        .next()
        .and_then(|v| v.as_string().and_then(|s| s.to_string().ok()))
        .unwrap_or_default();
    let ctx = realm.ctx().clone();

    match op {
        "has" => Ok(rquickjs::Value::new_bool(ctx, object.contains_key(&key))),
        "get" => realm.to_js(&object.get(&key).unwrap_or_default()),
        "set" => {
            let value = args.next().unwrap_or_else(|| rquickjs::Value::new_undefined(ctx.clone()));
            object.set(key, realm.from_js(value)?);
            Ok(rquickjs::Value::new_undefined(ctx))
        }
        "delete" => {
            object.remove(&key);
            Ok(rquickjs::Value::new_undefined(ctx))
        }
        "keys" => {
            let keys = Array::new(ctx).translate(realm)?;
            for (index, key) in object.keys().into_iter().enumerate() {
                keys.set(index, key).translate(realm)?;
            }
            Ok(keys.into_value())
        }
        other => Err(Error::script("InternalError", format!("unknown object trap: {other}"))),
    }
}
