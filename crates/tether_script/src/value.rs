//! Host-side values crossing the script boundary
//!
//! [`Value`] is a closed tagged variant. Composite kinds are reference types:
//! cloning a [`HostSequence`] or [`PlainObject`] clones the handle, never the
//! storage, so both sides of the boundary observe the same mutations.

use crate::error::{Error, Result};
use crate::function::Callback;
use crate::realm::{Realm, ScriptRoot};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rquickjs::{Object, Persistent};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use tether_core::number;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique identity for a host-owned handle.
pub(crate) fn next_handle_id() -> u64 {
    NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A value owned by the host, or a live reference into the script heap.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Host-owned sequence; appears to scripts as a live Array proxy.
    ///
    /// A script-native array converted into the host becomes a new sequence
    /// holding a copy of its elements: later changes to the script array are
    /// not seen here, and changes here are not seen by it. Only proxies of
    /// host sequences stay live in both directions.
    Array(HostSequence),
    /// Host-owned mapping; appears to scripts as a live object proxy.
    Plain(PlainObject),
    Function(Callback),
    Date(DateTime<Utc>),
    Error(ErrorValue),
    /// Script-owned object held by reference.
    Object(ScriptObject),
}

impl Value {
    /// Name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Plain(_) => "plain object",
            Value::Function(_) => "function",
            Value::Date(_) => "date",
            Value::Error(_) => "error",
            Value::Object(_) => "object",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&HostSequence> {
        match self {
            Value::Array(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_plain(&self) -> Option<&PlainObject> {
        match self {
            Value::Plain(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Callback> {
        match self {
            Value::Function(cb) => Some(cb),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ScriptObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// ToBoolean
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// ToNumber
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => number::string_to_number(s),
            Value::Date(date) => date.timestamp_millis() as f64,
            Value::Array(_) => number::string_to_number(&self.to_js_string()),
            _ => f64::NAN,
        }
    }

    /// ToString
    pub fn to_js_string(&self) -> String {
        let mut out = String::new();
        self.write_js_string(&mut out, &mut Vec::new());
        out
    }

    pub(crate) fn write_js_string(&self, out: &mut String, joining: &mut Vec<u64>) {
        match self {
            Value::Undefined => out.push_str("undefined"),
            Value::Null => out.push_str("null"),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&number::number_to_string(*n)),
            Value::String(s) => out.push_str(s),
            Value::Array(seq) => seq.write_joined(",", out, joining),
            Value::Plain(_) | Value::Object(_) => out.push_str("[object Object]"),
            Value::Function(cb) => {
                out.push_str(&format!("function {}() {{\n    [native code]\n}}", cb.name()))
            }
            Value::Date(date) => out.push_str(
                &date
                    .format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
                    .to_string(),
            ),
            Value::Error(err) => out.push_str(&err.to_string()),
        }
    }

    /// `===`
    ///
    /// Dates and errors cross the boundary by value, so two of them are never
    /// the same script object.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Plain(a), Value::Plain(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.same(b),
            (Value::Object(a), Value::Object(b)) => a.id() == b.id(),
            _ => false,
        }
    }

    /// SameValueZero, the relation used by `includes`.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => number::same_value_zero(*a, *b),
            _ => self.strict_equals(other),
        }
    }

    /// Convert a JSON document into host values.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let object = PlainObject::new();
                for (key, value) in map {
                    object.set(key, Value::from_json(value));
                }
                Value::Plain(object)
            }
        }
    }

    /// Convert into JSON, following `JSON.stringify` rules.
    ///
    /// Returns `None` for values without a JSON form (undefined, functions,
    /// script-owned objects).
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as Json;
        Some(match self {
            Value::Undefined | Value::Function(_) | Value::Object(_) => return None,
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                Json::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n).map(Json::Number).unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(seq) => Json::Array(
                seq.to_vec().iter().map(|v| v.to_json().unwrap_or(Json::Null)).collect(),
            ),
            Value::Plain(object) => Json::Object(
                object
                    .entries()
                    .into_iter()
                    .filter_map(|(k, v)| v.to_json().map(|json| (k, json)))
                    .collect(),
            ),
            Value::Date(date) => Json::String(date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            Value::Error(_) => Json::Object(Default::default()),
        })
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

/// Structural equality for host-side comparisons.
///
/// Sequences and mappings compare by contents; functions and script objects
/// compare by identity. Use [`Value::strict_equals`] for script `===`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b) || *a.borrow() == *b.borrow(),
            (Value::Plain(a), Value::Plain(b)) => a.ptr_eq(b) || *a.borrow() == *b.borrow(),
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&number::number_to_string(*n)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(seq) => seq.fmt(f),
            Value::Plain(obj) => obj.fmt(f),
            Value::Function(cb) => cb.fmt(f),
            Value::Date(date) => write!(f, "Date({})", date.to_rfc3339()),
            Value::Error(err) => err.fmt(f),
            Value::Object(obj) => obj.fmt(f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<HostSequence> for Value {
    fn from(value: HostSequence) -> Self {
        Value::Array(value)
    }
}

impl From<PlainObject> for Value {
    fn from(value: PlainObject) -> Self {
        Value::Plain(value)
    }
}

impl From<Callback> for Value {
    fn from(value: Callback) -> Self {
        Value::Function(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(HostSequence::from(items))
    }
}

fn mismatch(expected: &str, found: &Value) -> Error {
    Error::conversion("TypeError", format!("expected {expected}, found {}", found.type_name()))
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_number().ok_or_else(|| mismatch("number", &value))
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl TryFrom<Value> for HostSequence {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Array(seq) => Ok(seq),
            other => Err(mismatch("array", &other)),
        }
    }
}

impl TryFrom<Value> for PlainObject {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Plain(obj) => Ok(obj),
            other => Err(mismatch("plain object", &other)),
        }
    }
}

impl TryFrom<Value> for Callback {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Function(cb) => Ok(cb),
            other => Err(mismatch("function", &other)),
        }
    }
}

// ============================================================================
// HOST SEQUENCE
// ============================================================================

/// Grow `items` to `len` slots filled with `undefined`.
pub(crate) fn pad(items: &mut Vec<Value>, len: usize) -> Result<()> {
    if len > MAX_SEQUENCE_LENGTH {
        return Err(Error::invalid_array_length());
    }
    if let Some(extra) = len.checked_sub(items.len()).filter(|&n| n > 0) {
        items.try_reserve_exact(extra).map_err(|_| Error::invalid_array_length())?;
        items.resize(len, Value::Undefined);
    }
    Ok(())
}

/// Array lengths are uint32 values below 2^32.
const MAX_SEQUENCE_LENGTH: usize = u32::MAX as usize;

struct SequenceCell {
    id: u64,
    items: RefCell<Vec<Value>>,
}

/// A host-owned, mutable, ordered collection.
///
/// Clones share storage. Exposed to scripts through exactly one Array proxy
/// per sequence identity.
#[derive(Clone)]
pub struct HostSequence(Rc<SequenceCell>);

impl HostSequence {
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Identity used by the proxy registry.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.borrow().get(index).cloned()
    }

    /// Write slot `index`, padding with `undefined` when it lies past the end.
    ///
    /// Fails with a `RangeError` instead of aborting when the padding cannot
    /// be allocated.
    pub fn set(&self, index: usize, value: Value) -> Result<()> {
        let mut items = self.0.items.borrow_mut();
        if index < items.len() {
            items[index] = value;
            return Ok(());
        }
        let len = index.checked_add(1).ok_or_else(Error::invalid_array_length)?;
        pad(&mut items, len)?;
        items[index] = value;
        Ok(())
    }

    /// Append one element and return the new length.
    pub fn push(&self, value: Value) -> usize {
        let mut items = self.0.items.borrow_mut();
        items.push(value);
        items.len()
    }

    /// Snapshot of the current elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &HostSequence) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the backing storage. Do not hold across script calls.
    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.items.borrow()
    }

    /// Mutably borrow the backing storage. Do not hold across script calls.
    pub fn borrow_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.0.items.borrow_mut()
    }

    pub(crate) fn downgrade(&self) -> WeakSequence {
        WeakSequence(Rc::downgrade(&self.0))
    }

    /// Join with `separator`, treating a cycle back into a sequence that is
    /// already being joined as the empty string.
    pub(crate) fn write_joined(&self, separator: &str, out: &mut String, joining: &mut Vec<u64>) {
        if joining.contains(&self.id()) {
            return;
        }
        joining.push(self.id());
        for (index, item) in self.to_vec().iter().enumerate() {
            if index > 0 {
                out.push_str(separator);
            }
            if !item.is_nullish() {
                item.write_js_string(out, joining);
            }
        }
        joining.pop();
    }
}

impl Default for HostSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Value>> for HostSequence {
    fn from(items: Vec<Value>) -> Self {
        HostSequence(Rc::new(SequenceCell { id: next_handle_id(), items: RefCell::new(items) }))
    }
}

impl FromIterator<Value> for HostSequence {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl fmt::Debug for HostSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.items.try_borrow() {
            Ok(items) => f.debug_list().entries(items.iter()).finish(),
            Err(_) => write!(f, "HostSequence#{}(<borrowed>)", self.id()),
        }
    }
}

pub(crate) struct WeakSequence(Weak<SequenceCell>);

impl WeakSequence {
    pub(crate) fn upgrade(&self) -> Option<HostSequence> {
        self.0.upgrade().map(HostSequence)
    }
}

// ============================================================================
// PLAIN OBJECT
// ============================================================================

struct ObjectCell {
    id: u64,
    entries: RefCell<IndexMap<String, Value>>,
}

/// A host-owned mapping with insertion-ordered string keys.
#[derive(Clone)]
pub struct PlainObject(Rc<ObjectCell>);

impl PlainObject {
    pub fn new() -> Self {
        PlainObject(Rc::new(ObjectCell { id: next_handle_id(), entries: RefCell::new(IndexMap::new()) }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.entries.borrow().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.0.entries.borrow_mut().insert(key.into(), value);
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.entries.borrow_mut().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.entries.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.entries.borrow().keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0.entries.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.0.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ptr_eq(&self, other: &PlainObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn borrow(&self) -> Ref<'_, IndexMap<String, Value>> {
        self.0.entries.borrow()
    }

    pub(crate) fn downgrade(&self) -> WeakPlainObject {
        WeakPlainObject(Rc::downgrade(&self.0))
    }
}

impl Default for PlainObject {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for PlainObject {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let object = PlainObject::new();
        for (key, value) in iter {
            object.set(key, value);
        }
        object
    }
}

impl fmt::Debug for PlainObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.entries.try_borrow() {
            Ok(entries) => f.debug_map().entries(entries.iter()).finish(),
            Err(_) => write!(f, "PlainObject#{}(<borrowed>)", self.id()),
        }
    }
}

pub(crate) struct WeakPlainObject(Weak<ObjectCell>);

impl WeakPlainObject {
    pub(crate) fn upgrade(&self) -> Option<PlainObject> {
        self.0.upgrade().map(PlainObject)
    }
}

// ============================================================================
// SCRIPT OBJECT
// ============================================================================

struct ScriptRef {
    id: u64,
    object: RefCell<Option<Persistent<Object<'static>>>>,
}

impl ScriptRoot for ScriptRef {
    fn release(&self) {
        self.object.borrow_mut().take();
    }
}

/// A script-owned object held by the host.
///
/// Converting it back into the script yields the very same object. When the
/// [`ScriptRuntime`](crate::ScriptRuntime) it came from is dropped the
/// reference is released; the handle keeps its identity but can no longer
/// be restored.
#[derive(Clone)]
pub struct ScriptObject(Rc<ScriptRef>);

impl ScriptObject {
    pub(crate) fn capture<'js>(realm: &Realm<'js>, object: Object<'js>) -> Result<Self> {
        let id: f64 = realm.helper("scriptId", (object.clone(),))?;
        let object = Persistent::save(realm.ctx(), object);
        let inner = Rc::new(ScriptRef { id: id as u64, object: RefCell::new(Some(object)) });
        let root: Weak<dyn ScriptRoot> = Rc::downgrade(&inner) as Weak<_>;
        realm.shared().root(root);
        Ok(ScriptObject(inner))
    }

    /// Script-side identity; equal ids mean the same script object.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub(crate) fn restore<'js>(&self, realm: &Realm<'js>) -> Result<Object<'js>> {
        use crate::error::Translate;
        let object = self.0.object.borrow().clone().ok_or_else(|| Error::released("script object"))?;
        object.restore(realm.ctx()).translate(realm)
    }
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptObject#{}", self.id())
    }
}

// ============================================================================
// ERROR VALUE
// ============================================================================

/// A script `Error` object carried by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorValue {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), message: message.into(), stack: None }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> HostSequence {
        values.iter().copied().map(Value::from).collect()
    }

    #[test]
    fn test_clones_share_storage() {
        let seq = numbers(&[1.0, 2.0]);
        let alias = seq.clone();
        alias.push(Value::from(3));
        assert_eq!(seq.len(), 3);
        assert!(seq.ptr_eq(&alias));
        assert_eq!(seq.id(), alias.id());
    }

    #[test]
    fn test_set_pads_with_undefined() {
        let seq = HostSequence::new();
        seq.set(2, Value::from("x")).unwrap();
        assert_eq!(seq.to_vec(), vec![Value::Undefined, Value::Undefined, Value::from("x")]);
    }

    #[test]
    fn test_set_rejects_lengths_past_uint32() {
        let seq = HostSequence::from(vec![Value::from(1)]);
        let err = seq.set(u32::MAX as usize, Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "RangeError: invalid array length");
        assert!(seq.set(usize::MAX, Value::Null).is_err());
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_to_js_string_joins_nested_arrays() {
        let nested = Value::from(vec![Value::from(1), Value::from(vec![Value::from(2), Value::from(3)]), Value::Null]);
        assert_eq!(nested.to_js_string(), "1,2,3,");
        assert_eq!(Value::from(1.5).to_js_string(), "1.5");
        assert_eq!(Value::Boolean(false).to_js_string(), "false");
    }

    #[test]
    fn test_cyclic_join_is_empty() {
        let seq = numbers(&[1.0]);
        seq.push(Value::Array(seq.clone()));
        assert_eq!(Value::Array(seq.clone()).to_js_string(), "1,");
        // break the cycle so the Rc can drop
        seq.borrow_mut().clear();
    }

    #[test]
    fn test_equality_relations() {
        let nan = Value::from(f64::NAN);
        assert!(!nan.strict_equals(&nan));
        assert!(nan.same_value_zero(&nan));
        assert!(Value::from(0.0).same_value_zero(&Value::from(-0.0)));

        let a = numbers(&[1.0]);
        let b = numbers(&[1.0]);
        assert!(!Value::Array(a.clone()).strict_equals(&Value::Array(b.clone())));
        assert_eq!(Value::Array(a), Value::Array(b));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::from("  42 ").to_number(), 42.0);
        assert_eq!(Value::Null.to_number(), 0.0);
        assert!(Value::Undefined.to_number().is_nan());
        assert_eq!(Value::Boolean(true).to_number(), 1.0);
        assert_eq!(Value::from(vec![Value::from(7)]).to_number(), 7.0);
    }

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::json!({"a": 1, "b": [true, null, "x"], "c": {"d": 2.5}});
        let value = Value::from_json(json.clone());
        let object = value.as_plain().unwrap();
        assert_eq!(object.keys(), vec!["a", "b", "c"]);
        assert_eq!(value.to_json(), Some(json));
    }

    #[test]
    fn test_try_from_reports_kind() {
        let err = f64::try_from(Value::from("x")).unwrap_err();
        assert!(err.to_string().contains("expected number, found string"));
        assert!(HostSequence::try_from(Value::from(vec![])).is_ok());
    }

    #[test]
    fn test_plain_object_remove_keeps_order() {
        let object: PlainObject =
            [("a", Value::from(1)), ("b", Value::from(2)), ("c", Value::from(3))].into_iter().collect();
        assert_eq!(object.remove("b"), Some(Value::from(2)));
        assert_eq!(object.keys(), vec!["a", "c"]);
    }
}
