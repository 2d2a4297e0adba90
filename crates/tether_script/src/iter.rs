//! Iterator protocol in both directions
//!
//! [`Cursor`] walks a host sequence for `entries`/`keys`/`values` and is
//! exposed to scripts as an Array Iterator. [`ScriptIterator`] drives any
//! script iterable from host code.

use crate::error::{self, Result, Translate};
use crate::realm::Realm;
use crate::value::{HostSequence, Value};
use rquickjs::function::This;
use rquickjs::{Ctx, Function, Object};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Keys,
    Values,
    Entries,
}

/// One `{ value, done }` iterator result.
#[derive(Debug, Clone, PartialEq)]
pub struct IterStep {
    pub value: Value,
    pub done: bool,
}

impl IterStep {
    fn done() -> Self {
        Self { value: Value::Undefined, done: true }
    }
}

/// Iteration state over a live host sequence.
///
/// The sequence length is re-read at every step, so elements appended
/// before exhaustion are visited. Once exhausted, a cursor stays exhausted.
pub struct Cursor {
    sequence: HostSequence,
    kind: CursorKind,
    position: usize,
    exhausted: bool,
}

impl Cursor {
    pub fn new(sequence: HostSequence, kind: CursorKind) -> Self {
        Self { sequence, kind, position: 0, exhausted: false }
    }

    pub fn kind(&self) -> CursorKind {
        self.kind
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Produce the next iterator result.
    pub fn advance(&mut self) -> IterStep {
        if self.exhausted {
            return IterStep::done();
        }
        let Some(element) = self.sequence.get(self.position) else {
            self.exhausted = true;
            return IterStep::done();
        };
        let index = self.position;
        self.position += 1;
        let value = match self.kind {
            CursorKind::Keys => Value::from(index),
            CursorKind::Values => element,
            CursorKind::Entries => Value::from(vec![Value::from(index), element]),
        };
        IterStep { value, done: false }
    }
}

impl Iterator for Cursor {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let step = self.advance();
        (!step.done).then_some(step.value)
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("sequence", &self.sequence.id())
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// Expose `cursor` to the script as an Array Iterator object.
pub(crate) fn cursor_object<'js>(realm: &Realm<'js>, cursor: Cursor) -> Result<rquickjs::Value<'js>> {
    let state = Rc::new(RefCell::new(cursor));
    let shared = realm.shared().clone();
    let next = Function::new(realm.ctx().clone(), move |ctx: Ctx<'js>| {
        let realm = Realm::new(ctx, shared.clone());
        let step = state.borrow_mut().advance();
        step_object(&realm, step).map_err(|err| error::throw(&realm, err))
    })
    .translate(realm)?;
    realm.helper("makeIterator", (next,))
}

fn step_object<'js>(realm: &Realm<'js>, step: IterStep) -> Result<Object<'js>> {
    let result = Object::new(realm.ctx().clone()).translate(realm)?;
    result.set("value", realm.to_js(&step.value)?).translate(realm)?;
    result.set("done", step.done).translate(realm)?;
    Ok(result)
}

// ============================================================================
// SCRIPT ITERATORS
// ============================================================================

/// A script iterator driven from the host.
///
/// Yields `Err` once if the script throws, then ends. Dropping it early
/// does not notify the script; call [`ScriptIterator::close`] for that.
pub struct ScriptIterator<'r, 'js> {
    realm: &'r Realm<'js>,
    iterator: Object<'js>,
    next: Function<'js>,
    done: bool,
}

impl<'r, 'js> ScriptIterator<'r, 'js> {
    pub(crate) fn open(realm: &'r Realm<'js>, iterable: &Value) -> Result<Self> {
        let value = realm.to_js(iterable)?;
        let iterator: Object<'js> = realm.helper("getIterator", (value,))?;
        let next: Function<'js> = iterator.get("next").translate(realm)?;
        Ok(Self { realm, iterator, next, done: false })
    }

    /// Stop early, letting the script run its `return()` cleanup.
    pub fn close(mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        self.realm.helper("closeIterator", (self.iterator.clone(),))
    }

    fn step(&self) -> Result<Option<Value>> {
        let result: Object<'js> = self.next.call((This(self.iterator.clone()),)).translate(self.realm)?;
        let done: rquickjs::Value<'js> = result.get("done").translate(self.realm)?;
        if self.realm.from_js(done)?.truthy() {
            return Ok(None);
        }
        let value: rquickjs::Value<'js> = result.get("value").translate(self.realm)?;
        self.realm.from_js(value).map(Some)
    }
}

impl<'r, 'js> Iterator for ScriptIterator<'r, 'js> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_cursor_is_live_and_sticky() {
        let seq: HostSequence = vec![Value::from(1)].into();
        let mut cursor = Cursor::new(seq.clone(), CursorKind::Values);
        assert_eq!(cursor.advance(), IterStep { value: Value::from(1), done: false });
        seq.push(Value::from(2));
        assert_eq!(cursor.advance(), IterStep { value: Value::from(2), done: false });
        assert!(cursor.advance().done);
        seq.push(Value::from(3));
        assert_eq!(cursor.advance(), IterStep { value: Value::Undefined, done: true });
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_keys_and_entries() {
        let seq: HostSequence = vec![Value::from("a"), Value::from("b")].into();
        let keys: Vec<Value> = Cursor::new(seq.clone(), CursorKind::Keys).collect();
        assert_eq!(keys, vec![Value::from(0), Value::from(1)]);

        let entries: Vec<Value> = Cursor::new(seq, CursorKind::Entries).collect();
        assert_eq!(entries[1], Value::from(vec![Value::from(1), Value::from("b")]));
    }

    #[test]
    fn test_cursors_advance_independently() {
        let seq: HostSequence = vec![Value::from(1), Value::from(2)].into();
        let mut first = Cursor::new(seq.clone(), CursorKind::Values);
        let mut second = Cursor::new(seq, CursorKind::Values);
        first.advance();
        assert_eq!(first.position(), 1);
        assert_eq!(second.advance().value, Value::from(1));
    }
}
