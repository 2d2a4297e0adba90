//! Per-call view of a live script context
//!
//! Every host operation that touches the engine runs inside a [`Realm`]: the
//! entered context plus the bridge state shared by every callback created
//! for that context. Callbacks rebuild a `Realm` from the `Ctx` the engine
//! hands them, so the context is never entered twice.

use crate::coerce;
use crate::config::EngineConfig;
use crate::error::{self, Error, Result, Translate};
use crate::function::{Callback, HostFunction, WeakHostFunction};
use crate::iter::ScriptIterator;
use crate::proxy::{self, ScriptArrayHandle};
use crate::value::{HostSequence, PlainObject, ScriptObject, Value, WeakPlainObject, WeakSequence};
use rquickjs::function::IntoArgs;
use rquickjs::{Ctx, FromJs, Function, Object};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Name of the hidden global holding the bridge intrinsics.
pub(crate) const INTRINSICS: &str = "__tether__";

/// Prune dead registry entries after this many insertions.
const PRUNE_INTERVAL: usize = 256;

/// Weak back-reference from a registry id to its host handle.
pub(crate) enum HandleRef {
    Sequence(WeakSequence),
    Object(WeakPlainObject),
    Function(WeakHostFunction),
}

/// A live host handle recovered from the registry.
pub(crate) enum Handle {
    Sequence(HostSequence),
    Object(PlainObject),
    Function(HostFunction),
}

/// A host-held reference into the script heap.
///
/// The engine cannot see these edges, so every root is released while the
/// runtime is still alive; afterwards the host value is inert.
pub(crate) trait ScriptRoot {
    fn release(&self);
}

/// Bridge state shared by every callback of one context.
pub(crate) struct Shared {
    handles: RefCell<HashMap<u64, HandleRef>>,
    inserts: Cell<usize>,
    roots: RefCell<Vec<Weak<dyn ScriptRoot>>>,
    errors: RefCell<HashMap<u64, Error>>,
    next_error: Cell<u64>,
    depth: Cell<usize>,
    default_locale: String,
    max_array_length: usize,
}

impl Shared {
    pub(crate) fn new(config: &EngineConfig) -> Self {
        Self {
            handles: RefCell::new(HashMap::new()),
            inserts: Cell::new(0),
            roots: RefCell::new(Vec::new()),
            errors: RefCell::new(HashMap::new()),
            next_error: Cell::new(1),
            depth: Cell::new(0),
            default_locale: config.default_locale.clone(),
            max_array_length: config.max_array_length,
        }
    }

    /// Remember a script reference so teardown can release it.
    pub(crate) fn root(&self, root: Weak<dyn ScriptRoot>) {
        let mut roots = self.roots.borrow_mut();
        if roots.len() % PRUNE_INTERVAL == PRUNE_INTERVAL - 1 {
            roots.retain(|root| root.strong_count() > 0);
        }
        roots.push(root);
    }

    /// Release every script reference still held by the host; returns how
    /// many were live. Must run inside the context, before it is freed.
    pub(crate) fn release_roots(&self) -> usize {
        let roots = std::mem::take(&mut *self.roots.borrow_mut());
        let live: Vec<_> = roots.iter().filter_map(Weak::upgrade).collect();
        for root in &live {
            root.release();
        }
        self.errors.borrow_mut().clear();
        live.len()
    }

    pub(crate) fn track(&self, id: u64, handle: HandleRef) {
        let mut handles = self.handles.borrow_mut();
        handles.insert(id, handle);

        let inserts = self.inserts.get() + 1;
        if inserts >= PRUNE_INTERVAL {
            let before = handles.len();
            handles.retain(|_, handle| handle.is_alive());
            tracing::trace!(pruned = before - handles.len(), "pruned handle registry");
            self.inserts.set(0);
        } else {
            self.inserts.set(inserts);
        }
    }

    pub(crate) fn resolve(&self, id: u64) -> Option<Handle> {
        match self.handles.borrow().get(&id)? {
            HandleRef::Sequence(weak) => weak.upgrade().map(Handle::Sequence),
            HandleRef::Object(weak) => weak.upgrade().map(Handle::Object),
            HandleRef::Function(weak) => weak.upgrade().map(Handle::Function),
        }
    }

    pub(crate) fn tracked(&self) -> usize {
        self.handles.borrow().len()
    }

    pub(crate) fn stash_error(&self, error: Error) -> u64 {
        let tag = self.next_error.get();
        self.next_error.set(tag + 1);
        self.errors.borrow_mut().insert(tag, error);
        tag
    }

    pub(crate) fn take_error(&self, tag: u64) -> Option<Error> {
        self.errors.borrow_mut().remove(&tag)
    }

    /// Mark entry into the context; the returned guard marks the exit.
    pub(crate) fn enter(self: &Rc<Self>) -> EntryGuard {
        self.depth.set(self.depth.get() + 1);
        EntryGuard(self.clone())
    }
}

impl HandleRef {
    fn is_alive(&self) -> bool {
        match self {
            HandleRef::Sequence(weak) => weak.upgrade().is_some(),
            HandleRef::Object(weak) => weak.upgrade().is_some(),
            HandleRef::Function(weak) => weak.upgrade().is_some(),
        }
    }
}

/// Leaving the outermost entry drops host errors nobody recovered.
pub(crate) struct EntryGuard(Rc<Shared>);

impl Drop for EntryGuard {
    fn drop(&mut self) {
        let depth = self.0.depth.get().saturating_sub(1);
        self.0.depth.set(depth);
        if depth == 0 {
            let mut errors = self.0.errors.borrow_mut();
            if !errors.is_empty() {
                tracing::trace!(count = errors.len(), "discarding caught host errors");
                errors.clear();
            }
        }
    }
}

/// An entered script context.
pub struct Realm<'js> {
    ctx: Ctx<'js>,
    shared: Rc<Shared>,
}

impl<'js> Realm<'js> {
    pub(crate) fn new(ctx: Ctx<'js>, shared: Rc<Shared>) -> Self {
        Self { ctx, shared }
    }

    /// Raw engine context, for code that needs the engine API directly.
    pub fn ctx(&self) -> &Ctx<'js> {
        &self.ctx
    }

    pub(crate) fn shared(&self) -> &Rc<Shared> {
        &self.shared
    }

    /// Locale used when a script passes none.
    pub fn default_locale(&self) -> &str {
        &self.shared.default_locale
    }

    /// Longest sequence a script may ask the host to build.
    pub fn max_array_length(&self) -> usize {
        self.shared.max_array_length
    }

    /// Evaluate `source` and convert the completion value.
    pub fn eval(&self, source: &str) -> Result<Value> {
        let value: rquickjs::Value<'js> = self.ctx.eval(source).translate(self)?;
        self.from_js(value)
    }

    pub fn to_js(&self, value: &Value) -> Result<rquickjs::Value<'js>> {
        coerce::to_js(self, value)
    }

    pub fn from_js(&self, value: rquickjs::Value<'js>) -> Result<Value> {
        coerce::from_js(self, value)
    }

    /// Invoke `callback` with `this` and `args`.
    pub fn call(&self, callback: &Callback, this: &Value, args: &[Value]) -> Result<Value> {
        callback.call(self, this, args)
    }

    /// The unique script proxy for `sequence`.
    pub fn array_proxy(&self, sequence: &HostSequence) -> Result<ScriptArrayHandle> {
        let proxy = proxy::array_proxy(self, sequence)?;
        Ok(ScriptArrayHandle::new(sequence.clone(), ScriptObject::capture(self, proxy)?))
    }

    /// Read `key` from `target` with script semantics.
    pub fn property(&self, target: &Value, key: &str) -> Result<Value> {
        match target {
            Value::Plain(object) => Ok(object.get(key).unwrap_or_default()),
            Value::Array(seq) if key == "length" => Ok(Value::from(seq.len())),
            Value::Array(seq) => Ok(key.parse::<usize>().ok().and_then(|i| seq.get(i)).unwrap_or_default()),
            Value::Object(object) => {
                let object = object.restore(self)?;
                let value: rquickjs::Value<'js> = object.get(key).translate(self)?;
                self.from_js(value)
            }
            _ => Ok(Value::Undefined),
        }
    }

    /// Write `key` on `target`; primitives ignore the write.
    pub fn set_property(&self, target: &Value, key: &str, value: &Value) -> Result<()> {
        match target {
            Value::Plain(object) => object.set(key, value.clone()),
            Value::Array(seq) => match key.parse::<usize>() {
                Ok(index) if index < seq.len() || index < self.max_array_length() => seq.set(index, value.clone())?,
                Ok(_) => return Err(Error::invalid_array_length()),
                Err(_) => return Err(Error::runtime_logic(format!("cannot set {key} on a host array"))),
            },
            Value::Object(object) => {
                let object = object.restore(self)?;
                object.set(key, self.to_js(value)?).translate(self)?;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn global(&self, name: &str) -> Result<Value> {
        let value: rquickjs::Value<'js> = self.ctx.globals().get(name).translate(self)?;
        self.from_js(value)
    }

    pub fn set_global(&self, name: &str, value: &Value) -> Result<()> {
        let value = self.to_js(value)?;
        self.ctx.globals().set(name, value).translate(self)
    }

    /// Open the script iterator of `iterable`.
    pub fn iterate<'r>(&'r self, iterable: &Value) -> Result<ScriptIterator<'r, 'js>> {
        ScriptIterator::open(self, iterable)
    }

    /// Take the pending exception out of the context.
    pub(crate) fn take_exception(&self) -> Error {
        error::from_thrown(self, self.ctx.catch())
    }

    /// Call one of the bridge intrinsics.
    pub(crate) fn helper<A, R>(&self, name: &str, args: A) -> Result<R>
    where
        A: IntoArgs<'js>,
        R: FromJs<'js>,
    {
        let intrinsics: Object<'js> = self.ctx.globals().get(INTRINSICS).translate(self)?;
        let helper: Function<'js> = intrinsics.get(name).translate(self)?;
        helper.call(args).translate(self)
    }
}
