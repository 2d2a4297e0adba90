//! Host callables and script functions
//!
//! A [`Callback`] is either a host closure exposed to scripts or a script
//! function held by the host. Both are invoked through [`Callback::call`]
//! with an explicit `this` and argument list.

use crate::error::{self, Error, Result, Translate};
use crate::proxy;
use crate::realm::{HandleRef, Realm, ScriptRoot};
use crate::value::{next_handle_id, Value};
use rquickjs::function::{Rest, This};
use rquickjs::{Ctx, Function, Persistent};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Accepted argument count of a host callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl Arity {
    /// Reported as the function's `length`.
    pub fn min(&self) -> usize {
        match *self {
            Arity::Exact(n) | Arity::AtLeast(n) | Arity::Range(n, _) => n,
        }
    }

    pub fn max(&self) -> Option<usize> {
        match *self {
            Arity::Exact(n) | Arity::Range(_, n) => Some(n),
            Arity::AtLeast(_) => None,
        }
    }

    fn check(&self, name: &str, passed: usize) -> Result<()> {
        if passed < self.min() {
            return Err(Error::argument_count(name, self.min(), passed));
        }
        match self.max() {
            Some(max) if passed > max => Err(Error::too_many_arguments(name, max, passed)),
            _ => Ok(()),
        }
    }
}

type HostBody = dyn for<'r, 'js> Fn(&'r Realm<'js>, &Value, &[Value]) -> Result<Value>;

struct HostFunctionInner {
    id: u64,
    name: String,
    arity: Arity,
    body: Box<HostBody>,
}

/// A host closure callable from scripts.
///
/// Every conversion of the same `HostFunction` into a script yields the same
/// script function object.
#[derive(Clone)]
pub struct HostFunction(Rc<HostFunctionInner>);

impl HostFunction {
    pub fn new<F>(name: impl Into<String>, arity: Arity, body: F) -> Self
    where
        F: for<'r, 'js> Fn(&'r Realm<'js>, &Value, &[Value]) -> Result<Value> + 'static,
    {
        HostFunction(Rc::new(HostFunctionInner {
            id: next_handle_id(),
            name: name.into(),
            arity,
            body: Box::new(body),
        }))
    }

    /// A host closure accepting any number of arguments.
    pub fn variadic<F>(name: impl Into<String>, body: F) -> Self
    where
        F: for<'r, 'js> Fn(&'r Realm<'js>, &Value, &[Value]) -> Result<Value> + 'static,
    {
        Self::new(name, Arity::AtLeast(0), body)
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn arity(&self) -> Arity {
        self.0.arity
    }

    /// Check the argument count, then run the body.
    pub fn call(&self, realm: &Realm<'_>, this: &Value, args: &[Value]) -> Result<Value> {
        self.0.arity.check(&self.0.name, args.len())?;
        (self.0.body)(realm, this, args)
    }

    pub(crate) fn downgrade(&self) -> WeakHostFunction {
        WeakHostFunction(Rc::downgrade(&self.0))
    }
}

pub(crate) struct WeakHostFunction(Weak<HostFunctionInner>);

impl WeakHostFunction {
    pub(crate) fn upgrade(&self) -> Option<HostFunction> {
        self.0.upgrade().map(HostFunction)
    }
}

struct ScriptFunctionRef {
    id: u64,
    name: String,
    function: RefCell<Option<Persistent<Function<'static>>>>,
}

impl ScriptRoot for ScriptFunctionRef {
    fn release(&self) {
        self.function.borrow_mut().take();
    }
}

/// A script function held by the host.
///
/// Released when its runtime is dropped; calling it afterwards fails with a
/// `ReferenceError`.
#[derive(Clone)]
pub struct ScriptFunction(Rc<ScriptFunctionRef>);

impl ScriptFunction {
    pub(crate) fn capture<'js>(realm: &Realm<'js>, function: Function<'js>) -> Result<Self> {
        let id: f64 = realm.helper("scriptId", (function.clone(),))?;
        let name = function.get::<_, Option<String>>("name").ok().flatten().unwrap_or_default();
        let function = RefCell::new(Some(Persistent::save(realm.ctx(), function)));
        let inner = Rc::new(ScriptFunctionRef { id: id as u64, name, function });
        let root: Weak<dyn ScriptRoot> = Rc::downgrade(&inner) as Weak<_>;
        realm.shared().root(root);
        Ok(ScriptFunction(inner))
    }

    /// Script-side identity.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub(crate) fn restore<'js>(&self, realm: &Realm<'js>) -> Result<Function<'js>> {
        let function = self.0.function.borrow().clone().ok_or_else(|| Error::released("script function"))?;
        function.restore(realm.ctx()).translate(realm)
    }

    pub fn call(&self, realm: &Realm<'_>, this: &Value, args: &[Value]) -> Result<Value> {
        let function = self.restore(realm)?;
        let this = realm.to_js(this)?;
        let args = args.iter().map(|arg| realm.to_js(arg)).collect::<Result<Vec<_>>>()?;
        let result: rquickjs::Value = function.call((This(this), Rest(args))).translate(realm)?;
        realm.from_js(result)
    }
}

/// Something callable with `(this, args)`.
#[derive(Clone)]
pub enum Callback {
    Host(HostFunction),
    Script(ScriptFunction),
}

impl Callback {
    pub fn name(&self) -> &str {
        match self {
            Callback::Host(f) => f.name(),
            Callback::Script(f) => f.name(),
        }
    }

    pub fn call(&self, realm: &Realm<'_>, this: &Value, args: &[Value]) -> Result<Value> {
        match self {
            Callback::Host(f) => f.call(realm, this, args),
            Callback::Script(f) => f.call(realm, this, args),
        }
    }

    /// Identity comparison.
    pub fn same(&self, other: &Callback) -> bool {
        match (self, other) {
            (Callback::Host(a), Callback::Host(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Callback::Script(a), Callback::Script(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl From<HostFunction> for Callback {
    fn from(f: HostFunction) -> Self {
        Callback::Host(f)
    }
}

impl From<HostFunction> for Value {
    fn from(f: HostFunction) -> Self {
        Value::Function(Callback::Host(f))
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Host(host) => write!(f, "[HostFunction: {}]", host.name()),
            Callback::Script(script) => write!(f, "[Function: {}]", script.name()),
        }
    }
}

// ============================================================================
// SCRIPT WRAPPER
// ============================================================================

/// The unique script function object for `host`.
pub(crate) fn host_wrapper<'js>(realm: &Realm<'js>, host: &HostFunction) -> Result<Function<'js>> {
    if let Some(existing) = proxy::lookup(realm, host.id())?.and_then(|v| v.into_function()) {
        return Ok(existing);
    }

    let shared = realm.shared().clone();
    let callee = host.clone();
    let function = Function::new(
        realm.ctx().clone(),
        move |ctx: Ctx<'js>, this: This<rquickjs::Value<'js>>, args: Rest<rquickjs::Value<'js>>| {
            let realm = Realm::new(ctx, shared.clone());
            invoke(&realm, &callee, this.0, args.0).map_err(|err| error::throw(&realm, err))
        },
    )
    .translate(realm)?;

    let function: Function<'js> = realm.helper(
        "registerFunction",
        (host.id() as f64, function, host.name(), host.arity().min() as f64),
    )?;
    realm.shared().track(host.id(), HandleRef::Function(host.downgrade()));
    tracing::debug!(id = host.id(), name = host.name(), "exposed host function");
    Ok(function)
}

fn invoke<'js>(
    realm: &Realm<'js>,
    host: &HostFunction,
    this: rquickjs::Value<'js>,
    args: Vec<rquickjs::Value<'js>>,
) -> Result<rquickjs::Value<'js>> {
    let this = realm.from_js(this)?;
    let args = args.into_iter().map(|arg| realm.from_js(arg)).collect::<Result<Vec<_>>>()?;
    let result = host.call(realm, &this, &args)?;
    realm.to_js(&result)
}
