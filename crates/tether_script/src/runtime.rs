//! Script runtime management
//!
//! Owns the QuickJS runtime and context, installs the bridge intrinsics and
//! is the entry point for evaluating scripts and exchanging values.

use crate::config::EngineConfig;
use crate::error::{Error, Result, Translate};
use crate::function::Callback;
use crate::proxy::ScriptArrayHandle;
use crate::realm::{Realm, Shared};
use crate::value::{HostSequence, Value};
use rquickjs::{Context, Runtime};
use std::path::Path;
use std::rc::Rc;
use tether_core::locale::LanguageTag;

const BOOTSTRAP: &str = include_str!("bootstrap.js");

/// Script execution context
///
/// Values holding script references ([`ScriptObject`](crate::ScriptObject),
/// script callbacks, [`ScriptArrayHandle`]) may outlive the runtime that
/// produced them. Dropping the runtime releases those references; the host
/// values stay usable as data but can no longer cross back into a script.
pub struct ScriptRuntime {
    shared: Rc<Shared>,
    context: Context,
    runtime: Runtime,
}

impl ScriptRuntime {
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        LanguageTag::parse(&config.default_locale)?;

        let runtime = Runtime::new()?;
        if let Some(limit) = config.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(size) = config.max_stack_size {
            runtime.set_max_stack_size(size);
        }
        if let Some(threshold) = config.gc_threshold {
            runtime.set_gc_threshold(threshold);
        }
        let context = Context::full(&runtime)?;
        let shared = Rc::new(Shared::new(&config));

        let script = Self { shared, context, runtime };
        script.with(|realm| realm.ctx().eval::<(), _>(BOOTSTRAP).translate(realm))?;
        tracing::info!(locale = %config.default_locale, "script runtime ready");
        Ok(script)
    }

    /// Run `f` inside the context.
    ///
    /// Host errors thrown into the script and caught there are discarded
    /// when the outermost `with` returns.
    pub fn with<F, R>(&self, f: F) -> Result<R>
    where
        F: for<'js> FnOnce(&Realm<'js>) -> Result<R>,
    {
        self.context.with(|ctx| {
            let _entry = self.shared.enter();
            let realm = Realm::new(ctx, self.shared.clone());
            f(&realm)
        })
    }

    /// Evaluate `source`, drain pending jobs and return the completion value.
    pub fn execute(&self, source: &str) -> Result<Value> {
        let value = self.with(|realm| realm.eval(source))?;
        self.run_pending_jobs()?;
        Ok(value)
    }

    pub fn execute_file(&self, path: &Path) -> Result<Value> {
        let source = std::fs::read_to_string(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "executing script file");
        self.execute(&source)
    }

    /// Call `callback` with an explicit `this`.
    pub fn call_function(&self, callback: &Callback, this: &Value, args: &[Value]) -> Result<Value> {
        let result = self.with(|realm| callback.call(realm, this, args))?;
        self.run_pending_jobs()?;
        Ok(result)
    }

    /// Call the global function `name` with `this` undefined.
    pub fn call_global(&self, name: &str, args: &[Value]) -> Result<Value> {
        let result = self.with(|realm| match realm.global(name)? {
            Value::Function(callback) => callback.call(realm, &Value::Undefined, args),
            _ => Err(Error::script("TypeError", format!("{name} is not a function"))),
        })?;
        self.run_pending_jobs()?;
        Ok(result)
    }

    /// The unique script Array proxy for `sequence`.
    pub fn create_array_proxy(&self, sequence: &HostSequence) -> Result<ScriptArrayHandle> {
        self.with(|realm| realm.array_proxy(sequence))
    }

    pub fn set_global(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.with(|realm| realm.set_global(name, &value))
    }

    pub fn global(&self, name: &str) -> Result<Value> {
        self.with(|realm| realm.global(name))
    }

    /// Run queued promise jobs until none remain; returns how many ran.
    pub fn run_pending_jobs(&self) -> Result<usize> {
        let mut count = 0;
        loop {
            match self.runtime.execute_pending_job() {
                Ok(true) => count += 1,
                Ok(false) => break,
                Err(_) => {
                    let error = self.with(|realm| Ok(realm.take_exception()))?;
                    tracing::debug!(%error, "pending job failed");
                    return Err(error);
                }
            }
        }
        if count > 0 {
            tracing::trace!(count, "ran pending jobs");
        }
        Ok(count)
    }

    pub fn collect_garbage(&self) {
        self.runtime.run_gc();
        tracing::debug!(tracked = self.shared.tracked(), "garbage collection finished");
    }
}

impl Drop for ScriptRuntime {
    fn drop(&mut self) {
        // Host-held references can close cycles the collector cannot see;
        // free them while the context is alive so the engine tears down clean.
        let released = self.context.with(|_| self.shared.release_roots());
        self.runtime.run_gc();
        tracing::debug!(released, "released host-held script references");
    }
}
