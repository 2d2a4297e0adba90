//! Error kinds and their translation across the boundary
//!
//! Host failures thrown into a script become real script `Error` objects
//! (`instanceof Error`, `try`/`catch` works). Errors that reach the host from
//! the engine become [`Error::EngineRuntime`]; a host error that was thrown
//! into the script and propagated back out is recovered unchanged.

use crate::realm::Realm;
use std::path::PathBuf;
use tether_core::locale::LocaleError;
use thiserror::Error;

/// Hidden property on script errors that wrap a stashed host error.
pub(crate) const HOST_ERROR_TAG: &str = "__tetherHostError";

/// Bridge error
///
/// `Display` is the script-visible form, `"<Name>: <message>"`. Several
/// kinds share a script name (`Argument` and `RuntimeLogic` both surface as
/// `TypeError`), so match on the variant rather than the text to tell them
/// apart; `Debug` names the variant.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad argument count or type supplied to an Array method.
    #[error("TypeError: {message}")]
    Argument { message: String },

    /// A value could not be converted; `name` is the script error class.
    #[error("{name}: {message}")]
    TypeConversion { name: &'static str, message: String },

    /// Semantically invalid operation (`this` is null, reduce of empty array).
    #[error("TypeError: {message}")]
    RuntimeLogic { message: String },

    /// Raised by a host callable invoked from the script.
    #[error("Error: {function}: {message}")]
    HostCallable { function: String, message: String },

    /// An exception thrown inside the engine.
    #[error(transparent)]
    EngineRuntime(EngineError),

    /// Engine failure that is not a script exception (allocation, runtime mismatch).
    #[error("InternalError: {0}")]
    Engine(#[from] rquickjs::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Bridge result
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn argument(message: impl Into<String>) -> Self {
        Error::Argument { message: message.into() }
    }

    /// `method: At least N argument(s) required, but only M passed`
    pub fn argument_count(method: &str, required: usize, passed: usize) -> Self {
        let plural = if required == 1 { "" } else { "s" };
        Error::argument(format!(
            "{method}: At least {required} argument{plural} required, but only {passed} passed"
        ))
    }

    pub fn too_many_arguments(method: &str, allowed: usize, passed: usize) -> Self {
        let plural = if allowed == 1 { "" } else { "s" };
        Error::argument(format!("{method}: At most {allowed} argument{plural} accepted, but {passed} passed"))
    }

    pub fn not_a_function(method: &str) -> Self {
        Error::argument(format!("{method}: callback is not a function"))
    }

    /// A length or index the host refuses to grow a sequence to.
    pub fn invalid_array_length() -> Self {
        Error::conversion("RangeError", "invalid array length")
    }

    /// A script reference used after its runtime was torn down.
    pub(crate) fn released(what: &str) -> Self {
        Error::conversion("ReferenceError", format!("{what} outlived its script runtime"))
    }

    pub fn conversion(name: &'static str, message: impl Into<String>) -> Self {
        Error::TypeConversion { name, message: message.into() }
    }

    pub fn runtime_logic(message: impl Into<String>) -> Self {
        Error::RuntimeLogic { message: message.into() }
    }

    /// Failure raised by the host callable `function`.
    pub fn host(function: impl Into<String>, message: impl Into<String>) -> Self {
        Error::HostCallable { function: function.into(), message: message.into() }
    }

    /// An engine-style exception raised by the bridge itself.
    pub fn script(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::EngineRuntime(EngineError { name: name.into(), message: message.into(), stack: None })
    }

    /// Script error class this error surfaces as.
    pub fn script_name(&self) -> &str {
        match self {
            Error::Argument { .. } | Error::RuntimeLogic { .. } => "TypeError",
            Error::TypeConversion { name, .. } => name,
            Error::HostCallable { .. } | Error::Io { .. } => "Error",
            Error::EngineRuntime(err) => &err.name,
            Error::Engine(_) => "InternalError",
        }
    }

    /// Message without the class prefix.
    pub fn message(&self) -> String {
        match self {
            Error::Argument { message } | Error::RuntimeLogic { message } => message.clone(),
            Error::TypeConversion { message, .. } => message.clone(),
            Error::HostCallable { function, message } => format!("{function}: {message}"),
            Error::EngineRuntime(err) => err.message.clone(),
            Error::Engine(err) => err.to_string(),
            Error::Io { path, source } => format!("failed to read {}: {source}", path.display()),
        }
    }

    pub fn stack(&self) -> Option<&str> {
        match self {
            Error::EngineRuntime(err) => err.stack.as_deref(),
            _ => None,
        }
    }
}

impl From<LocaleError> for Error {
    fn from(err: LocaleError) -> Self {
        let name = if err.is_range_error() { "RangeError" } else { "TypeError" };
        Error::conversion(name, err.to_string())
    }
}

/// An exception raised inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct EngineError {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl EngineError {
    /// The innermost stack frame, trimmed.
    pub fn first_frame(&self) -> Option<&str> {
        self.frames().next()
    }

    /// Every frame after the first, one per line.
    pub fn remaining_frames(&self) -> Option<String> {
        let rest: Vec<&str> = self.frames().skip(1).collect();
        (!rest.is_empty()).then(|| rest.join("\n"))
    }

    fn frames(&self) -> impl Iterator<Item = &str> {
        self.stack.as_deref().unwrap_or_default().lines().map(str::trim).filter(|line| !line.is_empty())
    }
}

// ============================================================================
// TRANSLATION
// ============================================================================

/// Map raw engine results into bridge errors.
pub(crate) trait Translate<T> {
    fn translate(self, realm: &Realm<'_>) -> Result<T>;
}

impl<T> Translate<T> for rquickjs::Result<T> {
    fn translate(self, realm: &Realm<'_>) -> Result<T> {
        self.map_err(|err| match err {
            rquickjs::Error::Exception => realm.take_exception(),
            other => Error::Engine(other),
        })
    }
}

/// Convert a thrown script value into a host error.
pub(crate) fn from_thrown<'js>(realm: &Realm<'js>, thrown: rquickjs::Value<'js>) -> Error {
    let Some(object) = thrown.as_object() else {
        // `throw "text"` and friends carry no name
        let message = realm.from_js(thrown.clone()).map(|v| v.to_js_string()).unwrap_or_default();
        return Error::script("Error", message);
    };

    if let Ok(Some(tag)) = object.get::<_, Option<f64>>(HOST_ERROR_TAG) {
        if let Some(original) = realm.shared().take_error(tag as u64) {
            return original;
        }
    }

    let name = object.get::<_, Option<String>>("name").ok().flatten().unwrap_or_else(|| "Error".into());
    let mut message = object.get::<_, Option<String>>("message").ok().flatten().unwrap_or_default();
    if name == "TypeError" && message == BARE_NOT_A_FUNCTION {
        message = "value is not a function".to_string();
    }
    let stack = object.get::<_, Option<String>>("stack").ok().flatten().filter(|s| !s.is_empty());
    Error::EngineRuntime(EngineError { name, message, stack })
}

/// QuickJS reports a call of a non-callable without naming the callee.
const BARE_NOT_A_FUNCTION: &str = "not a function";

/// Throw `error` into the script as a real `Error` object.
///
/// The host error is stashed so that, if the script does not catch it, the
/// caller on the host side receives the original instead of a copy.
pub(crate) fn throw(realm: &Realm<'_>, error: Error) -> rquickjs::Error {
    if let Error::Engine(err) = error {
        return err;
    }
    let (name, message, stack) = match &error {
        Error::EngineRuntime(err) => (err.name.clone(), err.message.clone(), err.stack.clone()),
        other => (other.script_name().to_string(), other.message(), None),
    };
    tracing::debug!(%name, %message, "throwing host error into script");
    let tag = realm.shared().stash_error(error);
    match realm.helper::<_, rquickjs::Value>("makeError", (name, message, stack, tag as f64)) {
        Ok(exception) => realm.ctx().throw(exception),
        Err(Error::Engine(err)) => err,
        Err(_) => rquickjs::Error::Exception,
    }
}
