//! Tether Script Bridge
//!
//! Live host/script data sharing over QuickJS.
//!
//! ## Architecture
//!
//! - **Values:** [`Value`] is the currency crossing the boundary. Host
//!   sequences and mappings are reference types shared with the script.
//! - **Proxies:** each [`HostSequence`] appears to scripts as exactly one
//!   Array proxy whose methods run on the host ([`ArrayProxy`]).
//! - **Functions:** [`HostFunction`]s are callable from scripts; script
//!   functions come back as [`Callback`]s.
//! - **Errors:** host errors thrown into scripts are real `Error` objects and
//!   are recovered unchanged if they propagate back out.
//!
//! ```no_run
//! use tether_script::{HostSequence, ScriptRuntime, Value};
//!
//! let script = ScriptRuntime::new()?;
//! let scores: HostSequence = vec![Value::from(3), Value::from(1)].into();
//! script.set_global("scores", scores.clone())?;
//! script.execute("scores.push(2); scores.sort();")?;
//! assert_eq!(scores.join(","), "1,2,3");
//! # Ok::<(), tether_script::Error>(())
//! ```

pub mod array;
mod coerce;
pub mod config;
pub mod error;
pub mod function;
pub mod iter;
pub mod proxy;
pub mod realm;
pub mod runtime;
pub mod value;

pub use array::{ArrayProxy, Outcome};
pub use config::EngineConfig;
pub use error::{EngineError, Error, Result};
pub use function::{Arity, Callback, HostFunction, ScriptFunction};
pub use iter::{Cursor, CursorKind, IterStep, ScriptIterator};
pub use proxy::ScriptArrayHandle;
pub use realm::Realm;
pub use runtime::ScriptRuntime;
pub use value::{ErrorValue, HostSequence, PlainObject, ScriptObject, Value};

pub use rquickjs;
