//! Session state exposed to scripts
//!
//! Scripts request termination through an explicit `exit(code)` global
//! installed by [`Session::install`]. The call only records the code; the
//! embedder decides when to act on it.

use std::cell::Cell;
use std::rc::Rc;
use tether_script::{Arity, HostFunction, ScriptRuntime, Value};

#[derive(Debug, Clone, Default)]
pub struct Session {
    exit_code: Rc<Cell<Option<i32>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define the global `exit([code])` in `script`.
    pub fn install(&self, script: &ScriptRuntime) -> tether_script::Result<()> {
        script.set_global("exit", self.exit_function())
    }

    /// The host function behind the script's `exit`.
    pub fn exit_function(&self) -> HostFunction {
        let exit_code = self.exit_code.clone();
        HostFunction::new("exit", Arity::Range(0, 1), move |_, _, args| {
            let code = match args.first() {
                None | Some(Value::Undefined) => 0,
                Some(value) => exit_status(value.to_number()),
            };
            tracing::info!(code, "script requested exit");
            exit_code.set(Some(code));
            Ok(Value::Undefined)
        })
    }

    /// Code passed to the most recent `exit` call.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code.get()
    }

    pub fn has_exited(&self) -> bool {
        self.exit_code.get().is_some()
    }
}

fn exit_status(n: f64) -> i32 {
    if n.is_finite() {
        n.trunc().clamp(i32::MIN as f64, i32::MAX as f64) as i32
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_records_code() {
        let script = ScriptRuntime::new().unwrap();
        let session = Session::new();
        session.install(&script).unwrap();
        assert_eq!(session.exit_code(), None);

        script.execute("exit(3); 'still running'").unwrap();
        assert_eq!(session.exit_code(), Some(3));

        script.execute("exit()").unwrap();
        assert_eq!(session.exit_code(), Some(0));
        assert!(session.has_exited());
    }

    #[test]
    fn test_exit_arguments() {
        let script = ScriptRuntime::new().unwrap();
        let session = Session::new();
        session.install(&script).unwrap();

        script.execute("exit(2.9)").unwrap();
        assert_eq!(session.exit_code(), Some(2));
        script.execute("exit('x')").unwrap();
        assert_eq!(session.exit_code(), Some(1));

        let err = script.execute("exit(1, 2)").unwrap_err();
        assert!(err.to_string().contains("exit: At most 1 argument accepted, but 2 passed"), "{err}");
        assert_eq!(script.execute("exit.length").unwrap(), Value::from(0));
    }
}
