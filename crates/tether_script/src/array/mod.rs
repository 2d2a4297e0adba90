//! Array methods over host sequences
//!
//! [`ArrayProxy`] implements the Array prototype methods a script sees on a
//! host sequence. Calls arrive already converted to host [`Value`]s; results
//! are host values, or a [`Cursor`] for the iterator methods.
//!
//! Methods that need no callback live on [`HostSequence`] itself (see
//! `ops`), the rest here and in `callbacks`.

mod callbacks;
mod ops;
mod sort;

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use crate::function::Callback;
use crate::iter::{Cursor, CursorKind};
use crate::realm::Realm;
use crate::value::{HostSequence, Value};
use tether_core::number::to_integer_or_infinity;

/// Result of an Array method call.
#[derive(Debug)]
pub enum Outcome {
    Value(Value),
    Cursor(Cursor),
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}

/// A host sequence viewed as a script Array.
pub struct ArrayProxy<'r, 'js> {
    realm: &'r Realm<'js>,
    sequence: HostSequence,
}

impl<'r, 'js> ArrayProxy<'r, 'js> {
    /// Method names served by the host; any other property falls through
    /// to the ordinary Array prototype.
    pub const METHODS: &'static [&'static str] = &[
        "push", "pop", "shift", "unshift", "join", "toString", "toLocaleString", "indexOf",
        "lastIndexOf", "includes", "concat", "slice", "splice", "fill", "copyWithin", "reverse",
        "sort", "forEach", "map", "filter", "some", "every", "find", "findIndex", "reduce",
        "reduceRight", "flat", "flatMap", "entries", "keys", "values", "valueOf",
    ];

    pub fn new(realm: &'r Realm<'js>, sequence: HostSequence) -> Self {
        Self { realm, sequence }
    }

    pub fn sequence(&self) -> &HostSequence {
        &self.sequence
    }

    /// Dispatch `method` by name.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Outcome> {
        let seq = &self.sequence;
        let this = || Value::Array(seq.clone());

        let value = match method {
            "push" => Value::from(seq.push_all(args)),
            "pop" => seq.pop().unwrap_or_default(),
            "shift" => seq.shift().unwrap_or_default(),
            "unshift" => Value::from(seq.unshift(args)),
            "join" => Value::from(seq.join(&separator(args.first()))),
            "toString" => Value::from(seq.join(",")),
            "toLocaleString" => Value::from(self.to_locale_string(&arg(args, 0), &arg(args, 1))?),
            "indexOf" => index_result(seq.index_of(&arg(args, 0), number(args, 1))),
            "lastIndexOf" => index_result(seq.last_index_of(&arg(args, 0), number(args, 1))),
            "includes" => {
                require(method, args, 1)?;
                Value::from(seq.includes(&args[0], number(args, 1)))
            }
            "concat" => Value::from(seq.concat(args)),
            "slice" => Value::from(seq.slice(number(args, 0), bound(args, 1))),
            "splice" => match args.first() {
                None => Value::from(HostSequence::new()),
                Some(start) => Value::from(seq.splice(
                    start.to_number(),
                    number(args, 1),
                    args.get(2..).unwrap_or_default(),
                )),
            },
            "fill" => {
                seq.fill(&arg(args, 0), number(args, 1), bound(args, 2));
                this()
            }
            "copyWithin" => {
                seq.copy_within(number(args, 0), number(args, 1), bound(args, 2));
                this()
            }
            "reverse" => {
                seq.reverse();
                this()
            }
            "sort" => {
                let comparator = match args.first() {
                    None | Some(Value::Undefined) => None,
                    Some(Value::Function(callback)) => Some(callback),
                    Some(_) => return Err(Error::not_a_function(method)),
                };
                self.sort(comparator)?;
                this()
            }
            "forEach" => {
                let (callback, this_arg) = iteration_args(method, args)?;
                self.for_each(callback, &this_arg)?;
                Value::Undefined
            }
            "map" => {
                let (callback, this_arg) = iteration_args(method, args)?;
                Value::from(self.map(callback, &this_arg)?)
            }
            "filter" => {
                let (callback, this_arg) = iteration_args(method, args)?;
                Value::from(self.filter(callback, &this_arg)?)
            }
            "some" => {
                let (callback, this_arg) = iteration_args(method, args)?;
                Value::from(self.some(callback, &this_arg)?)
            }
            "every" => {
                let (callback, this_arg) = iteration_args(method, args)?;
                Value::from(self.every(callback, &this_arg)?)
            }
            "find" => {
                let (callback, this_arg) = iteration_args(method, args)?;
                self.find(callback, &this_arg)?
            }
            "findIndex" => {
                let (callback, this_arg) = iteration_args(method, args)?;
                index_result(self.find_index(callback, &this_arg)?)
            }
            "flatMap" => {
                let (callback, this_arg) = iteration_args(method, args)?;
                Value::from(self.flat_map(callback, &this_arg)?)
            }
            "reduce" => self.reduce(callback_arg(method, args)?, args.get(1).cloned())?,
            "reduceRight" => self.reduce_right(callback_arg(method, args)?, args.get(1).cloned())?,
            "flat" => {
                let depth = match args.first() {
                    None | Some(Value::Undefined) => 1.0,
                    Some(depth) => to_integer_or_infinity(depth.to_number()).max(0.0),
                };
                Value::from(seq.flat(depth))
            }
            "entries" => return Ok(Outcome::Cursor(Cursor::new(seq.clone(), CursorKind::Entries))),
            "keys" => return Ok(Outcome::Cursor(Cursor::new(seq.clone(), CursorKind::Keys))),
            "values" => return Ok(Outcome::Cursor(Cursor::new(seq.clone(), CursorKind::Values))),
            "valueOf" => this(),
            other => return Err(Error::script("TypeError", format!("{other} is not a function"))),
        };
        Ok(Outcome::Value(value))
    }
}

// ============================================================================
// ARGUMENT HELPERS
// ============================================================================

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Numeric argument, `None` only when absent.
fn number(args: &[Value], index: usize) -> Option<f64> {
    args.get(index).map(Value::to_number)
}

/// End-of-range argument, `None` when absent or `undefined`.
fn bound(args: &[Value], index: usize) -> Option<f64> {
    match args.get(index) {
        None | Some(Value::Undefined) => None,
        Some(value) => Some(value.to_number()),
    }
}

fn separator(arg: Option<&Value>) -> String {
    match arg {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(value) => value.to_js_string(),
    }
}

fn index_result(index: Option<usize>) -> Value {
    index.map(Value::from).unwrap_or(Value::Number(-1.0))
}

fn require(method: &str, args: &[Value], required: usize) -> Result<()> {
    if args.len() < required {
        return Err(Error::argument_count(method, required, args.len()));
    }
    Ok(())
}

/// The required callback of an iteration method.
fn callback_arg<'a>(method: &str, args: &'a [Value]) -> Result<&'a Callback> {
    require(method, args, 1)?;
    match &args[0] {
        Value::Function(callback) => Ok(callback),
        _ => Err(Error::not_a_function(method)),
    }
}

/// Callback and optional `thisArg` of an iteration method.
///
/// A `null` thisArg is rejected; other values pass through unchanged and
/// the engine applies its own binding rules.
fn iteration_args<'a>(method: &str, args: &'a [Value]) -> Result<(&'a Callback, Value)> {
    let callback = callback_arg(method, args)?;
    let this = match args.get(1) {
        Some(Value::Null) => return Err(Error::runtime_logic(format!("{method}: this is null"))),
        Some(value) => value.clone(),
        None => Value::Undefined,
    };
    Ok((callback, this))
}
