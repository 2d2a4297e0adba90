//! Array operations that never call back into the script
//!
//! Index arguments arrive as raw doubles (already ToNumber'd) and are
//! normalized with the relative-index rules; `None` means the argument was
//! absent.

use crate::error::Result;
use crate::value::{self, HostSequence, Value};
use tether_core::locale::NumberFormat;
use tether_core::number::{relative_index, to_integer_or_infinity};

impl HostSequence {
    /// Append `items` in order and return the new length.
    pub fn push_all(&self, items: &[Value]) -> usize {
        let mut storage = self.borrow_mut();
        storage.extend_from_slice(items);
        storage.len()
    }

    pub fn pop(&self) -> Option<Value> {
        self.borrow_mut().pop()
    }

    pub fn shift(&self) -> Option<Value> {
        let mut storage = self.borrow_mut();
        (!storage.is_empty()).then(|| storage.remove(0))
    }

    /// Prepend `items`, keeping their order, and return the new length.
    pub fn unshift(&self, items: &[Value]) -> usize {
        let mut storage = self.borrow_mut();
        storage.splice(0..0, items.iter().cloned());
        storage.len()
    }

    /// Truncate or pad with `undefined`.
    pub fn set_length(&self, len: usize) -> Result<()> {
        let mut storage = self.borrow_mut();
        if len <= storage.len() {
            storage.truncate(len);
            return Ok(());
        }
        value::pad(&mut storage, len)
    }

    /// Elements joined by `separator`; `undefined` and `null` become "".
    pub fn join(&self, separator: &str) -> String {
        let mut out = String::new();
        self.write_joined(separator, &mut out, &mut Vec::new());
        out
    }

    /// First index whose element is `===` to `search`.
    pub fn index_of(&self, search: &Value, from: Option<f64>) -> Option<usize> {
        let storage = self.borrow();
        let start = relative_index(from, storage.len(), 0);
        storage.iter().enumerate().skip(start).find(|(_, item)| item.strict_equals(search)).map(|(i, _)| i)
    }

    /// Last index whose element is `===` to `search`, scanning backwards
    /// from `from` (default: the last element).
    pub fn last_index_of(&self, search: &Value, from: Option<f64>) -> Option<usize> {
        let storage = self.borrow();
        let len = storage.len();
        if len == 0 {
            return None;
        }
        let start = match from {
            None => len - 1,
            Some(raw) => {
                let relative = to_integer_or_infinity(raw);
                if relative >= 0.0 {
                    relative.min(len as f64 - 1.0) as usize
                } else {
                    let from_end = len as f64 + relative;
                    if from_end < 0.0 {
                        return None;
                    }
                    from_end as usize
                }
            }
        };
        (0..=start).rev().find(|&i| storage[i].strict_equals(search))
    }

    /// SameValueZero membership, so `NaN` is found.
    pub fn includes(&self, search: &Value, from: Option<f64>) -> bool {
        let storage = self.borrow();
        let start = relative_index(from, storage.len(), 0);
        storage.iter().skip(start).any(|item| item.same_value_zero(search))
    }

    /// New sequence of these elements followed by `items`; array arguments
    /// are spread one level.
    pub fn concat(&self, items: &[Value]) -> HostSequence {
        let mut out = self.to_vec();
        for item in items {
            match item {
                Value::Array(seq) => out.extend(seq.to_vec()),
                other => out.push(other.clone()),
            }
        }
        HostSequence::from(out)
    }

    pub fn slice(&self, start: Option<f64>, end: Option<f64>) -> HostSequence {
        let storage = self.borrow();
        let len = storage.len();
        let from = relative_index(start, len, 0);
        let to = relative_index(end, len, len);
        if from >= to {
            return HostSequence::new();
        }
        HostSequence::from(storage[from..to].to_vec())
    }

    /// Remove `delete_count` elements at `start` (all remaining when `None`),
    /// insert `items` there and return the removed elements.
    pub fn splice(&self, start: f64, delete_count: Option<f64>, items: &[Value]) -> HostSequence {
        let mut storage = self.borrow_mut();
        let len = storage.len();
        let from = relative_index(Some(start), len, 0);
        let count = match delete_count {
            None => len - from,
            Some(raw) => to_integer_or_infinity(raw).clamp(0.0, (len - from) as f64) as usize,
        };
        let removed: Vec<Value> = storage.splice(from..from + count, items.iter().cloned()).collect();
        HostSequence::from(removed)
    }

    pub fn fill(&self, value: &Value, start: Option<f64>, end: Option<f64>) {
        let mut storage = self.borrow_mut();
        let len = storage.len();
        let from = relative_index(start, len, 0);
        let to = relative_index(end, len, len);
        for slot in storage.iter_mut().take(to).skip(from) {
            *slot = value.clone();
        }
    }

    /// Copy `[start, end)` onto `target`, handling overlap.
    pub fn copy_within(&self, target: Option<f64>, start: Option<f64>, end: Option<f64>) {
        let mut storage = self.borrow_mut();
        let len = storage.len();
        let to = relative_index(target, len, 0);
        let from = relative_index(start, len, 0);
        let end = relative_index(end, len, len);
        let count = end.saturating_sub(from).min(len - to);
        if count == 0 {
            return;
        }
        let chunk: Vec<Value> = storage[from..from + count].to_vec();
        storage[to..to + count].clone_from_slice(&chunk);
    }

    pub fn reverse(&self) {
        self.borrow_mut().reverse();
    }

    /// Flatten nested sequences up to `depth` levels.
    pub fn flat(&self, depth: f64) -> HostSequence {
        let mut out = Vec::new();
        flatten_into(&mut out, &self.to_vec(), depth, &mut vec![self.id()]);
        HostSequence::from(out)
    }

    /// `toLocaleString` body: numbers through `format`, nested sequences
    /// recursively, nullish elements as "".
    pub fn locale_join(&self, format: &NumberFormat) -> String {
        let mut out = String::new();
        self.write_locale_joined(format, &mut out, &mut Vec::new());
        out
    }

    fn write_locale_joined(&self, format: &NumberFormat, out: &mut String, joining: &mut Vec<u64>) {
        if joining.contains(&self.id()) {
            return;
        }
        joining.push(self.id());
        for (index, item) in self.to_vec().iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            match item {
                Value::Undefined | Value::Null => {}
                Value::Number(n) => out.push_str(&format.format(*n)),
                Value::Array(seq) => seq.write_locale_joined(format, out, joining),
                other => other.write_js_string(out, joining),
            }
        }
        joining.pop();
    }
}

fn flatten_into(out: &mut Vec<Value>, items: &[Value], depth: f64, visiting: &mut Vec<u64>) {
    for item in items {
        match item {
            // a sequence that contains itself is not descended into again
            Value::Array(seq) if depth >= 1.0 && !visiting.contains(&seq.id()) => {
                visiting.push(seq.id());
                flatten_into(out, &seq.to_vec(), depth - 1.0, visiting);
                visiting.pop();
            }
            other => out.push(other.clone()),
        }
    }
}
