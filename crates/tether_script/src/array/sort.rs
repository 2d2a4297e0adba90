//! Stable, fallible sorting
//!
//! Script comparators may throw or be inconsistent, so sorting runs over an
//! owned snapshot with a merge sort that propagates the first error and
//! never panics on a comparator that violates total order.

use crate::error::Result;
use crate::value::Value;
use std::cmp::Ordering;

/// Stable merge sort with a fallible comparator.
pub(crate) fn merge_sort<T, F>(mut items: Vec<T>, compare: &mut F) -> Result<Vec<T>>
where
    F: FnMut(&T, &T) -> Result<Ordering>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare)?;
    let right = merge_sort(right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(l, r)? == Ordering::Greater,
            _ => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

/// Sort `items` with the default order: ToString, compared by UTF-16 code
/// units, `undefined` last.
pub(crate) fn sort_default(items: Vec<Value>) -> Vec<Value> {
    let (defined, undefined) = partition(items);
    let keyed: Vec<(Vec<u16>, Value)> =
        defined.into_iter().map(|v| (v.to_js_string().encode_utf16().collect(), v)).collect();
    let sorted = merge_sort(keyed, &mut |a: &(Vec<u16>, Value), b: &(Vec<u16>, Value)| Ok(a.0.cmp(&b.0)));
    // the key comparison cannot fail
    let sorted = sorted.unwrap_or_default();
    sorted.into_iter().map(|(_, v)| v).chain(undefined).collect()
}

/// Sort `items` with a comparator returning a number; `undefined` last and
/// never passed to the comparator.
pub(crate) fn sort_with<F>(items: Vec<Value>, mut compare: F) -> Result<Vec<Value>>
where
    F: FnMut(&Value, &Value) -> Result<f64>,
{
    let (defined, undefined) = partition(items);
    let sorted = merge_sort(defined, &mut |a: &Value, b: &Value| {
        let n = compare(a, b)?;
        // NaN compares as equal
        Ok(if n < 0.0 {
            Ordering::Less
        } else if n > 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        })
    })?;
    Ok(sorted.into_iter().chain(undefined).collect())
}

fn partition(items: Vec<Value>) -> (Vec<Value>, Vec<Value>) {
    items.into_iter().partition(|v| !v.is_undefined())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn values(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn test_default_order_is_code_unit_order() {
        let sorted = sort_default(vec![Value::from(10), Value::from(9), Value::from(1), Value::Undefined, Value::from(2)]);
        let text: Vec<String> = sorted.iter().map(Value::to_js_string).collect();
        assert_eq!(text, vec!["1", "10", "2", "9", "undefined"]);

        // U+1F600 sorts after U+FF5E by code point but before it by code unit
        let sorted = sort_default(values(&["\u{1F600}", "\u{FF5E}"]));
        assert_eq!(sorted, values(&["\u{1F600}", "\u{FF5E}"]));
    }

    #[test]
    fn test_comparator_sort_is_stable() {
        let items: Vec<Value> =
            [(1, "a"), (0, "b"), (1, "c"), (0, "d")].iter().map(|(k, v)| Value::from(vec![Value::from(*k), Value::from(*v)])).collect();
        let sorted = sort_with(items, |a, b| {
            let key = |v: &Value| v.as_array().and_then(|s| s.get(0)).map(|k| k.to_number()).unwrap_or(0.0);
            Ok(key(a) - key(b))
        })
        .unwrap();
        let order: Vec<String> = sorted.iter().map(|v| v.as_array().unwrap().get(1).unwrap().to_js_string()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_comparator_error_propagates() {
        let result = sort_with(values(&["b", "a", "c"]), |_, _| Err(Error::host("cmp", "boom")));
        assert!(matches!(result, Err(Error::HostCallable { .. })));
    }

    #[test]
    fn test_inconsistent_comparator_does_not_panic() {
        let mut flip = false;
        let items: Vec<Value> = (0..50).map(Value::from).collect();
        let sorted = sort_with(items, |_, _| {
            flip = !flip;
            Ok(if flip { 1.0 } else { -1.0 })
        })
        .unwrap();
        assert_eq!(sorted.len(), 50);
    }
}
