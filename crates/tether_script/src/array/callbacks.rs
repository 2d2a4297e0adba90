//! Array operations that invoke script callbacks
//!
//! The length is read once before iterating; elements are fetched per step,
//! so a callback that shrinks the sequence ends the walk early and one that
//! grows it is not visited past the original length. No storage borrow is
//! held while a callback runs.

use super::sort;
use super::ArrayProxy;
use crate::error::{Error, Result};
use crate::function::Callback;
use crate::value::{HostSequence, Value};
use tether_core::locale::{NumberFormat, NumberFormatOptions};

impl<'r, 'js> ArrayProxy<'r, 'js> {
    /// `callback(element, index, array)` with `this`.
    fn visit(&self, callback: &Callback, this: &Value, element: Value, index: usize) -> Result<Value> {
        callback.call(
            self.realm,
            this,
            &[element, Value::from(index), Value::Array(self.sequence.clone())],
        )
    }

    /// Elements in order, stopping at the first index that no longer exists.
    fn walk<F>(&self, mut step: F) -> Result<()>
    where
        F: FnMut(usize, Value) -> Result<bool>,
    {
        let len = self.sequence.len();
        for index in 0..len {
            let Some(element) = self.sequence.get(index) else {
                break;
            };
            if !step(index, element)? {
                break;
            }
        }
        Ok(())
    }

    pub fn for_each(&self, callback: &Callback, this: &Value) -> Result<()> {
        self.walk(|index, element| {
            self.visit(callback, this, element, index)?;
            Ok(true)
        })
    }

    pub fn map(&self, callback: &Callback, this: &Value) -> Result<HostSequence> {
        let mut out = Vec::with_capacity(self.sequence.len());
        self.walk(|index, element| {
            out.push(self.visit(callback, this, element, index)?);
            Ok(true)
        })?;
        Ok(HostSequence::from(out))
    }

    pub fn filter(&self, callback: &Callback, this: &Value) -> Result<HostSequence> {
        let mut out = Vec::new();
        self.walk(|index, element| {
            if self.visit(callback, this, element.clone(), index)?.truthy() {
                out.push(element);
            }
            Ok(true)
        })?;
        Ok(HostSequence::from(out))
    }

    pub fn some(&self, callback: &Callback, this: &Value) -> Result<bool> {
        let mut found = false;
        self.walk(|index, element| {
            found = self.visit(callback, this, element, index)?.truthy();
            Ok(!found)
        })?;
        Ok(found)
    }

    pub fn every(&self, callback: &Callback, this: &Value) -> Result<bool> {
        let mut all = true;
        self.walk(|index, element| {
            all = self.visit(callback, this, element, index)?.truthy();
            Ok(all)
        })?;
        Ok(all)
    }

    pub fn find(&self, callback: &Callback, this: &Value) -> Result<Value> {
        Ok(self.find_entry(callback, this)?.map(|(_, element)| element).unwrap_or_default())
    }

    pub fn find_index(&self, callback: &Callback, this: &Value) -> Result<Option<usize>> {
        Ok(self.find_entry(callback, this)?.map(|(index, _)| index))
    }

    /// Unlike the other walks, indices removed during the search are still
    /// visited and observed as `undefined`.
    fn find_entry(&self, callback: &Callback, this: &Value) -> Result<Option<(usize, Value)>> {
        let len = self.sequence.len();
        for index in 0..len {
            let element = self.sequence.get(index).unwrap_or_default();
            if self.visit(callback, this, element.clone(), index)?.truthy() {
                return Ok(Some((index, element)));
            }
        }
        Ok(None)
    }

    /// Map, then flatten the results one level.
    pub fn flat_map(&self, callback: &Callback, this: &Value) -> Result<HostSequence> {
        let mut out = Vec::new();
        self.walk(|index, element| {
            match self.visit(callback, this, element, index)? {
                Value::Array(seq) => out.extend(seq.to_vec()),
                other => out.push(other),
            }
            Ok(true)
        })?;
        Ok(HostSequence::from(out))
    }

    /// `callback(accumulator, element, index, array)` left to right.
    pub fn reduce(&self, callback: &Callback, initial: Option<Value>) -> Result<Value> {
        let len = self.sequence.len();
        self.fold("reduce", callback, initial, Box::new(0..len))
    }

    /// `callback(accumulator, element, index, array)` right to left.
    pub fn reduce_right(&self, callback: &Callback, initial: Option<Value>) -> Result<Value> {
        let len = self.sequence.len();
        self.fold("reduceRight", callback, initial, Box::new((0..len).rev()))
    }

    fn fold(
        &self,
        method: &str,
        callback: &Callback,
        initial: Option<Value>,
        mut indices: Box<dyn Iterator<Item = usize>>,
    ) -> Result<Value> {
        let mut accumulator = match initial {
            Some(value) => value,
            None => indices
                .next()
                .and_then(|index| self.sequence.get(index))
                .ok_or_else(|| Error::runtime_logic(format!("{method} of empty array with no initial value")))?,
        };
        for index in indices {
            let Some(element) = self.sequence.get(index) else {
                continue;
            };
            accumulator = callback.call(
                self.realm,
                &Value::Undefined,
                &[accumulator, element, Value::from(index), Value::Array(self.sequence.clone())],
            )?;
        }
        Ok(accumulator)
    }

    /// Sort in place. On a comparator error the sequence is left untouched.
    pub fn sort(&self, comparator: Option<&Callback>) -> Result<()> {
        let snapshot = self.sequence.to_vec();
        let sorted = match comparator {
            None => sort::sort_default(snapshot),
            Some(callback) => sort::sort_with(snapshot, |a, b| {
                let result = callback.call(self.realm, &Value::Undefined, &[a.clone(), b.clone()])?;
                Ok(result.to_number())
            })?,
        };

        let mut storage = self.sequence.borrow_mut();
        for (index, value) in sorted.into_iter().enumerate() {
            match storage.get_mut(index) {
                Some(slot) => *slot = value,
                None => storage.push(value),
            }
        }
        Ok(())
    }

    /// Locale-aware join. Locale and options are validated before any
    /// element is formatted, so an invalid tag fails even on an empty array.
    pub fn to_locale_string(&self, locales: &Value, options: &Value) -> Result<String> {
        let locale = match locales {
            Value::Undefined => self.realm.default_locale().to_string(),
            Value::Array(list) => match list.get(0) {
                Some(first) if !first.is_undefined() => first.to_js_string(),
                _ => self.realm.default_locale().to_string(),
            },
            other => other.to_js_string(),
        };
        let options = self.number_format_options(options)?;
        let format = NumberFormat::new(&locale, &options)?;
        tracing::trace!(locale = %format.locale(), "toLocaleString");
        Ok(self.sequence.locale_join(&format))
    }

    fn number_format_options(&self, options: &Value) -> Result<NumberFormatOptions> {
        if options.is_nullish() {
            return Ok(NumberFormatOptions::default());
        }
        let text = |key: &str| -> Result<Option<String>> {
            let value = self.realm.property(options, key)?;
            Ok((!value.is_undefined()).then(|| value.to_js_string()))
        };
        let number = |key: &str| -> Result<Option<f64>> {
            let value = self.realm.property(options, key)?;
            Ok((!value.is_undefined()).then(|| value.to_number()))
        };
        let flag = |key: &str| -> Result<Option<bool>> {
            let value = self.realm.property(options, key)?;
            Ok((!value.is_undefined()).then(|| value.truthy()))
        };
        Ok(NumberFormatOptions {
            style: text("style")?,
            currency: text("currency")?,
            currency_display: text("currencyDisplay")?,
            minimum_fraction_digits: number("minimumFractionDigits")?,
            maximum_fraction_digits: number("maximumFractionDigits")?,
            use_grouping: flag("useGrouping")?,
        })
    }
}
