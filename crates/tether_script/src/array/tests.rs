//! Script-level behaviour of host sequences seen as Arrays.

use crate::config::EngineConfig;
use crate::error::Error;
use crate::runtime::ScriptRuntime;
use crate::value::{HostSequence, Value};

fn numbers(values: &[f64]) -> Vec<Value> {
    values.iter().copied().map(Value::from).collect()
}

fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().copied().map(Value::from).collect()
}

/// A runtime with `items` installed as the global `xs`.
fn runtime_with(items: Vec<Value>) -> (ScriptRuntime, HostSequence) {
    let script = ScriptRuntime::new().unwrap();
    let sequence = HostSequence::from(items);
    script.set_global("xs", sequence.clone()).unwrap();
    (script, sequence)
}

fn text(script: &ScriptRuntime, source: &str) -> String {
    script.execute(source).unwrap().to_js_string()
}

// ============================================================================
// IDENTITY AND LIVENESS
// ============================================================================

#[test]
fn test_proxy_identity_is_stable() {
    let (script, sequence) = runtime_with(numbers(&[1.0, 2.0]));
    let first = script.create_array_proxy(&sequence).unwrap();
    let second = script.create_array_proxy(&sequence).unwrap();
    assert_eq!(first, second);
    assert!(first.sequence().ptr_eq(&sequence));

    script.set_global("again", sequence.clone()).unwrap();
    assert_eq!(script.execute("again === xs").unwrap(), Value::Boolean(true));
    match script.global("xs").unwrap() {
        Value::Array(back) => assert!(back.ptr_eq(&sequence)),
        other => panic!("expected the host sequence, got {other:?}"),
    }
}

#[test]
fn test_script_mutation_visible_to_host() {
    let (script, sequence) = runtime_with(numbers(&[1.0, 2.0, 3.0]));
    assert_eq!(script.execute("xs.push(4, 5)").unwrap(), Value::from(5));
    assert_eq!(sequence.to_vec(), numbers(&[1.0, 2.0, 3.0, 4.0, 5.0]));

    script.execute("xs[0] = 'first'; xs[7] = 8;").unwrap();
    assert_eq!(sequence.len(), 8);
    assert_eq!(sequence.get(0), Some(Value::from("first")));
    assert_eq!(sequence.get(6), Some(Value::Undefined));

    script.execute("delete xs[1];").unwrap();
    assert_eq!(sequence.len(), 8);
    assert_eq!(sequence.get(1), Some(Value::Undefined));

    script.execute("xs.length = 2;").unwrap();
    assert_eq!(sequence.len(), 2);
}

#[test]
fn test_host_mutation_visible_to_script() {
    let (script, sequence) = runtime_with(numbers(&[1.0]));
    sequence.push(Value::from(2));
    sequence.push(Value::from(3));
    assert_eq!(script.execute("xs.length").unwrap(), Value::from(3));
    assert_eq!(script.execute("xs[2]").unwrap(), Value::from(3));
    assert_eq!(script.execute("xs[9]").unwrap(), Value::Undefined);
}

#[test]
fn test_invalid_length_is_range_error() {
    let (script, sequence) = runtime_with(numbers(&[1.0]));
    let err = script.execute("xs.length = -1").unwrap_err();
    assert_eq!(err.to_string(), "RangeError: invalid array length");
    assert_eq!(sequence.len(), 1);
    assert_eq!(
        text(&script, "try { xs.length = 1.5; 'ok' } catch (e) { e instanceof RangeError }"),
        "true"
    );
}

#[test]
fn test_script_arrays_are_copied_into_host() {
    let (script, sequence) = runtime_with(Vec::new());
    assert_eq!(text(&script, "var native = [1]; xs.push(native); native.push(2); xs[0].length"), "1");
    assert_eq!(script.execute("xs[0] === native").unwrap(), Value::Boolean(false));
    assert_eq!(sequence.get(0), Some(Value::from(numbers(&[1.0]))));
}

#[test]
fn test_huge_index_and_length_are_range_errors() {
    let (script, sequence) = runtime_with(numbers(&[1.0]));
    let err = script.execute("xs[4294967290] = 1").unwrap_err();
    assert_eq!(err.to_string(), "RangeError: invalid array length");
    let err = script.execute("xs.length = 4294967295").unwrap_err();
    assert_eq!(err.to_string(), "RangeError: invalid array length");
    assert_eq!(sequence.len(), 1);

    let err = script.execute("const huge = []; huge.length = 4294967295; huge").unwrap_err();
    assert_eq!(err.to_string(), "RangeError: invalid array length");
}

#[test]
fn test_array_length_cap_is_configurable() {
    let config = EngineConfig { max_array_length: 8, ..Default::default() };
    let script = ScriptRuntime::with_config(config).unwrap();
    let sequence = HostSequence::new();
    script.set_global("xs", sequence.clone()).unwrap();

    script.execute("xs[7] = 'last'").unwrap();
    assert_eq!(sequence.len(), 8);
    assert_eq!(script.execute("xs.length = 8; xs.length").unwrap(), Value::from(8));
    assert!(script.execute("xs[8] = 1").is_err());
    assert!(script.execute("xs.length = 9").is_err());
    assert_eq!(sequence.len(), 8);

    let err = script.execute("new Array(9).fill(0)").unwrap_err();
    assert_eq!(err.script_name(), "RangeError");
    assert_eq!(script.execute("[1, 2]").unwrap(), Value::from(numbers(&[1.0, 2.0])));
}

#[test]
fn test_proxy_looks_like_an_array() {
    let (script, _sequence) = runtime_with(numbers(&[1.0, 2.0, 3.0]));
    assert_eq!(script.execute("Array.isArray(xs)").unwrap(), Value::Boolean(true));
    assert_eq!(text(&script, "JSON.stringify(xs)"), "[1,2,3]");
    assert_eq!(text(&script, "Object.keys(xs).join('|')"), "0|1|2");
    assert_eq!(script.execute("1 in xs && !(3 in xs)").unwrap(), Value::Boolean(true));
    assert_eq!(text(&script, "let s = 0; for (const x of xs) s += x; s"), "6");
    assert_eq!(text(&script, "[...xs, 4].join()"), "1,2,3,4");
    assert_eq!(script.execute("xs.valueOf() === xs").unwrap(), Value::Boolean(true));
    // Methods served by the engine still work through the traps.
    assert_eq!(script.execute("xs.at(-1)").unwrap(), Value::from(3));
}

// ============================================================================
// COPIES AND IN-PLACE EDITS
// ============================================================================

#[test]
fn test_copy_producing_methods_are_isolated() {
    let (script, sequence) = runtime_with(numbers(&[1.0, 2.0, 3.0]));
    for source in [
        "xs.slice()",
        "xs.concat([])",
        "xs.filter(() => true)",
        "xs.map((x) => x)",
        "xs.flat()",
        "xs.flatMap((x) => [x])",
    ] {
        let copy = script.execute(&format!("(() => {{ const c = {source}; c.push(9); return c; }})()")).unwrap();
        let Value::Array(copy) = copy else {
            panic!("{source} did not return an array");
        };
        assert!(!copy.ptr_eq(&sequence), "{source} returned the original");
        assert_eq!(copy.len(), 4, "{source}");
        assert_eq!(sequence.len(), 3, "{source} changed the original");
        script.execute("xs.length = 3;").unwrap();
    }
}

#[test]
fn test_splice_removes_and_inserts() {
    let (script, sequence) = runtime_with(numbers(&[1.0, 2.0, 3.0]));
    let removed = script.execute("xs.splice(1, 2, 5)").unwrap();
    assert_eq!(sequence.to_vec(), numbers(&[1.0, 5.0]));
    let Value::Array(removed) = removed else {
        panic!("splice did not return an array");
    };
    assert_eq!(removed.to_vec(), numbers(&[2.0, 3.0]));
    assert!(!removed.ptr_eq(&sequence));

    assert_eq!(text(&script, "xs.splice().length"), "0");
    assert_eq!(text(&script, "xs.splice(-1).join()"), "5");
    assert_eq!(sequence.to_vec(), numbers(&[1.0]));
}

#[test]
fn test_in_place_methods_return_self() {
    let (script, sequence) = runtime_with(numbers(&[1.0, 2.0, 3.0, 4.0]));
    assert_eq!(script.execute("xs.reverse() === xs").unwrap(), Value::Boolean(true));
    assert_eq!(sequence.to_vec(), numbers(&[4.0, 3.0, 2.0, 1.0]));
    assert_eq!(script.execute("xs.fill(0, 2) === xs").unwrap(), Value::Boolean(true));
    assert_eq!(sequence.to_vec(), numbers(&[4.0, 3.0, 0.0, 0.0]));
    assert_eq!(script.execute("xs.copyWithin(2, 0) === xs").unwrap(), Value::Boolean(true));
    assert_eq!(sequence.to_vec(), numbers(&[4.0, 3.0, 4.0, 3.0]));
    assert_eq!(script.execute("xs.pop()").unwrap(), Value::from(3));
    assert_eq!(script.execute("xs.shift()").unwrap(), Value::from(4));
    assert_eq!(script.execute("xs.unshift(7, 8)").unwrap(), Value::from(4));
    assert_eq!(sequence.to_vec(), numbers(&[7.0, 8.0, 3.0, 4.0]));
}

#[test]
fn test_sort() {
    let (script, sequence) = runtime_with(Vec::new());
    assert_eq!(script.execute("xs.sort() === xs").unwrap(), Value::Boolean(true));
    assert!(sequence.is_empty());

    sequence.borrow_mut().extend(strings(&["Four", "Three", "One"]));
    script.execute("xs.sort()").unwrap();
    assert_eq!(sequence.to_vec(), strings(&["Four", "One", "Three"]));

    script.execute("xs.sort((a, b) => a.length - b.length)").unwrap();
    assert_eq!(sequence.to_vec(), strings(&["One", "Four", "Three"]));
}

#[test]
fn test_sort_errors_leave_sequence_unchanged() {
    let (script, sequence) = runtime_with(numbers(&[3.0, 1.0, 2.0]));
    let err = script.execute("xs.sort(5)").unwrap_err();
    assert!(err.to_string().contains("sort: callback is not a function"), "{err}");

    let err = script.execute("xs.sort(() => { throw new Error('boom'); })").unwrap_err();
    assert_eq!(err.message(), "boom");
    assert_eq!(sequence.to_vec(), numbers(&[3.0, 1.0, 2.0]));
}

#[test]
fn test_flat_depths() {
    let innermost = HostSequence::from(numbers(&[4.0]));
    let inner = HostSequence::from(vec![Value::from(3), Value::from(innermost)]);
    let middle = HostSequence::from(vec![Value::from(2), Value::from(inner)]);
    let (script, _sequence) = runtime_with(vec![Value::from(1), Value::from(middle)]);

    assert_eq!(text(&script, "JSON.stringify(xs.flat(0))"), "[1,[2,[3,[4]]]]");
    assert_eq!(text(&script, "JSON.stringify(xs.flat(1))"), "[1,2,[3,[4]]]");
    assert_eq!(text(&script, "JSON.stringify(xs.flat())"), "[1,2,[3,[4]]]");
    assert_eq!(text(&script, "JSON.stringify(xs.flat(10))"), "[1,2,3,4]");
    assert_eq!(text(&script, "JSON.stringify(xs.flat(-1))"), "[1,[2,[3,[4]]]]");
    assert_eq!(text(&script, "JSON.stringify(xs.flat(NaN))"), "[1,[2,[3,[4]]]]");
    assert_eq!(text(&script, "JSON.stringify(xs.flat(-Infinity))"), "[1,[2,[3,[4]]]]");
    assert_eq!(text(&script, "xs.flat(-1) !== xs"), "true");
}

// ============================================================================
// SEARCH AND STRINGS
// ============================================================================

#[test]
fn test_search_methods() {
    let (script, _sequence) = runtime_with(numbers(&[1.0, 2.0, 3.0, f64::NAN]));
    assert_eq!(script.execute("xs.indexOf(3, -2)").unwrap(), Value::from(2));
    assert_eq!(script.execute("xs.indexOf(9)").unwrap(), Value::from(-1));
    assert_eq!(script.execute("xs.indexOf(NaN)").unwrap(), Value::from(-1));
    assert_eq!(script.execute("xs.includes(NaN)").unwrap(), Value::Boolean(true));
    assert_eq!(script.execute("xs.lastIndexOf(1)").unwrap(), Value::from(0));

    let err = script.execute("xs.includes()").unwrap_err();
    assert!(matches!(err, Error::Argument { .. }), "{err:?}");
    assert!(err.to_string().contains("At least 1 argument required, but only 0 passed"), "{err}");
}

#[test]
fn test_join_and_to_string() {
    let nested = HostSequence::from(numbers(&[2.0, 3.0]));
    let (script, _sequence) =
        runtime_with(vec![Value::from(1), Value::Null, Value::from(nested), Value::Undefined]);
    assert_eq!(text(&script, "xs.join()"), "1,,2,3,");
    assert_eq!(text(&script, "xs.join(' - ')"), "1 -  - 2,3 - ");
    assert_eq!(text(&script, "String(xs)"), "1,,2,3,");
}

#[test]
fn test_to_locale_string() {
    let (script, sequence) = runtime_with(vec![Value::from(8123), Value::from("a"), Value::Null]);
    assert_eq!(text(&script, "xs.toLocaleString()"), "8,123,a,");
    assert_eq!(text(&script, "xs.toLocaleString('de-DE')"), "8.123,a,");
    assert_eq!(text(&script, "xs.toLocaleString(['es'])"), "8123,a,");

    sequence.set_length(0).unwrap();
    sequence.push(Value::from(1234.5));
    assert_eq!(
        text(&script, "xs.toLocaleString('de-DE', { style: 'currency', currency: 'EUR' })"),
        "1.234,50\u{a0}€"
    );

    let err = script.execute("xs.toLocaleString('not a tag')").unwrap_err();
    assert!(err.to_string().contains("invalid language tag"), "{err}");
    let err = script
        .execute("xs.toLocaleString('en', { style: 'currency', currency: 'EU' })")
        .unwrap_err();
    assert!(err.to_string().contains("invalid currency code"), "{err}");
    assert_eq!(err.script_name(), "RangeError");
}

// ============================================================================
// CALLBACK METHODS
// ============================================================================

#[test]
fn test_callback_methods() {
    let (script, _sequence) = runtime_with(numbers(&[1.0, 2.0, 3.0]));
    assert_eq!(text(&script, "xs.map((x, i) => x * 10 + i).join()"), "10,21,32");
    assert_eq!(text(&script, "xs.filter((x) => x % 2).join()"), "1,3");
    assert_eq!(script.execute("xs.some((x) => x > 2)").unwrap(), Value::Boolean(true));
    assert_eq!(script.execute("xs.every((x) => x > 2)").unwrap(), Value::Boolean(false));
    assert_eq!(script.execute("xs.find((x) => x > 1)").unwrap(), Value::from(2));
    assert_eq!(script.execute("xs.find((x) => x > 5)").unwrap(), Value::Undefined);
    assert_eq!(script.execute("xs.findIndex((x) => x === 3)").unwrap(), Value::from(2));
    assert_eq!(script.execute("xs.findIndex((x) => x === 7)").unwrap(), Value::from(-1));
    assert_eq!(text(&script, "xs.flatMap((x) => [x, x]).join()"), "1,1,2,2,3,3");
    assert_eq!(script.execute("xs.map((x, i, a) => a === xs).every(Boolean)").unwrap(), Value::Boolean(true));
    assert_eq!(
        text(&script, "let seen = []; xs.forEach((x) => seen.push(x)); seen.join()"),
        "1,2,3"
    );
}

#[test]
fn test_callback_this_binding() {
    let (script, _sequence) = runtime_with(numbers(&[1.0, 2.0]));
    assert_eq!(
        text(&script, "xs.map(function (x) { return x + this.k; }, { k: 10 }).join()"),
        "11,12"
    );
    assert_eq!(
        text(&script, "try { xs.forEach((x) => x, null); 'called' } catch (e) { e.message }"),
        "forEach: this is null"
    );
    let err = script.execute("xs.map((x) => x, null)").unwrap_err();
    assert!(matches!(err, Error::RuntimeLogic { .. }), "{err:?}");
}

#[test]
fn test_callback_not_a_function() {
    let (script, _sequence) = runtime_with(numbers(&[1.0]));
    let err = script.execute("xs.forEach(5)").unwrap_err();
    assert_eq!(err.to_string(), "TypeError: forEach: callback is not a function");
    let err = script.execute("xs.map()").unwrap_err();
    assert!(err.to_string().contains("map: At least 1 argument required, but only 0 passed"), "{err}");
}

#[test]
fn test_reduce() {
    let (script, sequence) = runtime_with(Vec::new());
    let err = script.execute("xs.reduce((a, b) => a + b)").unwrap_err();
    assert!(err.to_string().contains("reduce of empty array with no initial value"), "{err}");
    assert_eq!(script.execute("xs.reduce((a, b) => a + b, 7)").unwrap(), Value::from(7));
    assert_eq!(
        text(&script, "try { xs.reduceRight((a, b) => a + b) } catch (e) { e instanceof TypeError }"),
        "true"
    );

    sequence.push(Value::from(1));
    assert_eq!(
        script.execute("xs.reduce(() => { throw new Error('called'); })").unwrap(),
        Value::from(1)
    );

    sequence.push(Value::from("b"));
    sequence.push(Value::from("c"));
    assert_eq!(text(&script, "xs.reduce((a, b) => a + b)"), "1bc");
    assert_eq!(text(&script, "xs.reduceRight((a, b) => a + b)"), "cb1");
    assert_eq!(script.execute("xs.reduce((a, b) => a, null)").unwrap(), Value::Null);
}

#[test]
fn test_reduce_right_single_element_skips_callback() {
    let (script, _sequence) = runtime_with(numbers(&[5.0]));
    assert_eq!(
        script.execute("xs.reduceRight(() => { throw new Error('called'); })").unwrap(),
        Value::from(5)
    );
}

#[test]
fn test_callback_sees_live_mutation() {
    let (script, sequence) = runtime_with(numbers(&[1.0, 2.0, 3.0]));
    // The length is fixed when iteration starts; removed indices end the walk.
    assert_eq!(
        text(&script, "let n = 0; xs.forEach((x) => { n += 1; xs.push(x); }); n"),
        "3"
    );
    assert_eq!(sequence.len(), 6);
    assert_eq!(
        text(&script, "let m = 0; xs.forEach(() => { m += 1; xs.length = 1; }); m"),
        "1"
    );
}

#[test]
fn test_find_visits_removed_indices_as_undefined() {
    let (script, sequence) = runtime_with(numbers(&[1.0, 2.0, 3.0, 4.0]));
    let seen = text(
        &script,
        "(() => {
            const seen = [];
            xs.find((x, i) => { if (i === 0) xs.length = 2; seen.push(String(x)); return false; });
            return seen.join();
        })()",
    );
    assert_eq!(seen, "1,2,undefined,undefined");
    assert_eq!(sequence.len(), 2);

    sequence.push(Value::from(3));
    sequence.push(Value::from(4));
    assert_eq!(
        script.execute("xs.findIndex((x, i) => { if (i === 0) xs.length = 1; return x === undefined; })").unwrap(),
        Value::from(1)
    );
    assert_eq!(sequence.len(), 1);
}

// ============================================================================
// ITERATION
// ============================================================================

#[test]
fn test_iterator_protocol_is_sticky() {
    let (script, _sequence) = runtime_with(numbers(&[1.0, 2.0]));
    let steps = text(
        &script,
        "const it = xs[Symbol.iterator]();
         const out = [it.next(), it.next(), it.next()];
         xs.push(3);
         out.push(it.next());
         out.map((r) => r.done + ':' + r.value).join('|')",
    );
    assert_eq!(steps, "false:1|false:2|true:undefined|true:undefined");
    assert_eq!(script.execute("it[Symbol.iterator]() === it").unwrap(), Value::Boolean(true));
}

#[test]
fn test_keys_and_entries() {
    let (script, _sequence) = runtime_with(strings(&["a", "b"]));
    assert_eq!(text(&script, "[...xs.keys()].join()"), "0,1");
    assert_eq!(text(&script, "[...xs.values()].join()"), "a,b");
    assert_eq!(text(&script, "Array.from(xs.entries()).join('|')"), "0,a|1,b");
}

#[test]
fn test_keys_follow_live_length() {
    let (script, sequence) = runtime_with(strings(&["a", "b"]));
    let keys = text(&script, "var grow = xs.keys(); grow.next(); xs.push('c'); [...grow].join()");
    assert_eq!(keys, "1,2");
    assert_eq!(sequence.len(), 3);

    let done = text(&script, "var shrink = xs.keys(); shrink.next(); xs.length = 1; shrink.next().done");
    assert_eq!(done, "true");
}

#[test]
fn test_empty_iterator_is_done() {
    let (script, _sequence) = runtime_with(Vec::new());
    let step = text(&script, "(() => { const r = xs[Symbol.iterator]().next(); return r.done + ':' + r.value; })()");
    assert_eq!(step, "true:undefined");
    assert_eq!(text(&script, "[...xs].length"), "0");
}

#[test]
fn test_runtime_teardown_with_script_objects_in_sequence() {
    let sequence = HostSequence::new();
    {
        let script = ScriptRuntime::new().unwrap();
        script.set_global("xs", sequence.clone()).unwrap();
        script.execute("xs.push({ parent: xs }, { a: 1 }, () => xs.length);").unwrap();
    }
    assert_eq!(sequence.len(), 3);
    assert!(sequence.get(1).unwrap().as_object().is_some());
    assert!(sequence.get(2).unwrap().as_function().is_some());
}

#[test]
fn test_missing_member_is_engine_error() {
    let (script, _sequence) = runtime_with(numbers(&[1.0]));
    let err = script.execute("xs.nope()").unwrap_err();
    assert!(matches!(err, Error::EngineRuntime(_)), "{err:?}");
    assert!(err.to_string().contains("is not a function"), "{err}");
    assert_eq!(script.execute("xs.nope").unwrap(), Value::Undefined);
}
