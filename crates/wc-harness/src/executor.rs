use rquickjs::{
    CatchResultExt, CaughtError, Context, Ctx, Function, Object, Promise, Runtime, Value,
};
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use thiserror::Error;
use wc_core::config::HarnessConfig;
use wc_core::types::{Challenge, HarnessResult, TestCase, TestResult};

#[derive(Debug, Error)]
enum RunError {
    #[error("failed to prepare JavaScript runtime: {0}")]
    Setup(String),
    #[error("Error executing solution: {message}")]
    Load { message: String, trace: String },
}

impl RunError {
    fn into_result(self) -> HarnessResult {
        let message = self.to_string();
        match self {
            Self::Setup(_) => HarnessResult::error(message),
            Self::Load { trace, .. } => HarnessResult::error_with_trace(message, trace),
        }
    }
}

/// Evaluates `code` in a fresh runtime and runs every test case of
/// `challenge` against it, in order.
pub fn execute(challenge: &Challenge, code: &str, limits: &HarnessConfig) -> HarnessResult {
    let started = Instant::now();
    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => return RunError::Setup(err.to_string()).into_result(),
    };
    runtime.set_memory_limit(limits.memory_limit_bytes);
    runtime.set_max_stack_size(limits.max_stack_bytes);
    let ctx = match Context::full(&runtime) {
        Ok(ctx) => ctx,
        Err(err) => return RunError::Setup(err.to_string()).into_result(),
    };

    let timed_out = Arc::new(AtomicBool::new(false));
    let deadline = started + limits.timeout();
    let timed_out_flag = timed_out.clone();
    runtime.set_interrupt_handler(Some(Box::new(move || {
        if Instant::now() >= deadline {
            timed_out_flag.store(true, Ordering::Relaxed);
            true
        } else {
            false
        }
    })));

    let logs: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let logs_handle = logs.clone();
    let outcome = ctx.with(|ctx| {
        let log_fn = Function::new(ctx.clone(), move |message: String| {
            logs_handle.borrow_mut().push(message);
        })
        .map_err(setup_error)?;
        ctx.globals().set("__wc_log", log_fn).map_err(setup_error)?;

        // Grab the helpers before candidate code can touch any global.
        let helpers: Object = ctx.eval(BOOTSTRAP).map_err(setup_error)?;
        let invoke: Function = helpers.get("invoke").map_err(setup_error)?;
        let stringify: Function = helpers.get("stringify").map_err(setup_error)?;

        ctx.eval::<(), _>(code)
            .catch(&ctx)
            .map_err(|caught| {
                let (message, trace) = describe(&caught);
                RunError::Load {
                    trace: trace.unwrap_or_else(|| message.clone()),
                    message,
                }
            })?;

        let mut results = Vec::with_capacity(challenge.test_cases.len());
        for case in &challenge.test_cases {
            results.push(run_case(&ctx, &invoke, &stringify, case));
            if timed_out.load(Ordering::Relaxed) {
                break;
            }
        }
        Ok::<_, RunError>(results)
    });

    let captured = logs.borrow();
    if !captured.is_empty() {
        tracing::debug!(
            challenge = %challenge.name,
            lines = captured.len(),
            output = %captured.join("\n"),
            "candidate console output"
        );
    }

    if timed_out.load(Ordering::Relaxed) {
        tracing::info!(challenge = %challenge.name, timeout_ms = limits.timeout_ms, "harness run timed out");
        return HarnessResult::error(format!(
            "execution timed out after {} ms",
            limits.timeout_ms
        ));
    }

    match outcome {
        Ok(results) => {
            let result = HarnessResult::from_results(results);
            tracing::info!(
                challenge = %challenge.name,
                all_passed = result.all_passed(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "harness run finished"
            );
            result
        }
        Err(err) => {
            tracing::info!(challenge = %challenge.name, error = %err, "candidate code failed to load");
            err.into_result()
        }
    }
}

fn run_case<'js>(
    ctx: &Ctx<'js>,
    invoke: &Function<'js>,
    stringify: &Function<'js>,
    case: &TestCase,
) -> TestResult {
    if !is_identifier(&case.function) {
        return TestResult::errored(
            case,
            format!("'{}' is not a valid function name", case.function),
        );
    }
    let input = match serde_json::to_string(&case.input) {
        Ok(input) => input,
        Err(err) => return TestResult::errored(case, err.to_string()),
    };
    let value = invoke
        .call::<_, Value>((case.function.as_str(), input, case.is_keyword_call()))
        .and_then(settle)
        .catch(ctx);
    let value = match value {
        Ok(value) => value,
        Err(caught) => return TestResult::errored(case, describe(&caught).0),
    };
    match to_json(stringify, value).catch(ctx) {
        Ok(Ok(actual)) => TestResult::evaluated(case, actual),
        Ok(Err(message)) => TestResult::errored(case, message),
        Err(caught) => TestResult::errored(case, describe(&caught).0),
    }
}

/// Async solutions return a promise; drive it to completion.
fn settle(value: Value<'_>) -> rquickjs::Result<Value<'_>> {
    if value.is_promise() {
        let promise = Promise::from_value(value)?;
        promise.finish::<Value>()
    } else {
        Ok(value)
    }
}

fn to_json<'js>(
    stringify: &Function<'js>,
    value: Value<'js>,
) -> rquickjs::Result<Result<JsonValue, String>> {
    let json: Value = stringify.call((value,))?;
    if json.is_null() || json.is_undefined() {
        return Ok(Ok(JsonValue::Null));
    }
    let Some(text) = json.as_string() else {
        return Ok(Err("return value is not JSON serializable".to_string()));
    };
    let text = text.to_string()?;
    Ok(serde_json::from_str(&text).map_err(|err| err.to_string()))
}

/// Returns the message and, for `Error` objects, the stack trace.
fn describe(caught: &CaughtError<'_>) -> (String, Option<String>) {
    match caught {
        CaughtError::Exception(exception) => {
            let message = exception
                .message()
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| caught.to_string());
            (message, exception.stack())
        }
        CaughtError::Value(_) | CaughtError::Error(_) => (caught.to_string(), None),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn setup_error(err: rquickjs::Error) -> RunError {
    RunError::Setup(err.to_string())
}

// `invoke` resolves the callable through indirect eval so both function
// declarations and top-level `const` bindings are found. Mapping inputs are
// bound to the function's declared parameter names.
const BOOTSTRAP: &str = r#"
globalThis.console = {
  log: (...args) => {
    const msg = args
      .map((value) => {
        if (typeof value === "string") return value;
        try { return JSON.stringify(value); } catch { return String(value); }
      })
      .join(" ");
    __wc_log(msg);
  }
};
globalThis.console.error = globalThis.console.log;
globalThis.console.warn = globalThis.console.log;

(() => {
  const parse = JSON.parse;
  const stringify = JSON.stringify;
  const globalEval = eval;
  const toSource = Function.prototype.toString;

  const resolve = (name) => {
    let fn;
    try {
      fn = globalEval(name);
    } catch {
      fn = undefined;
    }
    if (typeof fn !== "function") {
      throw new ReferenceError(`function '${name}' is not defined`);
    }
    return fn;
  };

  // Splits the declared parameter list on top-level commas. Nested
  // brackets, string and template literals, and comments are skipped so
  // defaults like `b = Math.max(1, 2)` stay in one piece.
  const paramNames = (fn) => {
    const source = toSource.call(fn);
    const arrow = /^\s*(?:async\s*)?([A-Za-z_$][\w$]*)\s*=>/.exec(source);
    if (arrow) return [arrow[1]];
    const open = source.indexOf("(");
    if (open < 0) return [];

    const parts = [];
    let current = "";
    let depth = 0;
    let i = open + 1;
    while (i < source.length) {
      const ch = source[i];
      const next = source[i + 1];
      if (ch === "/" && next === "*") {
        const end = source.indexOf("*/", i + 2);
        i = end < 0 ? source.length : end + 2;
        continue;
      }
      if (ch === "/" && next === "/") {
        const end = source.indexOf("\n", i + 2);
        i = end < 0 ? source.length : end + 1;
        continue;
      }
      if (ch === "'" || ch === '"' || ch === "`") {
        let j = i + 1;
        while (j < source.length && source[j] !== ch) {
          j += source[j] === "\\" ? 2 : 1;
        }
        current += source.slice(i, j + 1);
        i = j + 1;
        continue;
      }
      if (ch === "(" || ch === "[" || ch === "{") {
        depth += 1;
      } else if (ch === ")" || ch === "]" || ch === "}") {
        if (depth === 0) break;
        depth -= 1;
      } else if (ch === "," && depth === 0) {
        parts.push(current);
        current = "";
        i += 1;
        continue;
      }
      current += ch;
      i += 1;
    }
    parts.push(current);
    return parts
      .map((part) => part.split("=")[0].trim())
      .filter((part) => part.length > 0 && !part.startsWith("..."));
  };

  const invoke = (name, inputJson, keyed) => {
    const fn = resolve(name);
    const input = parse(inputJson);
    if (!keyed) return fn(input);
    const names = paramNames(fn);
    for (const key of Object.keys(input)) {
      if (!names.includes(key)) {
        throw new TypeError(`${name}() got an unexpected keyword argument '${key}'`);
      }
    }
    return fn(...names.map((param) => input[param]));
  };

  return { invoke, stringify };
})()
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(function: &str, description: &str, input: JsonValue, expected: JsonValue) -> TestCase {
        TestCase {
            function: function.to_string(),
            description: description.to_string(),
            input,
            expected,
        }
    }

    fn sorting() -> Challenge {
        Challenge {
            name: "sorting".to_string(),
            description: "Sort numbers ascending.".to_string(),
            starter_code: "function sortList(numbers) {}".to_string(),
            test_cases: vec![
                case("sortList", "basic", json!([3, 1, 2]), json!([1, 2, 3])),
                case("sortList", "empty", json!([]), json!([])),
                case("sortList", "keyword", json!({"numbers": [5, 4]}), json!([4, 5])),
            ],
        }
    }

    fn limits() -> HarnessConfig {
        HarnessConfig {
            timeout_ms: 2_000,
            ..HarnessConfig::default()
        }
    }

    #[test]
    fn correct_solution_passes_every_case() {
        let code = "function sortList(numbers) { return [...numbers].sort((a, b) => a - b); }";
        let result = execute(&sorting(), code, &limits());
        assert!(result.all_passed(), "{result:?}");
        assert_eq!(result.test_results().len(), 3);
        assert!(result.test_results().iter().all(|r| r.passed && r.error.is_none()));
    }

    #[test]
    fn const_arrow_functions_resolve() {
        let code = "const sortList = (numbers) => numbers.slice().sort((a, b) => a - b);";
        assert!(execute(&sorting(), code, &limits()).all_passed());
    }

    #[test]
    fn throwing_case_is_isolated() {
        let code = r#"
function sortList(numbers) {
  if (numbers.length === 0) throw new Error("empty input");
  return [...numbers].sort((a, b) => a - b);
}
"#;
        let result = execute(&sorting(), code, &limits());
        assert!(!result.all_passed());
        let results = result.test_results();
        assert_eq!(results.len(), 3);
        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert_eq!(results[1].error.as_deref(), Some("empty input"));
        assert!(results[1].actual.is_none());
        assert!(results[2].passed);
    }

    #[test]
    fn wrong_answers_fail_on_their_own_merits() {
        let code = "function sortList(numbers) { return numbers; }";
        let result = execute(&sorting(), code, &limits());
        let passed: Vec<bool> = result.test_results().iter().map(|r| r.passed).collect();
        assert_eq!(passed, vec![false, true, false]);
        assert_eq!(result.test_results()[0].actual, Some(json!([3, 1, 2])));
        assert!(result.test_results()[0].error.is_none());
    }

    #[test]
    fn missing_function_is_a_per_test_error() {
        let result = execute(&sorting(), "function other() {}", &limits());
        assert!(!result.all_passed());
        for test in result.test_results() {
            assert!(!test.passed);
            assert!(test.error.as_deref().unwrap().contains("sortList"));
        }
    }

    #[test]
    fn syntax_error_is_batch_fatal() {
        let result = execute(&sorting(), "function sortList(numbers { return 1; }", &limits());
        match result {
            HarnessResult::Failed { error, trace } => {
                assert!(error.starts_with("Error executing solution"));
                assert!(trace.is_some());
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn top_level_throw_is_batch_fatal() {
        let result = execute(&sorting(), "throw new Error('nope');", &limits());
        assert!(matches!(result, HarnessResult::Failed { ref error, .. } if error.contains("nope")));
        assert!(result.test_results().is_empty());
    }

    #[test]
    fn unexpected_keyword_is_reported() {
        let code = "function sortList(values) { return values; }";
        let result = execute(&sorting(), code, &limits());
        let keyword = &result.test_results()[2];
        assert!(!keyword.passed);
        assert!(keyword.error.as_deref().unwrap().contains("numbers"));
    }

    #[test]
    fn keyword_inputs_bind_by_name_not_position() {
        let challenge = Challenge {
            name: "bfs".to_string(),
            description: String::new(),
            starter_code: String::new(),
            test_cases: vec![case(
                "pair",
                "named",
                json!({"second": 2, "first": 1}),
                json!([1, 2]),
            )],
        };
        let code = "function pair(first, second = 0 /* fallback */) { return [first, second]; }";
        assert!(execute(&challenge, code, &limits()).all_passed());
    }

    fn triple(input: serde_json::Value, expected: serde_json::Value) -> Challenge {
        Challenge {
            name: "defaults".to_string(),
            description: String::new(),
            starter_code: String::new(),
            test_cases: vec![case("f", "named", input, expected)],
        }
    }

    #[test]
    fn default_with_nested_commas_keeps_parameter_names() {
        let challenge = triple(json!({"a": 1, "b": 5, "c": 3}), json!([1, 5, 3]));
        let code = "function f(a, b = Math.max(1, 2), c) { return [a, b, c]; }";
        let summary = execute(&challenge, code, &limits());
        assert!(summary.all_passed(), "{summary:?}");
    }

    #[test]
    fn parenthesised_comment_does_not_end_parameter_list() {
        let challenge = triple(json!({"a": 1, "b": 2}), json!([1, 2]));
        let code = "function f(a /* see (1) */, b) { return [a, b]; }";
        let summary = execute(&challenge, code, &limits());
        assert!(summary.all_passed(), "{summary:?}");
    }

    #[test]
    fn string_default_with_delimiters_keeps_parameter_names() {
        let challenge = triple(json!({"a": "x", "b": 2}), json!(["x", 2]));
        let code = r#"function f(a = ")", b = [1, 2]) { return [a, b]; }"#;
        let summary = execute(&challenge, code, &limits());
        assert!(summary.all_passed(), "{summary:?}");
    }

    #[test]
    fn graph_traversal_solution_passes() {
        let challenge = Challenge {
            name: "bfs".to_string(),
            description: String::new(),
            starter_code: String::new(),
            test_cases: vec![case(
                "bfsTraversal",
                "connected graph from node 2",
                json!({"graph": {"0": [2, 1], "1": [0, 3], "2": [0, 3], "3": [1, 2]}, "source": 2}),
                json!([2, 0, 3, 1]),
            )],
        };
        let code = r#"
function bfsTraversal(graph, source) {
  const seen = new Set([source]);
  const queue = [source];
  const order = [];
  while (queue.length > 0) {
    const node = queue.shift();
    order.push(node);
    for (const next of graph[node] || []) {
      if (!seen.has(next)) {
        seen.add(next);
        queue.push(next);
      }
    }
  }
  return order;
}
"#;
        let result = execute(&challenge, code, &limits());
        assert!(result.all_passed(), "{result:?}");
    }

    #[test]
    fn async_solutions_are_awaited() {
        let code = "async function sortList(numbers) { return [...numbers].sort((a, b) => a - b); }";
        assert!(execute(&sorting(), code, &limits()).all_passed());
    }

    #[test]
    fn undefined_return_is_null() {
        let result = execute(&sorting(), "function sortList(numbers) {}", &limits());
        assert_eq!(result.test_results()[0].actual, Some(JsonValue::Null));
        assert!(!result.test_results()[0].passed);
    }

    #[test]
    fn infinite_loop_hits_the_deadline() {
        let limits = HarnessConfig {
            timeout_ms: 200,
            ..HarnessConfig::default()
        };
        let started = Instant::now();
        let result = execute(&sorting(), "function sortList(n) { while (true) {} }", &limits);
        assert!(started.elapsed().as_secs() < 5);
        match result {
            HarnessResult::Failed { error, trace } => {
                assert!(error.contains("timed out"));
                assert!(trace.is_none());
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn runaway_allocation_is_contained() {
        let limits = HarnessConfig {
            memory_limit_bytes: 8 * 1024 * 1024,
            ..limits()
        };
        let code = "const hoard = []; while (true) { hoard.push(new Array(100000).fill(7)); }";
        let result = execute(&sorting(), code, &limits);
        assert!(matches!(result, HarnessResult::Failed { .. }), "{result:?}");
    }

    #[test]
    fn runaway_recursion_only_fails_its_case() {
        let code = r#"
function sortList(numbers) {
  if (numbers.length === 0) return sortList(numbers);
  return [...numbers].sort((a, b) => a - b);
}
"#;
        let result = execute(&sorting(), code, &limits());
        let results = result.test_results();
        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert!(results[1].error.is_some());
        assert!(results[2].passed);
    }

    #[test]
    fn runs_do_not_share_globals() {
        let first = "var leaked = 1; function sortList(n) { return n; }";
        execute(&sorting(), first, &limits());
        let second = "function sortList(n) { return typeof leaked === 'undefined' ? [] : n; }";
        let result = execute(&sorting(), second, &limits());
        assert_eq!(result.test_results()[0].actual, Some(json!([])));
    }

    #[test]
    fn identifiers_are_validated() {
        assert!(is_identifier("sortList"));
        assert!(is_identifier("_private$"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier("while(true){}"));
        assert!(!is_identifier(""));
    }
}
