//! In-process evaluation with `boa_engine`. Only the worker process calls
//! this; the server never evaluates student code in its own address space.

use std::time::{Duration, Instant};

use boa_engine::{Context, JsError, Source};
use serde::{Deserialize, Serialize};

use super::{console, normalize_fault_message};

/// Limits the engine enforces by itself, without help from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    pub loop_iteration_limit: u64,
    pub recursion_limit: usize,
    pub max_output_chars: usize,
}

/// What one evaluation produced. Sent from the worker to the server as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptReport {
    pub lines: Vec<String>,
    pub error: Option<String>,
    pub elapsed_ms: f64,
}

/// Evaluates `code` in a fresh context. Owns the (non-`Send`) engine context.
pub fn run_script(code: &str, limits: &EngineLimits) -> ScriptReport {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(limits.loop_iteration_limit);
    context
        .runtime_limits_mut()
        .set_recursion_limit(limits.recursion_limit);

    let sink = match console::install(&mut context, limits.max_output_chars) {
        Ok(sink) => sink,
        Err(e) => {
            return ScriptReport {
                lines: Vec::new(),
                error: Some(format!("The sandbox could not be prepared: {}", e)),
                elapsed_ms: 0.0,
            };
        }
    };

    let started = Instant::now();
    let evaluated = context.eval(Source::from_bytes(code));
    let elapsed = started.elapsed();

    let error = evaluated
        .err()
        .map(|fault| describe_fault(&fault, &mut context));
    let lines = console::drain(&sink, &mut context);

    ScriptReport {
        lines,
        error,
        elapsed_ms: as_millis(elapsed),
    }
}

/// Extracts a readable message from whatever the script threw.
fn describe_fault(fault: &JsError, context: &mut Context) -> String {
    let message = match fault.try_native(context) {
        Ok(native) if !native.message().is_empty() => native.message().to_string(),
        Ok(native) => native.to_string(),
        Err(_) => match fault.as_opaque() {
            Some(value) => match value.as_string() {
                Some(text) => text.to_std_string_escaped(),
                None => value.display().to_string(),
            },
            None => fault.to_string(),
        },
    };

    normalize_fault_message(&message)
}

pub(super) fn as_millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}
