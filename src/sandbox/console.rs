//! Output capture exposed to scripts as `console`.

use boa_engine::{Context, JsResult, JsValue, Source};

pub(super) const TRUNCATION_MARKER: &str = "[output truncated]";

/// Function of the output budget (in characters). Defines `console` on the
/// global object and returns the array that collects formatted lines. The
/// array is only reachable from the console closures and from the host, so
/// scripts cannot swap it out.
const CONSOLE_SHIM: &str = r#"
function (limit) {
    var lines = [];
    var used = 0;
    var truncated = false;

    function format(value, seen) {
        if (value === undefined) return 'undefined';
        if (value === null) return 'null';
        if (Array.isArray(value)) {
            if (seen.indexOf(value) !== -1) return '[Circular]';
            seen[seen.length] = value;
            var parts = [];
            for (var i = 0; i < value.length; i++) {
                parts[parts.length] = format(value[i], seen);
            }
            seen.length = seen.length - 1;
            return '[' + parts.join(', ') + ']';
        }
        if (typeof value === 'object') {
            try {
                return JSON.stringify(value, null, 2);
            } catch (e) {
                return '[Unserializable Object]';
            }
        }
        return String(value);
    }

    function capture() {
        if (truncated) return;
        var parts = [];
        for (var i = 0; i < arguments.length; i++) {
            parts[parts.length] = format(arguments[i], []);
        }
        var line = parts.join(' ');
        if (used + line.length > limit) {
            truncated = true;
            lines[lines.length] = 'TRUNCATION_MARKER';
            return;
        }
        used += line.length + 1;
        lines[lines.length] = line;
    }

    globalThis.console = {
        log: capture,
        error: capture,
        warn: capture,
        info: capture
    };

    return lines;
}
"#;

/// Installs the console capture and returns the line sink.
pub(super) fn install(context: &mut Context, max_output_chars: usize) -> JsResult<JsValue> {
    let source = format!(
        "({})({})",
        CONSOLE_SHIM.replace("TRUNCATION_MARKER", TRUNCATION_MARKER),
        max_output_chars
    );
    context.eval(Source::from_bytes(&source))
}

/// Reads the captured lines back out of the engine.
pub(super) fn drain(sink: &JsValue, context: &mut Context) -> Vec<String> {
    match sink.to_json(context) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(line) => line,
                other => other.to_string(),
            })
            .collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!("Could not read captured console output: {}", e);
            Vec::new()
        }
    }
}
