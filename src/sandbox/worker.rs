//! The child side of a sandbox run.
//!
//! The server re-executes its own binary as
//! `academy sandbox-worker <loop-limit> <recursion-limit> <max-output-chars>`,
//! writes the script to the child's stdin and reads one JSON [`ScriptReport`]
//! from its stdout. The child exits after a single run.

use std::io::{self, Read, Write};
use std::thread;

use super::engine::{EngineLimits, ScriptReport, run_script};

/// First argument that switches the binary into worker mode.
pub const WORKER_ARG: &str = "sandbox-worker";

const WORKER_STACK_BYTES: usize = 16 * 1024 * 1024;

/// Exit code for a worker started with unusable arguments or input.
const EXIT_USAGE: i32 = 2;

pub(super) fn worker_args(limits: &EngineLimits) -> [String; 4] {
    [
        WORKER_ARG.to_string(),
        limits.loop_iteration_limit.to_string(),
        limits.recursion_limit.to_string(),
        limits.max_output_chars.to_string(),
    ]
}

fn parse_limits(mut args: impl Iterator<Item = String>) -> Option<EngineLimits> {
    let limits = EngineLimits {
        loop_iteration_limit: args.next()?.parse().ok()?,
        recursion_limit: args.next()?.parse().ok()?,
        max_output_chars: args.next()?.parse().ok()?,
    };
    Some(limits)
}

/// Runs one script read from stdin and returns the process exit code.
///
/// `args` are the arguments after [`WORKER_ARG`].
pub fn run_worker(args: impl Iterator<Item = String>) -> i32 {
    let Some(limits) = parse_limits(args) else {
        return EXIT_USAGE;
    };

    let mut code = String::new();
    if io::stdin().read_to_string(&mut code).is_err() {
        return EXIT_USAGE;
    }

    // The engine recurses on the native stack; give it room before its own
    // recursion limit kicks in.
    let handle = thread::Builder::new()
        .name("lab-sandbox".to_string())
        .stack_size(WORKER_STACK_BYTES)
        .spawn(move || run_script(&code, &limits));

    let report: ScriptReport = match handle {
        Ok(handle) => match handle.join() {
            Ok(report) => report,
            // A panic already printed to stderr; the non-zero exit tells the parent.
            Err(_) => return 101,
        },
        Err(_) => return 1,
    };

    let mut stdout = io::stdout().lock();
    if serde_json::to_writer(&mut stdout, &report).is_err() || stdout.flush().is_err() {
        return 1;
    }
    0
}
