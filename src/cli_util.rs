use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::str::FromStr;

use bfpy::{Error, SyntaxError, lexer};
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// `BFPY_LOG` (or `RUST_LOG`) selects the filter; the default only shows warnings.
/// `debug` forces a per-step trace of the interpreter.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("bfpy=trace")
    } else {
        EnvFilter::try_from_env("BFPY_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Parse an environment variable, ignoring it when unset or malformed.
pub fn env_value<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// Brainfuck source from `--file` or the concatenated positional parts.
pub fn read_code(program: &str, file: Option<String>, code: Vec<String>) -> Result<String, i32> {
    match file {
        Some(path) => fs::read_to_string(&path).map_err(|e| {
            eprintln!("{program}: failed to read code file as UTF-8: {e}");
            let _ = io::stderr().flush();
            1
        }),
        None => Ok(code.join("")),
    }
}

/// Program input: `--input`, then `--input-file`, then piped stdin, else empty.
pub fn read_input(
    program: &str,
    input: Option<String>,
    input_file: Option<String>,
) -> Result<String, i32> {
    if let Some(text) = input {
        return Ok(text);
    }
    if let Some(path) = input_file {
        return fs::read_to_string(&path).map_err(|e| {
            eprintln!("{program}: failed to read input file as UTF-8: {e}");
            let _ = io::stderr().flush();
            1
        });
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }
    let mut text = String::new();
    if let Err(e) = stdin.lock().read_to_string(&mut text) {
        eprintln!("{program}: failed reading UTF-8 from stdin: {e}");
        let _ = io::stderr().flush();
        return Err(1);
    }
    Ok(text)
}

/// Pretty-print an [`Error`]; syntax errors get a caret under the offending command.
pub fn print_error(program: &str, code: &str, err: &Error) {
    match err {
        Error::Syntax(SyntaxError { ip, kind }) => {
            let filtered = lexer::render(&lexer::filter(code));
            let msg = format!("{program}: Parse error: unmatched bracket {kind}");
            print_error_with_context(&msg, &filtered, *ip);
        }
        Error::StepLimitExceeded { .. } | Error::Canceled => {
            eprintln!("{err}");
        }
        other => {
            eprintln!("{program}: {other}");
        }
    }
    let _ = io::stderr().flush();
}

/// Print a concise error with instruction index and a caret context window.
pub fn print_error_with_context(prefix: &str, code: &str, pos: usize) {
    eprintln!("{prefix} at instruction {pos}");

    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let start = pos.saturating_sub(WINDOW_CHARS);
    let window: String = code.chars().skip(start).take(pos - start + WINDOW_CHARS + 1).collect();
    eprintln!("  {window}");
    eprintln!("  {}^", " ".repeat(pos - start));
}
