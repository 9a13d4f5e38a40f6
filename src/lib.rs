//! A Brainfuck interpreter and Brainfuck-to-Python translator.
//!
//! Source text is filtered down to the eight Brainfuck commands and its
//! brackets are validated once, producing a [`Program`]. A program can then be
//! interpreted directly on a [`TapeMachine`] or translated into an equivalent
//! Python module with [`codegen::generate`].
//!
//! Features and behaviors:
//! - Memory tape (default 30,000 cells) initialized to 0.
//! - The data pointer wraps around at both ends of the tape.
//! - Cells are unsigned bytes that wrap on overflow and underflow.
//! - Input `,` consumes one character of the input text; when it is exhausted
//!   the current cell is set to 0.
//! - Output `.` appends the current cell as a character; the whole output is
//!   returned at the end.
//! - Non-Brainfuck characters are comments.
//! - Unmatched brackets are reported before anything runs.
//!
//! Quick start:
//!
//! ```
//! let out = bfpy::execute("++++++++[>++++++++<-]>+.", "", 30_000).unwrap();
//! assert_eq!(out, "A");
//!
//! let python = bfpy::compile("+.", 30_000).unwrap();
//! assert!(python.contains("def brainpy_program()"));
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod host;
pub mod lexer;
pub mod machine;
pub mod validate;

pub use config::{DEFAULT_TAPE_LENGTH, Settings, TapeConfig};
pub use error::{Error, Result, SyntaxError, UnmatchedBracketKind};
pub use host::{Host, HostError, PythonProcess, Replay};
pub use lexer::Command;
pub use machine::{StepControl, TapeMachine};
pub use validate::{JumpTable, Program};

/// Run `source` on a tape of `tape_length` cells and return its output.
pub fn execute(source: &str, input: &str, tape_length: usize) -> Result<String> {
    TapeConfig::new(tape_length)?.execute_direct(source, input)
}

/// Translate `source` into a Python module for a tape of `tape_length` cells.
pub fn compile(source: &str, tape_length: usize) -> Result<String> {
    TapeConfig::new(tape_length)?.compile(source)
}

/// Translate `source` and evaluate the result with `host`.
///
/// Produces the same output as [`execute`] for the same arguments.
pub fn execute_generated(
    source: &str,
    input: &str,
    tape_length: usize,
    host: &dyn Host,
) -> Result<String> {
    let generated = compile(source, tape_length)?;
    host.evaluate(&generated, input)
}
