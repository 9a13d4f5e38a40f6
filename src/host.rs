//! Evaluators for generated Python source.
//!
//! A [`Host`] binds `input_data` to the input text, runs a module produced by
//! [`codegen::generate`](crate::codegen::generate) and returns its `result`
//! binding. [`PythonProcess`] hands the module to a real Python interpreter;
//! [`Replay`] understands exactly the statements the generator emits and runs
//! them on a [`TapeMachine`] without leaving the process.

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::process::{Command as Process, ExitStatus, Stdio};
use std::string::FromUtf8Error;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::codegen::templates;
use crate::config::TapeConfig;
use crate::error::{Result, SyntaxError};
use crate::lexer::Command;
use crate::machine::{StepControl, TapeMachine};
use crate::validate::Program;

/// Errors raised while evaluating generated source.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to start {interpreter}: {source}")]
    Spawn { interpreter: String, #[source] source: io::Error },

    #[error("I/O error talking to the host: {0}")]
    Io(#[from] io::Error),

    #[error("host evaluation timed out after {0:?}")]
    Timeout(Duration),

    #[error("host failed ({status}): {stderr}")]
    Exit { status: ExitStatus, stderr: String },

    #[error("host produced invalid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("unsupported statement on line {line}: {text:?}")]
    Unsupported { line: usize, text: String },

    #[error("generated source is missing `{0}`")]
    MissingFrame(&'static str),

    #[error("generated source is not properly nested: {0}")]
    Structure(#[from] SyntaxError),
}

/// Something that can run generated source with `input_data` bound.
pub trait Host {
    fn evaluate(&self, source: &str, input: &str) -> Result<String>;
}

/// Reads the length-prefixed module and the input from stdin, executes the
/// module with `input_data` bound and writes `result` to stdout.
const DRIVER: &str = r#"
import sys
raw = sys.stdin.buffer.read()
head, _, rest = raw.partition(b"\n")
size = int(head)
namespace = {"input_data": rest[size:].decode("utf-8")}
exec(compile(rest[:size].decode("utf-8"), "<bfpy>", "exec"), namespace)
sys.stdout.buffer.write(namespace["result"].encode("utf-8"))
"#;

/// Evaluates generated source in a Python 3 subprocess.
///
/// CPython's compiler rejects more than 20 statically nested blocks; such a
/// program comes back as [`HostError::Exit`] carrying the interpreter's
/// `SyntaxError`. [`Replay`] has no nesting limit.
#[derive(Debug, Clone)]
pub struct PythonProcess {
    interpreter: OsString,
    timeout: Option<Duration>,
}

impl Default for PythonProcess {
    fn default() -> Self {
        Self { interpreter: OsString::from("python3"), timeout: None }
    }
}

impl PythonProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<OsString>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Kill the interpreter if it has not finished within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether the configured interpreter can be started at all.
    pub fn is_available(&self) -> bool {
        Process::new(&self.interpreter)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    fn run(&self, source: &str, input: &str) -> std::result::Result<String, HostError> {
        let mut child = Process::new(&self.interpreter)
            .arg("-c")
            .arg(DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HostError::Spawn {
                interpreter: self.interpreter.to_string_lossy().into_owned(),
                source,
            })?;

        let mut payload = format!("{}\n", source.len()).into_bytes();
        payload.extend_from_slice(source.as_bytes());
        payload.extend_from_slice(input.as_bytes());

        // Feed stdin and drain both pipes on their own threads so a large
        // output cannot block the child while we wait on it.
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || {
                // A child that dies early closes the pipe; its status says why.
                let _ = stdin.write_all(&payload);
            })
        });
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match self.timeout {
            None => child.wait()?,
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                loop {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(HostError::Timeout(timeout));
                    }
                    thread::sleep(Duration::from_millis(5));
                }
            }
        };

        if let Some(writer) = writer {
            let _ = writer.join();
        }
        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;

        if !status.success() {
            return Err(HostError::Exit {
                status,
                stderr: String::from_utf8_lossy(&stderr).trim_end().to_string(),
            });
        }

        debug!(bytes = stdout.len(), "python host finished");
        Ok(String::from_utf8(stdout)?)
    }
}

impl Host for PythonProcess {
    fn evaluate(&self, source: &str, input: &str) -> Result<String> {
        Ok(self.run(source, input)?)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(
    handle: Option<JoinHandle<io::Result<Vec<u8>>>>,
) -> std::result::Result<Vec<u8>, HostError> {
    match handle {
        None => Ok(Vec::new()),
        Some(handle) => handle
            .join()
            .map_err(|_| HostError::Io(io::Error::other("pipe reader panicked")))?
            .map_err(HostError::Io),
    }
}

/// In-process evaluator for the statements [`codegen`](crate::codegen) emits.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    control: Option<StepControl>,
}

impl Replay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run replayed programs under `control`.
    pub fn with_control(control: StepControl) -> Self {
        Self { control: Some(control) }
    }

    /// Read the tape length and the command sequence back out of generated source.
    pub fn recover(source: &str) -> Result<(TapeConfig, Program)> {
        let lines: Vec<&str> = source.lines().collect();

        let tape_length = lines
            .iter()
            .find_map(|line| line.strip_prefix(templates::TAPE_SIZE_PREFIX))
            .and_then(|n| n.trim().parse::<usize>().ok())
            .ok_or(HostError::MissingFrame("memory_size"))?;
        let config = TapeConfig::new(tape_length)?;

        for (required, name) in [
            (templates::INPUT_ITERATOR, "input_data = iter(input_data)"),
            (templates::RESULT_ASSIGN, "result = brainpy_program()"),
        ] {
            if !lines.contains(&required) {
                return Err(HostError::MissingFrame(name).into());
            }
        }

        let header = lines
            .iter()
            .position(|&line| line == templates::FUNCTION_HEADER)
            .ok_or(HostError::MissingFrame("def brainpy_program():"))?;
        let body_start = lines[header..]
            .iter()
            .position(|line| line.strip_prefix(templates::INDENT) == Some(templates::OUTPUT_INIT))
            .map(|offset| header + offset + 1)
            .ok_or(HostError::MissingFrame("output = []"))?;

        let mut commands = Vec::new();
        let mut depth = 1usize;
        let mut returned = false;

        for (index, &line) in lines.iter().enumerate().skip(body_start) {
            if line.trim().is_empty() {
                continue;
            }
            let unsupported = || HostError::Unsupported { line: index + 1, text: line.to_string() };

            let text = line.trim_start_matches(' ');
            let indent = line.len() - text.len();
            if indent % templates::INDENT.len() != 0 {
                return Err(unsupported().into());
            }
            let level = indent / templates::INDENT.len();
            if level == 0 || level > depth {
                return Err(unsupported().into());
            }
            while depth > level {
                commands.push(Command::LoopClose);
                depth -= 1;
            }

            let command = match text {
                templates::RETURN_OUTPUT if level == 1 => {
                    returned = true;
                    break;
                }
                templates::POINTER_RIGHT => Command::PointerRight,
                templates::POINTER_LEFT => Command::PointerLeft,
                templates::INCREMENT => Command::Increment,
                templates::DECREMENT => Command::Decrement,
                templates::OUTPUT => Command::Output,
                templates::INPUT => Command::Input,
                templates::LOOP_OPEN => {
                    depth += 1;
                    Command::LoopOpen
                }
                templates::EMPTY_BODY => continue,
                _ => return Err(unsupported().into()),
            };
            commands.push(command);
        }

        if !returned {
            return Err(HostError::MissingFrame("return ''.join(output)").into());
        }

        let program = Program::from_commands(commands).map_err(HostError::from)?;
        Ok((config, program))
    }
}

impl Host for Replay {
    fn evaluate(&self, source: &str, input: &str) -> Result<String> {
        let (config, program) = Self::recover(source)?;
        let mut machine = TapeMachine::new(&program, &config, input);
        match &self.control {
            Some(control) => machine.run_with_control(control)?,
            None => machine.run(),
        }
        Ok(machine.into_output())
    }
}
