use clap::Args;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use bfpy::{Error, Program, Settings, StepControl, TapeConfig, TapeMachine};
use tracing::debug;

use crate::cli_util::{env_value, print_error, read_code, read_input};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Trace every executed instruction to stderr
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Input text consumed by `,`
    #[arg(short = 'i', long = "input", conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read the input text from PATH
    #[arg(long = "input-file", value_name = "PATH")]
    pub input_file: Option<String>,

    /// Number of tape cells (fallback BFPY_TAPE_LENGTH; default 30000)
    #[arg(short = 't', long = "tape-length", value_name = "N")]
    pub tape_length: Option<usize>,

    /// Wall-clock timeout in milliseconds, 0 disables (fallback BFPY_TIMEOUT_MS; default 2_000)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps before abort (fallback BFPY_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<u64>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs, settings: &Settings) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs {
        file,
        input,
        input_file,
        tape_length,
        timeout_ms,
        max_steps,
        code,
        ..
    } = args;

    if file.is_none() && code.is_empty() {
        usage_and_exit(program, 2);
    }

    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let code_str = match read_code(program, file, code) {
        Ok(s) => s,
        Err(exit) => return exit,
    };
    let input = match read_input(program, input, input_file) {
        Ok(s) => s,
        Err(exit) => return exit,
    };

    // Resolve limits: flags -> env -> settings -> defaults
    let tape_length = tape_length
        .or_else(|| env_value("BFPY_TAPE_LENGTH"))
        .unwrap_or(settings.tape_length);
    let timeout_ms = timeout_ms
        .or_else(|| env_value("BFPY_TIMEOUT_MS"))
        .unwrap_or(settings.timeout_ms);
    let max_steps = max_steps
        .or_else(|| env_value("BFPY_MAX_STEPS"))
        .or(settings.max_steps);

    let config = match TapeConfig::new(tape_length) {
        Ok(config) => config,
        Err(err) => {
            print_error(program, &code_str, &err);
            return 2;
        }
    };

    // Validate up front so errors can point into the source
    let parsed = match Program::parse(&code_str) {
        Ok(parsed) => parsed,
        Err(err) => {
            print_error(program, &code_str, &Error::from(err));
            println!();
            let _ = io::stdout().flush();
            return 1;
        }
    };

    // Execute on a worker thread with cooperative cancellation
    let cancel = Arc::new(AtomicBool::new(false));
    let ctrl_c_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || ctrl_c_flag.store(true, Ordering::Relaxed)) {
        debug!("ctrl+c handler not installed: {e}");
    }

    let (tx, rx) = mpsc::channel::<Result<String, Error>>();
    let ctrl = StepControl::new(max_steps.map(|n| n as usize), cancel.clone());

    thread::spawn(move || {
        let mut machine = TapeMachine::new(&parsed, &config, &input);
        let res = machine.run_with_control(&ctrl).map(|()| machine.into_output());
        let _ = tx.send(res);
    });

    let received = if timeout_ms == 0 {
        rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected)
    } else {
        rx.recv_timeout(Duration::from_millis(timeout_ms))
    };

    let exit_code = match received {
        Ok(Ok(output)) => {
            print!("{output}");
            0
        }
        Ok(Err(Error::Canceled)) => {
            eprintln!("Execution aborted: cancelled");
            let _ = io::stderr().flush();
            1
        }
        Ok(Err(other)) => {
            print_error(program, &code_str, &other);
            1
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.store(true, Ordering::Relaxed);
            eprintln!("Execution aborted: wall-clock timeout exceeded ({timeout_ms} ms)");
            let _ = io::stderr().flush();
            1
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => 1,
    };

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();
    exit_code
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [OPTIONS] "<code>"
  {0} run [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>       Read Brainfuck code from PATH instead of positional "<code>"
  --input, -i <TEXT>       Input text consumed by `,`
  --input-file <PATH>      Read the input text from PATH
  --tape-length, -t <N>    Number of tape cells (default 30000)
  --timeout <MS>           Wall-clock timeout in milliseconds, 0 disables (default 2000)
  --max-steps <N>          Abort after N executed instructions
  --debug, -d              Trace every executed instruction to stderr
  --help,  -h              Show this help

Notes:
- Without --input or --input-file, piped stdin is used as the input text.
- When the input is exhausted, `,` sets the current cell to 0.
- The pointer wraps around both ends of the tape; cells wrap modulo 256.
- Characters outside of Brainfuck's ><+-.,[] are comments.

Examples:
- Load Brainfuck code from a file:
    {0} run --file ./program.bf
- Echo piped input:
    {0} run ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
