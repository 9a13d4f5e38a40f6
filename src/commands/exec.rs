use clap::Args;
use std::io::{self, Write};
use std::time::Duration;

use bfpy::{Host, PythonProcess, Settings, TapeConfig};

use crate::cli_util::{env_value, print_error, read_code, read_input};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct ExecArgs {
    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Input text bound to `input_data`
    #[arg(short = 'i', long = "input", conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read the input text from PATH
    #[arg(long = "input-file", value_name = "PATH")]
    pub input_file: Option<String>,

    /// Number of tape cells (fallback BFPY_TAPE_LENGTH; default 30000)
    #[arg(short = 't', long = "tape-length", value_name = "N")]
    pub tape_length: Option<usize>,

    /// Python interpreter to run (fallback BFPY_PYTHON; default python3)
    #[arg(long = "python", value_name = "PATH")]
    pub python: Option<String>,

    /// Wall-clock timeout in milliseconds, 0 disables (fallback BFPY_TIMEOUT_MS; default 2_000)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: ExecArgs, settings: &Settings) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let ExecArgs {
        file,
        input,
        input_file,
        tape_length,
        python,
        timeout_ms,
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

    let tape_length = tape_length
        .or_else(|| env_value("BFPY_TAPE_LENGTH"))
        .unwrap_or(settings.tape_length);
    let timeout_ms = timeout_ms
        .or_else(|| env_value("BFPY_TIMEOUT_MS"))
        .unwrap_or(settings.timeout_ms);
    let python = python
        .or_else(|| env_value("BFPY_PYTHON"))
        .unwrap_or_else(|| settings.python.clone());

    let config = match TapeConfig::new(tape_length) {
        Ok(config) => config,
        Err(err) => {
            print_error(program, &code_str, &err);
            return 2;
        }
    };

    let generated = match config.compile(&code_str) {
        Ok(generated) => generated,
        Err(err) => {
            print_error(program, &code_str, &err);
            return 1;
        }
    };

    let mut host = PythonProcess::new().with_interpreter(python);
    if timeout_ms > 0 {
        host = host.with_timeout(Duration::from_millis(timeout_ms));
    }

    let exit_code = match host.evaluate(&generated, &input) {
        Ok(output) => {
            print!("{output}");
            0
        }
        Err(err) => {
            print_error(program, &code_str, &err);
            1
        }
    };

    println!();
    let _ = io::stdout().flush();
    exit_code
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} exec [OPTIONS] "<code>"
  {0} exec [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>       Read Brainfuck code from PATH instead of positional "<code>"
  --input, -i <TEXT>       Input text bound to `input_data`
  --input-file <PATH>      Read the input text from PATH
  --tape-length, -t <N>    Number of tape cells (default 30000)
  --python <PATH>          Python interpreter to run (default python3)
  --timeout <MS>           Wall-clock timeout in milliseconds, 0 disables (default 2000)
  --help,  -h              Show this help

Description:
  Translates Brainfuck into Python and runs it with a Python 3 interpreter.
  The output matches `{0} run` for the same program and input.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
