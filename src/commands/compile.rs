use clap::Args;
use std::fs;
use std::io::{self, Write};

use bfpy::{Settings, TapeConfig};

use crate::cli_util::{env_value, print_error, read_code};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct CompileArgs {
    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Write the generated Python to PATH instead of stdout
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<String>,

    /// Number of tape cells (fallback BFPY_TAPE_LENGTH; default 30000)
    #[arg(short = 't', long = "tape-length", value_name = "N")]
    pub tape_length: Option<usize>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: CompileArgs, settings: &Settings) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let CompileArgs {
        file,
        output,
        tape_length,
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

    let tape_length = tape_length
        .or_else(|| env_value("BFPY_TAPE_LENGTH"))
        .unwrap_or(settings.tape_length);
    let config = match TapeConfig::new(tape_length) {
        Ok(config) => config,
        Err(err) => {
            print_error(program, &code_str, &err);
            return 2;
        }
    };

    let python = match config.compile(&code_str) {
        Ok(python) => python,
        Err(err) => {
            print_error(program, &code_str, &err);
            return 1;
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &python) {
                eprintln!("{program}: failed to write {path}: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        }
        None => {
            print!("{python}");
            let _ = io::stdout().flush();
        }
    }
    0
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} compile [OPTIONS] "<code>"
  {0} compile [OPTIONS] --file <PATH>

Options:
  --file,   -f <PATH>       Read Brainfuck code from PATH instead of positional "<code>"
  --output, -o <PATH>       Write the generated Python to PATH instead of stdout
  --tape-length, -t <N>     Number of tape cells (default 30000)
  --help,   -h              Show this help

Description:
  Translates Brainfuck into an equivalent Python module. Bind `input_data`
  to the input text before running it; the output is left in `result`.

Example:
    {0} compile --file hello.bf -o hello.py
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
