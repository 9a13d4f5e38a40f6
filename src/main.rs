mod cli_util;
mod commands;

use bfpy::Settings;
use clap::{Parser, Subcommand};
use std::env;
use std::io::{self, Write};
use std::path::Path;

use commands::compile::CompileArgs;
use commands::exec::ExecArgs;
use commands::run::RunArgs;

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run     [OPTIONS] "<code>"        # Interpret Brainfuck code (args are concatenated)
  {0} run     [OPTIONS] --file <PATH>   # Interpret Brainfuck code loaded from file
  {0} compile [OPTIONS] "<code>"        # Translate Brainfuck code into Python
  {0} exec    [OPTIONS] "<code>"        # Translate to Python and run it with python3

Run "{0} <subcommand> --help" for more info.

Environment:
  BFPY_LOG       Log filter for stderr diagnostics (default: warn)
  BFPY_CONFIG    Settings file (default: <config home>/bfpy.toml)
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bfpy", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(RunArgs),
    Compile(CompileArgs),
    Exec(ExecArgs),
}

fn main() {
    // Only the file name is used in help and error prefixes
    let program = env::args()
        .next()
        .as_deref()
        .and_then(|arg| Path::new(arg).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("bfpy"));

    let cli = Cli::parse();

    let Some(command) = cli.command.filter(|_| !cli.help) else {
        print_top_usage_and_exit(&program, if cli.help { 0 } else { 2 });
    };

    let debug = matches!(&command, Command::Run(args) if args.debug);
    cli_util::init_logging(debug);
    let settings = Settings::load();

    let code = match command {
        Command::Run(args) => commands::run::run(&program, args, &settings),
        Command::Compile(args) => commands::compile::run(&program, args, &settings),
        Command::Exec(args) => commands::exec::run(&program, args, &settings),
    };

    std::process::exit(code);
}
