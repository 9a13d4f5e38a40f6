use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bfpy").unwrap();
    cmd.env("BFPY_CONFIG", std::env::temp_dir().join("bfpy-tests-no-settings.toml"))
        .env_remove("BFPY_LOG")
        .env_remove("RUST_LOG")
        .env_remove("BFPY_TAPE_LENGTH")
        .env_remove("BFPY_TIMEOUT_MS")
        .env_remove("BFPY_MAX_STEPS");
    cmd
}

fn write_tempfile(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn run_positional_code_prints_output_and_newline() {
    cargo_bin()
        .args(["run", "+++++++++[>+++++++<-]>++."])
        .assert()
        .success()
        .stdout("A\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn run_concatenates_code_parts() {
    cargo_bin()
        .args(["run", "++++++++[>++++++++<-]", ">+."])
        .assert()
        .success()
        .stdout("A\n");
}

#[test]
fn run_reads_code_from_file() {
    let tf = write_tempfile("Print A\n++++++++[>++++++++<-]>+.\n");
    cargo_bin()
        .arg("run").arg("--file").arg(tf.path())
        .assert()
        .success()
        .stdout("A\n");
}

#[test]
fn run_uses_input_flag() {
    cargo_bin()
        .args(["run", "--input", "AB", ">,>,.<."])
        .assert()
        .success()
        .stdout("BA\n");
}

#[test]
fn run_reads_input_from_file() {
    let tf = write_tempfile("xyz");
    cargo_bin()
        .arg("run").arg("--input-file").arg(tf.path()).arg(",[.,]")
        .assert()
        .success()
        .stdout("xyz\n");
}

#[test]
fn run_uses_piped_stdin_as_input() {
    cargo_bin()
        .args(["run", ",[.,]"])
        .write_stdin("Hello")
        .assert()
        .success()
        .stdout("Hello\n");
}

#[test]
fn run_exhausted_input_reads_zero() {
    cargo_bin()
        .args(["run", ",."])
        .assert()
        .success()
        .stdout("\u{0}\n");
}

#[test]
fn run_wraps_pointer_on_small_tape() {
    cargo_bin()
        .args(["run", "--tape-length", "5", "+++++>+."])
        .assert()
        .success()
        .stdout("\u{1}\n");
}

#[test]
fn run_accepts_code_starting_with_hyphen() {
    cargo_bin()
        .args(["run", "-."])
        .assert()
        .success()
        .stdout("\u{ff}\n");
}

#[test]
fn run_times_out_on_infinite_loop() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .args(["run", "--timeout", "200", "+[]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("wall-clock timeout exceeded (200 ms)"));
}

#[test]
fn run_enforces_step_limit() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .args(["run", "--max-steps", "50", "+[]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("step limit exceeded (50)"));
}

#[test]
fn run_step_limit_from_environment() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .env("BFPY_MAX_STEPS", "10")
        .args(["run", "+[]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("step limit exceeded (10)"));
}

#[test]
fn run_debug_traces_steps_to_stderr() {
    cargo_bin()
        .args(["run", "--debug", "+."])
        .assert()
        .success()
        .stdout("\u{1}\n")
        .stderr(predicate::str::contains("step"));
}

#[test]
fn settings_file_sets_default_tape_length() {
    // On a two-cell tape ">>" returns to cell 0
    let settings = write_tempfile("tape_length = 2\n");
    cargo_bin()
        .env("BFPY_CONFIG", settings.path())
        .args(["run", "+>>."])
        .assert()
        .success()
        .stdout("\u{1}\n");
}

#[test]
fn environment_overrides_settings_file() {
    let settings = write_tempfile("tape_length = 2\n");
    cargo_bin()
        .env("BFPY_CONFIG", settings.path())
        .env("BFPY_TAPE_LENGTH", "3")
        .args(["run", "+>>."])
        .assert()
        .success()
        .stdout("\u{0}\n");
}

#[test]
fn malformed_settings_file_warns_and_uses_defaults() {
    let settings = write_tempfile("tape_length = \"many\"\n");
    cargo_bin()
        .env("BFPY_CONFIG", settings.path())
        .args(["run", "+."])
        .assert()
        .success()
        .stdout("\u{1}\n")
        .stderr(predicate::str::contains("using defaults"));
}
