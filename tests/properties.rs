use bfpy::lexer::{filter, render};
use bfpy::validate::validate;
use bfpy::{Command, Error, Host, Program, Replay, StepControl, TapeConfig, TapeMachine, codegen};
use quickcheck::{Arbitrary, Gen, TestResult, quickcheck};

const STEP_BUDGET: usize = 5_000;

/// Brainfuck-ish text: commands mixed with comment characters, brackets unbalanced.
#[derive(Clone, Debug)]
struct Source(String);

impl Arbitrary for Source {
    fn arbitrary(g: &mut Gen) -> Self {
        const ALPHABET: &[char] = &['>', '<', '+', '+', '-', '.', ',', '[', ']', ' ', 'x', '\n'];
        let len = usize::arbitrary(g) % 48;
        Source((0..len).map(|_| *g.choose(ALPHABET).unwrap()).collect())
    }
}

/// A program whose brackets always match.
#[derive(Clone, Debug)]
struct Balanced(String);

impl Arbitrary for Balanced {
    fn arbitrary(g: &mut Gen) -> Self {
        const ALPHABET: &[char] = &['>', '<', '+', '+', '-', '.', ',', '[', ']'];
        let len = usize::arbitrary(g) % 40;
        let mut depth = 0usize;
        let mut code = String::new();
        for _ in 0..len {
            match *g.choose(ALPHABET).unwrap() {
                '[' => {
                    depth += 1;
                    code.push('[');
                }
                ']' if depth > 0 => {
                    depth -= 1;
                    code.push(']');
                }
                ']' => code.push('-'),
                other => code.push(other),
            }
        }
        code.extend(std::iter::repeat_n(']', depth));
        Balanced(code)
    }
}

fn balanced(commands: &[Command]) -> bool {
    let mut depth = 0i64;
    for command in commands {
        match command {
            Command::LoopOpen => depth += 1,
            Command::LoopClose => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn tape(len: u8) -> TapeConfig {
    TapeConfig::new(usize::from(len % 16) + 1).unwrap()
}

quickcheck! {
    fn filtering_is_idempotent(source: String) -> bool {
        let once = filter(&source);
        let text = render(&once);
        filter(&text) == once && text.chars().all(|c| "><+-.,[]".contains(c))
    }

    fn validator_accepts_exactly_balanced_sequences(source: Source) -> bool {
        let commands = filter(&source.0);
        match validate(&commands) {
            Ok(table) => {
                balanced(&commands) && table.pairs().all(|(open, close)| {
                    open < close
                        && commands[open] == Command::LoopOpen
                        && commands[close] == Command::LoopClose
                        && table.partner(close) == Some(open)
                        && balanced(&commands[open + 1..close])
                })
            }
            Err(err) => !balanced(&commands) && validate(&commands) == Err(err),
        }
    }

    fn generated_source_agrees_with_interpreter(
        source: Balanced,
        input: String,
        len: u8
    ) -> TestResult {
        let program = Program::parse(&source.0).unwrap();
        let config = tape(len);

        let mut machine = TapeMachine::new(&program, &config, &input);
        let finished = machine.run_with_control(&StepControl::with_max_steps(STEP_BUDGET));
        let direct = match finished {
            Ok(()) => machine.into_output(),
            Err(Error::StepLimitExceeded { .. }) => return TestResult::discard(),
            Err(other) => return TestResult::error(other.to_string()),
        };

        let generated = codegen::generate(&program, &config);
        let replayed = Replay::with_control(StepControl::with_max_steps(STEP_BUDGET))
            .evaluate(&generated, &input);
        match replayed {
            Ok(output) => TestResult::from_bool(output == direct),
            Err(err) => TestResult::error(err.to_string()),
        }
    }

    fn cells_wrap_modulo_256(ops: Vec<bool>) -> bool {
        let code: String = ops.iter().map(|&up| if up { '+' } else { '-' }).collect();
        let net: i64 = ops.iter().map(|&up| if up { 1 } else { -1 }).sum();
        let program = Program::parse(&code).unwrap();
        let config = TapeConfig::new(1).unwrap();
        let mut machine = TapeMachine::new(&program, &config, "");
        machine.run();
        i64::from(machine.tape()[0]) == net.rem_euclid(256)
    }

    fn pointer_wraps_modulo_tape_length(moves: Vec<bool>, len: u8) -> bool {
        let code: String = moves.iter().map(|&right| if right { '>' } else { '<' }).collect();
        let net: i64 = moves.iter().map(|&right| if right { 1 } else { -1 }).sum();
        let program = Program::parse(&code).unwrap();
        let config = tape(len);
        let mut machine = TapeMachine::new(&program, &config, "");
        machine.run();
        machine.pointer() as i64 == net.rem_euclid(config.tape_length() as i64)
    }

    fn loop_on_zero_cell_runs_zero_times(body: Balanced) -> bool {
        let code = format!("[{}].", body.0);
        let program = Program::parse(&code).unwrap();
        let config = TapeConfig::new(8).unwrap();
        let mut machine = TapeMachine::new(&program, &config, "unused");
        machine.run();
        machine.output() == "\u{0}" && machine.tape().iter().all(|&cell| cell == 0)
    }
}
