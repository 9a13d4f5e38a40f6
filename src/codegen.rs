//! Translation of a validated [`Program`] into a Python program.
//!
//! The generated module expects a global `input_data` holding the input text
//! and leaves the program's output in a global `result`. Every Brainfuck
//! command maps to exactly one statement; loops map to `while` blocks nested
//! exactly as deep as the brackets.

use std::borrow::Cow;

use tracing::debug;

use crate::config::TapeConfig;
use crate::lexer::Command;
use crate::validate::Program;

/// Exact statement text emitted for each construct.
pub mod templates {
    pub const INDENT: &str = "    ";

    pub const PROGRAM_FUNCTION: &str = "brainpy_program";
    pub const RESULT_BINDING: &str = "result";
    pub const INPUT_BINDING: &str = "input_data";

    pub const TAPE_SIZE_PREFIX: &str = "memory_size = ";
    pub const INPUT_ITERATOR: &str = "input_data = iter(input_data)";
    pub const READ_HELPER: [&str; 6] = [
        "def read_char():",
        "    try:",
        "        char = next(input_data)",
        "    except StopIteration:",
        "        return 0",
        "    return ord(char) % 256",
    ];
    pub const FUNCTION_HEADER: &str = "def brainpy_program():";
    pub const TAPE_INIT: &str = "memory = [0] * memory_size";
    pub const POINTER_INIT: &str = "pointer = 0";
    pub const OUTPUT_INIT: &str = "output = []";
    pub const RETURN_OUTPUT: &str = "return ''.join(output)";
    pub const RESULT_ASSIGN: &str = "result = brainpy_program()";

    pub const POINTER_RIGHT: &str = "pointer = (pointer + 1) % memory_size";
    pub const POINTER_LEFT: &str = "pointer = (pointer - 1) % memory_size";
    pub const INCREMENT: &str = "memory[pointer] = (memory[pointer] + 1) % 256";
    pub const DECREMENT: &str = "memory[pointer] = (memory[pointer] - 1) % 256";
    pub const OUTPUT: &str = "output.append(chr(memory[pointer]))";
    pub const INPUT: &str = "memory[pointer] = read_char()";
    pub const LOOP_OPEN: &str = "while memory[pointer] != 0:";
    pub const EMPTY_BODY: &str = "pass";
}

struct Line {
    depth: usize,
    text: Cow<'static, str>,
}

/// Collects one entry per emitted statement and joins them once at the end.
struct Emitter {
    lines: Vec<Line>,
    depth: usize,
}

impl Emitter {
    fn new() -> Self {
        Self { lines: Vec::new(), depth: 0 }
    }

    fn push(&mut self, text: impl Into<Cow<'static, str>>) {
        self.lines.push(Line { depth: self.depth, text: text.into() });
    }

    fn blank(&mut self) {
        self.lines.push(Line { depth: 0, text: Cow::Borrowed("") });
    }

    fn open_block(&mut self, header: impl Into<Cow<'static, str>>) {
        self.push(header);
        self.depth += 1;
    }

    fn close_block(&mut self) {
        // The last line is still the header when nothing was emitted inside.
        if self.lines.last().is_some_and(|line| line.depth < self.depth) {
            self.push(templates::EMPTY_BODY);
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn finish(self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            if !line.text.is_empty() {
                for _ in 0..line.depth {
                    out.push_str(templates::INDENT);
                }
                out.push_str(&line.text);
            }
            out.push('\n');
        }
        out
    }
}

/// Emit a Python module equivalent to running `program` on a tape of
/// `config.tape_length()` cells.
///
/// Every loop becomes one nested `while` block. CPython refuses to compile
/// more than 20 statically nested blocks, so loops nested deeper than that
/// translate fine but fail when a Python host evaluates them.
pub fn generate(program: &Program, config: &TapeConfig) -> String {
    let mut emitter = Emitter::new();

    emitter.push("# Generated by bfpy. Bind `input_data` first; output is left in `result`.");
    emitter.push(format!("{}{}", templates::TAPE_SIZE_PREFIX, config.tape_length()));
    emitter.push(templates::INPUT_ITERATOR);
    emitter.blank();
    emitter.blank();
    for line in templates::READ_HELPER {
        emitter.push(line);
    }
    emitter.blank();
    emitter.blank();

    emitter.open_block(templates::FUNCTION_HEADER);
    emitter.push(templates::TAPE_INIT);
    emitter.push(templates::POINTER_INIT);
    emitter.push(templates::OUTPUT_INIT);

    for &command in program.commands() {
        match command {
            Command::PointerRight => emitter.push(templates::POINTER_RIGHT),
            Command::PointerLeft => emitter.push(templates::POINTER_LEFT),
            Command::Increment => emitter.push(templates::INCREMENT),
            Command::Decrement => emitter.push(templates::DECREMENT),
            Command::Output => emitter.push(templates::OUTPUT),
            Command::Input => emitter.push(templates::INPUT),
            Command::LoopOpen => emitter.open_block(templates::LOOP_OPEN),
            Command::LoopClose => emitter.close_block(),
        }
    }

    emitter.push(templates::RETURN_OUTPUT);
    emitter.close_block();
    emitter.blank();
    emitter.blank();
    emitter.push(templates::RESULT_ASSIGN);

    debug!(
        commands = program.len(),
        lines = emitter.lines.len(),
        tape_length = config.tape_length(),
        "generated python source"
    );
    emitter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(code: &str) -> String {
        generate(&Program::parse(code).unwrap(), &TapeConfig::default())
    }

    fn body(source: &str) -> Vec<&str> {
        let lines: Vec<&str> = source.lines().collect();
        let start = lines.iter().position(|l| l.trim() == templates::OUTPUT_INIT).unwrap() + 1;
        let end = lines.iter().position(|l| l.trim() == templates::RETURN_OUTPUT).unwrap();
        lines[start..end].to_vec()
    }

    #[test]
    fn frame_contains_compatibility_markers() {
        let python = compile("+++.--");
        for marker in [
            "def brainpy_program()",
            "memory = [0]",
            "pointer = 0",
            "output = []",
            "memory[pointer]",
            "output.append",
            "input_data = iter(input_data)",
            "next(input_data)",
            "ord(char)",
            "result = brainpy_program()",
        ] {
            assert!(python.contains(marker), "missing {marker:?} in:\n{python}");
        }
        assert!(python.contains("memory_size = 30000\n"));
    }

    #[test]
    fn pointer_moves_use_modulo_wrap() {
        let python = compile("><");
        assert!(python.contains("pointer = (pointer + 1) % memory_size"));
        assert!(python.contains("pointer = (pointer - 1) % memory_size"));
    }

    #[test]
    fn one_statement_per_command() {
        assert_eq!(
            body(&compile("+-.,")),
            vec![
                "    memory[pointer] = (memory[pointer] + 1) % 256",
                "    memory[pointer] = (memory[pointer] - 1) % 256",
                "    output.append(chr(memory[pointer]))",
                "    memory[pointer] = read_char()",
            ]
        );
    }

    #[test]
    fn loops_nest_one_level_per_bracket() {
        assert_eq!(
            body(&compile("+[>[-]<]")),
            vec![
                "    memory[pointer] = (memory[pointer] + 1) % 256",
                "    while memory[pointer] != 0:",
                "        pointer = (pointer + 1) % memory_size",
                "        while memory[pointer] != 0:",
                "            memory[pointer] = (memory[pointer] - 1) % 256",
                "        pointer = (pointer - 1) % memory_size",
            ]
        );
    }

    #[test]
    fn empty_loops_get_pass() {
        assert_eq!(
            body(&compile("[[]]")),
            vec![
                "    while memory[pointer] != 0:",
                "        while memory[pointer] != 0:",
                "            pass",
            ]
        );
    }

    #[test]
    fn empty_program_still_returns_output() {
        let python = compile("comment only");
        assert!(body(&python).is_empty());
        assert!(python.contains("    return ''.join(output)\n"));
        assert!(python.ends_with("result = brainpy_program()\n"));
    }

    #[test]
    fn tape_length_is_emitted() {
        let program = Program::parse("+").unwrap();
        let python = generate(&program, &TapeConfig::new(5).unwrap());
        assert!(python.contains("memory_size = 5\n"));
    }
}
