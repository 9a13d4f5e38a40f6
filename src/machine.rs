//! The tape machine: direct interpretation of a validated [`Program`].
//!
//! Behaviors:
//! - Memory tape of `tape_length` cells initialized to 0.
//! - The data pointer wraps at both ends of the tape.
//! - Cells wrap modulo 256 on `+` and `-`.
//! - Input `,` consumes one character; exhausted input sets the cell to 0.
//! - Output `.` appends the current cell as a character to the output buffer.
//!
//! Quick start:
//!
//! ```
//! use bfpy::{Program, TapeConfig, TapeMachine};
//!
//! let program = Program::parse("+++[>+++++<-]>.").unwrap();
//! let config = TapeConfig::default();
//! let mut machine = TapeMachine::new(&program, &config, "");
//! machine.run();
//! assert_eq!(machine.output(), "\u{f}");
//! ```

use std::str::Chars;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, trace};

use crate::config::TapeConfig;
use crate::error::{Error, Result};
use crate::lexer::Command;
use crate::validate::Program;

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone, Debug, Default)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }

    /// A control that only enforces a step budget.
    pub fn with_max_steps(max_steps: usize) -> Self {
        Self { max_steps: Some(max_steps), cancel_flag: Arc::default() }
    }

    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    fn check(&self, steps: usize) -> Result<()> {
        if self.cancel_flag.load(Ordering::Relaxed) {
            return Err(Error::Canceled);
        }
        match self.max_steps {
            Some(limit) if steps >= limit => Err(Error::StepLimitExceeded { limit }),
            _ => Ok(()),
        }
    }
}

/// One execution of a program: its own tape, pointer, input cursor and output.
pub struct TapeMachine<'a> {
    program: &'a Program,
    memory: Vec<u8>,
    pointer: usize,
    pc: usize,
    steps: usize,
    input: Chars<'a>,
    output: String,
}

impl<'a> TapeMachine<'a> {
    pub fn new(program: &'a Program, config: &TapeConfig, input: &'a str) -> Self {
        Self {
            program,
            memory: vec![0; config.tape_length()],
            pointer: 0,
            pc: 0,
            steps: 0,
            input: input.chars(),
            output: String::new(),
        }
    }

    pub fn is_halted(&self) -> bool {
        self.pc >= self.program.len()
    }

    /// Execute one command. Returns `false` once the program has finished.
    pub fn step(&mut self) -> bool {
        let Some(&command) = self.program.commands().get(self.pc) else {
            return false;
        };
        let cell = self.memory[self.pointer];
        trace!(step = self.steps, ip = self.pc, ptr = self.pointer, cell, instr = %command, "step");

        match command {
            Command::PointerRight => {
                self.pointer = (self.pointer + 1) % self.memory.len();
            }
            Command::PointerLeft => {
                self.pointer = (self.pointer + self.memory.len() - 1) % self.memory.len();
            }
            Command::Increment => {
                self.memory[self.pointer] = cell.wrapping_add(1);
            }
            Command::Decrement => {
                self.memory[self.pointer] = cell.wrapping_sub(1);
            }
            Command::Output => {
                self.output.push(char::from(cell));
            }
            Command::Input => {
                // Only the low byte of the code point fits in a cell.
                self.memory[self.pointer] = self
                    .input
                    .next()
                    .map_or(0, |c| (u32::from(c) % 256) as u8);
            }
            Command::LoopOpen => {
                // Skip past the matching ']' when the cell is zero.
                if cell == 0 {
                    if let Some(close) = self.program.jumps().partner(self.pc) {
                        self.pc = close;
                    }
                }
            }
            Command::LoopClose => {
                // Land on the matching '['; the advance below re-enters the body.
                if cell != 0 {
                    if let Some(open) = self.program.jumps().partner(self.pc) {
                        self.pc = open;
                    }
                }
            }
        }

        self.pc += 1;
        self.steps += 1;
        true
    }

    /// Execute until the program counter passes the end. May not terminate.
    pub fn run(&mut self) {
        while self.step() {}
        debug!(steps = self.steps, output = self.output.len(), "program finished");
    }

    /// Execute with cooperative cancellation and optional step limit.
    pub fn run_with_control(&mut self, control: &StepControl) -> Result<()> {
        while !self.is_halted() {
            control.check(self.steps)?;
            self.step();
        }
        debug!(steps = self.steps, output = self.output.len(), "program finished");
        Ok(())
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn tape(&self) -> &[u8] {
        &self.memory
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}
