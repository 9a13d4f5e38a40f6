//! Source filtering.
//!
//! Brainfuck has no comment syntax: any character outside `><+-.,[]` is
//! ignored, so filtering never fails.

use std::fmt;

/// One primitive Brainfuck operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    PointerRight,
    PointerLeft,
    Increment,
    Decrement,
    Output,
    Input,
    LoopOpen,
    LoopClose,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::PointerRight,
        Command::PointerLeft,
        Command::Increment,
        Command::Decrement,
        Command::Output,
        Command::Input,
        Command::LoopOpen,
        Command::LoopClose,
    ];

    /// Map a source character to its command, if it is one.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '>' => Command::PointerRight,
            '<' => Command::PointerLeft,
            '+' => Command::Increment,
            '-' => Command::Decrement,
            '.' => Command::Output,
            ',' => Command::Input,
            '[' => Command::LoopOpen,
            ']' => Command::LoopClose,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            Command::PointerRight => '>',
            Command::PointerLeft => '<',
            Command::Increment => '+',
            Command::Decrement => '-',
            Command::Output => '.',
            Command::Input => ',',
            Command::LoopOpen => '[',
            Command::LoopClose => ']',
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Keep only Brainfuck instruction characters, in order.
pub fn filter(source: &str) -> Vec<Command> {
    source.chars().filter_map(Command::from_char).collect()
}

/// Print a command sequence back as Brainfuck text.
pub fn render(commands: &[Command]) -> String {
    commands.iter().map(|c| c.as_char()).collect()
}
