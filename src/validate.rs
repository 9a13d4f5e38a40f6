use tracing::debug;

use crate::error::{SyntaxError, UnmatchedBracketKind};
use crate::lexer::{self, Command};

/// Matching bracket positions for O(1) jumps.
///
/// `partners[i]` holds the matching index for `[` or `]` at index `i`.
/// For non-bracket positions it is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTable {
    partners: Vec<Option<usize>>,
}

impl JumpTable {
    /// The index of the bracket matching the one at `ip`.
    pub fn partner(&self, ip: usize) -> Option<usize> {
        self.partners.get(ip).copied().flatten()
    }

    /// Matched `(open, close)` pairs in order of their opening bracket.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.partners
            .iter()
            .enumerate()
            .filter_map(|(open, &partner)| {
                partner
                    .filter(|&close| close > open)
                    .map(|close| (open, close))
            })
    }

    pub fn pair_count(&self) -> usize {
        self.pairs().count()
    }
}

/// Scan `commands` once, matching brackets with a stack of pending `[` positions.
///
/// Fails on the first `]` with nothing open, or, after the scan, on the earliest
/// `[` that was never closed.
pub fn validate(commands: &[Command]) -> Result<JumpTable, SyntaxError> {
    let mut partners: Vec<Option<usize>> = vec![None; commands.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (i, command) in commands.iter().enumerate() {
        match command {
            Command::LoopOpen => stack.push(i),
            Command::LoopClose => {
                let Some(open_index) = stack.pop() else {
                    return Err(SyntaxError { ip: i, kind: UnmatchedBracketKind::Close });
                };
                partners[open_index] = Some(i);
                partners[i] = Some(open_index);
            }
            _ => {}
        }
    }

    if let Some(&unmatched_open) = stack.first() {
        return Err(SyntaxError { ip: unmatched_open, kind: UnmatchedBracketKind::Open });
    }

    Ok(JumpTable { partners })
}

/// A filtered command sequence that passed bracket validation.
///
/// This is the only input the tape machine and the code generator accept, so
/// validation happens once no matter which of them runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    commands: Vec<Command>,
    jumps: JumpTable,
}

impl Program {
    /// Filter raw source and validate it.
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        Self::from_commands(lexer::filter(source))
    }

    pub fn from_commands(commands: Vec<Command>) -> Result<Self, SyntaxError> {
        let jumps = validate(&commands)?;
        debug!(commands = commands.len(), loops = jumps.pair_count(), "validated program");
        Ok(Self { commands, jumps })
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn jumps(&self) -> &JumpTable {
        &self.jumps
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
