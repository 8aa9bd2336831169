//! Tracks the nesting of procedural constructs across logical statements.
//!
//! A frame is either *explicit* (opened with `begin`, or a `case` which is
//! closed by `endcase`) or covers exactly one following statement. `if`
//! frames outlive their statement until it is known whether an `else`
//! follows.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructKind {
    If,
    ElseIf,
    Else,
    CaseCondition,
    CaseExpression,
    AlwaysFf,
    AlwaysCombo,
    For,
    Block,
    Initial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructFrame {
    pub kind: ConstructKind,
    pub explicit_block: bool,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructError {
    /// `endcase` with no open case.
    UnmatchedEndcase,
    /// `end` with no open `begin`.
    UnmatchedEnd,
}

#[derive(Debug, Default)]
pub struct ConstructStack {
    frames: Vec<ConstructFrame>,
    awaiting_else: bool,
}

impl ConstructStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ConstructKind, line: usize) {
        self.frames.push(ConstructFrame {
            kind,
            explicit_block: kind == ConstructKind::CaseCondition,
            line,
        });
    }

    /// Must run before each statement is classified. Closes an `if` chain
    /// whose statement already completed unless this statement is its `else`.
    pub fn before_statement(&mut self, is_else: bool) {
        while self.awaiting_else {
            self.awaiting_else = false;
            self.frames.pop();
            if is_else {
                return;
            }
            self.complete_statement();
        }
    }

    /// `begin`: claims the block for the construct waiting on its statement,
    /// or opens an anonymous block.
    pub fn open_block(&mut self, line: usize) {
        match self.frames.last_mut() {
            Some(top) if !top.explicit_block => top.explicit_block = true,
            _ => self.frames.push(ConstructFrame {
                kind: ConstructKind::Block,
                explicit_block: true,
                line,
            }),
        }
    }

    /// `end`: closes the innermost explicit block.
    pub fn close_block(&mut self) -> Result<(), ConstructError> {
        while self.frames.last().map_or(false, |top| !top.explicit_block) {
            self.frames.pop();
        }
        let top = self.frames.last_mut().ok_or(ConstructError::UnmatchedEnd)?;
        if top.kind == ConstructKind::CaseCondition {
            return Err(ConstructError::UnmatchedEnd);
        }
        if matches!(top.kind, ConstructKind::If | ConstructKind::ElseIf) {
            top.explicit_block = false;
            self.awaiting_else = true;
            return Ok(());
        }
        self.frames.pop();
        self.complete_statement();
        Ok(())
    }

    /// `endcase`. On a mismatch the stack is unwound to the nearest case, if
    /// any, and the error is returned for reporting.
    pub fn close_case(&mut self) -> Result<(), ConstructError> {
        while self.frames.last().map_or(false, |top| !top.explicit_block) {
            self.frames.pop();
        }
        self.awaiting_else = false;
        match self.frames.last() {
            Some(top) if top.kind == ConstructKind::CaseCondition => {
                self.frames.pop();
                self.complete_statement();
                Ok(())
            }
            _ => {
                if let Some(position) = self
                    .frames
                    .iter()
                    .rposition(|frame| frame.kind == ConstructKind::CaseCondition)
                {
                    self.frames.truncate(position);
                }
                Err(ConstructError::UnmatchedEndcase)
            }
        }
    }

    /// A single statement finished: every construct that was waiting for
    /// exactly one statement is done too.
    pub fn complete_statement(&mut self) {
        while let Some(top) = self.frames.last() {
            if top.explicit_block {
                break;
            }
            if matches!(top.kind, ConstructKind::If | ConstructKind::ElseIf) {
                self.awaiting_else = true;
                break;
            }
            self.frames.pop();
        }
    }

    pub fn in_sequential(&self) -> bool {
        self.frames
            .iter()
            .any(|frame| frame.kind == ConstructKind::AlwaysFf)
    }

    pub fn in_procedural(&self) -> bool {
        self.frames.iter().any(|frame| {
            matches!(
                frame.kind,
                ConstructKind::AlwaysFf | ConstructKind::AlwaysCombo | ConstructKind::Initial
            )
        })
    }

    /// Directly inside a `case`, where `label:` items are expected.
    pub fn in_case_body(&self) -> bool {
        self.frames
            .last()
            .map_or(false, |top| top.kind == ConstructKind::CaseCondition)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[ConstructFrame] {
        &self.frames
    }

    pub fn reset(&mut self) {
        self.frames.clear();
        self.awaiting_else = false;
    }
}
