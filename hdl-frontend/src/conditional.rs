use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Ifdef,
    Ifndef,
    Elif,
    Else,
}

/// One open `` `ifdef `` group. `decision` is whether the current branch is
/// admitted, `served` whether any branch of the group has been admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionalFrame {
    pub kind: BranchKind,
    pub decision: bool,
    pub served: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionalError {
    #[error("`{0} without a matching `ifdef/`ifndef")]
    Unmatched(&'static str),
}

#[derive(Debug, Default)]
pub struct ConditionalStack {
    frames: Vec<ConditionalFrame>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn enclosing(&self) -> bool {
        self.frames.len() < 2 || self.frames[self.frames.len() - 2].decision
    }

    pub fn push_ifdef(&mut self, defined: bool, negate: bool) {
        let enclosing = self.is_active();
        let decision = enclosing && (defined != negate);
        self.frames.push(ConditionalFrame {
            kind: if negate {
                BranchKind::Ifndef
            } else {
                BranchKind::Ifdef
            },
            decision,
            served: decision,
        });
    }

    /// Whether an `` `elsif `` condition needs evaluating at all. When this is
    /// false the branch is dead regardless of its condition.
    pub fn can_take_elsif(&self) -> Result<bool, ConditionalError> {
        let top = self.frames.last().ok_or(ConditionalError::Unmatched("elsif"))?;
        Ok(!top.served && self.enclosing())
    }

    pub fn elsif(&mut self, condition: bool) -> Result<(), ConditionalError> {
        let enclosing = self.enclosing();
        let top = self
            .frames
            .last_mut()
            .ok_or(ConditionalError::Unmatched("elsif"))?;
        top.kind = BranchKind::Elif;
        top.decision = !top.served && enclosing && condition;
        top.served |= top.decision;
        Ok(())
    }

    pub fn else_branch(&mut self) -> Result<(), ConditionalError> {
        let enclosing = self.enclosing();
        let top = self
            .frames
            .last_mut()
            .ok_or(ConditionalError::Unmatched("else"))?;
        top.kind = BranchKind::Else;
        top.decision = !top.served && enclosing;
        top.served |= top.decision;
        Ok(())
    }

    pub fn endif(&mut self) -> Result<(), ConditionalError> {
        self.frames
            .pop()
            .map(|_| ())
            .ok_or(ConditionalError::Unmatched("endif"))
    }

    /// Whether code at the current position is admitted.
    pub fn is_active(&self) -> bool {
        self.frames.last().map_or(true, |frame| frame.decision)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[ConditionalFrame] {
        &self.frames
    }
}
