//! Count-and-confirm gate in front of recursive removals.

use std::io;

use crate::error::EngineResult;
use crate::reader::NamespaceReader;

/// Where a removal stands in the confirmation protocol.
///
/// ```text
/// Idle -> Counting -> AutoProceed ---------------------> Proceed
///                  -> AwaitingConfirmation { count } -> Proceed | Aborted
/// Idle -> Proceed   (non-recursive or forced)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmState {
    Idle,
    Counting,
    AutoProceed,
    AwaitingConfirmation { count: u64 },
    Proceed,
    Aborted,
}

impl ConfirmState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Proceed | Self::Aborted)
    }
}

/// Source of yes/no answers for a pending removal.
pub trait Confirm {
    /// Ask whether `count` keys under `label` may be deleted.
    fn confirm(&mut self, count: u64, label: &str) -> io::Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(u64, &str) -> bool,
{
    fn confirm(&mut self, count: u64, label: &str) -> io::Result<bool> {
        Ok(self(count, label))
    }
}

/// Answers yes to everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysYes;

impl Confirm for AlwaysYes {
    fn confirm(&mut self, _count: u64, _label: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Answers no to everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysNo;

impl Confirm for AlwaysNo {
    fn confirm(&mut self, _count: u64, _label: &str) -> io::Result<bool> {
        Ok(false)
    }
}

/// Interpret a typed answer. Only a leading `Y` or `y` counts as yes;
/// leading whitespace is ignored, an empty answer is a no.
pub fn answer_is_yes(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}

/// Drives the confirmation state machine for one removal at a time.
pub struct RemovalConfirmer<C: Confirm> {
    confirm: C,
    state: ConfirmState,
    trail: Vec<ConfirmState>,
}

impl<C: Confirm> RemovalConfirmer<C> {
    pub fn new(confirm: C) -> Self {
        Self {
            confirm,
            state: ConfirmState::Idle,
            trail: vec![ConfirmState::Idle],
        }
    }

    /// Current state. `Idle` until the first gate.
    pub fn state(&self) -> ConfirmState {
        self.state
    }

    /// Every state visited by the most recent gate, starting at `Idle`.
    pub fn trail(&self) -> &[ConfirmState] {
        &self.trail
    }

    /// Run one removal through the gate. Always ends in `Proceed` or
    /// `Aborted`.
    ///
    /// `recursive` must be the effective mode (see
    /// [`NamespaceWriter::is_recursive`](crate::writer::NamespaceWriter::is_recursive)).
    pub fn gate(
        &mut self,
        reader: &NamespaceReader<'_>,
        key: &str,
        recursive: bool,
        force: bool,
    ) -> EngineResult<ConfirmState> {
        self.trail.clear();
        self.enter(ConfirmState::Idle);

        if !recursive || force {
            self.enter(ConfirmState::Proceed);
            return Ok(self.state);
        }

        self.enter(ConfirmState::Counting);
        let count = reader.count(key.as_bytes())?;
        if count == 0 {
            self.enter(ConfirmState::AutoProceed);
            self.enter(ConfirmState::Proceed);
            return Ok(self.state);
        }

        self.enter(ConfirmState::AwaitingConfirmation { count });
        let next = if self.confirm.confirm(count, key)? {
            ConfirmState::Proceed
        } else {
            ConfirmState::Aborted
        };
        self.enter(next);
        Ok(self.state)
    }

    fn enter(&mut self, state: ConfirmState) {
        self.state = state;
        self.trail.push(state);
    }
}
