//! Card-to-detail synchronization.
//!
//! Clicking a card swaps the detail pane asynchronously and the page offers no
//! completion signal, so the pane is polled until its content can be
//! attributed to the clicked card. Nothing may be read from the pane before
//! [`SyncState::Synced`]; a pane that never matches abandons the card.

use std::time::Duration;

use crate::record::{collapse_whitespace, is_unavailable};

/// Identity markers known from the card before the click.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardIdentity {
    pub title: String,
    pub company: String,
}

/// One sample of the detail pane.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaneSnapshot {
    pub title: Option<String>,
    pub company: Option<String>,
    /// Full text of the detail region; empty while nothing is rendered.
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Clicked,
    Polling { ticks: u32 },
    Synced { ticks: u32 },
    SyncFailed { ticks: u32 },
}

impl SyncState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SyncState::Synced { .. } | SyncState::SyncFailed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    pub poll_interval: Duration,
    /// Observations allowed before giving up.
    pub max_polls: u32,
}

impl SyncPolicy {
    /// Ceiling of `timeout / poll_interval` polls, at least one.
    pub fn from_timeout(poll_interval: Duration, timeout: Duration) -> Self {
        let max_polls = if poll_interval.is_zero() {
            1
        } else {
            let polls = timeout.as_millis().div_ceil(poll_interval.as_millis().max(1));
            u32::try_from(polls).unwrap_or(u32::MAX).max(1)
        };
        Self {
            poll_interval,
            max_polls,
        }
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::from_timeout(Duration::from_millis(300), Duration::from_secs(6))
    }
}

/// Explicit state machine deciding when the detail pane shows the clicked card.
#[derive(Debug, Clone)]
pub struct CardSynchronizer {
    expected: CardIdentity,
    previous_text: Option<String>,
    policy: SyncPolicy,
    state: SyncState,
}

impl CardSynchronizer {
    /// `previous_text` is the pane text attributed to the last synced card, if any.
    pub fn new(expected: CardIdentity, previous_text: Option<String>, policy: SyncPolicy) -> Self {
        Self {
            expected,
            previous_text: previous_text.filter(|text| !text.trim().is_empty()),
            policy,
            state: SyncState::Idle,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn clicked(&mut self) {
        if self.state == SyncState::Idle {
            self.state = SyncState::Clicked;
        }
    }

    /// Feed one poll tick. Terminal states and an un-clicked machine ignore input.
    pub fn observe(&mut self, snapshot: &PaneSnapshot) -> SyncState {
        let ticks = match self.state {
            SyncState::Clicked => 1,
            SyncState::Polling { ticks } => ticks + 1,
            SyncState::Idle | SyncState::Synced { .. } | SyncState::SyncFailed { .. } => {
                return self.state;
            }
        };

        self.state = if self.matches(snapshot) {
            SyncState::Synced { ticks }
        } else if ticks >= self.policy.max_polls {
            SyncState::SyncFailed { ticks }
        } else {
            SyncState::Polling { ticks }
        };
        self.state
    }

    fn matches(&self, snapshot: &PaneSnapshot) -> bool {
        let pairs = [
            (self.expected.title.as_str(), snapshot.title.as_deref()),
            (self.expected.company.as_str(), snapshot.company.as_deref()),
        ];
        let mut compared = 0;
        for (known, observed) in pairs {
            let Some(observed) = observed else { continue };
            if is_unavailable(known) || is_unavailable(observed) {
                continue;
            }
            compared += 1;
            if !loose_match(known, observed) {
                return false;
            }
        }
        if compared > 0 {
            return true;
        }

        let text = collapse_whitespace(&snapshot.text);
        if text.is_empty() {
            return false;
        }
        match &self.previous_text {
            Some(previous) => collapse_whitespace(previous) != text,
            None => true,
        }
    }
}

/// Case-insensitive containment in either direction; empty sides never match.
pub fn loose_match(a: &str, b: &str) -> bool {
    let a = collapse_whitespace(a).to_lowercase();
    let b = collapse_whitespace(b).to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Drive `machine` to a terminal state using the injected pane reader and sleeper.
///
/// A failed read (`None`) counts as an unsynced tick.
pub fn run_sync<R, S>(machine: &mut CardSynchronizer, mut read: R, mut sleep: S) -> SyncState
where
    R: FnMut() -> Option<PaneSnapshot>,
    S: FnMut(Duration),
{
    machine.clicked();
    loop {
        let snapshot = read().unwrap_or_default();
        let state = machine.observe(&snapshot);
        if state.is_terminal() {
            return state;
        }
        sleep(machine.policy().poll_interval);
    }
}
