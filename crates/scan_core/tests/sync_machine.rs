use std::cell::Cell;
use std::time::Duration;

use scan_core::{
    loose_match, run_sync, CardIdentity, CardSynchronizer, PaneSnapshot, SyncPolicy, SyncState,
};

fn identity(title: &str, company: &str) -> CardIdentity {
    CardIdentity {
        title: title.to_string(),
        company: company.to_string(),
    }
}

fn pane(title: &str, company: &str, text: &str) -> PaneSnapshot {
    PaneSnapshot {
        title: Some(title.to_string()),
        company: Some(company.to_string()),
        text: text.to_string(),
    }
}

fn policy(max_polls: u32) -> SyncPolicy {
    SyncPolicy {
        poll_interval: Duration::from_millis(300),
        max_polls,
    }
}

/// A pane that keeps showing the previous job for `stale` reads, then the clicked one.
struct SimulatedPane {
    stale: u32,
    reads: Cell<u32>,
    previous: PaneSnapshot,
    current: PaneSnapshot,
}

impl SimulatedPane {
    fn read(&self) -> Option<PaneSnapshot> {
        let n = self.reads.get();
        self.reads.set(n + 1);
        if n < self.stale {
            Some(self.previous.clone())
        } else {
            Some(self.current.clone())
        }
    }
}

#[test]
fn synced_exactly_one_tick_after_stale_content() {
    for stale in 0..5 {
        let sim = SimulatedPane {
            stale,
            reads: Cell::new(0),
            previous: pane("Data Engineer", "Acme", "old job"),
            current: pane("Data Scientist", "Globex", "new job"),
        };
        let mut machine = CardSynchronizer::new(
            identity("Data Scientist", "Globex"),
            Some("old job".to_string()),
            policy(20),
        );
        let mut sleeps = 0;

        let state = run_sync(&mut machine, || sim.read(), |_| sleeps += 1);

        assert_eq!(state, SyncState::Synced { ticks: stale + 1 });
        assert_eq!(sleeps, stale);
    }
}

#[test]
fn states_walk_idle_clicked_polling_synced() {
    let mut machine = CardSynchronizer::new(identity("Analyst", "Initech"), None, policy(5));
    assert_eq!(machine.state(), SyncState::Idle);

    let stale = pane("Engineer", "Hooli", "stale");
    assert_eq!(machine.observe(&stale), SyncState::Idle);

    machine.clicked();
    assert_eq!(machine.state(), SyncState::Clicked);
    assert_eq!(machine.observe(&stale), SyncState::Polling { ticks: 1 });
    assert_eq!(
        machine.observe(&pane("Senior Analyst", "Initech Inc.", "x")),
        SyncState::Synced { ticks: 2 }
    );
    assert_eq!(machine.observe(&stale), SyncState::Synced { ticks: 2 });
}

#[test]
fn never_matching_pane_fails_after_max_polls() {
    let mut machine = CardSynchronizer::new(identity("Analyst", "Initech"), None, policy(3));
    let mut reads = 0;
    let state = run_sync(
        &mut machine,
        || {
            reads += 1;
            Some(pane("Engineer", "Hooli", "other"))
        },
        |_| {},
    );
    assert_eq!(state, SyncState::SyncFailed { ticks: 3 });
    assert_eq!(reads, 3);
}

#[test]
fn failed_reads_count_as_unsynced_ticks() {
    let mut machine = CardSynchronizer::new(identity("Analyst", "Initech"), None, policy(4));
    let mut reads = 0;
    let state = run_sync(
        &mut machine,
        || {
            reads += 1;
            (reads > 2).then(|| pane("Analyst", "Initech", "body"))
        },
        |_| {},
    );
    assert_eq!(state, SyncState::Synced { ticks: 3 });
}

#[test]
fn company_mismatch_blocks_sync_even_when_title_matches() {
    let mut machine = CardSynchronizer::new(identity("Data Analyst", "Initech"), None, policy(2));
    machine.clicked();
    assert_eq!(
        machine.observe(&pane("Data Analyst", "Hooli", "body")),
        SyncState::Polling { ticks: 1 }
    );
}

#[test]
fn text_fallback_requires_changed_non_empty_pane() {
    let mut machine = CardSynchronizer::new(
        identity("Data Analyst", "N/A"),
        Some("previous   body".to_string()),
        policy(5),
    );
    machine.clicked();
    let textual = |text: &str| PaneSnapshot {
        title: None,
        company: None,
        text: text.to_string(),
    };

    assert_eq!(machine.observe(&textual("")), SyncState::Polling { ticks: 1 });
    assert_eq!(
        machine.observe(&textual("previous body")),
        SyncState::Polling { ticks: 2 }
    );
    assert_eq!(
        machine.observe(&textual("fresh body")),
        SyncState::Synced { ticks: 3 }
    );
}

#[test]
fn policy_rounds_timeout_up() {
    let policy = SyncPolicy::from_timeout(Duration::from_millis(300), Duration::from_millis(1000));
    assert_eq!(policy.max_polls, 4);
    assert_eq!(SyncPolicy::default().max_polls, 20);
    assert_eq!(
        SyncPolicy::from_timeout(Duration::ZERO, Duration::from_secs(1)).max_polls,
        1
    );
}

#[test]
fn loose_match_is_bidirectional_and_case_insensitive() {
    assert!(loose_match("Data Scientist", "senior data scientist ii"));
    assert!(loose_match("Globex Corporation", "globex"));
    assert!(!loose_match("Globex", ""));
    assert!(!loose_match("Analyst", "Engineer"));
}
