use crate::effect::{EndReason, SkipReason};
use crate::msg::DetailFailure;
use crate::state::PendingCard;
use crate::{CardSummary, Effect, JobRecord, Msg, Relevance, ScanState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ScanState, msg: Msg) -> (ScanState, Vec<Effect>) {
    let effects = match msg {
        Msg::KeywordStarted(keyword) => {
            state.keyword = Some(keyword);
            state.page = 0;
            state.pending = None;
            if state.halt_at_cap() {
                vec![Effect::StopRun]
            } else {
                state.counters.keywords += 1;
                Vec::new()
            }
        }
        Msg::PageLoaded { page, card_count } => {
            state.page = page;
            if state.halt_at_cap() {
                vec![Effect::StopRun]
            } else if page > state.limits.max_pages_per_keyword {
                vec![Effect::EndKeyword {
                    reason: EndReason::PageCap,
                }]
            } else if card_count == 0 {
                vec![Effect::EndKeyword {
                    reason: EndReason::NoResults,
                }]
            } else {
                state.counters.pages += 1;
                Vec::new()
            }
        }
        Msg::CardListed { index, card } => on_card(&mut state, index, card),
        Msg::DetailExtracted(record) => on_record(&mut state, record),
        Msg::DetailFailed { reason } => {
            let Some(pending) = state.pending.take() else {
                return (state, Vec::new());
            };
            state.counters.skipped += 1;
            let reason = match reason {
                DetailFailure::SyncFailed { .. } => {
                    state.counters.sync_failures += 1;
                    SkipReason::SyncFailed
                }
                DetailFailure::Transient(message) => SkipReason::Unreadable(message),
            };
            vec![Effect::Skipped {
                title: pending.card.title,
                reason,
            }]
        }
        Msg::PageFinished { has_next } => {
            state.pending = None;
            let reason = if state.stopped {
                return (state, vec![Effect::StopRun]);
            } else if !has_next {
                EndReason::LastPage
            } else if state.page >= state.limits.max_pages_per_keyword {
                EndReason::PageCap
            } else {
                return (state, vec![Effect::AdvancePage]);
            };
            vec![Effect::EndKeyword { reason }]
        }
        Msg::PageFailed { reason } => {
            state.pending = None;
            vec![Effect::EndKeyword {
                reason: EndReason::PageError(reason),
            }]
        }
    };

    (state, effects)
}

fn on_card(state: &mut ScanState, index: usize, card: CardSummary) -> Vec<Effect> {
    if state.halt_at_cap() {
        return vec![Effect::StopRun];
    }
    state.counters.cards += 1;

    let skip = |state: &mut ScanState, title: String, reason: SkipReason| {
        state.counters.skipped += 1;
        vec![Effect::Skipped { title, reason }]
    };

    if card.url.trim().is_empty() {
        return skip(state, card.title, SkipReason::MissingUrl);
    }
    if state.seen.contains_url(&card.url) {
        state.counters.duplicates += 1;
        return skip(state, card.title, SkipReason::AlreadySeen);
    }

    let verdict = state.classifier.explain_title(&card.title);
    if verdict.relevance == Relevance::Skip {
        let reason = match verdict.matched {
            Some(term) => SkipReason::Excluded { term },
            None => SkipReason::NotRelevant,
        };
        return skip(state, card.title, reason);
    }

    state.counters.opened += 1;
    state.pending = Some(PendingCard {
        card,
        relevance: verdict.relevance,
    });
    vec![Effect::OpenDetail {
        index,
        relevance: verdict.relevance,
    }]
}

fn on_record(state: &mut ScanState, record: JobRecord) -> Vec<Effect> {
    let Some(pending) = state.pending.take() else {
        return Vec::new();
    };
    if state.stopped {
        return vec![Effect::StopRun];
    }

    let reason = if !record.satisfies(&state.policy) {
        Some(SkipReason::InvalidRecord)
    } else if state.seen.is_duplicate(&record) {
        state.counters.duplicates += 1;
        Some(SkipReason::Duplicate)
    } else if !state
        .classifier
        .should_save(pending.relevance, &record.description)
    {
        Some(SkipReason::NotConfirmed)
    } else {
        None
    };
    if let Some(reason) = reason {
        state.counters.skipped += 1;
        return vec![Effect::Skipped {
            title: record.title,
            reason,
        }];
    }

    state.seen.insert(&record);
    let mut effects = vec![Effect::Accepted {
        title: record.title.clone(),
        url: record.url.clone(),
        verified: pending.relevance == Relevance::CheckDescription,
    }];
    state.buffer.push(record);
    if state.cap_reached() {
        state.stopped = true;
        effects.push(Effect::StopRun);
    }
    effects
}
