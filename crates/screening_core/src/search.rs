//! crates/screening_core/src/search.rs
//!
//! Candidate-id search backed by the `candidateId` query parameter.
//!
//! The draft follows the input on every keystroke. The query parameter is
//! written only after the input has been quiet for the settle window, and
//! always with a history replace. The visible list is filtered from the
//! committed parameter, never from the draft.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::debounce::Debouncer;
use crate::domain::Candidate;
use crate::ports::Navigator;

pub const CANDIDATE_ID_PARAM: &str = "candidateId";
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Case-insensitive substring match on candidate id.
/// A blank search returns the input slice itself.
pub fn filter_candidates_by_id<'a>(
    candidates: &'a [Arc<Candidate>],
    search: &str,
) -> Cow<'a, [Arc<Candidate>]> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return Cow::Borrowed(candidates);
    }
    Cow::Owned(
        candidates
            .iter()
            .filter(|c| c.id.to_lowercase().contains(&needle))
            .cloned()
            .collect(),
    )
}

pub fn has_candidate_id_filter(search: &str) -> bool {
    !search.trim().is_empty()
}

pub struct CandidateSearch {
    navigator: Arc<dyn Navigator>,
    draft: String,
    observed: String,
    debouncer: Debouncer,
}

impl CandidateSearch {
    pub fn new(navigator: Arc<dyn Navigator>, window: Duration) -> Self {
        let committed = navigator.search_param(CANDIDATE_ID_PARAM).unwrap_or_default();
        Self {
            navigator,
            draft: committed.clone(),
            observed: committed,
            debouncer: Debouncer::new(window),
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// The value currently in the query string.
    pub fn committed(&self) -> String {
        self.navigator
            .search_param(CANDIDATE_ID_PARAM)
            .unwrap_or_default()
    }

    /// Updates the draft and re-arms the commit timer.
    pub fn set_draft(&mut self, value: impl Into<String>) {
        self.draft = value.into();
        let navigator = self.navigator.clone();
        let draft = self.draft.clone();
        self.debouncer.schedule(move || {
            let current = navigator.search_param(CANDIDATE_ID_PARAM).unwrap_or_default();
            if draft == current {
                return;
            }
            let trimmed = draft.trim();
            debug!(search = trimmed, "Committing candidate search");
            if trimmed.is_empty() {
                navigator.replace_search_param(CANDIDATE_ID_PARAM, None);
            } else {
                navigator.replace_search_param(CANDIDATE_ID_PARAM, Some(trimmed));
            }
        });
    }

    /// Resynchronizes the draft when the query parameter changed outside the
    /// search (back/forward navigation). Returns whether it changed.
    pub fn observe_param(&mut self) -> bool {
        let committed = self.committed();
        if committed == self.observed {
            return false;
        }
        self.observed = committed.clone();
        if self.draft != committed {
            self.draft = committed;
        }
        true
    }

    /// Drops the pending commit, if any. Dropping the search does the same.
    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    pub fn filter<'a>(&self, candidates: &'a [Arc<Candidate>]) -> Cow<'a, [Arc<Candidate>]> {
        filter_candidates_by_id(candidates, &self.committed())
    }

    pub fn has_filter(&self) -> bool {
        has_candidate_id_filter(&self.committed())
    }
}
