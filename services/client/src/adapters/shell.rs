//! services/client/src/adapters/shell.rs
//!
//! Terminal implementations of the UI shell ports: toasts become log events,
//! navigation is an in-memory history, and the document title is logged.

use std::collections::BTreeMap;
use std::sync::Mutex;

use screening_core::domain::{JobOpening, Route};
use screening_core::ports::{Navigator, Notifier, TitleSink, Toast, ToastKind};
use tracing::{error, info, warn};

/// Renders each toast as a single tracing event.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        let description = toast.description.unwrap_or_default();
        let action = toast
            .action
            .map(|a| format!("{} -> {}", a.label, a.target.path()))
            .unwrap_or_default();
        match toast.kind {
            ToastKind::Success => info!(description = %description, action = %action, "{}", toast.title),
            ToastKind::Error => error!(description = %description, action = %action, "{}", toast.title),
        }
    }
}

#[derive(Debug, Default)]
pub struct TracingTitle;

impl TitleSink for TracingTitle {
    fn set_title(&self, title: &str) {
        info!(title, "Page");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub route: Route,
    pub opening: Option<JobOpening>,
    pub query: BTreeMap<String, String>,
}

/// Browser-like history held in memory. `navigate` pushes, query updates
/// replace the current entry.
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<Location>>,
}

impl MemoryNavigator {
    pub fn new(route: Route, opening: Option<JobOpening>) -> Self {
        Self {
            history: Mutex::new(vec![Location {
                route,
                opening,
                query: BTreeMap::new(),
            }]),
        }
    }

    pub fn with_query(self, key: &str, value: &str) -> Self {
        self.with_current(|loc| {
            loc.query.insert(key.to_string(), value.to_string());
        });
        self
    }

    pub fn current(&self) -> Option<Location> {
        self.lock().last().cloned()
    }

    pub fn history_len(&self) -> usize {
        self.lock().len()
    }

    /// Steps back one entry, as the browser back button would.
    pub fn back(&self) -> bool {
        let mut history = self.lock();
        if history.len() > 1 {
            history.pop();
            true
        } else {
            false
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Location>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_current<R>(&self, f: impl FnOnce(&mut Location) -> R) -> Option<R> {
        self.lock().last_mut().map(f)
    }
}

impl Navigator for MemoryNavigator {
    fn navigate(&self, route: Route, opening: Option<JobOpening>) {
        info!(path = %route.path(), "Navigating");
        self.lock().push(Location {
            route,
            opening,
            query: BTreeMap::new(),
        });
    }

    fn location_opening(&self) -> Option<JobOpening> {
        self.with_current(|loc| loc.opening.clone()).flatten()
    }

    fn search_param(&self, key: &str) -> Option<String> {
        self.with_current(|loc| loc.query.get(key).cloned()).flatten()
    }

    fn replace_search_param(&self, key: &str, value: Option<&str>) {
        let updated = self.with_current(|loc| match value {
            Some(v) => {
                loc.query.insert(key.to_string(), v.to_string());
            }
            None => {
                loc.query.remove(key);
            }
        });
        if updated.is_none() {
            warn!(key, "No current location to update");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_updates_replace_the_current_entry() {
        let nav = MemoryNavigator::new(Route::OpeningDetail("JD-1".into()), None);
        nav.replace_search_param("candidateId", Some("cand"));
        nav.replace_search_param("candidateId", Some("cand-1"));
        assert_eq!(nav.history_len(), 1);
        assert_eq!(nav.search_param("candidateId").as_deref(), Some("cand-1"));

        nav.replace_search_param("candidateId", None);
        assert_eq!(nav.search_param("candidateId"), None);
    }

    #[test]
    fn navigate_pushes_and_back_restores() {
        let opening = JobOpening { id: "JD-9".into(), title: "Designer".into(), candidate_count: 0 };
        let nav = MemoryNavigator::new(Route::Openings, None).with_query("page", "2");
        nav.navigate(Route::AddCandidates("JD-9".into()), Some(opening.clone()));
        assert_eq!(nav.location_opening(), Some(opening));
        assert_eq!(nav.search_param("page"), None);

        assert!(nav.back());
        assert_eq!(nav.search_param("page").as_deref(), Some("2"));
        assert!(!nav.back());
    }
}
