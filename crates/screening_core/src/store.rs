//! crates/screening_core/src/store.rs
//!
//! A generic list/detail store over an explicit set of remote capabilities.
//!
//! Every store can `fetch()` its collection. Sources that can look a single
//! item up (`RemoteLookup`) get a cached `get_one`, and sources that can create
//! items (`RemoteCreate`) get an optimistic `create`. State is published on a
//! `watch` channel so the pages can react to terminal states.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{Candidate, CreatedOpening, JobOpening, NewOpening};
use crate::errors::{extract_error_message, is_validation_error};
use crate::ports::{CandidateService, JobOpeningService, PortError, PortResult};

//=========================================================================================
// Capabilities
//=========================================================================================

pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for JobOpening {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Candidate {
    fn id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
pub trait RemoteCollection: Send + Sync + 'static {
    type Item: Identified + Send + Sync + 'static;

    /// Name used in log lines.
    const NAME: &'static str;

    /// A source that is not ready (e.g. no opening selected) makes `fetch` a no-op.
    fn is_ready(&self) -> bool {
        true
    }

    async fn list(&self) -> PortResult<Vec<Self::Item>>;
}

#[async_trait]
pub trait RemoteLookup: RemoteCollection {
    async fn get_one(&self, id: &str) -> PortResult<Self::Item>;
}

#[async_trait]
pub trait RemoteCreate: RemoteCollection {
    type Payload: Send + 'static;
    type Created: Send + 'static;

    /// The local projection inserted before the next server refresh.
    fn project(created: &Self::Created) -> Self::Item;

    async fn create(&self, payload: Self::Payload) -> PortResult<Self::Created>;
}

//=========================================================================================
// Store State
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// What happened to the response of one `fetch()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was applied; carries the resulting status.
    Applied(StoreStatus),
    /// A newer fetch was issued meanwhile, or the store was torn down.
    Discarded,
    /// The source was not ready, nothing was requested.
    Skipped,
}

#[derive(Debug)]
pub struct StoreState<T> {
    pub status: StoreStatus,
    pub items: Vec<Arc<T>>,
    pub error: Option<String>,
    pub is_creating: bool,
}

impl<T> Clone for StoreState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            items: self.items.clone(),
            error: self.error.clone(),
            is_creating: self.is_creating,
        }
    }
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            status: StoreStatus::Idle,
            items: Vec::new(),
            error: None,
            is_creating: false,
        }
    }
}

impl<T: Identified> StoreState<T> {
    fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    fn find(&self, id: &str) -> Option<Arc<T>> {
        self.items.iter().find(|item| item.id() == id).cloned()
    }
}

/// Keeps the first occurrence of every id.
fn dedupe<T: Identified>(items: Vec<T>) -> Vec<Arc<T>> {
    let mut out: Vec<Arc<T>> = Vec::with_capacity(items.len());
    for item in items {
        if !out.iter().any(|existing| existing.id() == item.id()) {
            out.push(Arc::new(item));
        }
    }
    out
}

//=========================================================================================
// The Store
//=========================================================================================

pub struct Store<S: RemoteCollection> {
    source: S,
    state: watch::Sender<StoreState<S::Item>>,
    /// Sequence number of the most recently issued fetch.
    latest_fetch: AtomicU64,
    shutdown: CancellationToken,
}

impl<S: RemoteCollection> Store<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            source,
            state,
            latest_fetch: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn snapshot(&self) -> StoreState<S::Item> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState<S::Item>> {
        self.state.subscribe()
    }

    /// Reloads the whole collection. Never fails: errors become state.
    ///
    /// Only the response of the most recently issued fetch is applied; older
    /// responses that land later are discarded.
    pub async fn fetch(&self) -> FetchOutcome {
        if !self.source.is_ready() {
            return FetchOutcome::Skipped;
        }
        let seq = self.latest_fetch.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| {
            s.status = StoreStatus::Loading;
            s.error = None;
        });

        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                debug!(store = S::NAME, seq, "Store torn down, dropping fetch");
                return FetchOutcome::Discarded;
            }
            result = self.source.list() => result,
        };

        if self.latest_fetch.load(Ordering::SeqCst) != seq {
            debug!(store = S::NAME, seq, "Discarding stale fetch response");
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(items) => {
                let items = dedupe(items);
                info!(store = S::NAME, count = items.len(), "Collection loaded");
                self.state.send_modify(|s| {
                    s.items = items;
                    s.status = StoreStatus::Success;
                });
                FetchOutcome::Applied(StoreStatus::Success)
            }
            Err(e) => {
                warn!(store = S::NAME, "Failed to load collection: {}", e);
                let message = extract_error_message(&e);
                self.state.send_modify(|s| {
                    s.error = Some(message);
                    s.status = StoreStatus::Error;
                });
                FetchOutcome::Applied(StoreStatus::Error)
            }
        }
    }

    /// Stops applying the results of in-flight fetches.
    pub fn teardown(&self) {
        self.shutdown.cancel();
    }
}

impl<S: RemoteCollection> Drop for Store<S> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl<S: RemoteLookup> Store<S> {
    /// Returns the loaded entry when present, otherwise fetches it by id and
    /// appends it to the collection unless a concurrent refresh already did.
    pub async fn get_one(&self, id: &str) -> PortResult<Arc<S::Item>> {
        let cached = self.state.borrow().find(id);
        if let Some(item) = cached {
            debug!(store = S::NAME, id, "Serving item from the loaded collection");
            return Ok(item);
        }

        let fetched = self.source.get_one(id).await.map_err(|e| {
            warn!(store = S::NAME, id, "Failed to load item: {}", e);
            e
        })?;

        let mut resolved = None;
        self.state.send_if_modified(|s| match s.find(fetched.id()) {
            Some(existing) => {
                resolved = Some(existing);
                false
            }
            None => {
                let item = Arc::new(fetched);
                s.items.push(item.clone());
                resolved = Some(item);
                true
            }
        });
        resolved.ok_or_else(|| PortError::Unexpected("item vanished during insert".to_string()))
    }
}

impl<S: RemoteCreate> Store<S> {
    /// Creates an item remotely and prepends its projection locally.
    ///
    /// Validation failures are left to the caller; any other failure is also
    /// recorded as the store's error message. The error is always returned.
    pub async fn create(&self, payload: S::Payload) -> PortResult<S::Created> {
        self.state.send_modify(|s| s.is_creating = true);
        let result = self.source.create(payload).await;

        match result {
            Ok(created) => {
                let item = S::project(&created);
                self.state.send_modify(|s| {
                    s.is_creating = false;
                    if !s.contains(item.id()) {
                        s.items.insert(0, Arc::new(item));
                    }
                });
                Ok(created)
            }
            Err(e) => {
                warn!(store = S::NAME, "Failed to create item: {}", e);
                let validation = is_validation_error(&e);
                let message = extract_error_message(&e);
                self.state.send_modify(|s| {
                    s.is_creating = false;
                    if !validation {
                        s.error = Some(message);
                    }
                });
                Err(e)
            }
        }
    }
}

//=========================================================================================
// Concrete Sources
//=========================================================================================

pub struct OpeningSource {
    service: Arc<dyn JobOpeningService>,
}

impl OpeningSource {
    pub fn new(service: Arc<dyn JobOpeningService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RemoteCollection for OpeningSource {
    type Item = JobOpening;
    const NAME: &'static str = "openings";

    async fn list(&self) -> PortResult<Vec<JobOpening>> {
        self.service.list_openings().await
    }
}

#[async_trait]
impl RemoteCreate for OpeningSource {
    type Payload = NewOpening;
    type Created = CreatedOpening;

    fn project(created: &CreatedOpening) -> JobOpening {
        JobOpening::provisional(created)
    }

    async fn create(&self, payload: NewOpening) -> PortResult<CreatedOpening> {
        self.service.create_opening(payload).await
    }
}

/// Candidates of one opening. Without an opening id nothing is fetched.
pub struct CandidateSource {
    service: Arc<dyn CandidateService>,
    jd_id: Option<String>,
}

impl CandidateSource {
    pub fn new(service: Arc<dyn CandidateService>, jd_id: Option<String>) -> Self {
        Self { service, jd_id }
    }

    pub fn jd_id(&self) -> Option<&str> {
        self.jd_id.as_deref()
    }
}

#[async_trait]
impl RemoteCollection for CandidateSource {
    type Item = Candidate;
    const NAME: &'static str = "candidates";

    fn is_ready(&self) -> bool {
        self.jd_id.is_some()
    }

    async fn list(&self) -> PortResult<Vec<Candidate>> {
        let jd_id = self.jd_id.as_deref().ok_or(PortError::MissingJobOpening)?;
        self.service.list_candidates(jd_id).await
    }
}

#[async_trait]
impl RemoteLookup for CandidateSource {
    async fn get_one(&self, id: &str) -> PortResult<Candidate> {
        let jd_id = self.jd_id.as_deref().ok_or(PortError::MissingJobOpening)?;
        self.service.get_candidate(jd_id, id).await
    }
}

pub type OpeningStore = Store<OpeningSource>;
pub type CandidateStore = Store<CandidateSource>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldError, UploadFile};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn opening(id: &str, title: &str) -> JobOpening {
        JobOpening { id: id.into(), title: title.into(), candidate_count: 3 }
    }

    fn candidate(id: &str) -> Candidate {
        Candidate {
            id: id.into(),
            name: Some(format!("Name of {}", id)),
            email: None,
            fit_score: Some(70.0),
            summary: "Solid".into(),
            strengths: vec![],
            weaknesses: vec![],
            evidence: String::new(),
        }
    }

    /// Each `list` call waits on the next receiver, so tests decide when and
    /// in which order responses land.
    #[derive(Default)]
    struct ScriptedOpenings {
        pending: Mutex<VecDeque<oneshot::Receiver<PortResult<Vec<JobOpening>>>>>,
        create_result: Mutex<Option<PortResult<CreatedOpening>>>,
    }

    impl ScriptedOpenings {
        fn script(&self) -> oneshot::Sender<PortResult<Vec<JobOpening>>> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().push_back(rx);
            tx
        }
    }

    #[async_trait]
    impl JobOpeningService for ScriptedOpenings {
        async fn list_openings(&self) -> PortResult<Vec<JobOpening>> {
            let rx = self.pending.lock().unwrap().pop_front().expect("unscripted list call");
            rx.await.expect("script sender dropped")
        }

        async fn create_opening(&self, _opening: NewOpening) -> PortResult<CreatedOpening> {
            self.create_result.lock().unwrap().take().expect("unscripted create call")
        }
    }

    #[derive(Default)]
    struct FakeCandidates {
        list: Mutex<Vec<Candidate>>,
        by_id: Mutex<Option<PortResult<Candidate>>>,
        get_calls: Mutex<u32>,
    }

    #[async_trait]
    impl CandidateService for FakeCandidates {
        async fn list_candidates(&self, _jd_id: &str) -> PortResult<Vec<Candidate>> {
            Ok(self.list.lock().unwrap().clone())
        }

        async fn get_candidate(&self, _jd_id: &str, _candidate_id: &str) -> PortResult<Candidate> {
            *self.get_calls.lock().unwrap() += 1;
            self.by_id.lock().unwrap().clone().expect("unscripted get call")
        }
    }

    /// Lists immediately; each `get_candidate` waits on the next scripted receiver.
    #[derive(Default)]
    struct SlowLookupCandidates {
        list: Mutex<Vec<Candidate>>,
        pending: Mutex<VecDeque<oneshot::Receiver<PortResult<Candidate>>>>,
    }

    impl SlowLookupCandidates {
        fn script(&self) -> oneshot::Sender<PortResult<Candidate>> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().push_back(rx);
            tx
        }
    }

    #[async_trait]
    impl CandidateService for SlowLookupCandidates {
        async fn list_candidates(&self, _jd_id: &str) -> PortResult<Vec<Candidate>> {
            Ok(self.list.lock().unwrap().clone())
        }

        async fn get_candidate(&self, _jd_id: &str, _candidate_id: &str) -> PortResult<Candidate> {
            let rx = self.pending.lock().unwrap().pop_front().expect("unscripted get call");
            rx.await.expect("script sender dropped")
        }
    }

    fn opening_store() -> (Arc<ScriptedOpenings>, OpeningStore) {
        let fake = Arc::new(ScriptedOpenings::default());
        (fake.clone(), Store::new(OpeningSource::new(fake)))
    }

    fn candidate_store(fake: Arc<FakeCandidates>) -> CandidateStore {
        Store::new(CandidateSource::new(fake, Some("JD-1".into())))
    }

    #[tokio::test]
    async fn test_fetch_replaces_collection() {
        let (fake, store) = opening_store();
        fake.script().send(Ok(vec![opening("a", "A"), opening("b", "B"), opening("a", "dup")])).unwrap();
        assert_eq!(store.snapshot().status, StoreStatus::Idle);
        store.fetch().await;
        let state = store.snapshot();
        assert_eq!(state.status, StoreStatus::Success);
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.items[0].title, "A");
    }

    #[tokio::test]
    async fn test_fetch_failure_becomes_state() {
        let (fake, store) = opening_store();
        fake.script()
            .send(Err(PortError::Status { status: 500, message: Some("Server unavailable".into()), errors: vec![] }))
            .unwrap();
        store.fetch().await;
        let state = store.snapshot();
        assert_eq!(state.status, StoreStatus::Error);
        assert_eq!(state.error.as_deref(), Some("Server unavailable"));
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (fake, store) = opening_store();
        let first = fake.script();
        let second = fake.script();

        let driver = async {
            tokio::task::yield_now().await;
            second.send(Ok(vec![opening("new", "Newer")])).unwrap();
            tokio::task::yield_now().await;
            first.send(Ok(vec![opening("old", "Older")])).unwrap();
        };
        let (older, newer, _) = tokio::join!(store.fetch(), store.fetch(), driver);
        assert_eq!(older, FetchOutcome::Discarded);
        assert_eq!(newer, FetchOutcome::Applied(StoreStatus::Success));

        let state = store.snapshot();
        assert_eq!(state.status, StoreStatus::Success);
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].id, "new");
    }

    #[tokio::test]
    async fn test_teardown_drops_in_flight_fetch() {
        let (fake, store) = opening_store();
        let tx = fake.script();
        let teardown = async {
            tokio::task::yield_now().await;
            store.teardown();
            let _ = tx.send(Ok(vec![opening("late", "Late")]));
        };
        let (outcome, _) = tokio::join!(store.fetch(), teardown);
        assert_eq!(outcome, FetchOutcome::Discarded);
        assert!(store.snapshot().items.is_empty());
    }

    #[tokio::test]
    async fn test_create_prepends_provisional_opening() {
        let (fake, store) = opening_store();
        fake.script().send(Ok(vec![opening("JD-1", "Existing")])).unwrap();
        store.fetch().await;

        *fake.create_result.lock().unwrap() =
            Some(Ok(CreatedOpening { id: "JD-2".into(), title: "Backend Engineer".into() }));
        let payload = NewOpening {
            title: "Backend Engineer".into(),
            description: UploadFile::new("jd.pdf", "application/pdf", vec![1u8, 2, 3]),
        };
        let created = store.create(payload).await.unwrap();
        assert_eq!(created.id, "JD-2");

        let state = store.snapshot();
        assert!(!state.is_creating);
        assert_eq!(
            *state.items[0],
            JobOpening { id: "JD-2".into(), title: "Backend Engineer".into(), candidate_count: 0 }
        );
        assert_eq!(state.items.len(), 2);
    }

    #[tokio::test]
    async fn test_create_validation_failure_is_not_recorded() {
        let (fake, store) = opening_store();
        *fake.create_result.lock().unwrap() = Some(Err(PortError::Status {
            status: 422,
            message: None,
            errors: vec![FieldError { field: "title".into(), messages: vec!["too short".into()] }],
        }));
        let payload = NewOpening {
            title: "BE".into(),
            description: UploadFile::new("jd.pdf", "application/pdf", vec![1u8]),
        };
        let err = store.create(payload.clone()).await.unwrap_err();
        assert!(is_validation_error(&err));
        assert_eq!(store.snapshot().error, None);

        *fake.create_result.lock().unwrap() = Some(Err(PortError::Network("Network Error".into())));
        store.create(payload).await.unwrap_err();
        let state = store.snapshot();
        assert_eq!(state.error.as_deref(), Some("Network Error"));
        assert!(state.items.is_empty());
    }

    #[tokio::test]
    async fn test_get_one_serves_loaded_candidate_without_network() {
        let fake = Arc::new(FakeCandidates::default());
        *fake.list.lock().unwrap() = vec![candidate("cand-1"), candidate("cand-2")];
        let store = candidate_store(fake.clone());
        store.fetch().await;

        let loaded = store.snapshot().items[0].clone();
        let found = store.get_one("cand-1").await.unwrap();
        assert!(Arc::ptr_eq(&loaded, &found));
        assert_eq!(*fake.get_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_one_appends_fetched_candidate() {
        let fake = Arc::new(FakeCandidates::default());
        *fake.by_id.lock().unwrap() = Some(Ok(candidate("cand-9")));
        let store = candidate_store(fake.clone());

        let found = store.get_one("cand-9").await.unwrap();
        assert_eq!(found.id, "cand-9");
        assert_eq!(store.snapshot().items.len(), 1);

        // Second lookup is served locally.
        store.get_one("cand-9").await.unwrap();
        assert_eq!(*fake.get_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_one_failure_leaves_state_alone() {
        let fake = Arc::new(FakeCandidates::default());
        *fake.by_id.lock().unwrap() = Some(Err(PortError::Status { status: 404, message: None, errors: vec![] }));
        let store = candidate_store(fake);
        let err = store.get_one("missing").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        let state = store.snapshot();
        assert!(state.items.is_empty());
        assert_eq!(state.status, StoreStatus::Idle);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_candidates_without_opening_do_nothing() {
        let store = Store::new(CandidateSource::new(Arc::new(FakeCandidates::default()), None));
        assert_eq!(store.fetch().await, FetchOutcome::Skipped);
        assert_eq!(store.snapshot().status, StoreStatus::Idle);
        assert_eq!(store.get_one("x").await.unwrap_err(), PortError::MissingJobOpening);
    }

    #[tokio::test]
    async fn test_get_one_keeps_entry_inserted_by_concurrent_fetch() {
        let fake = Arc::new(SlowLookupCandidates::default());
        let mut refreshed = candidate("cand-9");
        refreshed.summary = "From the refresh".into();
        *fake.list.lock().unwrap() = vec![refreshed];
        let lookup = fake.script();
        let store = Store::new(CandidateSource::new(fake.clone(), Some("JD-1".into())));

        let refresh = async {
            tokio::task::yield_now().await;
            assert_eq!(store.fetch().await, FetchOutcome::Applied(StoreStatus::Success));
            lookup.send(Ok(candidate("cand-9"))).unwrap();
        };
        let (found, _) = tokio::join!(store.get_one("cand-9"), refresh);
        let found = found.unwrap();

        let state = store.snapshot();
        assert_eq!(state.items.len(), 1);
        assert!(Arc::ptr_eq(&found, &state.items[0]));
        assert_eq!(found.summary, "From the refresh");
    }

    #[tokio::test]
    async fn test_create_with_known_id_does_not_grow_list() {
        let (fake, store) = opening_store();
        fake.script().send(Ok(vec![opening("JD-2", "Backend Engineer")])).unwrap();
        store.fetch().await;
        let before = store.snapshot().items[0].clone();

        *fake.create_result.lock().unwrap() =
            Some(Ok(CreatedOpening { id: "JD-2".into(), title: "Backend Engineer".into() }));
        let payload = NewOpening {
            title: "Backend Engineer".into(),
            description: UploadFile::new("jd.pdf", "application/pdf", vec![1u8]),
        };
        store.create(payload).await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.items.len(), 1);
        assert!(Arc::ptr_eq(&before, &state.items[0]));
        assert_eq!(state.items[0].candidate_count, 3);
    }
}
