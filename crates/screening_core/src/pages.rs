//! crates/screening_core/src/pages.rs
//!
//! Page orchestrators. Each one composes the stores with the UI shell: it sets
//! the document title, fires one-shot toasts on terminal states and turns raw
//! store state into the booleans the views need.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use crate::domain::{
    Candidate, CreatedOpening, FieldError, JobOpening, NewOpening, Route, UploadFile,
    UploadReceipt,
};
use crate::errors::{classify, partition_field_errors, Failure};
use crate::ports::{
    CandidateService, JobOpeningService, Navigator, Notifier, PortError, ResumeUploadService,
    TitleSink, Toast, ToastAction,
};
use crate::search::{CandidateSearch, SEARCH_DEBOUNCE};
use crate::store::{
    CandidateSource, CandidateStore, FetchOutcome, OpeningSource, OpeningStore, Store,
    StoreStatus,
};
use crate::upload::{
    is_pdf, is_upload_limit_reached, remaining_slots, UploadQueue, UploadStatus,
    MAX_FILE_SIZE_BYTES, MAX_FILE_SIZE_MB, RESUME_UPLOAD_LIMIT,
};

pub const DEFAULT_OPENING_TITLE: &str = "Job opening";
pub const OPENINGS_PAGE_TITLE: &str = "Job openings • Screening";
pub const MIN_TITLE_LEN: usize = 3;

/// The UI collaborators every page talks to.
#[derive(Clone)]
pub struct Shell {
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
    pub title: Arc<dyn TitleSink>,
}

fn opening_title(opening: Option<&JobOpening>) -> String {
    opening
        .map(|o| o.title.clone())
        .unwrap_or_else(|| DEFAULT_OPENING_TITLE.to_string())
}

//=========================================================================================
// Opening List Page
//=========================================================================================

/// Input of the "new opening" form.
#[derive(Debug, Clone)]
pub struct CreateOpeningForm {
    pub title: String,
    pub description: Option<UploadFile>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateOpeningError {
    /// Rejected locally or by the service, with messages for the form controls.
    #[error("The opening form has errors")]
    Invalid(Vec<FieldError>),
    #[error(transparent)]
    Failed(PortError),
}

/// Local checks for the create form, keyed by the service's field names.
pub fn validate_opening_form(form: &CreateOpeningForm) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let title = form.title.trim();
    let title_message = if title.is_empty() {
        Some("Enter the job title.")
    } else if title.chars().count() < MIN_TITLE_LEN {
        Some("Title is too short.")
    } else {
        None
    };
    if let Some(message) = title_message {
        errors.push(FieldError {
            field: "title".into(),
            messages: vec![message.into()],
        });
    }

    let file_message = match &form.description {
        None => Some("Upload the job description file in PDF.".to_string()),
        Some(file) if !is_pdf(file) => Some("Upload the job description file in PDF.".to_string()),
        Some(file) if file.size_bytes > MAX_FILE_SIZE_BYTES => {
            Some(format!("Maximum size is {}MB.", MAX_FILE_SIZE_MB))
        }
        Some(_) => None,
    };
    if let Some(message) = file_message {
        errors.push(FieldError {
            field: "job_description".into(),
            messages: vec![message],
        });
    }

    errors
}

const OPENING_FORM_CONTROLS: [&str; 2] = ["title", "job_description"];

pub struct OpeningListPage {
    shell: Shell,
    store: OpeningStore,
}

impl OpeningListPage {
    pub fn new(shell: Shell, service: Arc<dyn JobOpeningService>) -> Self {
        Self {
            shell,
            store: Store::new(OpeningSource::new(service)),
        }
    }

    pub fn store(&self) -> &OpeningStore {
        &self.store
    }

    pub async fn mount(&self) {
        self.shell.title.set_title(OPENINGS_PAGE_TITLE);
        self.refresh().await;
    }

    pub async fn refresh(&self) {
        if self.store.fetch().await == FetchOutcome::Applied(StoreStatus::Error) {
            let mut toast = Toast::error("Unable to load job openings");
            if let Some(message) = self.store.snapshot().error {
                toast = toast.with_description(message);
            }
            self.shell.notifier.notify(toast);
        }
    }

    /// Validates the form, creates the opening and moves on to the upload page.
    pub async fn handle_create(
        &self,
        form: CreateOpeningForm,
    ) -> Result<CreatedOpening, CreateOpeningError> {
        let problems = validate_opening_form(&form);
        let description = match form.description {
            Some(file) if problems.is_empty() => file,
            _ => return Err(CreateOpeningError::Invalid(problems)),
        };
        let payload = NewOpening {
            title: form.title.trim().to_string(),
            description,
        };

        match self.store.create(payload).await {
            Ok(created) => {
                info!(jd_id = %created.id, "Job opening created");
                let opening = JobOpening::provisional(&created);
                let target = Route::AddCandidates(created.id.clone());
                self.shell.notifier.notify(
                    Toast::success("Job opening created successfully")
                        .with_description("You can add resumes now.")
                        .with_action(ToastAction {
                            label: "Add resumes".into(),
                            target: target.clone(),
                            opening: Some(opening.clone()),
                        }),
                );
                self.shell.navigator.navigate(target, Some(opening));
                Ok(created)
            }
            Err(e) => match classify(&e) {
                Failure::Validation { fields, .. } => {
                    let split = partition_field_errors(&fields, &OPENING_FORM_CONTROLS);
                    if let Some(rest) = split.unmatched {
                        self.shell.notifier.notify(
                            Toast::error("Unable to create the opening").with_description(rest),
                        );
                    }
                    Err(CreateOpeningError::Invalid(split.inline))
                }
                Failure::General { message } => {
                    self.shell.notifier.notify(
                        Toast::error("Unable to create the opening").with_description(message),
                    );
                    Err(CreateOpeningError::Failed(e))
                }
            },
        }
    }

    pub fn openings(&self) -> Vec<Arc<JobOpening>> {
        self.store.snapshot().items
    }

    pub fn status(&self) -> StoreStatus {
        self.store.snapshot().status
    }

    pub fn is_creating(&self) -> bool {
        self.store.snapshot().is_creating
    }

    pub fn is_empty(&self) -> bool {
        let state = self.store.snapshot();
        state.status == StoreStatus::Success && state.items.is_empty()
    }

    pub fn teardown(&self) {
        self.store.teardown();
    }
}

//=========================================================================================
// Opening Detail Page
//=========================================================================================

/// View state of the candidate detail panel.
#[derive(Debug, Clone, Default)]
pub struct DetailView {
    pub detail_open: bool,
    pub selected: Option<Arc<Candidate>>,
    pub loading_candidate_id: Option<String>,
}

pub struct OpeningDetailPage {
    shell: Shell,
    opening: Option<JobOpening>,
    store: CandidateStore,
    search: CandidateSearch,
    view: watch::Sender<DetailView>,
}

impl OpeningDetailPage {
    pub fn new(shell: Shell, service: Arc<dyn CandidateService>, jd_id: Option<String>) -> Self {
        let opening = shell.navigator.location_opening();
        let search = CandidateSearch::new(shell.navigator.clone(), SEARCH_DEBOUNCE);
        let (view, _) = watch::channel(DetailView::default());
        Self {
            opening,
            store: Store::new(CandidateSource::new(service, jd_id)),
            search,
            view,
            shell,
        }
    }

    pub fn store(&self) -> &CandidateStore {
        &self.store
    }

    pub fn job_title(&self) -> String {
        opening_title(self.opening.as_ref())
    }

    pub fn opening(&self) -> Option<&JobOpening> {
        self.opening.as_ref()
    }

    pub async fn mount(&self) {
        self.shell
            .title
            .set_title(&format!("Opening details - {}", self.job_title()));
        self.handle_refresh().await;
    }

    /// Manual "Refresh results".
    pub async fn handle_refresh(&self) {
        if self.store.fetch().await == FetchOutcome::Applied(StoreStatus::Error) {
            let mut toast = Toast::error("Failed to load results");
            if let Some(message) = self.store.snapshot().error {
                toast = toast.with_description(message);
            }
            self.shell.notifier.notify(toast);
        }
    }

    pub async fn handle_open_candidate(&self, candidate_id: &str) {
        self.view
            .send_modify(|v| v.loading_candidate_id = Some(candidate_id.to_string()));
        match self.store.get_one(candidate_id).await {
            Ok(candidate) => self.view.send_modify(|v| {
                v.selected = Some(candidate);
                v.detail_open = true;
                v.loading_candidate_id = None;
            }),
            Err(e) => {
                error!(candidate_id, "Could not load the candidate: {}", e);
                self.view.send_modify(|v| v.loading_candidate_id = None);
                self.shell
                    .notifier
                    .notify(Toast::error("Could not load the candidate."));
            }
        }
    }

    pub fn handle_detail_open_change(&self, open: bool) {
        self.view.send_modify(|v| {
            v.detail_open = open;
            if !open {
                v.selected = None;
            }
        });
    }

    pub fn handle_search_change(&mut self, value: &str) {
        self.search.set_draft(value);
    }

    /// Picks up query-string changes made by history navigation.
    pub fn sync_location(&mut self) -> bool {
        self.search.observe_param()
    }

    pub fn search_draft(&self) -> &str {
        self.search.draft()
    }

    pub fn view(&self) -> DetailView {
        self.view.borrow().clone()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<DetailView> {
        self.view.subscribe()
    }

    pub fn filtered_candidates(&self) -> Vec<Arc<Candidate>> {
        let state = self.store.snapshot();
        self.search.filter(&state.items).into_owned()
    }

    pub fn has_search_filter(&self) -> bool {
        self.search.has_filter()
    }

    pub fn show_empty_state(&self) -> bool {
        let state = self.store.snapshot();
        state.status == StoreStatus::Success && state.items.is_empty()
    }

    pub fn is_initial_loading(&self) -> bool {
        let state = self.store.snapshot();
        state.status == StoreStatus::Loading && state.items.is_empty()
    }

    pub fn teardown(&mut self) {
        self.store.teardown();
        self.search.cancel();
    }
}

//=========================================================================================
// Add Candidates Page
//=========================================================================================

pub struct AddCandidatesPage {
    shell: Shell,
    jd_id: Option<String>,
    opening: Option<JobOpening>,
    queue: UploadQueue,
}

impl AddCandidatesPage {
    pub fn new(shell: Shell, service: Arc<dyn ResumeUploadService>, jd_id: Option<String>) -> Self {
        let opening = shell.navigator.location_opening();
        let candidate_count = opening.as_ref().map(|o| o.candidate_count);
        let slots = remaining_slots(candidate_count, RESUME_UPLOAD_LIMIT);
        Self {
            queue: UploadQueue::new(service, jd_id.clone(), slots),
            shell,
            jd_id,
            opening,
        }
    }

    pub fn mount(&self) {
        self.shell
            .title
            .set_title(&format!("Upload resumes • {}", self.job_title()));
        if self.jd_id.is_none() {
            self.shell.notifier.notify(Toast::error("Job opening not found"));
        }
    }

    pub fn job_title(&self) -> String {
        opening_title(self.opening.as_ref())
    }

    pub fn candidate_count(&self) -> Option<u32> {
        self.opening.as_ref().map(|o| o.candidate_count)
    }

    pub fn remaining_slots(&self) -> u32 {
        remaining_slots(self.candidate_count(), RESUME_UPLOAD_LIMIT)
    }

    pub fn is_limit_reached(&self) -> bool {
        is_upload_limit_reached(self.candidate_count(), RESUME_UPLOAD_LIMIT)
    }

    pub fn is_job_missing(&self) -> bool {
        self.jd_id.is_none()
    }

    pub fn files(&self) -> &[UploadFile] {
        self.queue.files()
    }

    pub fn is_submitting(&self) -> bool {
        self.queue.status() == UploadStatus::Submitting
    }

    pub fn queue(&self) -> &UploadQueue {
        &self.queue
    }

    pub fn handle_files_selected(&mut self, files: Vec<UploadFile>) {
        self.queue.add_files(files);
        self.report_queue_errors();
    }

    pub fn handle_remove(&mut self, index: usize) {
        self.queue.remove_at(index);
    }

    pub fn handle_clear(&mut self) {
        self.queue.clear();
    }

    /// Uploads the queue. Failures are surfaced as toasts, so the caller only
    /// learns whether a receipt came back.
    pub async fn handle_submit(&mut self) -> Option<UploadReceipt> {
        match self.queue.submit().await {
            Ok(receipt) => {
                self.shell.notifier.notify(
                    Toast::success("Resumes uploaded")
                        .with_description(format!("{} resume(s) queued.", receipt.queued_count))
                        .with_action(ToastAction {
                            label: "View candidates".into(),
                            target: Route::OpeningDetail(receipt.jd_id.clone()),
                            opening: None,
                        }),
                );
                Some(receipt)
            }
            Err(e) => {
                error!("Resume upload did not go through: {}", e);
                self.report_queue_errors();
                None
            }
        }
    }

    fn report_queue_errors(&self) {
        let errors = self.queue.errors();
        if errors.is_empty() {
            return;
        }
        self.shell.notifier.notify(
            Toast::error("Unable to process the selected files").with_description(errors.join(" ")),
        );
    }
}
