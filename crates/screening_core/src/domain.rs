//! crates/screening_core/src/domain.rs
//!
//! Defines the pure, core data structures for the screening client.
//! These structs are independent of any transport or serialization format.

use bytes::Bytes;

/// A job requisition with an attached description document.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOpening {
    pub id: String,
    pub title: String,
    pub candidate_count: u32,
}

impl JobOpening {
    /// The local projection inserted right after a successful creation call,
    /// before the server list is fetched again.
    pub fn provisional(created: &CreatedOpening) -> Self {
        Self {
            id: created.id.clone(),
            title: created.title.clone(),
            candidate_count: 0,
        }
    }
}

/// What the service answers after an opening has been created.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOpening {
    pub id: String,
    pub title: String,
}

/// Payload of the "create opening" call: a title and the description PDF.
#[derive(Debug, Clone)]
pub struct NewOpening {
    pub title: String,
    pub description: UploadFile,
}

/// A resume submitted against one opening, with its computed assessment.
///
/// `fit_score` is absent and `summary` is empty while the service is still
/// scoring the resume.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub fit_score: Option<f64>,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub evidence: String,
}

impl Candidate {
    /// An empty summary means scoring has not finished yet.
    pub fn is_processing(&self) -> bool {
        self.summary.trim().is_empty()
    }

    pub fn fit_band(&self) -> FitBand {
        FitBand::from_score(self.fit_score)
    }
}

/// Coarse bucket of a fit score, used to pick a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitBand {
    Pending,
    High,
    Medium,
    Low,
}

impl FitBand {
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            None => FitBand::Pending,
            Some(s) if s >= 80.0 => FitBand::High,
            Some(s) if s >= 50.0 => FitBand::Medium,
            Some(_) => FitBand::Low,
        }
    }
}

/// A file staged locally for upload. Lives only in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// The service's acknowledgement of a resume batch.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub jd_id: String,
    pub queued_count: u32,
    pub batch_id: Option<String>,
}

/// Per-field validation messages derived from a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

/// The signed-in user, as reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthUser,
}

/// Client-side navigation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Openings,
    OpeningDetail(String),
    AddCandidates(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Openings => "/app/job-descriptions".to_string(),
            Route::OpeningDetail(id) => format!("/app/job-descriptions/{}", id),
            Route::AddCandidates(id) => format!("/app/job-descriptions/{}/add", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_band_thresholds() {
        assert_eq!(FitBand::from_score(None), FitBand::Pending);
        assert_eq!(FitBand::from_score(Some(80.0)), FitBand::High);
        assert_eq!(FitBand::from_score(Some(79.9)), FitBand::Medium);
        assert_eq!(FitBand::from_score(Some(50.0)), FitBand::Medium);
        assert_eq!(FitBand::from_score(Some(12.0)), FitBand::Low);
    }

    #[test]
    fn empty_summary_means_processing() {
        let candidate = Candidate {
            id: "cand-1".into(),
            name: None,
            email: None,
            fit_score: None,
            summary: "  ".into(),
            strengths: vec![],
            weaknesses: vec![],
            evidence: String::new(),
        };
        assert!(candidate.is_processing());
        assert_eq!(candidate.fit_band(), FitBand::Pending);
    }

    #[test]
    fn routes_render_paths() {
        assert_eq!(Route::AddCandidates("JD-1".into()).path(), "/app/job-descriptions/JD-1/add");
        assert_eq!(Route::OpeningDetail("JD-1".into()).path(), "/app/job-descriptions/JD-1");
    }

    #[test]
    fn provisional_opening_has_no_candidates() {
        let created = CreatedOpening { id: "JD-9".into(), title: "Backend Engineer".into() };
        let opening = JobOpening::provisional(&created);
        assert_eq!(opening.candidate_count, 0);
        assert_eq!(opening.title, "Backend Engineer");
    }
}
