//! services/client/src/adapters/rest.rs
//!
//! The adapter for the screening REST service. It implements the opening,
//! candidate, upload and auth ports from the `core` crate on top of the
//! shared `HttpTransport`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use screening_core::domain::{
    AuthUser as DomainAuthUser, Candidate as DomainCandidate, CreatedOpening, Credentials,
    JobOpening, LoginResponse as DomainLoginResponse, NewOpening, UploadFile, UploadReceipt,
};
use screening_core::ports::{
    AuthService, CandidateService, JobOpeningService, PortError, PortResult, ResumeUploadService,
};
use screening_core::search::CANDIDATE_ID_PARAM;

use super::transport::HttpTransport;

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct JobSummary {
    jd_id: String,
    title: String,
    #[serde(default)]
    candidate_count: u32,
}

impl JobSummary {
    fn to_domain(self) -> JobOpening {
        JobOpening {
            id: self.jd_id,
            title: self.title,
            candidate_count: self.candidate_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    jd_id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct UploadResumesResponse {
    jd_id: String,
    queued_count: u32,
    #[serde(default)]
    batch_id: Option<String>,
}

/// A candidate as the service reports it. `fit_score` and the narrative
/// fields may be missing or null while scoring runs.
#[derive(Debug, Deserialize)]
struct CandidateRecord {
    id: String,
    #[serde(default)]
    candidate_name: Option<String>,
    #[serde(default)]
    candidate_email: Option<String>,
    #[serde(default)]
    fit_score: Option<f64>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    evidence: String,
}

impl CandidateRecord {
    fn to_domain(self) -> DomainCandidate {
        DomainCandidate {
            id: self.id,
            name: self.candidate_name,
            email: self.candidate_email,
            fit_score: self.fit_score,
            summary: self.summary,
            strengths: self.strengths,
            weaknesses: self.weaknesses,
            evidence: self.evidence,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthUserRecord {
    id: String,
    name: String,
    email: String,
}

impl AuthUserRecord {
    fn to_domain(self) -> DomainAuthUser {
        DomainAuthUser {
            id: self.id,
            name: self.name,
            email: self.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponseRecord {
    token: String,
    user: AuthUserRecord,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

fn file_part(file: &UploadFile) -> PortResult<Part> {
    Part::bytes(file.bytes.to_vec())
        .file_name(file.name.clone())
        .mime_str(&file.mime_type)
        .map_err(|e| PortError::Unexpected(format!("Invalid content type for {}: {}", file.name, e)))
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct RestClient {
    transport: HttpTransport,
}

impl RestClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

#[async_trait]
impl JobOpeningService for RestClient {
    async fn list_openings(&self) -> PortResult<Vec<JobOpening>> {
        let url = self.transport.url(&["jds"])?;
        let envelope: DataEnvelope<Vec<JobSummary>> = self
            .transport
            .send(self.transport.request(Method::GET, url))
            .await?;
        Ok(envelope.data.into_iter().map(JobSummary::to_domain).collect())
    }

    async fn create_opening(&self, opening: NewOpening) -> PortResult<CreatedOpening> {
        let url = self.transport.url(&["jds"])?;
        let form = Form::new()
            .text("title", opening.title.clone())
            .part("job_description", file_part(&opening.description)?);

        let created: CreateJobResponse = self
            .transport
            .send(self.transport.request(Method::POST, url).multipart(form))
            .await?;
        info!(jd_id = %created.jd_id, "Job opening stored by the service");
        Ok(CreatedOpening {
            id: created.jd_id,
            title: created.title,
        })
    }
}

#[async_trait]
impl CandidateService for RestClient {
    async fn list_candidates(&self, jd_id: &str) -> PortResult<Vec<DomainCandidate>> {
        let url = self.transport.url(&["jds", jd_id, "candidates"])?;
        let records: Vec<CandidateRecord> = self
            .transport
            .send(self.transport.request(Method::GET, url))
            .await?;
        Ok(records.into_iter().map(CandidateRecord::to_domain).collect())
    }

    async fn get_candidate(&self, jd_id: &str, candidate_id: &str) -> PortResult<DomainCandidate> {
        let mut url = self.transport.url(&["jds", jd_id, "candidates"])?;
        url.query_pairs_mut()
            .append_pair(CANDIDATE_ID_PARAM, candidate_id);
        let record: CandidateRecord = self
            .transport
            .send(self.transport.request(Method::GET, url))
            .await?;
        Ok(record.to_domain())
    }
}

#[async_trait]
impl ResumeUploadService for RestClient {
    async fn upload_resumes(&self, jd_id: &str, files: &[UploadFile]) -> PortResult<UploadReceipt> {
        let url = self.transport.url(&["jds", jd_id, "resumes"])?;
        let mut form = Form::new();
        for file in files {
            form = form.part("resumes[]", file_part(file)?);
        }

        let response: UploadResumesResponse = self
            .transport
            .send(self.transport.request(Method::POST, url).multipart(form))
            .await?;
        Ok(UploadReceipt {
            jd_id: response.jd_id,
            queued_count: response.queued_count,
            batch_id: response.batch_id,
        })
    }
}

#[async_trait]
impl AuthService for RestClient {
    async fn login(&self, credentials: &Credentials) -> PortResult<DomainLoginResponse> {
        let url = self.transport.url(&["auth", "login"])?;
        let body = LoginRequest {
            email: credentials.email.trim(),
            password: &credentials.password,
        };
        let response: LoginResponseRecord = self
            .transport
            .send(self.transport.request(Method::POST, url).json(&body))
            .await?;
        Ok(DomainLoginResponse {
            token: response.token,
            user: response.user.to_domain(),
        })
    }

    async fn me(&self) -> PortResult<DomainAuthUser> {
        let url = self.transport.url(&["auth", "me"])?;
        let user: AuthUserRecord = self
            .transport
            .send(self.transport.request(Method::GET, url))
            .await?;
        Ok(user.to_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_without_score_is_processing() {
        let record: CandidateRecord = serde_json::from_str(
            r#"{"id":"cand-1","candidate_name":"Alice","fit_score":null,"summary":"","strengths":[],"weaknesses":[],"evidence":""}"#,
        )
        .unwrap();
        let candidate = record.to_domain();
        assert_eq!(candidate.name.as_deref(), Some("Alice"));
        assert_eq!(candidate.email, None);
        assert!(candidate.is_processing());
    }

    #[test]
    fn job_summary_maps_jd_id() {
        let envelope: DataEnvelope<Vec<JobSummary>> = serde_json::from_str(
            r#"{"data":[{"jd_id":"JD-1","title":"Frontend Engineer","candidate_count":2}]}"#,
        )
        .unwrap();
        let openings: Vec<JobOpening> = envelope.data.into_iter().map(JobSummary::to_domain).collect();
        assert_eq!(
            openings,
            vec![JobOpening { id: "JD-1".into(), title: "Frontend Engineer".into(), candidate_count: 2 }]
        );
    }
}
