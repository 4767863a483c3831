//! crates/screening_core/src/upload.rs
//!
//! The client-side queue of resumes waiting to be uploaded to one opening.
//! Type, size and count constraints are enforced here, before any network call.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use crate::domain::{UploadFile, UploadReceipt};
use crate::errors::classify;
use crate::ports::{PortError, ResumeUploadService};

pub const RESUME_UPLOAD_LIMIT: u32 = 20;
pub const MAX_FILE_SIZE_MB: u64 = 5;
pub const MAX_FILE_SIZE_BYTES: u64 = MAX_FILE_SIZE_MB * 1024 * 1024;
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A file is accepted as a PDF by MIME type or by a `.pdf` extension.
pub fn is_pdf(file: &UploadFile) -> bool {
    file.mime_type == PDF_MIME_TYPE || file.name.to_lowercase().ends_with(".pdf")
}

/// Slots left on an opening. An unknown count leaves the whole limit available.
pub fn remaining_slots(candidate_count: Option<u32>, limit: u32) -> u32 {
    match candidate_count {
        Some(count) => limit.saturating_sub(count),
        None => limit,
    }
}

pub fn is_upload_limit_reached(candidate_count: Option<u32>, limit: u32) -> bool {
    remaining_slots(candidate_count, limit) == 0
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["B", "KB", "MB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn plural_resumes(n: u32) -> &'static str {
    if n == 1 {
        "resume"
    } else {
        "resumes"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Job opening not found.")]
    MissingJobOpening,
    #[error("No file selected.")]
    NoFiles,
    #[error(transparent)]
    Port(#[from] PortError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Submitting,
}

pub struct UploadQueue {
    jd_id: Option<String>,
    max_files: u32,
    files: Vec<UploadFile>,
    errors: Vec<String>,
    status: watch::Sender<UploadStatus>,
    service: Arc<dyn ResumeUploadService>,
}

impl UploadQueue {
    /// Creates a queue for `jd_id` admitting at most `max_files` files.
    /// Callers pass the remaining slots of the opening, not the global limit.
    pub fn new(service: Arc<dyn ResumeUploadService>, jd_id: Option<String>, max_files: u32) -> Self {
        let (status, _) = watch::channel(UploadStatus::Idle);
        Self {
            jd_id,
            max_files,
            files: Vec::new(),
            errors: Vec::new(),
            status,
            service,
        }
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn max_files(&self) -> u32 {
        self.max_files
    }

    pub fn status(&self) -> UploadStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<UploadStatus> {
        self.status.subscribe()
    }

    /// Validates `incoming` and appends the acceptable files.
    ///
    /// Files are only committed when the combined count fits the ceiling;
    /// otherwise the queue is left untouched.
    pub fn add_files(&mut self, incoming: Vec<UploadFile>) {
        self.errors.clear();

        if self.max_files == 0 {
            self.errors
                .push("This opening already reached the resume limit.".to_string());
            return;
        }

        let mut errors = Vec::new();
        let accepted: Vec<UploadFile> = incoming
            .into_iter()
            .filter(|file| {
                if !is_pdf(file) {
                    errors.push(format!("{}: only PDFs are accepted.", file.name));
                    return false;
                }
                if file.size_bytes > MAX_FILE_SIZE_BYTES {
                    errors.push(format!("{}: maximum size is {}MB.", file.name, MAX_FILE_SIZE_MB));
                    return false;
                }
                true
            })
            .collect();

        if self.files.len() + accepted.len() > self.max_files as usize {
            errors.push(format!(
                "Select at most {} {}.",
                self.max_files,
                plural_resumes(self.max_files)
            ));
            self.errors = errors;
            return;
        }

        self.files.extend(accepted);
        self.errors = errors;
    }

    pub fn remove_at(&mut self, index: usize) {
        self.errors.clear();
        if index < self.files.len() {
            self.files.remove(index);
        }
    }

    pub fn clear(&mut self) {
        self.errors.clear();
        self.files.clear();
    }

    /// Sends the whole queue as one batch and empties it on success.
    pub async fn submit(&mut self) -> Result<UploadReceipt, SubmitError> {
        self.errors.clear();
        let jd_id = self.jd_id.clone().ok_or(SubmitError::MissingJobOpening)?;

        if self.files.is_empty() {
            let message = if self.max_files == 0 {
                format!(
                    "This opening already reached the resume limit of {} resumes.",
                    RESUME_UPLOAD_LIMIT
                )
            } else {
                format!(
                    "Select between 1 and {} PDF {}.",
                    self.max_files,
                    plural_resumes(self.max_files)
                )
            };
            self.errors.push(message);
            return Err(SubmitError::NoFiles);
        }

        self.status.send_replace(UploadStatus::Submitting);
        let result = self.service.upload_resumes(&jd_id, &self.files).await;
        self.status.send_replace(UploadStatus::Idle);

        match result {
            Ok(receipt) => {
                info!(jd_id = %jd_id, queued = receipt.queued_count, "Resume batch accepted");
                self.clear();
                Ok(receipt)
            }
            Err(e) => {
                error!(jd_id = %jd_id, "Error uploading resumes: {}", e);
                self.errors = classify(&e).messages();
                Err(SubmitError::Port(e))
            }
        }
    }
}
