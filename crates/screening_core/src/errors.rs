//! crates/screening_core/src/errors.rs
//!
//! Classifies failed port calls into validation failures (per-field messages)
//! and general failures (one human-readable message).

use crate::domain::FieldError;
use crate::ports::PortError;

/// Shown when neither the service nor the transport supplied a usable message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Validation {
        message: Option<String>,
        fields: Vec<FieldError>,
    },
    General {
        message: String,
    },
}

impl Failure {
    /// Every message carried by the failure, field messages flattened in field order.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Failure::Validation { fields, .. } => fields
                .iter()
                .flat_map(|f| f.messages.iter().cloned())
                .collect(),
            Failure::General { message } => vec![message.clone()],
        }
    }
}

pub fn is_validation_error(error: &PortError) -> bool {
    error.status() == Some(PortError::UNPROCESSABLE)
}

pub fn extract_field_errors(error: &PortError) -> Vec<FieldError> {
    match error {
        PortError::Status { errors, .. } => errors.clone(),
        _ => Vec::new(),
    }
}

/// Server-supplied message first, then the error's own message, then the default.
pub fn extract_error_message(error: &PortError) -> String {
    let server_message = match error {
        PortError::Status { message, .. } => message.as_deref(),
        _ => None,
    };
    if let Some(message) = server_message.filter(|m| !m.trim().is_empty()) {
        return message.to_string();
    }
    let own = error.to_string();
    if own.trim().is_empty() {
        DEFAULT_ERROR_MESSAGE.to_string()
    } else {
        own
    }
}

pub fn classify(error: &PortError) -> Failure {
    if is_validation_error(error) {
        let message = match error {
            PortError::Status { message, .. } => message.clone(),
            _ => None,
        };
        return Failure::Validation {
            message,
            fields: extract_field_errors(error),
        };
    }
    Failure::General {
        message: extract_error_message(error),
    }
}

/// Field errors split between form controls that can show them inline and
/// a single merged message for everything else.
#[derive(Debug, Default, PartialEq)]
pub struct PartitionedFieldErrors {
    pub inline: Vec<FieldError>,
    pub unmatched: Option<String>,
}

pub fn partition_field_errors(fields: &[FieldError], controls: &[&str]) -> PartitionedFieldErrors {
    let mut inline = Vec::new();
    let mut rest = Vec::new();
    for field in fields {
        if controls.contains(&field.field.as_str()) {
            inline.push(field.clone());
        } else {
            rest.push(field.messages.join(" "));
        }
    }
    PartitionedFieldErrors {
        inline,
        unmatched: if rest.is_empty() { None } else { Some(rest.join(" ")) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, message: Option<&str>, errors: Vec<FieldError>) -> PortError {
        PortError::Status {
            status,
            message: message.map(str::to_string),
            errors,
        }
    }

    fn field(name: &str, messages: &[&str]) -> FieldError {
        FieldError {
            field: name.to_string(),
            messages: messages.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_422_is_a_validation_failure() {
        let err = status(422, None, vec![field("title", &["too short"])]);
        match classify(&err) {
            Failure::Validation { fields, .. } => {
                assert_eq!(fields, vec![field("title", &["too short"])]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_other_statuses_prefer_server_message() {
        let err = status(500, Some("Server unavailable"), vec![]);
        assert_eq!(
            classify(&err),
            Failure::General { message: "Server unavailable".into() }
        );
    }

    #[test]
    fn test_falls_back_to_transport_message() {
        let err = status(503, None, vec![]);
        assert_eq!(extract_error_message(&err), "Request failed with status code 503");
        let err = PortError::Network("Request timed out".into());
        assert_eq!(extract_error_message(&err), "Request timed out");
    }

    #[test]
    fn test_falls_back_to_default_message() {
        assert_eq!(
            extract_error_message(&PortError::Unexpected(String::new())),
            DEFAULT_ERROR_MESSAGE
        );
        assert_eq!(
            extract_error_message(&status(500, Some("  "), vec![])),
            "Request failed with status code 500"
        );
    }

    #[test]
    fn test_messages_flatten_fields() {
        let failure = classify(&status(
            422,
            Some("Invalid"),
            vec![field("resumes.0", &["a", "b"]), field("resumes.1", &["c"])],
        ));
        assert_eq!(failure.messages(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_partition_merges_unknown_fields() {
        let fields = vec![
            field("title", &["too short"]),
            field("job_description", &["not a pdf"]),
            field("owner", &["missing", "invalid"]),
            field("team", &["unknown"]),
        ];
        let split = partition_field_errors(&fields, &["title", "job_description"]);
        assert_eq!(split.inline.len(), 2);
        assert_eq!(split.unmatched.as_deref(), Some("missing invalid unknown"));
    }
}
