//! Shared types passed between the batch orchestrator and its consumers.
//!
//! Progress events cross a thread boundary (orchestrator → printer thread) and
//! are serialisable so a UI adapter can forward them as JSON unchanged.

use serde::{Deserialize, Serialize};

/// Lifecycle of one [`PhotoTask`](crate::process::PhotoTask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// Emitted immediately before each unit starts.
    Processing,
    /// Terminal: every unit succeeded.
    Completed,
    /// Terminal: at least one unit failed.
    Error,
    /// Terminal: the batch stopped early on request.
    Cancelled,
}

impl ProgressStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProgressStatus::Processing)
    }
}

/// One progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// 1-based index of the unit (for terminal events: units attempted).
    pub current: usize,
    pub total: usize,
    pub current_file_name: String,
    pub status: ProgressStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_processing_is_non_terminal() {
        assert!(!ProgressStatus::Processing.is_terminal());
        assert!(ProgressStatus::Completed.is_terminal());
        assert!(ProgressStatus::Error.is_terminal());
        assert!(ProgressStatus::Cancelled.is_terminal());
    }

    #[test]
    fn progress_serializes_with_lowercase_status() {
        let event = BatchProgress {
            current: 1,
            total: 3,
            current_file_name: "a.jpg".into(),
            status: ProgressStatus::Processing,
            message: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"current":1,"total":3,"current_file_name":"a.jpg","status":"processing"}"#
        );
    }
}
