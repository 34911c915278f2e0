use thiserror::Error;

use crate::model::ResourceKind;

pub const FALLBACK_SUBMIT_MESSAGE: &str = "Something went wrong! Please try again.";

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("failed to list {kind}: {message}")]
pub struct FetchError {
    pub kind: ResourceKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: ResourceKind, source: impl std::fmt::Display) -> Self {
        Self {
            kind,
            message: format!("{source:#}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SubmissionStep {
    LabelCluster,
    CreateConfigMap,
    CreateSecret,
}

impl SubmissionStep {
    pub fn describe(self) -> &'static str {
        match self {
            Self::LabelCluster => "label managed cluster",
            Self::CreateConfigMap => "create config map",
            Self::CreateSecret => "create secret",
        }
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("{} failed: {message}", step.describe())]
pub struct SubmissionError {
    pub step: SubmissionStep,
    pub message: String,
    pub completed: Vec<SubmissionStep>,
}

impl SubmissionError {
    /// The single line shown to the operator.
    pub fn user_message(&self) -> String {
        if self.message.trim().is_empty() {
            FALLBACK_SUBMIT_MESSAGE.to_string()
        } else {
            self.message.clone()
        }
    }

    pub fn left_orphans(&self) -> bool {
        self.completed.contains(&SubmissionStep::CreateConfigMap)
    }
}

#[cfg(test)]
mod tests {
    use super::{FALLBACK_SUBMIT_MESSAGE, FetchError, SubmissionError, SubmissionStep};
    use crate::model::ResourceKind;

    #[test]
    fn empty_message_falls_back() {
        let error = SubmissionError {
            step: SubmissionStep::CreateSecret,
            message: "  ".to_string(),
            completed: vec![SubmissionStep::CreateConfigMap],
        };
        assert_eq!(error.user_message(), FALLBACK_SUBMIT_MESSAGE);
        assert!(error.left_orphans());
    }

    #[test]
    fn display_names_the_step() {
        let error = SubmissionError {
            step: SubmissionStep::CreateConfigMap,
            message: "configmaps \"aws-s3-configmap\" already exists".to_string(),
            completed: Vec::new(),
        };
        assert_eq!(
            error.to_string(),
            "create config map failed: configmaps \"aws-s3-configmap\" already exists"
        );
        assert!(!error.left_orphans());
    }

    #[test]
    fn fetch_error_carries_kind() {
        let error = FetchError::new(ResourceKind::Namespaces, "forbidden");
        assert_eq!(error.to_string(), "failed to list Namespaces: forbidden");
    }
}
