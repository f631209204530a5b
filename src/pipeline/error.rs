//! Pipeline failure taxonomy.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::browser::RenderError;
use crate::config::Messages;
use crate::http_client::FetchError;
use crate::resolver::BlockReason;

/// Why a pipeline run failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("navigation failed: {0}")]
    Navigation(#[from] RenderError),

    #[error("access restricted at {final_url} ({})", reason.as_str())]
    AccessRestricted {
        final_url: String,
        reason: BlockReason,
    },

    #[error("no media source found on {final_url}")]
    SourceNotFound { final_url: String },

    #[error("transfer failed: {0}")]
    Transfer(#[from] FetchError),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl PipelineError {
    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Navigation(_) => FailureKind::NavigationFailure,
            Self::AccessRestricted { .. } => FailureKind::AccessRestricted,
            Self::SourceNotFound { .. } => FailureKind::SourceNotFound,
            Self::Transfer(_) => FailureKind::TransferFailure,
            Self::Timeout(_) => FailureKind::Timeout,
        }
    }
}

/// Stable classification of pipeline failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NavigationFailure,
    AccessRestricted,
    SourceNotFound,
    TransferFailure,
    Timeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NavigationFailure => "navigation-failure",
            Self::AccessRestricted => "access-restricted",
            Self::SourceNotFound => "source-not-found",
            Self::TransferFailure => "transfer-failure",
            Self::Timeout => "timeout",
        }
    }

    /// Text shown to the chat user. Only access restrictions get their own message.
    pub fn user_message<'a>(&self, messages: &'a Messages) -> &'a str {
        match self {
            Self::AccessRestricted => &messages.restricted,
            _ => &messages.failure,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        assert_eq!(
            PipelineError::Timeout(Duration::from_secs(120)).kind().as_str(),
            "timeout"
        );
        assert_eq!(
            PipelineError::Transfer(FetchError::Status(404)).kind(),
            FailureKind::TransferFailure
        );
        assert_eq!(
            PipelineError::Navigation(RenderError::Launch("boom".into())).kind(),
            FailureKind::NavigationFailure
        );
    }

    #[test]
    fn test_restricted_has_its_own_message() {
        let messages = Messages::default();
        assert_eq!(
            FailureKind::AccessRestricted.user_message(&messages),
            messages.restricted
        );
        for kind in [
            FailureKind::NavigationFailure,
            FailureKind::SourceNotFound,
            FailureKind::TransferFailure,
            FailureKind::Timeout,
        ] {
            assert_eq!(kind.user_message(&messages), messages.failure);
        }
    }

    #[test]
    fn test_display_includes_detail() {
        let err = PipelineError::AccessRestricted {
            final_url: "https://www.facebook.com/login/".into(),
            reason: BlockReason::LoginRedirect,
        };
        assert!(err.to_string().contains("/login/"));
    }
}
