//! Session state machine: the single source of truth for the upload/URL
//! attempt lifecycle
//!
//! The lifecycle is `Idle → Previewing → Submitting → Completed | Failed`,
//! with explicit reset back to `Idle`. State payloads live on the variants,
//! so a result can only exist in `Completed` and an error message only in
//! `Failed`; the ambiguous flag combinations of a loose-flags design are
//! unrepresentable.

use crate::client::{ProcessedResult, ProcessingService};
use crate::error::{ClientError, Result};
use crate::input::{CandidateImage, PreviewAddress, SelectedInput};
use crate::palette::BackgroundSpec;

/// Generic user-facing message stored on a failed submission; the specific
/// cause is logged for diagnostics only
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to process image. Please try again.";

/// Identity of one submission attempt; guards late responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionId(u64);

/// Identity of a completed result; guards stale downloads
pub type ResultId = SubmissionId;

/// Observable session status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Previewing,
    Submitting,
    Completed,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Previewing => write!(f, "previewing"),
            Self::Submitting => write!(f, "submitting"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug)]
enum SessionState {
    Idle,
    Previewing {
        candidate: CandidateImage,
        preview: PreviewAddress,
    },
    Submitting {
        candidate: CandidateImage,
        preview: PreviewAddress,
        submission: SubmissionId,
    },
    Completed {
        candidate: CandidateImage,
        preview: PreviewAddress,
        result: ProcessedResult,
        id: ResultId,
    },
    Failed {
        candidate: CandidateImage,
        preview: PreviewAddress,
        message: String,
    },
}

/// The single in-memory record of the current attempt and its outcome
///
/// The session is the only shared resource in the pipeline and this type is
/// its sole mutator; other components read it and request transitions.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    background: BackgroundSpec,
    next_submission: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a fresh idle session
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            background: BackgroundSpec::default(),
            next_submission: 0,
        }
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Idle => SessionStatus::Idle,
            SessionState::Previewing { .. } => SessionStatus::Previewing,
            SessionState::Submitting { .. } => SessionStatus::Submitting,
            SessionState::Completed { .. } => SessionStatus::Completed,
            SessionState::Failed { .. } => SessionStatus::Failed,
        }
    }

    /// Current candidate, present in every state except `Idle`
    #[must_use]
    pub fn candidate(&self) -> Option<&CandidateImage> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Previewing { candidate, .. }
            | SessionState::Submitting { candidate, .. }
            | SessionState::Completed { candidate, .. }
            | SessionState::Failed { candidate, .. } => Some(candidate),
        }
    }

    /// Displayable address of the current candidate
    #[must_use]
    pub fn preview_address(&self) -> Option<&PreviewAddress> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Previewing { preview, .. }
            | SessionState::Submitting { preview, .. }
            | SessionState::Completed { preview, .. }
            | SessionState::Failed { preview, .. } => Some(preview),
        }
    }

    /// Completed result, present only in `Completed`
    #[must_use]
    pub fn result(&self) -> Option<&ProcessedResult> {
        match &self.state {
            SessionState::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Identity of the completed result, for stale-download guards
    #[must_use]
    pub fn result_id(&self) -> Option<ResultId> {
        match &self.state {
            SessionState::Completed { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Whether `id` still names the current completed result
    #[must_use]
    pub fn is_result_current(&self, id: ResultId) -> bool {
        self.result_id() == Some(id)
    }

    /// User-facing error message, present only in `Failed`
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Currently selected background
    #[must_use]
    pub fn background(&self) -> &BackgroundSpec {
        &self.background
    }

    /// Select a background for compositing
    ///
    /// Pure state update; compositing happens at download time.
    pub fn set_background(&mut self, spec: BackgroundSpec) {
        self.background = spec;
    }

    /// Accept a validated input selection and enter `Previewing`
    ///
    /// A new candidate assignment always supersedes the current state: it
    /// clears any prior result or error, and drops the previous preview
    /// handle (releasing its temp file). A response still in flight for a
    /// superseded submission will fail the [`SubmissionId`] guard.
    pub fn select(&mut self, input: SelectedInput) {
        tracing::debug!(from = %self.status(), candidate = %input.candidate.describe(), "new selection");
        self.state = SessionState::Previewing {
            candidate: input.candidate,
            preview: input.preview,
        };
    }

    /// Gate into `Submitting` and hand out the submission's identity
    ///
    /// # Errors
    /// - `InvalidTransition` with a named reason when no candidate is
    ///   present, a submission is already in flight, or the session already
    ///   holds an outcome
    pub fn begin_submission(&mut self) -> Result<SubmissionId> {
        match self.state {
            SessionState::Previewing { .. } => {},
            SessionState::Idle => {
                return Err(ClientError::InvalidTransition(
                    "submission rejected: no candidate present".to_string(),
                ));
            },
            SessionState::Submitting { .. } => {
                return Err(ClientError::InvalidTransition(
                    "submission rejected: a submission is already in flight".to_string(),
                ));
            },
            SessionState::Completed { .. } | SessionState::Failed { .. } => {
                return Err(ClientError::InvalidTransition(
                    "submission rejected: select a new image or reset first".to_string(),
                ));
            },
        }

        self.next_submission += 1;
        let submission = SubmissionId(self.next_submission);
        let SessionState::Previewing { candidate, preview } =
            std::mem::replace(&mut self.state, SessionState::Idle)
        else {
            unreachable!("state checked above");
        };
        self.state = SessionState::Submitting {
            candidate,
            preview,
            submission,
        };
        tracing::info!(submission = submission.0, "submission started");
        Ok(submission)
    }

    /// Apply a successful outcome for submission `id`
    ///
    /// Returns whether the outcome was applied; a response for anything but
    /// the in-flight submission is discarded as stale. Completion resets the
    /// background selection to transparent.
    pub fn complete(&mut self, id: SubmissionId, result: ProcessedResult) -> bool {
        match &self.state {
            SessionState::Submitting { submission, .. } if *submission == id => {},
            _ => {
                tracing::debug!(submission = id.0, "discarding stale success response");
                return false;
            },
        }
        let SessionState::Submitting { candidate, preview, .. } =
            std::mem::replace(&mut self.state, SessionState::Idle)
        else {
            unreachable!("state checked above");
        };
        tracing::info!(submission = id.0, processed = %result.processed_url, "submission completed");
        self.state = SessionState::Completed {
            candidate,
            preview,
            result,
            id,
        };
        self.background = BackgroundSpec::default();
        true
    }

    /// Apply a failed outcome for submission `id`
    ///
    /// Returns whether the outcome was applied; stale responses are
    /// discarded, same as [`Session::complete`].
    pub fn fail<S: Into<String>>(&mut self, id: SubmissionId, message: S) -> bool {
        match &self.state {
            SessionState::Submitting { submission, .. } if *submission == id => {},
            _ => {
                tracing::debug!(submission = id.0, "discarding stale failure response");
                return false;
            },
        }
        let SessionState::Submitting { candidate, preview, .. } =
            std::mem::replace(&mut self.state, SessionState::Idle)
        else {
            unreachable!("state checked above");
        };
        let message = message.into();
        tracing::info!(submission = id.0, message = %message, "submission failed");
        self.state = SessionState::Failed {
            candidate,
            preview,
            message,
        };
        true
    }

    /// Discard the session and return to `Idle`
    ///
    /// Releases the preview handle, clears candidate/result/error, and
    /// restores the default background. An in-flight submission's eventual
    /// response will be discarded by the [`SubmissionId`] guard.
    pub fn reset(&mut self) {
        tracing::debug!(from = %self.status(), "session reset");
        self.state = SessionState::Idle;
        self.background = BackgroundSpec::default();
    }
}

/// Drive one full submission through the service
///
/// Gates through [`Session::begin_submission`], awaits exactly one service
/// call, and routes the outcome back through the [`SubmissionId`] guard. A
/// service failure stores [`GENERIC_FAILURE_MESSAGE`] on the session; the
/// specific cause is logged at warn level.
///
/// # Errors
/// - `InvalidTransition` if the session cannot accept a submission
pub async fn submit_candidate<S>(session: &mut Session, service: &S) -> Result<SessionStatus>
where
    S: ProcessingService + ?Sized,
{
    let id = session.begin_submission()?;
    let candidate = session
        .candidate()
        .cloned()
        .ok_or_else(|| ClientError::InvalidTransition("no candidate present".to_string()))?;

    match service.submit(&candidate).await {
        Ok(result) => {
            session.complete(id, result);
        },
        Err(error) => {
            tracing::warn!(%error, "removal submission failed");
            session.fail(id, GENERIC_FAILURE_MESSAGE);
        },
    }
    Ok(session.status())
}
