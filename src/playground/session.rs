//! Streaming query session state machine.
//!
//! [`QuerySession`] owns the transcript and the single `query_running`
//! flag. It is deliberately I/O-free: the CLI opens the stream, pulls
//! frames, and feeds them to [`QuerySession::apply_frame`], which mutates
//! the transcript and says whether to keep listening. Keeping the state
//! transitions pure makes every property of the flow testable without a
//! backend.
//!
//! Per query the transcript gains exactly one user entry and one processing
//! entry up front; the processing entry is mutated in place as frames
//! arrive, and a terminal answer appends exactly one system entry. An error
//! (backend frame, transport failure, or user cancel) finishes the query
//! with the processing entry left not-done and no system entry.

use crate::api::sse::Frame;

use super::params::{ConstraintRanges, QueryParams, ValidationError};
use super::{EntryId, StepRecord, Transcript};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal result of one streamed query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The backend answered. The transcript already holds the system entry.
    Answered {
        text: String,
        model: Option<String>,
    },
    /// The backend reported an error frame.
    Failed { message: String },
}

/// What the stream driver should do after a frame is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Keep listening.
    Continue,
    /// Terminal frame — close the connection.
    Finished(QueryOutcome),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// State for one playground conversation and its at-most-one in-flight query.
#[derive(Debug, Default)]
pub struct QuerySession {
    transcript: Transcript,
    ranges: Option<ConstraintRanges>,
    query_running: bool,
    current: Option<EntryId>,
}

impl QuerySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session opening with a system greeting, like the hosted playground.
    pub fn with_greeting(text: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.transcript.push_system(text, None);
        session
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn query_running(&self) -> bool {
        self.query_running
    }

    /// The in-progress processing entry, while a query is in flight.
    pub fn processing_entry(&self) -> Option<EntryId> {
        self.current
    }

    pub fn ranges(&self) -> Option<&ConstraintRanges> {
        self.ranges.as_ref()
    }

    /// Record the fetched constraint ranges for pre-submission validation.
    pub fn set_ranges(&mut self, ranges: ConstraintRanges) {
        self.ranges = Some(ranges);
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Validate a submission and stage the transcript for it.
    ///
    /// On success the transcript gains a user entry and an empty processing
    /// entry (in that order), `query_running` is set, and the processing
    /// entry's id is returned — the caller then opens the stream. On any
    /// validation failure nothing is mutated and no connection should be
    /// opened.
    ///
    /// A second submission while one is in flight is rejected with
    /// [`ValidationError::QueryInFlight`].
    pub fn begin_query(
        &mut self,
        query: &str,
        params: &QueryParams,
    ) -> Result<EntryId, ValidationError> {
        if self.query_running {
            return Err(ValidationError::QueryInFlight);
        }

        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }

        params.validate(self.ranges.as_ref())?;

        self.transcript.push_user(trimmed);
        let id = self.transcript.push_processing();
        self.current = Some(id);
        self.query_running = true;
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Frame application
    // -----------------------------------------------------------------------

    /// Apply one inbound frame to the transcript.
    ///
    /// Frames arriving after the query already finished (terminal frame,
    /// error, or cancel) have no observable effect.
    pub fn apply_frame(&mut self, frame: Frame) -> FrameOutcome {
        if !self.query_running {
            return FrameOutcome::Continue;
        }

        match frame {
            Frame::Error { error } => {
                // Processing entry is left not-done; no system entry.
                self.finish();
                FrameOutcome::Finished(QueryOutcome::Failed { message: error })
            }
            Frame::StatusUpdate { rl_status, domain } => {
                self.append_step(StepRecord::new(
                    format!("{rl_status} (domain: {domain})"),
                    None,
                ));
                FrameOutcome::Continue
            }
            ref frame @ Frame::ProgressStep { ref step, .. } => {
                self.append_step(StepRecord::new(step.clone(), frame.step_payload().cloned()));
                FrameOutcome::Continue
            }
            Frame::FinalResponse {
                final_response,
                model_used,
            } => {
                if let Some(id) = self.current {
                    self.transcript.mark_done(id);
                }
                self.transcript
                    .push_system(final_response.clone(), model_used.clone());
                self.finish();
                FrameOutcome::Finished(QueryOutcome::Answered {
                    text: final_response,
                    model: model_used,
                })
            }
        }
    }

    fn append_step(&mut self, step: StepRecord) {
        if let Some(id) = self.current {
            self.transcript.append_step(id, step);
        }
    }

    fn finish(&mut self) {
        self.query_running = false;
        self.current = None;
    }

    // -----------------------------------------------------------------------
    // Abort paths
    // -----------------------------------------------------------------------

    /// Finish the in-flight query after a transport-level failure. The
    /// processing entry stays not-done and no system entry is created;
    /// the user may resubmit.
    pub fn abort(&mut self) {
        self.finish();
    }

    /// User-initiated cancel. Same transcript effect as [`abort`]: the
    /// caller drops the stream handle, which closes the connection.
    ///
    /// [`abort`]: QuerySession::abort
    pub fn cancel(&mut self) {
        self.finish();
    }

    // -----------------------------------------------------------------------
    // Display mutations
    // -----------------------------------------------------------------------

    /// Fold or unfold an entry's step list.
    pub fn toggle_steps(&mut self, id: EntryId) {
        self.transcript.toggle_expanded(id);
    }

    /// Full transcript reset — the only way entries are ever deleted.
    /// Also clears any in-flight query state.
    pub fn reset(&mut self) {
        self.transcript.reset();
        self.finish();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playground::Role;
    use crate::playground::params::AutoParams;

    fn auto() -> QueryParams {
        QueryParams::Auto(AutoParams::balanced())
    }

    #[test]
    fn begin_query_stages_user_then_processing() {
        let mut session = QuerySession::new();
        let id = session.begin_query("hello", &auto()).unwrap();

        let entries = session.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].text, "hello");
        assert_eq!(entries[1].role, Role::Processing);
        assert_eq!(entries[1].id, id);
        assert!(session.query_running());
    }

    #[test]
    fn begin_query_trims_the_text() {
        let mut session = QuerySession::new();
        session.begin_query("  spaced out  ", &auto()).unwrap();
        assert_eq!(session.transcript().entries()[0].text, "spaced out");
    }

    #[test]
    fn status_update_synthesizes_a_step() {
        let mut session = QuerySession::new();
        let id = session.begin_query("q", &auto()).unwrap();
        let outcome = session.apply_frame(Frame::StatusUpdate {
            rl_status: "exploring".to_string(),
            domain: "general".to_string(),
        });
        assert_eq!(outcome, FrameOutcome::Continue);
        let entry = session.transcript().get(id).unwrap();
        assert_eq!(entry.steps[0].label, "exploring (domain: general)");
        assert!(entry.steps[0].payload.is_none());
    }

    #[test]
    fn cancel_finishes_without_terminal_entry() {
        let mut session = QuerySession::new();
        let id = session.begin_query("q", &auto()).unwrap();
        session.cancel();
        assert!(!session.query_running());
        assert!(!session.transcript().get(id).unwrap().done);
        assert_eq!(session.transcript().len(), 2);
        // A fresh submission is allowed afterwards.
        assert!(session.begin_query("again", &auto()).is_ok());
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = QuerySession::with_greeting("welcome");
        session.begin_query("q", &auto()).unwrap();
        session.reset();
        assert!(session.transcript().is_empty());
        assert!(!session.query_running());
    }
}
