//! Ephemeral state of one interactive session: the form, the last outcome
//! and the submit guard.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::models::{FormPatch, MeasurementForm, MeasurementInput, PredictionResult};
use crate::predictor::{PredictorClient, RequestError};
use crate::render;

pub const SUBMIT_LABEL: &str = "Get Recommendation";
pub const BUSY_LABEL: &str = "Predicting...";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("a submission is already in progress")]
    Busy,
    #[error("unknown form field {0:?}")]
    UnknownField(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Handed out by [`Session::begin_submission`]; only the ticket for the
/// current sequence number may complete.
#[derive(Debug)]
pub struct SubmissionTicket {
    seq: u64,
    input: MeasurementInput,
}

impl SubmissionTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn input(&self) -> &MeasurementInput {
        &self.input
    }
}

#[derive(Debug, Default)]
pub struct Session {
    form: MeasurementForm,
    seq: u64,
    in_flight: bool,
    result: Option<PredictionResult>,
    error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub busy: bool,
    pub button_label: &'static str,
    pub form: MeasurementForm,
    pub result: Option<PredictionResult>,
    pub error: Option<String>,
    pub display: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &MeasurementForm {
        &self.form
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight {
            Phase::Submitting
        } else if self.result.is_some() {
            Phase::Succeeded
        } else if self.error.is_some() {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }

    pub fn update_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), SessionError> {
        let slot = match name {
            "height" => &mut self.form.height,
            "weight" => &mut self.form.weight,
            "chest_size" => &mut self.form.chest_size,
            "waist_size" => &mut self.form.waist_size,
            other => return Err(SessionError::UnknownField(other.to_string())),
        };
        *slot = value.into();
        Ok(())
    }

    pub fn apply_patch(&mut self, patch: FormPatch) {
        patch.apply_to(&mut self.form);
    }

    /// Clears the previous outcome and marks the session busy. Fails while
    /// another submission is outstanding.
    pub fn begin_submission(&mut self) -> Result<SubmissionTicket, SessionError> {
        self.begin_submission_with(None)
    }

    /// Like [`Session::begin_submission`], applying `patch` to the form
    /// first. A busy session keeps its form untouched.
    pub fn begin_submission_with(
        &mut self,
        patch: Option<FormPatch>,
    ) -> Result<SubmissionTicket, SessionError> {
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        if let Some(patch) = patch {
            patch.apply_to(&mut self.form);
        }
        self.seq += 1;
        self.in_flight = true;
        self.result = None;
        self.error = None;

        let input = self.form.normalize();
        let advisories = input.advisories();
        if !advisories.is_empty() {
            tracing::warn!(seq = self.seq, ?advisories, "submitting values outside advisory ranges");
        }
        tracing::info!(seq = self.seq, "prediction submission started");
        Ok(SubmissionTicket { seq: self.seq, input })
    }

    /// Records the outcome of `ticket`. Returns `false` and leaves state
    /// untouched when the ticket is stale.
    pub fn complete(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<PredictionResult, RequestError>,
    ) -> bool {
        if ticket.seq != self.seq || !self.in_flight {
            tracing::warn!(
                ticket = ticket.seq,
                current = self.seq,
                "discarding stale prediction outcome"
            );
            return false;
        }
        self.in_flight = false;
        match outcome {
            Ok(result) => {
                tracing::info!(
                    seq = ticket.seq,
                    predicted_size = %result.predicted_size,
                    confidence = result.confidence,
                    "prediction succeeded"
                );
                self.result = Some(result);
            }
            Err(err) => {
                tracing::warn!(seq = ticket.seq, kind = err.kind(), error = %err, "prediction failed");
                self.error = Some(err.to_string());
            }
        }
        true
    }

    pub fn display(&self) -> String {
        match (&self.result, &self.error) {
            (Some(result), _) => render::render_result(result),
            (None, Some(message)) => render::render_error(message),
            (None, None) => String::new(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase(),
            busy: self.in_flight,
            button_label: if self.in_flight { BUSY_LABEL } else { SUBMIT_LABEL },
            form: self.form.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
            display: self.display(),
        }
    }
}

/// Cloneable handle sharing one [`Session`] between request handlers.
#[derive(Debug, Clone, Default)]
pub struct SharedSession(Arc<Mutex<Session>>);

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, Session> {
        // Transitions never leave partial state, so poisoning is ignored.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs one full submission cycle. The lock is released across the
    /// network call.
    pub async fn submit(&self, client: &PredictorClient) -> Result<SessionView, SessionError> {
        self.submit_with(None, client).await
    }

    /// Applies `patch` and claims the session in a single critical section,
    /// then runs the submission.
    pub async fn submit_with(
        &self,
        patch: Option<FormPatch>,
        client: &PredictorClient,
    ) -> Result<SessionView, SessionError> {
        let ticket = self.lock().begin_submission_with(patch)?;
        let outcome = client.submit(ticket.input()).await;
        let mut session = self.lock();
        session.complete(ticket, outcome);
        Ok(session.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InputEcho, SizeLabel};

    fn filled_session() -> Session {
        let mut session = Session::new();
        session.update_field("height", "175").unwrap();
        session.update_field("weight", "70").unwrap();
        session.update_field("chest_size", "M").unwrap();
        session
    }

    fn result_for(input: MeasurementInput) -> PredictionResult {
        let mut all_probabilities = serde_json::Map::new();
        all_probabilities.insert("M".to_string(), serde_json::json!(87.5));
        PredictionResult {
            predicted_size: "M".to_string(),
            confidence: 87.5,
            message: "Good fit".to_string(),
            all_probabilities,
            input_data: InputEcho {
                height: input.height,
                weight: input.weight,
                chest_size: input.chest_size.map(|label| label.to_string()),
                waist_size: input.waist_size.map(|label| label.to_string()),
            },
        }
    }

    #[test]
    fn busy_session_ignores_patch_on_submit() {
        let mut session = filled_session();
        let _ticket = session.begin_submission().unwrap();
        let before = session.form().clone();

        let patch = FormPatch {
            height: Some("190".to_string()),
            chest_size: Some("L".to_string()),
            ..FormPatch::default()
        };
        assert_eq!(
            session.begin_submission_with(Some(patch)).unwrap_err(),
            SessionError::Busy
        );
        assert_eq!(session.form(), &before);
    }

    #[test]
    fn patch_is_part_of_the_submitted_input() {
        let mut session = filled_session();
        let patch = FormPatch {
            weight: Some("82".to_string()),
            waist_size: Some("L".to_string()),
            ..FormPatch::default()
        };
        let ticket = session.begin_submission_with(Some(patch)).unwrap();
        assert_eq!(ticket.input().weight, Some(82.0));
        assert_eq!(ticket.input().waist_size, Some(SizeLabel::L));
        assert_eq!(session.form().weight, "82");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut session = Session::new();
        assert_eq!(
            session.update_field("shoe_size", "42"),
            Err(SessionError::UnknownField("shoe_size".to_string()))
        );
    }

    #[test]
    fn second_submission_is_refused_while_busy() {
        let mut session = filled_session();
        let ticket = session.begin_submission().unwrap();
        assert_eq!(session.phase(), Phase::Submitting);
        assert_eq!(session.view().button_label, BUSY_LABEL);
        assert_eq!(session.begin_submission().unwrap_err(), SessionError::Busy);

        let input = *ticket.input();
        assert!(session.complete(ticket, Ok(result_for(input))));
        assert_eq!(session.phase(), Phase::Succeeded);
        assert_eq!(session.view().button_label, SUBMIT_LABEL);
    }

    #[test]
    fn ticket_carries_normalized_input() {
        let mut session = filled_session();
        let ticket = session.begin_submission().unwrap();
        assert_eq!(ticket.input().height, Some(175.0));
        assert_eq!(ticket.input().chest_size, Some(SizeLabel::M));
        assert_eq!(ticket.input().waist_size, None);
    }

    #[test]
    fn new_submission_clears_previous_outcome() {
        let mut session = filled_session();
        let ticket = session.begin_submission().unwrap();
        session.complete(ticket, Err(RequestError::Rejected("Invalid height".to_string())));
        assert_eq!(session.error(), Some("Invalid height"));
        assert_eq!(session.display(), "Error: Invalid height\n");

        let _ticket = session.begin_submission().unwrap();
        assert_eq!(session.error(), None);
        assert!(session.result().is_none());
        assert_eq!(session.display(), "");
    }

    #[test]
    fn stale_ticket_does_not_overwrite_state() {
        let mut session = filled_session();
        let first = session.begin_submission().unwrap();
        let stale = SubmissionTicket {
            seq: first.seq() - 1,
            input: *first.input(),
        };
        assert!(!session.complete(stale, Err(RequestError::Transport("late".to_string()))));
        assert!(session.is_busy());
        assert_eq!(session.error(), None);

        let input = *first.input();
        assert!(session.complete(first, Ok(result_for(input))));
        assert_eq!(session.result().map(|r| r.predicted_size.as_str()), Some("M"));
    }
}
