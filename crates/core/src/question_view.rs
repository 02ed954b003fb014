//! Overlay state for a single question.
//!
//! `Hidden -> Visible -> (Answered | skipped) -> Hidden`. The view owns its
//! [`Question`], so completion recorded here is the model's completion.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    answer::{InputField, is_correct, serialize_inputs},
    error::{Result, SocratesError},
    types::{Question, Response, ResponseDraft, TemplateKey},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Hidden,
    Visible,
    /// Correct answer given; the continue affordance is showing.
    Answered,
}

impl ViewState {
    pub fn name(self) -> &'static str {
        match self {
            ViewState::Hidden => "hidden",
            ViewState::Visible => "visible",
            ViewState::Answered => "answered",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub response: Response,
    pub correct: bool,
    /// Set on the submit that emitted this showing's `answered` event.
    pub answered: bool,
}

#[derive(Debug, Clone)]
pub struct QuestionView {
    question: Question,
    state: ViewState,
    inputs: Vec<InputField>,
    shown_at: Option<Instant>,
    time_displayed: Duration,
    answered_emitted: bool,
}

impl QuestionView {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            state: ViewState::Hidden,
            inputs: Vec::new(),
            shown_at: None,
            time_displayed: Duration::ZERO,
            answered_emitted: false,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn is_showing(&self) -> bool {
        self.state != ViewState::Hidden
    }

    pub fn show(&mut self, now: Instant) -> Result<TemplateKey> {
        if self.state != ViewState::Hidden {
            return Err(self.invalid("show"));
        }
        self.state = ViewState::Visible;
        self.inputs.clear();
        self.answered_emitted = false;
        self.shown_at = Some(now);
        info!(question = %self.question.id(), "Question shown");
        Ok(self.question.template_key())
    }

    /// Record the latest state of one input, replacing any earlier state of
    /// the same control.
    pub fn set_input(&mut self, field: InputField) -> Result<()> {
        if !self.is_showing() {
            return Err(self.invalid("edit inputs"));
        }
        let same_control = |existing: &InputField| match (existing, &field) {
            (InputField::Text { name: a, .. }, InputField::Text { name: b, .. }) => a == b,
            (
                InputField::Checkbox { name: a, row: ra, col: ca, .. },
                InputField::Checkbox { name: b, row: rb, col: cb, .. },
            )
            | (
                InputField::MatrixCell { name: a, row: ra, col: ca, .. },
                InputField::MatrixCell { name: b, row: rb, col: cb, .. },
            ) => a == b && ra == rb && ca == cb,
            _ => false,
        };
        self.inputs.retain(|existing| !same_control(existing));
        self.inputs.push(field);
        Ok(())
    }

    pub fn get_data(&self) -> Value {
        serialize_inputs(self.question.kind, &self.inputs)
    }

    pub fn is_correct(&self, data: &Value) -> bool {
        is_correct(self.question.correct_data.as_ref(), data)
    }

    pub fn submit(&mut self, now: Instant) -> Result<Submission> {
        if !self.is_showing() {
            return Err(self.invalid("submit"));
        }

        let data = self.get_data();
        let correct = self.is_correct(&data);
        // Nothing changes unless the response can actually be sent.
        let response = self.build_response(now, correct, data)?;
        let mut answered = false;

        if correct {
            if !self.question.is_complete() {
                info!(question = %self.question.id(), "Question completed");
                self.question.mark_complete();
            }
            self.state = ViewState::Answered;
            answered = !self.answered_emitted;
            self.answered_emitted = true;
        } else {
            debug!(question = %self.question.id(), "Incorrect answer");
        }

        Ok(Submission {
            response,
            correct,
            answered,
        })
    }

    /// Leave without completing. The response snapshot is never marked
    /// correct.
    pub fn skip(&mut self, now: Instant) -> Result<Response> {
        if !self.is_showing() {
            return Err(self.invalid("skip"));
        }
        let data = self.get_data();
        let response = self.build_response(now, false, data)?;
        self.hide(now);
        info!(question = %self.question.id(), "Question skipped");
        Ok(response)
    }

    pub fn hide(&mut self, now: Instant) {
        if let Some(shown_at) = self.shown_at.take() {
            self.time_displayed += now.saturating_duration_since(shown_at);
        }
        self.state = ViewState::Hidden;
    }

    /// Visible time accumulated since the last response.
    pub fn time_displayed(&self, now: Instant) -> Duration {
        let open = self
            .shown_at
            .map(|shown_at| now.saturating_duration_since(shown_at))
            .unwrap_or_default();
        self.time_displayed + open
    }

    /// Snapshot the current inputs as a response and restart the display
    /// timer.
    pub fn get_response(&mut self, now: Instant) -> Result<Response> {
        let data = self.get_data();
        let correct = self.is_correct(&data);
        self.build_response(now, correct, data)
    }

    fn build_response(&mut self, now: Instant, correct: bool, data: Value) -> Result<Response> {
        let time_displayed = self.time_displayed(now);
        let draft = ResponseDraft {
            time: Some(self.question.bookmark.time.clone()),
            youtube_id: Some(self.question.youtube_id.clone()),
            id: Some(self.question.id().to_string()),
            version: self.question.version.clone(),
            correct: Some(correct),
            data: Some(data),
            time_displayed: time_displayed.as_secs_f64(),
        };
        let response = draft.validate()?;

        self.time_displayed = Duration::ZERO;
        if self.shown_at.is_some() {
            self.shown_at = Some(now);
        }
        Ok(response)
    }

    fn invalid(&self, action: &'static str) -> SocratesError {
        SocratesError::InvalidTransition {
            from: self.state.name(),
            action,
        }
    }
}
