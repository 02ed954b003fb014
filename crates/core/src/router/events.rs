//! Events the router publishes for its collaborators.

use serde::Serialize;

use crate::{
    events::EventHeader,
    impl_event,
    types::{Response, TemplateKey},
};

#[derive(Clone, Debug, Serialize)]
pub struct QuestionShown {
    pub header: EventHeader,
    pub question_id: String,
    pub title: String,
    pub seconds: f64,
    pub template: TemplateKey,
}

impl QuestionShown {
    pub const EVENT_TYPE: &'static str = "question.shown";
}

#[derive(Clone, Debug, Serialize)]
pub struct QuestionAnswered {
    pub header: EventHeader,
    pub question_id: String,
    pub response: Response,
}

impl QuestionAnswered {
    pub const EVENT_TYPE: &'static str = "question.answered";
}

#[derive(Clone, Debug, Serialize)]
pub struct QuestionSkipped {
    pub header: EventHeader,
    pub question_id: String,
    pub response: Response,
}

impl QuestionSkipped {
    pub const EVENT_TYPE: &'static str = "question.skipped";
}

/// One per submit or skip; the transport layer's input.
#[derive(Clone, Debug, Serialize)]
pub struct ResponseSubmitted {
    pub header: EventHeader,
    pub response: Response,
}

impl ResponseSubmitted {
    pub const EVENT_TYPE: &'static str = "response.submitted";
}

#[derive(Clone, Debug, Serialize)]
pub struct FragmentChanged {
    pub header: EventHeader,
    pub fragment: String,
}

impl FragmentChanged {
    pub const EVENT_TYPE: &'static str = "fragment.changed";
}

#[derive(Clone, Debug, Serialize)]
pub struct BookmarkReached {
    pub header: EventHeader,
    pub bookmark_id: String,
    pub title: String,
    pub seconds: f64,
}

impl BookmarkReached {
    pub const EVENT_TYPE: &'static str = "bookmark.reached";
}

#[derive(Clone, Debug, Serialize)]
pub struct AudioCueRequested {
    pub header: EventHeader,
    pub question_id: String,
}

impl AudioCueRequested {
    pub const EVENT_TYPE: &'static str = "audio.cue_requested";
}

#[derive(Clone, Debug, Serialize)]
pub struct PlaybackFinished {
    pub header: EventHeader,
    pub completed: Vec<String>,
    pub total_questions: usize,
}

impl PlaybackFinished {
    pub const EVENT_TYPE: &'static str = "playback.finished";
}

impl_event!(QuestionShown);
impl_event!(QuestionAnswered);
impl_event!(QuestionSkipped);
impl_event!(ResponseSubmitted);
impl_event!(FragmentChanged);
impl_event!(BookmarkReached);
impl_event!(AudioCueRequested);
impl_event!(PlaybackFinished);
