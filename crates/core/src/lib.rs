//! Socrates Core Library
//!
//! Interactive-video question engine: a playback-position scheduler, the
//! question overlay state machine, and the router that reconciles the two
//! with a video player, plus the event bus its collaborators listen on.

pub mod answer;
pub mod config;
pub mod duration;
pub mod error;
pub mod events;
pub mod format;
pub mod fragment;
pub mod paths;
pub mod player;
pub mod poppler;
pub mod question_view;
pub mod queues;
pub mod router;
pub mod routes;
pub mod types;
pub mod workers;

pub use answer::{InputField, is_correct, serialize_inputs};
pub use config::{SocratesConfig, default_config_path, load_config};
pub use duration::{format_duration_fragment, parse_duration};
pub use error::{Result, SocratesError};
pub use format::{format_timestamp, slugify};
pub use fragment::Fragment;
pub use paths::{get_journal_path, get_root_data_dir};
pub use player::{PlayerState, SimulatedPlayer, VideoPlayer};
pub use poppler::{Callback, Entry, Flow, Poppler};
pub use question_view::{QuestionView, Submission, ViewState};
pub use router::{Router, RouterState};
pub use types::{
    Bookmark, Question, QuestionKind, Response, ResponseDraft, TemplateKey, TimelineItem,
    VideoFeed,
};
