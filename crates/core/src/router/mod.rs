//! Ties playback position, URL fragment and overlay visibility together.
//!
//! The router owns the player handle, the scheduler and one
//! [`QuestionView`] per question. Everything it wants the outside world to
//! know goes out through its [`Publisher`] as typed events.

pub mod events;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Instant,
};

use tracing::{debug, info, warn};

use crate::{
    answer::InputField,
    config::SocratesConfig,
    error::{Result, SocratesError},
    events::{Event, EventHeader, Publisher},
    fragment::Fragment,
    player::{PlayerState, VideoPlayer},
    poppler::{Flow, Poppler},
    question_view::{QuestionView, Submission},
    types::{Bookmark, Response, TemplateKey, TimelineItem, VideoFeed},
};

pub use events::*;

/// Player and scheduler positions closer than this are the same position.
const POSITION_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterState {
    Playing,
    QuestionActive { id: String },
    Seeking,
}

impl RouterState {
    pub fn name(&self) -> &'static str {
        match self {
            RouterState::Playing => "playing",
            RouterState::QuestionActive { .. } => "question-active",
            RouterState::Seeking => "seeking",
        }
    }
}

#[derive(Debug, Clone)]
enum Trigger {
    Question(String),
    Bookmark(String),
}

/// A playback resume waiting out the settle delay. Dropped if the epoch
/// moved on in the meantime.
#[derive(Debug, Clone, Copy)]
struct PendingResume {
    due: Instant,
    epoch: u64,
    seconds: f64,
}

pub struct Router<P, B> {
    config: SocratesConfig,
    player: P,
    publisher: B,
    poppler: Poppler<Trigger>,
    views: HashMap<String, QuestionView>,
    bookmarks: HashMap<String, Bookmark>,
    /// Timeline ids in feed order; slug lookups take the first match.
    order: Vec<String>,
    templates: Option<HashSet<TemplateKey>>,
    state: RouterState,
    fragment: Fragment,
    pending_deep_link: Option<String>,
    pending_resume: Option<PendingResume>,
    resume_at: Option<f64>,
    epoch: u64,
    ignore_next_play: bool,
    finished: bool,
}

impl<P: VideoPlayer, B: Publisher> Router<P, B> {
    /// Register every timeline item with the scheduler. Fails on the first
    /// malformed time or repeated id.
    pub fn new(config: SocratesConfig, feed: &VideoFeed, player: P, publisher: B) -> Result<Self> {
        let mut poppler = Poppler::new();
        let mut views = HashMap::new();
        let mut bookmarks = HashMap::new();
        let mut order = Vec::with_capacity(feed.items.len());

        for item in &feed.items {
            let bookmark = item.bookmark();
            let seconds = bookmark.seconds()?;
            let id = bookmark.id.clone();

            if views.contains_key(&id) || bookmarks.contains_key(&id) {
                return Err(SocratesError::DuplicateId { id });
            }
            order.push(id.clone());

            match item {
                TimelineItem::Question(question) => {
                    poppler.add(seconds, Trigger::Question(id.clone()), id.clone());
                    views.insert(id, QuestionView::new(question.clone()));
                }
                TimelineItem::Bookmark(bookmark) => {
                    poppler.add(seconds, Trigger::Bookmark(id.clone()), id.clone());
                    bookmarks.insert(id, bookmark.clone());
                }
            }
        }

        info!(
            youtube_id = %feed.youtube_id,
            questions = views.len(),
            bookmarks = bookmarks.len(),
            "Timeline registered"
        );

        Ok(Self {
            config,
            player,
            publisher,
            poppler,
            views,
            bookmarks,
            order,
            templates: None,
            state: RouterState::Playing,
            fragment: Fragment::Empty,
            pending_deep_link: None,
            pending_resume: None,
            resume_at: None,
            epoch: 0,
            ignore_next_play: false,
            finished: false,
        })
    }

    /// Restrict the overlay templates that resolve. Without this every
    /// question's template is assumed to exist.
    pub fn with_templates(mut self, templates: impl IntoIterator<Item = TemplateKey>) -> Self {
        self.templates = Some(templates.into_iter().collect());
        self
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn publisher(&self) -> &B {
        &self.publisher
    }

    pub fn view(&self, id: &str) -> Option<&QuestionView> {
        self.views.get(id)
    }

    pub fn views(&self) -> impl Iterator<Item = &QuestionView> {
        self.views.values()
    }

    pub fn active_view(&self) -> Option<&QuestionView> {
        match &self.state {
            RouterState::QuestionActive { id } => self.views.get(id),
            _ => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.poppler.is_blocked()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn overlay_enabled(&self) -> bool {
        self.config.show_questions
    }

    pub fn set_overlay_enabled(&mut self, enabled: bool) {
        self.config.show_questions = enabled;
    }

    /// Periodic driver: apply parked deep links, run a due resume, and feed
    /// the playhead to the scheduler.
    pub fn tick(&mut self, now: Instant) {
        if self.pending_deep_link.is_some() && self.player.state().is_ready() {
            self.apply_pending_deep_link(now);
        }

        if let Some(pending) = self.pending_resume
            && pending.due <= now
        {
            self.pending_resume = None;
            if pending.epoch == self.epoch && self.state == RouterState::Playing {
                self.resume_playback(pending.seconds);
            } else {
                debug!(epoch = pending.epoch, current = self.epoch, "Dropped stale resume");
            }
        }

        if self.state == RouterState::Seeking && self.player.state() == PlayerState::Playing {
            self.finish_seek();
        }

        match self.player.state() {
            PlayerState::Playing if self.state == RouterState::Playing => {
                let seconds = self.player.current_time();
                self.fire_due(now, seconds);
            }
            PlayerState::Ended => self.finish(),
            _ => {}
        }
    }

    /// Feed from the player's asynchronous state-change notifications.
    pub fn on_player_state(&mut self, now: Instant, state: PlayerState) {
        debug!(state = state.name(), "Player state changed");
        match state {
            PlayerState::Playing => {
                let ignored = std::mem::take(&mut self.ignore_next_play);
                if self.state == RouterState::Seeking {
                    self.finish_seek();
                } else if !ignored && self.state == RouterState::Playing {
                    self.resync_after_scrub();
                }
            }
            PlayerState::Paused => self.ignore_next_play = false,
            PlayerState::Buffering => self.ignore_next_play = true,
            PlayerState::Ended => self.finish(),
            PlayerState::Unstarted | PlayerState::Cued => {}
        }

        if self.pending_deep_link.is_some() && state.is_ready() {
            self.apply_pending_deep_link(now);
        }
    }

    /// Route to a URL fragment: a question (`slug/q`), a bookmark slug, or
    /// a bare time.
    pub fn navigate(&mut self, now: Instant, raw: &str) -> Result<()> {
        let fragment = Fragment::parse(raw);
        info!(fragment = %fragment, "Navigate");

        self.epoch += 1;
        self.pending_resume = None;
        self.pending_deep_link = None;

        match fragment {
            Fragment::Empty => {
                self.dismiss_active(now);
                self.set_fragment(Fragment::Empty);
                Ok(())
            }
            Fragment::Time(seconds) => {
                self.dismiss_active(now);
                let seconds = self.seek_to_time(seconds);
                self.set_fragment(Fragment::Time(seconds));
                Ok(())
            }
            Fragment::Bookmark(slug) => {
                let seconds = self.seconds_for_slug(&slug)?;
                self.dismiss_active(now);
                self.seek_to_time(seconds);
                self.set_fragment(Fragment::Bookmark(slug));
                Ok(())
            }
            Fragment::Question(slug) => {
                let id = self
                    .question_by_slug(&slug)
                    .map(|view| view.question().id().to_string())
                    .ok_or(SocratesError::UnknownQuestion { id: slug })?;

                if self.player.state().is_ready() {
                    self.deep_link(now, &id);
                } else {
                    debug!(question = %id, "Player not ready, parking deep link");
                    self.pending_deep_link = Some(id);
                }
                Ok(())
            }
        }
    }

    pub fn set_input(&mut self, field: InputField) -> Result<()> {
        self.active_view_mut()?.set_input(field)
    }

    /// Check the active question's inputs. A first correct answer closes the
    /// overlay and schedules playback to resume.
    pub fn submit(&mut self, now: Instant) -> Result<Submission> {
        let view = self.active_view_mut()?;
        let id = view.question().id().to_string();
        let submission = match view.submit(now) {
            Ok(submission) => submission,
            Err(err) => return Err(self.abandon_question(now, &id, err)),
        };

        self.emit(ResponseSubmitted {
            header: EventHeader::new(),
            response: submission.response.clone(),
        });

        if submission.answered {
            self.emit(QuestionAnswered {
                header: EventHeader::new(),
                question_id: id.clone(),
                response: submission.response.clone(),
            });
            self.close_question(now, &id);
        }
        Ok(submission)
    }

    pub fn skip(&mut self, now: Instant) -> Result<Response> {
        let view = self.active_view_mut()?;
        let id = view.question().id().to_string();
        let response = match view.skip(now) {
            Ok(response) => response,
            Err(err) => return Err(self.abandon_question(now, &id, err)),
        };

        self.emit(ResponseSubmitted {
            header: EventHeader::new(),
            response: response.clone(),
        });
        self.emit(QuestionSkipped {
            header: EventHeader::new(),
            question_id: id.clone(),
            response: response.clone(),
        });
        self.close_question(now, &id);
        Ok(response)
    }

    /// A response that cannot be built closes the question without one and
    /// playback continues.
    fn abandon_question(&mut self, now: Instant, id: &str, err: SocratesError) -> SocratesError {
        if matches!(err, SocratesError::InvalidResponse { .. }) {
            warn!(question = %id, error = %err, "Dropping unsendable response, resuming playback");
            self.close_question(now, id);
        }
        err
    }

    fn active_view_mut(&mut self) -> Result<&mut QuestionView> {
        let RouterState::QuestionActive { id } = &self.state else {
            return Err(SocratesError::InvalidTransition {
                from: self.state.name(),
                action: "answer",
            });
        };
        self.views
            .get_mut(id)
            .ok_or_else(|| SocratesError::UnknownQuestion { id: id.clone() })
    }

    fn fire_due(&mut self, now: Instant, seconds: f64) {
        // The scheduler is moved out so triggers can borrow the rest of the
        // router mutably.
        let mut poppler = std::mem::take(&mut self.poppler);
        poppler.trigger_with(seconds, |entry| self.on_trigger(now, &entry.payload));
        self.poppler = poppler;
    }

    fn on_trigger(&mut self, now: Instant, trigger: &Trigger) -> Flow {
        match trigger {
            Trigger::Bookmark(id) => {
                if let Some(bookmark) = self.bookmarks.get(id) {
                    let event = BookmarkReached {
                        header: EventHeader::new(),
                        bookmark_id: bookmark.id.clone(),
                        title: bookmark.title.clone(),
                        seconds: bookmark.seconds().unwrap_or_default(),
                    };
                    self.emit(event);
                }
                Flow::Continue
            }
            Trigger::Question(id) => {
                if !self.config.show_questions || self.state != RouterState::Playing {
                    return Flow::Continue;
                }
                match self.open_question(now, id) {
                    Ok(()) => Flow::Block,
                    Err(err) => {
                        warn!(question = %id, error = %err, "Cannot show question, continuing playback");
                        Flow::Continue
                    }
                }
            }
        }
    }

    /// The overlay template for question `id`, if one is available.
    fn resolve_template(&self, id: &str) -> Result<TemplateKey> {
        let view = self
            .views
            .get(id)
            .ok_or_else(|| SocratesError::UnknownQuestion { id: id.to_string() })?;

        let template = view.question().template_key();
        if let Some(templates) = &self.templates
            && !templates.contains(&template)
        {
            return Err(SocratesError::UnknownQuestion { id: id.to_string() });
        }
        Ok(template)
    }

    /// Pause, show the overlay and enter `QuestionActive`. Does not touch
    /// the scheduler.
    fn open_question(&mut self, now: Instant, id: &str) -> Result<()> {
        let template = self.resolve_template(id)?;
        let question = self
            .views
            .get(id)
            .map(QuestionView::question)
            .ok_or_else(|| SocratesError::UnknownQuestion { id: id.to_string() })?;

        let seconds = question.seconds()?;
        let title = question.bookmark.title.clone();
        let slug = question.slug();

        if let Some(view) = self.views.get_mut(id) {
            view.show(now)?;
        }

        self.player.pause();
        if self.config.audio_cue {
            self.emit(AudioCueRequested {
                header: EventHeader::new(),
                question_id: id.to_string(),
            });
        }

        self.resume_at = Some(seconds);
        self.state = RouterState::QuestionActive { id: id.to_string() };
        self.set_fragment(Fragment::Question(slug));
        self.emit(QuestionShown {
            header: EventHeader::new(),
            question_id: id.to_string(),
            title,
            seconds,
            template,
        });
        Ok(())
    }

    /// Hide the overlay after `answered`/`skipped` and get playback going
    /// again, unless another trigger at the same instant takes over.
    fn close_question(&mut self, now: Instant, id: &str) {
        if let Some(view) = self.views.get_mut(id)
            && view.is_showing()
        {
            view.hide(now);
        }

        self.state = RouterState::Playing;
        self.poppler.resume_events();

        let resume_seconds = match self.poppler.seek_to_id(id) {
            Ok(seconds) => seconds,
            Err(_) => self.resume_at.unwrap_or_else(|| self.player.current_time()),
        };
        self.resume_at = None;

        let slug = self.views.get(id).map(|view| view.question().slug());
        if let Some(slug) = slug {
            self.set_fragment(Fragment::Bookmark(slug));
        }

        let queued = self
            .poppler
            .next_pending()
            .is_some_and(|entry| entry.seconds <= resume_seconds + POSITION_EPSILON);
        if queued {
            self.fire_due(now, resume_seconds);
            if self.state != RouterState::Playing {
                debug!("Queued trigger took over");
                return;
            }
        }

        let delay = self.config.settle_delay();
        if delay.is_zero() {
            self.resume_playback(resume_seconds);
        } else {
            self.pending_resume = Some(PendingResume {
                due: now + delay,
                epoch: self.epoch,
                seconds: resume_seconds,
            });
        }
    }

    fn resume_playback(&mut self, seconds: f64) {
        info!(seconds, "Resuming playback");
        self.ignore_next_play = true;
        self.player.seek_to(seconds, true);
        self.player.play();
    }

    /// Hide whatever question is showing without sending a response.
    fn dismiss_active(&mut self, now: Instant) {
        if let RouterState::QuestionActive { id } = &self.state {
            debug!(question = %id, "Dismissing question");
            if let Some(view) = self.views.get_mut(id) {
                view.hide(now);
            }
            self.state = RouterState::Playing;
            self.resume_at = None;
        }
        self.poppler.resume_events();
    }

    /// Returns the clamped position actually sought to.
    fn seek_to_time(&mut self, seconds: f64) -> f64 {
        let seconds = seconds.clamp(0.0, self.player.duration().max(0.0));
        self.state = RouterState::Seeking;

        let was_paused = self.player.state() == PlayerState::Paused;
        self.poppler.seek(seconds);
        self.player.seek_to(seconds, true);
        if was_paused {
            self.ignore_next_play = true;
            self.player.play();
        }
        seconds
    }

    /// The player reported playing after a fragment seek.
    fn finish_seek(&mut self) {
        debug!(position = self.poppler.position(), "Seek settled");
        self.state = RouterState::Playing;
    }

    fn apply_pending_deep_link(&mut self, now: Instant) {
        if let Some(id) = self.pending_deep_link.take() {
            self.deep_link(now, &id);
        }
    }

    /// Jump straight to a question: skip everything before it, park the
    /// player on its second, and show it.
    fn deep_link(&mut self, now: Instant, id: &str) {
        if let Err(err) = self.resolve_template(id) {
            warn!(question = %id, error = %err, "Cannot show deep-linked question, playback unchanged");
            return;
        }

        self.dismiss_active(now);
        self.epoch += 1;

        let seconds = match self.poppler.seek_to_id(id) {
            Ok(seconds) => seconds,
            Err(err) => {
                warn!(question = %id, error = %err, "Deep link target not scheduled");
                return;
            }
        };

        let parked = self.player.state() == PlayerState::Paused
            && (self.player.current_time() - seconds).abs() < POSITION_EPSILON;
        if !parked {
            self.player.seek_to(seconds, true);
            self.player.pause();
        }

        match self.open_question(now, id) {
            Ok(()) => self.poppler.set_blocked(true),
            Err(err) => {
                warn!(question = %id, error = %err, "Cannot show deep-linked question");
                self.state = RouterState::Playing;
                self.poppler.resume_events();
                self.resume_playback(seconds);
            }
        }
    }

    /// A `PLAYING` report far from where the scheduler thinks we are means
    /// the user scrubbed; move the scheduler without firing.
    fn resync_after_scrub(&mut self) {
        let seconds = self.player.current_time();
        let delta = seconds - self.poppler.position().max(0.0);
        if delta < -POSITION_EPSILON || delta > self.config.seek_threshold_secs {
            info!(from = self.poppler.position(), to = seconds, "Re-syncing after scrub");
            self.poppler.seek(seconds);
        }
    }

    fn question_by_slug(&self, slug: &str) -> Option<&QuestionView> {
        self.order
            .iter()
            .filter_map(|id| self.views.get(id))
            .find(|view| view.question().slug() == slug)
    }

    fn seconds_for_slug(&self, slug: &str) -> Result<f64> {
        let bookmark = self
            .order
            .iter()
            .filter_map(|id| {
                self.bookmarks
                    .get(id)
                    .or_else(|| self.views.get(id).map(|view| &view.question().bookmark))
            })
            .find(|bookmark| bookmark.slug() == slug)
            .ok_or_else(|| SocratesError::UnknownBookmark {
                slug: slug.to_string(),
            })?;
        bookmark.seconds()
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let mut completed: Vec<String> = self
            .views
            .values()
            .filter(|view| view.question().is_complete())
            .map(|view| view.question().id().to_string())
            .collect();
        completed.sort();

        info!(completed = completed.len(), total = self.views.len(), "Playback finished");
        self.emit(PlaybackFinished {
            header: EventHeader::new(),
            completed,
            total_questions: self.views.len(),
        });
    }

    fn set_fragment(&mut self, fragment: Fragment) {
        if self.fragment == fragment {
            return;
        }
        self.fragment = fragment;
        self.emit(FragmentChanged {
            header: EventHeader::new(),
            fragment: self.fragment.to_string(),
        });
    }

    fn emit<E: Event>(&self, event: E) {
        self.publisher.publish(Arc::new(event));
    }
}
