//! Playback-position event scheduler.
//!
//! Entries are kept sorted by time (equal times keep registration order).
//! A cursor marks the first entry that has not fired for the current
//! forward pass; `trigger` advances it, `seek` repositions it without
//! firing anything.

use tracing::debug;

use crate::error::{Result, SocratesError};

/// Backwards movement smaller than this is treated as jitter, not a seek.
const EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop firing and block the scheduler until `resume_events`.
    Block,
}

impl From<bool> for Flow {
    fn from(block: bool) -> Self {
        if block { Flow::Block } else { Flow::Continue }
    }
}

#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub seconds: f64,
    pub id: String,
    pub payload: T,
}

pub type Callback = Box<dyn FnMut() -> Flow + Send>;

#[derive(Debug)]
pub struct Poppler<T> {
    entries: Vec<Entry<T>>,
    position: f64,
    cursor: usize,
    blocked: bool,
}

impl<T> Default for Poppler<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            position: f64::NEG_INFINITY,
            cursor: 0,
            blocked: false,
        }
    }
}

impl<T> Poppler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger point. Entries landing behind the cursor count as
    /// already passed until a seek rewinds past them.
    pub fn add(&mut self, seconds: f64, payload: T, id: impl Into<String>) {
        let index = self.entries.partition_point(|e| e.seconds <= seconds);
        if index < self.cursor {
            self.cursor += 1;
        }
        self.entries.insert(
            index,
            Entry {
                seconds,
                id: id.into(),
                payload,
            },
        );
    }

    /// Fire every pending entry with a time at or before `seconds`, in
    /// order. Returns how many entries fired.
    pub fn trigger_with<F>(&mut self, seconds: f64, mut on_entry: F) -> usize
    where
        F: FnMut(&mut Entry<T>) -> Flow,
    {
        if self.blocked {
            return 0;
        }

        if seconds < self.position - EPSILON {
            debug!(from = self.position, to = seconds, "backwards tick, treating as seek");
            self.seek(seconds);
            return 0;
        }

        let mut fired = 0;
        while let Some(entry) = self.entries.get_mut(self.cursor) {
            if entry.seconds > seconds {
                break;
            }
            self.cursor += 1;
            fired += 1;

            debug!(id = %entry.id, at = entry.seconds, "firing");
            if on_entry(entry) == Flow::Block {
                debug!(id = %entry.id, "blocked");
                self.blocked = true;
                break;
            }
        }

        self.position = self.position.max(seconds);
        fired
    }

    /// Jump to `seconds` without firing. Entries strictly after it become
    /// pending.
    pub fn seek(&mut self, seconds: f64) {
        self.position = seconds;
        self.cursor = self.entries.partition_point(|e| e.seconds <= seconds);
    }

    /// Jump to the first entry registered under `id`. Only entries after it stay
    /// pending, so it does not fire again straight away.
    pub fn seek_to_id(&mut self, id: &str) -> Result<f64> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| SocratesError::UnknownQuestion { id: id.to_string() })?;

        let seconds = self.entries[index].seconds;
        self.position = seconds;
        self.cursor = index + 1;
        Ok(seconds)
    }

    pub fn resume_events(&mut self) {
        self.blocked = false;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn next_pending(&self) -> Option<&Entry<T>> {
        self.entries.get(self.cursor)
    }

    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    pub fn seconds_of(&self, id: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.seconds)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Poppler<Callback> {
    pub fn trigger(&mut self, seconds: f64) -> usize {
        self.trigger_with(seconds, |entry| (entry.payload)())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, name: &'static str, flow: Flow) -> Callback {
        let log = Arc::clone(log);
        Box::new(move || {
            log.lock().unwrap().push(name);
            flow
        })
    }

    fn fired(log: &Log) -> Vec<&'static str> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn fires_each_entry_once_in_time_order() {
        let log = Log::default();
        let mut poppler = Poppler::new();
        poppler.add(20.0, recorder(&log, "b", Flow::Continue), "b");
        poppler.add(5.0, recorder(&log, "a", Flow::Continue), "a");
        poppler.add(40.0, recorder(&log, "c", Flow::Continue), "c");

        for t in [0.0, 4.9, 5.0, 12.0, 39.0, 45.0, 60.0] {
            poppler.trigger(t);
        }

        assert_eq!(fired(&log), vec!["a", "b", "c"]);
    }

    #[test]
    fn large_forward_jump_still_fires_everything_crossed() {
        let log = Log::default();
        let mut poppler = Poppler::new();
        poppler.add(1.0, recorder(&log, "a", Flow::Continue), "a");
        poppler.add(2.0, recorder(&log, "b", Flow::Continue), "b");

        assert_eq!(poppler.trigger(100.0), 2);
        assert_eq!(fired(&log), vec!["a", "b"]);
    }

    #[test]
    fn repeated_trigger_is_idempotent() {
        let log = Log::default();
        let mut poppler = Poppler::new();
        poppler.add(10.0, recorder(&log, "a", Flow::Continue), "a");

        assert_eq!(poppler.trigger(10.0), 1);
        assert_eq!(poppler.trigger(10.0), 0);
        assert_eq!(fired(&log), vec!["a"]);
    }

    #[test]
    fn seek_skips_earlier_entries() {
        let log = Log::default();
        let mut poppler = Poppler::new();
        poppler.add(10.0, recorder(&log, "a", Flow::Continue), "a");
        poppler.add(20.0, recorder(&log, "b", Flow::Continue), "b");

        poppler.seek(15.0);
        poppler.trigger(25.0);

        assert_eq!(fired(&log), vec!["b"]);
    }

    #[test]
    fn seeking_back_refires_on_next_crossing() {
        let log = Log::default();
        let mut poppler = Poppler::new();
        poppler.add(10.0, recorder(&log, "a", Flow::Continue), "a");

        poppler.trigger(12.0);
        poppler.trigger(3.0);
        assert_eq!(fired(&log), vec!["a"]);

        poppler.trigger(11.0);
        assert_eq!(fired(&log), vec!["a", "a"]);
    }

    #[test]
    fn block_stops_the_pass_and_resume_continues_after_it() {
        let log = Log::default();
        let mut poppler = Poppler::new();
        poppler.add(10.0, recorder(&log, "a", Flow::Block), "a");
        poppler.add(11.0, recorder(&log, "b", Flow::Continue), "b");

        poppler.trigger(12.0);
        assert_eq!(fired(&log), vec!["a"]);
        assert!(poppler.is_blocked());

        poppler.trigger(13.0);
        assert_eq!(fired(&log), vec!["a"]);

        poppler.resume_events();
        poppler.trigger(13.0);
        assert_eq!(fired(&log), vec!["a", "b"]);
    }

    #[test]
    fn equal_times_fire_in_registration_order() {
        let log = Log::default();
        let mut poppler = Poppler::new();
        poppler.add(5.0, recorder(&log, "first", Flow::Continue), "1");
        poppler.add(5.0, recorder(&log, "second", Flow::Continue), "2");
        poppler.add(5.0, recorder(&log, "third", Flow::Continue), "3");

        poppler.trigger(5.0);
        assert_eq!(fired(&log), vec!["first", "second", "third"]);
    }

    #[test]
    fn seek_to_id_leaves_same_time_followers_pending() {
        let log = Log::default();
        let mut poppler = Poppler::new();
        poppler.add(30.0, recorder(&log, "q1", Flow::Continue), "q1");
        poppler.add(30.0, recorder(&log, "q2", Flow::Continue), "q2");

        assert_eq!(poppler.seek_to_id("q1").unwrap(), 30.0);
        poppler.trigger(30.0);
        assert_eq!(fired(&log), vec!["q2"]);

        assert!(matches!(
            poppler.seek_to_id("missing"),
            Err(SocratesError::UnknownQuestion { .. })
        ));
    }

    #[test]
    fn blocked_flag_makes_trigger_a_noop() {
        let log = Log::default();
        let mut poppler = Poppler::new();
        poppler.add(1.0, recorder(&log, "a", Flow::Continue), "a");

        poppler.set_blocked(true);
        assert_eq!(poppler.trigger(2.0), 0);
        poppler.set_blocked(false);
        assert_eq!(poppler.trigger(2.0), 1);
    }
}
