use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Player states, numbered as the YouTube iframe API reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(PlayerState::Unstarted),
            0 => Some(PlayerState::Ended),
            1 => Some(PlayerState::Playing),
            2 => Some(PlayerState::Paused),
            3 => Some(PlayerState::Buffering),
            5 => Some(PlayerState::Cued),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            PlayerState::Unstarted => -1,
            PlayerState::Ended => 0,
            PlayerState::Playing => 1,
            PlayerState::Paused => 2,
            PlayerState::Buffering => 3,
            PlayerState::Cued => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PlayerState::Unstarted => "unstarted",
            PlayerState::Ended => "ended",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Buffering => "buffering",
            PlayerState::Cued => "cued",
        }
    }

    /// The player has loaded enough to accept seeks.
    pub fn is_ready(self) -> bool {
        self != PlayerState::Unstarted
    }
}

/// The capabilities the router needs from an embedded video player.
pub trait VideoPlayer {
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn state(&self) -> PlayerState;
    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool);
    fn play(&mut self);
    fn pause(&mut self);
}

/// Deterministic in-process player. The playhead only moves when
/// [`SimulatedPlayer::advance`] is called.
pub struct SimulatedPlayer {
    position: f64,
    duration: f64,
    rate: f64,
    state: PlayerState,
    state_tx: mpsc::UnboundedSender<PlayerState>,
}

impl SimulatedPlayer {
    pub fn new(duration: f64) -> (Self, mpsc::UnboundedReceiver<PlayerState>) {
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        let player = Self {
            position: 0.0,
            duration: duration.max(0.0),
            rate: 1.0,
            state: PlayerState::Unstarted,
            state_tx,
        };
        (player, state_rx)
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate.max(0.0);
        self
    }

    /// Move the playhead as if `elapsed` wall time had passed.
    pub fn advance(&mut self, elapsed: Duration) {
        if self.state != PlayerState::Playing {
            return;
        }
        self.position += elapsed.as_secs_f64() * self.rate;
        if self.position >= self.duration {
            self.position = self.duration;
            self.set_state(PlayerState::Ended);
        }
    }

    /// Mark the player loaded, as an embed does once its API is ready.
    pub fn cue(&mut self) {
        if self.state == PlayerState::Unstarted {
            self.set_state(PlayerState::Cued);
        }
    }

    fn set_state(&mut self, state: PlayerState) {
        if self.state == state {
            return;
        }
        self.state = state;
        // Nobody listening is fine; the state is still queryable.
        let _ = self.state_tx.send(state);
    }
}

impl VideoPlayer for SimulatedPlayer {
    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn state(&self) -> PlayerState {
        self.state
    }

    fn seek_to(&mut self, seconds: f64, _allow_seek_ahead: bool) {
        self.position = seconds.clamp(0.0, self.duration);
        if self.state == PlayerState::Playing {
            self.set_state(PlayerState::Buffering);
            self.set_state(PlayerState::Playing);
        } else if self.state == PlayerState::Ended && self.position < self.duration {
            self.set_state(PlayerState::Paused);
        }
    }

    fn play(&mut self) {
        if self.position >= self.duration {
            return;
        }
        self.set_state(PlayerState::Playing);
    }

    fn pause(&mut self) {
        if matches!(self.state, PlayerState::Playing | PlayerState::Buffering) {
            self.set_state(PlayerState::Paused);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in [-1, 0, 1, 2, 3, 5] {
            assert_eq!(PlayerState::from_code(code).unwrap().code(), code);
        }
        assert_eq!(PlayerState::from_code(4), None);
    }

    #[test]
    fn playhead_moves_only_while_playing() {
        let (mut player, mut rx) = SimulatedPlayer::new(10.0);
        player.advance(Duration::from_secs(1));
        assert_eq!(player.current_time(), 0.0);

        player.play();
        player.advance(Duration::from_millis(2500));
        assert_eq!(player.current_time(), 2.5);

        player.pause();
        player.advance(Duration::from_secs(1));
        assert_eq!(player.current_time(), 2.5);

        assert_eq!(rx.try_recv().unwrap(), PlayerState::Playing);
        assert_eq!(rx.try_recv().unwrap(), PlayerState::Paused);
    }

    #[test]
    fn seeking_while_playing_buffers_then_plays() {
        let (mut player, mut rx) = SimulatedPlayer::new(60.0);
        player.play();
        player.seek_to(30.0, true);

        let states: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            states,
            vec![PlayerState::Playing, PlayerState::Buffering, PlayerState::Playing]
        );
    }

    #[test]
    fn ends_at_duration() {
        let (player, _rx) = SimulatedPlayer::new(5.0);
        let mut player = player.with_rate(2.0);
        player.play();
        player.advance(Duration::from_secs(4));
        assert_eq!(player.current_time(), 5.0);
        assert_eq!(player.state(), PlayerState::Ended);
    }
}
