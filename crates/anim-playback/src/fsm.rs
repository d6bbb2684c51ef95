//! Playback state machine.

use crate::request::Segment;

/// Consecutive frame failures that stop playback.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PlaybackState {
    #[default]
    Idle = 0,
    Playing = 1,
    Stopped = 2,
    Deleting = 3,
}

impl PlaybackState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => PlaybackState::Playing,
            2 => PlaybackState::Stopped,
            3 => PlaybackState::Deleting,
            _ => PlaybackState::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackInput {
    Start(Segment),
    Stop,
    FrameDecoded,
    FrameFailed,
    PassComplete,
    Delete,
}

/// State change produced by one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PlaybackState,
    pub to: PlaybackState,
    /// Failure threshold reached on this input.
    pub breaker_tripped: bool,
}

impl Transition {
    /// Playback was running and no longer is.
    pub fn left_playing(&self) -> bool {
        self.from == PlaybackState::Playing && self.to != PlaybackState::Playing
    }
}

/// Task-local playback state: current state, run parameters and the
/// consecutive failure counter.
#[derive(Debug, Clone)]
pub struct PlaybackFsm {
    state: PlaybackState,
    run: Option<Segment>,
    failures: u32,
}

impl Default for PlaybackFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackFsm {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            run: None,
            failures: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Run parameters of the most recent start.
    pub fn run(&self) -> Option<Segment> {
        self.run
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn transition(&mut self, input: PlaybackInput) -> Transition {
        use PlaybackInput::*;

        let from = self.state;
        let mut breaker_tripped = false;

        match input {
            Start(segment) => {
                if from != PlaybackState::Deleting {
                    self.run = Some(segment);
                    self.failures = 0;
                    self.state = PlaybackState::Playing;
                }
            }

            Stop => {
                if from == PlaybackState::Playing {
                    self.state = PlaybackState::Stopped;
                }
            }

            FrameDecoded => {
                self.failures = 0;
            }

            FrameFailed => {
                self.failures += 1;
                if from == PlaybackState::Playing && self.failures >= MAX_CONSECUTIVE_FAILURES {
                    self.state = PlaybackState::Stopped;
                    self.failures = 0;
                    breaker_tripped = true;
                }
            }

            PassComplete => {
                let repeat = self.run.is_some_and(|r| r.repeat);
                if from == PlaybackState::Playing && !repeat {
                    self.state = PlaybackState::Idle;
                }
            }

            Delete => {
                self.state = PlaybackState::Deleting;
            }
        }

        Transition {
            from,
            to: self.state,
            breaker_tripped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(repeat: bool) -> Segment {
        Segment {
            start: 0,
            end: 1,
            fps: 10,
            repeat,
        }
    }

    #[test]
    fn test_start_stop() {
        let mut fsm = PlaybackFsm::new();
        let t = fsm.transition(PlaybackInput::Start(segment(true)));
        assert_eq!((t.from, t.to), (PlaybackState::Idle, PlaybackState::Playing));

        let t = fsm.transition(PlaybackInput::Stop);
        assert!(t.left_playing());
        assert_eq!(fsm.state(), PlaybackState::Stopped);

        let t = fsm.transition(PlaybackInput::Start(segment(true)));
        assert_eq!(t.to, PlaybackState::Playing);
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut fsm = PlaybackFsm::new();
        let t = fsm.transition(PlaybackInput::Stop);
        assert_eq!(t.to, PlaybackState::Idle);
        assert!(!t.left_playing());
    }

    #[test]
    fn test_pass_complete() {
        let mut fsm = PlaybackFsm::new();
        fsm.transition(PlaybackInput::Start(segment(true)));
        assert!(!fsm.transition(PlaybackInput::PassComplete).left_playing());

        fsm.transition(PlaybackInput::Start(segment(false)));
        let t = fsm.transition(PlaybackInput::PassComplete);
        assert!(t.left_playing());
        assert_eq!(t.to, PlaybackState::Idle);
    }

    #[test]
    fn test_breaker_trips_after_five_failures() {
        let mut fsm = PlaybackFsm::new();
        fsm.transition(PlaybackInput::Start(segment(true)));
        for _ in 0..4 {
            assert!(!fsm.transition(PlaybackInput::FrameFailed).breaker_tripped);
        }
        let t = fsm.transition(PlaybackInput::FrameFailed);
        assert!(t.breaker_tripped);
        assert!(t.left_playing());
        assert_eq!(fsm.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_success_resets_failures() {
        let mut fsm = PlaybackFsm::new();
        fsm.transition(PlaybackInput::Start(segment(true)));
        for _ in 0..4 {
            fsm.transition(PlaybackInput::FrameFailed);
        }
        fsm.transition(PlaybackInput::FrameDecoded);
        assert_eq!(fsm.failures(), 0);
        assert!(fsm.is_playing());

        for _ in 0..4 {
            fsm.transition(PlaybackInput::FrameFailed);
        }
        assert!(fsm.is_playing());
    }

    #[test]
    fn test_delete_is_terminal() {
        let mut fsm = PlaybackFsm::new();
        fsm.transition(PlaybackInput::Start(segment(true)));
        let t = fsm.transition(PlaybackInput::Delete);
        assert!(t.left_playing());
        fsm.transition(PlaybackInput::Start(segment(true)));
        assert_eq!(fsm.state(), PlaybackState::Deleting);
    }

    #[test]
    fn test_state_roundtrip_u8() {
        for state in [
            PlaybackState::Idle,
            PlaybackState::Playing,
            PlaybackState::Stopped,
            PlaybackState::Deleting,
        ] {
            assert_eq!(PlaybackState::from_u8(state as u8), state);
        }
    }
}
