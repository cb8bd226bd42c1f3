//! Pacing between turns: automatic playback vs. manual single-stepping.

/// What should happen after a turn's stream has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAdvance {
    /// Auto-play: schedule the next turn after the configured delay.
    Automatic,
    /// Manual mode: hold until the user's advance action.
    Hold,
}

/// Tracks auto-play vs. manual mode and whether the pipeline is paused
/// awaiting an explicit advance.
///
/// `waiting_for_next` is true only while auto-play is off and a completed
/// turn has not yet been followed by a new turn request.
#[derive(Debug, Clone)]
pub struct PacingState {
    auto_play: bool,
    waiting_for_next: bool,
    /// Configuration-derived value restored on reset.
    initial_auto_play: bool,
}

impl PacingState {
    pub fn new(auto_play: bool) -> Self {
        Self {
            auto_play,
            waiting_for_next: false,
            initial_auto_play: auto_play,
        }
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    pub fn waiting_for_next(&self) -> bool {
        self.waiting_for_next
    }

    /// A turn's stream has ended; decide how the next turn is triggered.
    pub fn on_stream_end(&mut self) -> TurnAdvance {
        if self.auto_play {
            TurnAdvance::Automatic
        } else {
            self.waiting_for_next = true;
            TurnAdvance::Hold
        }
    }

    /// The user asked for the next turn. Returns true when a turn request
    /// should fire now; an advance while not waiting is ignored.
    pub fn advance(&mut self) -> bool {
        if self.waiting_for_next {
            self.waiting_for_next = false;
            true
        } else {
            false
        }
    }

    /// Toggle auto-play. Switching it on while a turn is held fires the
    /// pending turn immediately (returns true); switching it off takes
    /// effect at the next stream end.
    pub fn set_auto_play(&mut self, auto_play: bool) -> bool {
        self.auto_play = auto_play;
        if auto_play && self.waiting_for_next {
            self.waiting_for_next = false;
            true
        } else {
            false
        }
    }

    /// Restore the configuration-derived initial state.
    pub fn reset(&mut self) {
        self.auto_play = self.initial_auto_play;
        self.waiting_for_next = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_play_schedules_next_turn() {
        let mut pacing = PacingState::new(true);
        assert_eq!(pacing.on_stream_end(), TurnAdvance::Automatic);
        assert!(!pacing.waiting_for_next());
    }

    #[test]
    fn test_manual_mode_holds_until_advance() {
        let mut pacing = PacingState::new(false);
        assert_eq!(pacing.on_stream_end(), TurnAdvance::Hold);
        assert!(pacing.waiting_for_next());

        assert!(pacing.advance());
        assert!(!pacing.waiting_for_next());
        // A second advance without a new stream end fires nothing.
        assert!(!pacing.advance());
    }

    #[test]
    fn test_advance_ignored_while_running() {
        let mut pacing = PacingState::new(false);
        assert!(!pacing.advance());
    }

    #[test]
    fn test_toggle_on_while_waiting_fires_pending_turn() {
        let mut pacing = PacingState::new(false);
        pacing.on_stream_end();
        assert!(pacing.set_auto_play(true));
        assert!(!pacing.waiting_for_next());
        assert_eq!(pacing.on_stream_end(), TurnAdvance::Automatic);
    }

    #[test]
    fn test_toggle_off_takes_effect_at_next_stream_end() {
        let mut pacing = PacingState::new(true);
        assert!(!pacing.set_auto_play(false));
        assert!(!pacing.waiting_for_next());
        assert_eq!(pacing.on_stream_end(), TurnAdvance::Hold);
    }

    #[test]
    fn test_reset_restores_configured_mode() {
        let mut pacing = PacingState::new(false);
        pacing.on_stream_end();
        pacing.set_auto_play(true);
        pacing.reset();
        assert!(!pacing.auto_play());
        assert!(!pacing.waiting_for_next());

        let mut auto = PacingState::new(true);
        auto.set_auto_play(false);
        auto.on_stream_end();
        auto.reset();
        assert!(auto.auto_play());
        assert!(!auto.waiting_for_next());
    }
}
