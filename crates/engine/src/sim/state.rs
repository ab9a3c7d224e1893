use tracing::{info, warn};

use super::deferred::{DeferredAction, DeferredQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    Loading,
    Playing,
    Paused,
    LevelTransition,
    Won,
    GameOver,
    /// A level failed to load. Terminal until restart.
    Error,
}

impl GamePhase {
    /// Phases in which the scheduler advances entities.
    pub const fn simulates(self) -> bool {
        matches!(self, Self::Playing | Self::LevelTransition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItem {
    Resume,
    RestartLevel,
    DebugMode,
    Exit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 4] = [
        MenuItem::Resume,
        MenuItem::RestartLevel,
        MenuItem::DebugMode,
        MenuItem::Exit,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Resume => "Un-Pause",
            Self::RestartLevel => "Restart Level",
            Self::DebugMode => "Debug Mode",
            Self::Exit => "Exit",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseMenu {
    selected: usize,
}

impl PauseMenu {
    pub fn selected(&self) -> MenuItem {
        MenuItem::ALL[self.selected.min(MenuItem::ALL.len() - 1)]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.selected = (self.selected + 1).min(MenuItem::ALL.len() - 1);
    }

    fn reset(&mut self) {
        self.selected = 0;
    }
}

/// Level index, session flags and the deferred level-change timer.
#[derive(Debug, Clone)]
pub struct GameState {
    phase: GamePhase,
    level: u32,
    loaded_level: u32,
    level_count: u32,
    new_game: bool,
    win: bool,
    transition_triggered: bool,
    fast_run: bool,
    debug_overlay: bool,
    pending_debug_overlay: bool,
    menu: PauseMenu,
    paused_from: Option<GamePhase>,
    deferred: DeferredQueue,
    error: Option<String>,
}

impl GameState {
    pub fn new(level_count: u32) -> Self {
        Self {
            phase: GamePhase::Loading,
            level: 1,
            loaded_level: 1,
            level_count: level_count.max(1),
            new_game: true,
            win: false,
            transition_triggered: false,
            fast_run: false,
            debug_overlay: false,
            pending_debug_overlay: false,
            menu: PauseMenu::default(),
            paused_from: None,
            deferred: DeferredQueue::default(),
            error: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Level index the session is heading for. Moves to the next level as
    /// soon as a transition starts.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Level most recently loaded, or attempted when the load failed.
    pub fn loaded_level(&self) -> u32 {
        self.loaded_level
    }

    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    pub fn is_final_level(&self) -> bool {
        self.level >= self.level_count
    }

    pub fn is_new_game(&self) -> bool {
        self.new_game
    }

    pub fn is_won(&self) -> bool {
        self.win
    }

    pub fn transition_triggered(&self) -> bool {
        self.transition_triggered
    }

    pub fn fast_run(&self) -> bool {
        self.fast_run
    }

    pub fn debug_overlay(&self) -> bool {
        self.debug_overlay
    }

    pub fn pending_debug_overlay(&self) -> bool {
        self.pending_debug_overlay
    }

    pub fn menu(&self) -> &PauseMenu {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut PauseMenu {
        &mut self.menu
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending_transition_ms(&self) -> Option<f64> {
        self.deferred.remaining_ms()
    }

    pub fn toggle_fast_run(&mut self) -> bool {
        self.fast_run = !self.fast_run;
        info!(fast_run = self.fast_run, "fast_run_toggled");
        self.fast_run
    }

    pub fn toggle_pending_debug_overlay(&mut self) -> bool {
        self.pending_debug_overlay = !self.pending_debug_overlay;
        self.pending_debug_overlay
    }

    pub fn begin_loading(&mut self, level: u32) {
        self.level = level.clamp(1, self.level_count);
        self.loaded_level = self.level;
        self.phase = GamePhase::Loading;
        self.transition_triggered = false;
        self.paused_from = None;
        self.deferred.clear();
    }

    pub fn finish_loading(&mut self) {
        if self.phase != GamePhase::Loading {
            return;
        }
        self.phase = GamePhase::Playing;
        self.new_game = false;
        info!(level = self.level, "level_playing");
    }

    pub fn fail_loading(&mut self, message: String) {
        warn!(level = self.level, error = %message, "level_load_failed");
        self.phase = GamePhase::Error;
        self.error = Some(message);
        self.deferred.clear();
    }

    pub fn pause(&mut self) -> bool {
        if !self.phase.simulates() {
            return false;
        }
        self.paused_from = Some(self.phase);
        self.phase = GamePhase::Paused;
        self.menu.reset();
        self.pending_debug_overlay = self.debug_overlay;
        info!(level = self.level, "paused");
        true
    }

    /// Returns to the phase that was paused and applies the menu's debug selection.
    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = self.paused_from.take().unwrap_or(GamePhase::Playing);
        self.debug_overlay = self.pending_debug_overlay;
        info!(
            level = self.level,
            debug_overlay = self.debug_overlay,
            "resumed"
        );
        true
    }

    /// Fires at most once per level session. On the final level the portal is
    /// inert and this returns `false`.
    pub fn trigger_level_transition(&mut self, delay_ms: u32) -> bool {
        if self.phase != GamePhase::Playing || self.transition_triggered || self.is_final_level()
        {
            return false;
        }
        self.transition_triggered = true;
        self.level += 1;
        self.deferred
            .schedule_after(delay_ms, DeferredAction::LoadLevel { level: self.level });
        self.phase = GamePhase::LevelTransition;
        info!(next_level = self.level, delay_ms, "level_transition_scheduled");
        true
    }

    pub fn declare_won(&mut self) -> bool {
        if !self.phase.simulates() || self.win {
            return false;
        }
        self.win = true;
        self.phase = GamePhase::Won;
        self.deferred.clear();
        info!(level = self.level, "game_won");
        true
    }

    /// Leaves the win screen for a fresh run from level 1.
    pub fn continue_after_win(&mut self) -> Option<u32> {
        if self.phase != GamePhase::Won {
            return None;
        }
        self.win = false;
        self.new_game = true;
        self.begin_loading(1);
        Some(self.level)
    }

    pub fn game_over(&mut self) -> bool {
        if matches!(self.phase, GamePhase::GameOver | GamePhase::Error) {
            return false;
        }
        self.phase = GamePhase::GameOver;
        self.paused_from = None;
        self.deferred.clear();
        info!(level = self.level, "game_over");
        true
    }

    /// Reloads the loaded level, dropping any pending transition. Ignored while
    /// a load is already underway or the game has been won.
    pub fn restart(&mut self) -> Option<u32> {
        if matches!(self.phase, GamePhase::Loading | GamePhase::Won) {
            return None;
        }
        self.error = None;
        let level = self.loaded_level;
        self.begin_loading(level);
        info!(level, "level_restart");
        Some(level)
    }

    /// Moves the deferred clock unless paused and returns actions now due.
    pub fn advance_clock(&mut self, elapsed_ms: f32) -> Vec<DeferredAction> {
        if self.phase != GamePhase::LevelTransition {
            return Vec::new();
        }
        self.deferred.advance(elapsed_ms);
        let due = self.deferred.drain_due();
        for action in &due {
            info!(action = ?action, "deferred_action_fired");
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(level_count: u32) -> GameState {
        let mut state = GameState::new(level_count);
        state.finish_loading();
        state
    }

    #[test]
    fn loading_then_playing_clears_new_game() {
        let mut state = GameState::new(3);
        assert_eq!(state.phase(), GamePhase::Loading);
        assert!(state.is_new_game());
        state.finish_loading();
        assert_eq!(state.phase(), GamePhase::Playing);
        assert!(!state.is_new_game());
    }

    #[test]
    fn level_transition_fires_at_most_once() {
        let mut state = playing(3);
        let mut fired = 0;
        for _ in 0..100 {
            if state.trigger_level_transition(2500) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(state.level(), 2);
        assert_eq!(state.loaded_level(), 1);
        assert_eq!(state.phase(), GamePhase::LevelTransition);
    }

    #[test]
    fn deferred_load_fires_after_delay() {
        let mut state = playing(3);
        state.trigger_level_transition(2500);
        let mut due = Vec::new();
        for _ in 0..156 {
            due.extend(state.advance_clock(16.0));
        }
        assert!(due.is_empty());
        due.extend(state.advance_clock(16.0));
        assert_eq!(due, vec![DeferredAction::LoadLevel { level: 2 }]);
        assert!(state.advance_clock(16.0).is_empty());
    }

    #[test]
    fn restart_mid_transition_keeps_current_level() {
        let mut state = playing(3);
        state.trigger_level_transition(2500);
        assert_eq!(state.level(), 2);
        assert_eq!(state.restart(), Some(1));
        assert_eq!(state.level(), 1);
        assert_eq!(state.phase(), GamePhase::Loading);
        assert!(!state.transition_triggered());
        assert_eq!(state.pending_transition_ms(), None);
    }

    #[test]
    fn pause_freezes_transition_countdown() {
        let mut state = playing(3);
        state.trigger_level_transition(100);
        state.advance_clock(60.0);
        assert!(state.pause());
        assert_eq!(state.phase(), GamePhase::Paused);
        assert!(state.advance_clock(10_000.0).is_empty());
        assert_eq!(state.pending_transition_ms(), Some(40.0));

        assert!(state.resume());
        assert_eq!(state.phase(), GamePhase::LevelTransition);
        assert_eq!(
            state.advance_clock(40.0),
            vec![DeferredAction::LoadLevel { level: 2 }]
        );
    }

    #[test]
    fn final_level_portal_is_inert() {
        let mut state = playing(1);
        assert!(state.is_final_level());
        assert!(!state.trigger_level_transition(2500));
        assert_eq!(state.level(), 1);
        assert_eq!(state.phase(), GamePhase::Playing);
    }

    #[test]
    fn reload_resets_transition_guard() {
        let mut state = playing(3);
        state.trigger_level_transition(10);
        state.begin_loading(2);
        state.finish_loading();
        assert!(!state.transition_triggered());
        assert!(state.trigger_level_transition(10));
        assert_eq!(state.level(), 3);
        assert_eq!(
            state.advance_clock(10.0),
            vec![DeferredAction::LoadLevel { level: 3 }]
        );
    }

    #[test]
    fn won_then_continue_restarts_from_level_one() {
        let mut state = playing(3);
        state.begin_loading(3);
        state.finish_loading();
        assert!(state.declare_won());
        assert!(!state.declare_won());
        assert!(state.is_won());
        assert_eq!(state.continue_after_win(), Some(1));
        assert_eq!(state.phase(), GamePhase::Loading);
        assert!(!state.is_won());
        assert!(state.is_new_game());
    }

    #[test]
    fn game_over_cancels_transition_and_waits_for_restart() {
        let mut state = playing(3);
        state.trigger_level_transition(10);
        assert!(state.game_over());
        assert!(!state.game_over());
        assert_eq!(state.pending_transition_ms(), None);
        assert_eq!(state.restart(), Some(1));
        assert_eq!(state.phase(), GamePhase::Loading);
    }

    #[test]
    fn menu_selection_is_clamped_and_debug_applies_on_resume() {
        let mut state = playing(3);
        state.pause();
        state.menu_mut().move_up();
        assert_eq!(state.menu().selected(), MenuItem::Resume);
        for _ in 0..10 {
            state.menu_mut().move_down();
        }
        assert_eq!(state.menu().selected(), MenuItem::Exit);
        state.menu_mut().move_up();
        assert_eq!(state.menu().selected(), MenuItem::DebugMode);

        assert!(state.toggle_pending_debug_overlay());
        assert!(!state.debug_overlay());
        state.resume();
        assert!(state.debug_overlay());
    }

    #[test]
    fn load_failure_enters_error_phase() {
        let mut state = GameState::new(3);
        state.fail_loading("map is 10x10 tiles".to_string());
        assert_eq!(state.phase(), GamePhase::Error);
        assert_eq!(state.error(), Some("map is 10x10 tiles"));
        assert!(!state.pause());
        assert_eq!(state.restart(), Some(1));
        assert_eq!(state.error(), None);
    }
}
