#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveLeft,
    MoveRight,
    Jump,
    Fire,
    Pause,
    Resume,
    MenuUp,
    MenuDown,
    MenuSelect,
    DebugToggle,
    SpawnEnemy,
    Continue,
    Restart,
    Quit,
}

const ACTION_COUNT: usize = 14;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Jump,
        InputAction::Fire,
        InputAction::Pause,
        InputAction::Resume,
        InputAction::MenuUp,
        InputAction::MenuDown,
        InputAction::MenuSelect,
        InputAction::DebugToggle,
        InputAction::SpawnEnemy,
        InputAction::Continue,
        InputAction::Restart,
        InputAction::Quit,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveLeft => 0,
            InputAction::MoveRight => 1,
            InputAction::Jump => 2,
            InputAction::Fire => 3,
            InputAction::Pause => 4,
            InputAction::Resume => 5,
            InputAction::MenuUp => 6,
            InputAction::MenuDown => 7,
            InputAction::MenuSelect => 8,
            InputAction::DebugToggle => 9,
            InputAction::SpawnEnemy => 10,
            InputAction::Continue => 11,
            InputAction::Restart => 12,
            InputAction::Quit => 13,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            InputAction::MoveLeft => "move_left",
            InputAction::MoveRight => "move_right",
            InputAction::Jump => "jump",
            InputAction::Fire => "fire",
            InputAction::Pause => "pause",
            InputAction::Resume => "resume",
            InputAction::MenuUp => "menu_up",
            InputAction::MenuDown => "menu_down",
            InputAction::MenuSelect => "menu_select",
            InputAction::DebugToggle => "debug_toggle",
            InputAction::SpawnEnemy => "spawn_enemy",
            InputAction::Continue => "continue",
            InputAction::Restart => "restart",
            InputAction::Quit => "quit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

/// A start or stop event for one action, independent of any key encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Press(InputAction),
    Release(InputAction),
}

/// Held state plus press edges observed since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    down: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_down(mut self, action: InputAction) -> Self {
        self.down.set(action, true);
        self
    }

    pub fn with_pressed(mut self, action: InputAction) -> Self {
        self.down.set(action, true);
        self.pressed.set(action, true);
        self
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }
}

/// Folds intents arriving between ticks into one [`InputSnapshot`] per tick.
/// A press is reported once even if the action stays held.
#[derive(Debug, Default)]
pub struct IntentCollector {
    down: ActionStates,
    pressed_edges: ActionStates,
}

impl IntentCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::Press(action) => {
                if !self.down.is_down(action) {
                    self.pressed_edges.set(action, true);
                }
                self.down.set(action, true);
            }
            Intent::Release(action) => self.down.set(action, false),
        }
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            down: self.down,
            pressed: self.pressed_edges,
        };
        self.pressed_edges = ActionStates::default();
        snapshot
    }
}
