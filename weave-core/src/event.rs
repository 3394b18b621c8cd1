use weave_script::ast::Position;

use crate::runtime::{SpeakerBox, Sprite, Value};

/// Presentation instruction produced by a tick, consumed by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    ShowSpeaker(SpeakerBox),
    ClearSpeaker,
    /// A new line of text, nothing revealed yet.
    StageText { text: String, auto: bool },
    RevealText { shown: String, complete: bool },
    ShowChoices { options: Vec<String>, selected: usize },
    HighlightChoice { selected: usize },
    ChoiceMade { index: usize, text: String },

    SetBackground(Sprite),
    ClearBackground,
    SetCharacter { position: Position, sprite: Sprite },
    ClearCharacter(Position),
    ClearCharacters,
    HideUi,
    ShowUi,

    PlaySound(String),
    PlayMusic(String),
    StopMusic,

    VariableAssigned { name: String, value: Value },
    End,
}

/// Input signals sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Confirm: completes a revealed line or picks the highlighted choice.
    pub advance: bool,
    /// Reveals the rest of the current line at once.
    pub skip: bool,
    pub up: bool,
    pub down: bool,
}

impl TickInput {
    pub fn advance() -> Self {
        Self { advance: true, ..Self::default() }
    }

    pub fn skip() -> Self {
        Self { skip: true, ..Self::default() }
    }

    pub fn up() -> Self {
        Self { up: true, ..Self::default() }
    }

    pub fn down() -> Self {
        Self { down: true, ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Tick(TickInput),
    Exit,
    SaveRequest { slot: u32 },
    LoadRequest { slot: u32 },
}
