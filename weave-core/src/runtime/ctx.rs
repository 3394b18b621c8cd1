use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use weave_script::anim::Animation;
use weave_script::ast::Position;

use crate::event::Directive;

/// Presentation state shared between the interpreter and the renderer.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Ctx {
    pub stage: Stage,
    pub dialogue_history: Vec<DialogueRecord>,
    /// Scripts queued by `NEXT_DIALOG`, run after the current one ends.
    pub next_dialogs: VecDeque<String>,
    #[serde(skip)]
    pub event_queue: VecDeque<Directive>,
}

impl Ctx {
    pub fn push(&mut self, event: Directive) {
        self.event_queue.push_back(event);
    }
    pub fn pop(&mut self) -> Option<Directive> {
        self.event_queue.pop_front()
    }
    pub fn drain(&mut self) -> Vec<Directive> {
        self.event_queue.drain(..).collect()
    }

    /// Drops everything on screen; history and queued scripts are kept.
    pub fn clear_stage(&mut self) {
        self.stage = Stage::default();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRecord {
    pub speaker: Option<String>,
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Stage {
    pub background: Option<Sprite>,
    pub characters: BTreeMap<Position, Sprite>,
    pub speaker: Option<SpeakerBox>,
    /// Revealed part of the line being shown.
    pub text: Option<String>,
    pub choices: Option<ChoiceBox>,
    pub ui_hidden: bool,
    pub music: Option<String>,
}

/// A resolved animation ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    /// Background pack or character name.
    pub owner: String,
    pub animation: String,
    pub sheet: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frames: Animation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceBox {
    pub options: Vec<String>,
    pub selected: usize,
}

/// Name box geometry, computed once when a cue is entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerBox {
    pub name: String,
    pub position: Position,
    pub anchor_x: f32,
    /// Width in character cells, padding included.
    pub width: usize,
}

impl SpeakerBox {
    const PADDING: usize = 2;

    pub fn new(name: &str, position: Position) -> Self {
        Self {
            name: name.to_string(),
            position,
            anchor_x: position.anchor_x(),
            width: name.chars().count() + 2 * Self::PADDING,
        }
    }
}
