mod ctx;
mod error;
pub mod eval;
mod vars;

pub use ctx::{ChoiceBox, Ctx, DialogueRecord, SpeakerBox, Sprite, Stage};
pub use error::RuntimeError;
pub use vars::{Value, Variable, VariableStore};
