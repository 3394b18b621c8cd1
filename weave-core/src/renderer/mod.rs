pub mod terminal;
pub mod driver;

use crate::event::{Directive, InputEvent};
use crate::runtime::Ctx;

pub trait Renderer {
    /// Presents one tick's directives and returns the input for the next tick.
    fn render(&mut self, directives: &[Directive], ctx: &Ctx) -> InputEvent;
}
