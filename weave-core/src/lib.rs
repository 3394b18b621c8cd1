pub mod config;
pub mod event;
pub mod executor;
pub mod manager;
pub mod renderer;
pub mod runtime;
pub mod storager;

pub use event::{Directive, InputEvent, TickInput};
pub use executor::{Executor, StepStatus};
pub use manager::ScriptManager;
pub use renderer::terminal::TerminalRenderer;
pub use runtime::Ctx;
