mod command;
mod walk;

use serde::{Deserialize, Serialize};
use weave_script::ast::Dialog;

use crate::event::{Directive, TickInput};
use crate::runtime::{Ctx, RuntimeError, VariableStore};
use crate::storager::types::SaveFile;
use walk::{Jump, StepOutcome, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Running,
    Ended,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub ticks: u64,
    pub guard_evaluations: u64,
    pub commands: u64,
}

/// Resumable interpreter: one [`Executor::step`] call per tick.
#[derive(Debug, Clone)]
pub struct Executor {
    dialog: Dialog,
    vars: VariableStore,
    stats: Stats,
}

impl Executor {
    pub fn new(dialog: Dialog) -> Self {
        Self::with_vars(dialog, VariableStore::new())
    }

    pub fn with_vars(dialog: Dialog, vars: VariableStore) -> Self {
        log::info!("Executor ready for '{}' ({} knots)", dialog.file, dialog.knots.len());
        Executor { dialog, vars, stats: Stats::default() }
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn vars(&self) -> &VariableStore {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VariableStore {
        &mut self.vars
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn is_ended(&self) -> bool {
        self.dialog.is_ended()
    }

    /// Swaps in the next script; variables carry over.
    pub fn replace_dialog(&mut self, dialog: Dialog) {
        log::info!("Switching dialog '{}' -> '{}'", self.dialog.file, dialog.file);
        self.dialog = dialog;
    }

    pub fn snapshot(&self, ctx: &Ctx) -> SaveFile {
        SaveFile {
            dialog: self.dialog.clone(),
            vars: self.vars.clone(),
            ctx: ctx.clone(),
        }
    }

    pub fn restore(save: SaveFile) -> (Self, Ctx) {
        let exe = Executor { dialog: save.dialog, vars: save.vars, stats: Stats::default() };
        (exe, save.ctx)
    }

    /// Processes exactly one tick, queuing directives on `ctx`.
    pub fn step(&mut self, ctx: &mut Ctx, input: &TickInput) -> Result<StepStatus, RuntimeError> {
        if self.dialog.is_ended() {
            return Ok(StepStatus::Ended);
        }
        self.stats.ticks += 1;
        log::trace!("tick {} {:?}", self.stats.ticks, input);

        let mut consumed = false;
        loop {
            let index = self.dialog.current_knot();
            let outcome = {
                let mut tick = Tick {
                    input,
                    ctx: &mut *ctx,
                    vars: &mut self.vars,
                    assets: &self.dialog.assets,
                    stats: &mut self.stats,
                    consumed,
                };
                let outcome = walk::step_knot(&mut self.dialog.knots[index], &mut tick)?;
                consumed = tick.consumed;
                outcome
            };

            match outcome {
                StepOutcome::Continue => return Ok(StepStatus::Running),
                StepOutcome::CompletedAdvance => {
                    if !self.dialog.advance_knot() {
                        log::info!("'{}' ran past its last knot", self.dialog.file);
                        ctx.push(Directive::End);
                        return Ok(StepStatus::Ended);
                    }
                    if consumed {
                        return Ok(StepStatus::Running);
                    }
                }
                StepOutcome::Jumped(Jump::Knot(target)) => {
                    let to = self
                        .dialog
                        .knot_index(&target)
                        .ok_or(RuntimeError::UnknownKnot(target.clone()))?;
                    log::debug!("GO_TO {}", target);
                    self.dialog.jump_to(to);
                    return Ok(StepStatus::Running);
                }
                StepOutcome::Jumped(Jump::End) => {
                    log::info!("'{}' reached #END", self.dialog.file);
                    self.dialog.finish();
                    ctx.push(Directive::End);
                    return Ok(StepStatus::Ended);
                }
            }
        }
    }
}
