//! Per-node step functions.
//!
//! Each function advances one level of the tree by at most one unit of
//! visible progress and reports what happened through [`StepOutcome`].
//! Progress lives in the tree itself, so a suspended tick is just a return.

use weave_script::ast::{
    Assets, Choice, ChoiceMenu, Condition, Cue, CueExpr, Knot, KnotExpr, Sentence, Track,
};

use crate::event::{Directive, TickInput};
use crate::executor::command::exec_command;
use crate::executor::Stats;
use crate::runtime::{eval, ChoiceBox, Ctx, DialogueRecord, RuntimeError, SpeakerBox, VariableStore};

#[derive(Debug, Clone, PartialEq)]
pub enum Jump {
    Knot(String),
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The node still has work; the tick is over for this branch.
    Continue,
    /// The node finished and its cursor was reset; the parent moves on.
    CompletedAdvance,
    /// A `GO_TO` or `END` fired; every level rewinds on the way up.
    Jumped(Jump),
}

pub type StepResult = Result<StepOutcome, RuntimeError>;

/// Everything a tick may touch besides the tree.
pub struct Tick<'a> {
    pub input: &'a TickInput,
    pub ctx: &'a mut Ctx,
    pub vars: &'a mut VariableStore,
    pub assets: &'a Assets,
    pub stats: &'a mut Stats,
    /// Set once visible progress happened; siblings wait for the next tick.
    pub consumed: bool,
}

/// Steps the current child of `node`, moving on to later children while the
/// tick has not been consumed.
fn drive<N: Track>(
    node: &mut N,
    tick: &mut Tick,
    step: impl Fn(&mut N::Item, &mut Tick) -> StepResult,
) -> StepResult {
    loop {
        let Some(child) = node.current_mut() else {
            node.rewind();
            return Ok(StepOutcome::CompletedAdvance);
        };
        match step(child, tick)? {
            StepOutcome::Continue => return Ok(StepOutcome::Continue),
            StepOutcome::CompletedAdvance => {
                node.advance();
                if node.is_exhausted() {
                    node.rewind();
                    return Ok(StepOutcome::CompletedAdvance);
                }
                if tick.consumed {
                    return Ok(StepOutcome::Continue);
                }
            }
            StepOutcome::Jumped(jump) => {
                node.rewind();
                return Ok(StepOutcome::Jumped(jump));
            }
        }
    }
}

pub fn step_knot(knot: &mut Knot, tick: &mut Tick) -> StepResult {
    drive(knot, tick, step_knot_expr)
}

fn step_knot_expr(expr: &mut KnotExpr, tick: &mut Tick) -> StepResult {
    match expr {
        KnotExpr::Command(cmd) => exec_command(cmd, tick),
        KnotExpr::Cue(cue) => step_cue(cue, tick),
        KnotExpr::Condition(cond) => step_condition(cond, tick, step_knot_expr),
    }
}

fn step_condition<T>(
    cond: &mut Condition<T>,
    tick: &mut Tick,
    step: fn(&mut T, &mut Tick) -> StepResult,
) -> StepResult {
    if !cond.is_resolved() {
        let result = eval::truthy(&cond.guard, tick.vars)?;
        tick.stats.guard_evaluations += 1;
        log::trace!("#if at line {} -> {}", cond.line, result);
        cond.resolve(result);
    }
    drive(cond, tick, step)
}

fn step_cue(cue: &mut Cue, tick: &mut Tick) -> StepResult {
    if cue.enter() {
        if let Some(speaker) = &cue.speaker {
            let speaker_box = SpeakerBox::new(&speaker.name, speaker.position);
            tick.ctx.stage.speaker = Some(speaker_box.clone());
            tick.ctx.push(Directive::ShowSpeaker(speaker_box));
        }
    }

    loop {
        if cue.is_exhausted() {
            leave_cue(cue, tick);
            return Ok(StepOutcome::CompletedAdvance);
        }
        if cue.at_choices() {
            return step_menu(cue, tick);
        }
        let Some(child) = cue.current_mut() else {
            leave_cue(cue, tick);
            return Ok(StepOutcome::CompletedAdvance);
        };
        match step_cue_expr(child, tick)? {
            StepOutcome::Continue => return Ok(StepOutcome::Continue),
            StepOutcome::CompletedAdvance => {
                cue.advance();
                if tick.consumed && !cue.is_exhausted() {
                    return Ok(StepOutcome::Continue);
                }
            }
            StepOutcome::Jumped(jump) => {
                leave_cue(cue, tick);
                return Ok(StepOutcome::Jumped(jump));
            }
        }
    }
}

fn leave_cue(cue: &mut Cue, tick: &mut Tick) {
    cue.rewind();
    tick.ctx.stage.speaker = None;
    tick.ctx.stage.text = None;
    tick.ctx.stage.choices = None;
    tick.ctx.push(Directive::ClearSpeaker);
}

fn step_cue_expr(expr: &mut CueExpr, tick: &mut Tick) -> StepResult {
    match expr {
        CueExpr::Sentence(sentence) => Ok(step_sentence(sentence, tick)),
        CueExpr::Command(cmd) => exec_command(cmd, tick),
        CueExpr::Condition(cond) => step_condition(cond, tick, step_cue_expr),
        // choices are only reached through the menu
        CueExpr::Choice(_) => Ok(StepOutcome::CompletedAdvance),
    }
}

fn step_sentence(sentence: &mut Sentence, tick: &mut Tick) -> StepOutcome {
    if !sentence.is_staged() {
        sentence.stage();
        tick.ctx.stage.text = Some(String::new());
        tick.ctx.push(Directive::StageText {
            text: sentence.text.clone(),
            auto: sentence.auto,
        });
        tick.consumed = true;
        return StepOutcome::Continue;
    }

    if !sentence.is_revealed() {
        if tick.input.skip || tick.input.advance {
            sentence.reveal_all();
        } else {
            sentence.reveal_next();
        }
        let shown = sentence.revealed().to_string();
        tick.ctx.stage.text = Some(shown.clone());
        tick.ctx.push(Directive::RevealText { shown, complete: sentence.is_revealed() });
        tick.consumed = true;
        return StepOutcome::Continue;
    }

    if tick.input.advance || sentence.auto {
        let speaker = tick.ctx.stage.speaker.as_ref().map(|s| s.name.clone());
        tick.ctx.dialogue_history.push(DialogueRecord { speaker, text: sentence.text.clone() });
        sentence.reset();
        return StepOutcome::CompletedAdvance;
    }
    StepOutcome::Continue
}

fn step_menu(cue: &mut Cue, tick: &mut Tick) -> StepResult {
    if cue.menu().is_none() {
        let mut options = Vec::new();
        visible_choices(cue.choices(), tick, &mut options)?;
        if options.is_empty() {
            log::warn!("cue at line {} has no visible choice", cue.line);
            leave_cue(cue, tick);
            return Ok(StepOutcome::CompletedAdvance);
        }
        let texts: Vec<String> = options.iter().map(|c| c.text.clone()).collect();
        tick.ctx.stage.choices = Some(ChoiceBox { options: texts.clone(), selected: 0 });
        tick.ctx.push(Directive::ShowChoices { options: texts, selected: 0 });
        cue.open_menu(ChoiceMenu::new(options));
        tick.consumed = true;
        return Ok(StepOutcome::Continue);
    }
    let Some(menu) = cue.menu_mut() else {
        return Ok(StepOutcome::Continue);
    };

    if tick.input.up || tick.input.down {
        if tick.input.up {
            menu.up();
        } else {
            menu.down();
        }
        if let Some(shown) = tick.ctx.stage.choices.as_mut() {
            shown.selected = menu.selected();
        }
        tick.ctx.push(Directive::HighlightChoice { selected: menu.selected() });
        tick.consumed = true;
        return Ok(StepOutcome::Continue);
    }
    if !tick.input.advance {
        return Ok(StepOutcome::Continue);
    }

    let index = menu.selected();
    let Some(choice) = menu.selected_choice().cloned() else {
        return Ok(StepOutcome::Continue);
    };
    tick.ctx.push(Directive::ChoiceMade { index, text: choice.text.clone() });
    tick.consumed = true;
    let outcome = exec_command(&choice.go_to(), tick)?;
    leave_cue(cue, tick);
    Ok(outcome)
}

/// Collects the choices whose enclosing conditions currently hold. Guards are
/// evaluated on the spot; the conditions' own caches stay untouched.
fn visible_choices(
    exprs: &[CueExpr],
    tick: &mut Tick,
    out: &mut Vec<Choice>,
) -> Result<(), RuntimeError> {
    for expr in exprs {
        match expr {
            CueExpr::Choice(choice) => out.push(choice.clone()),
            CueExpr::Condition(cond) => {
                let result = eval::truthy(&cond.guard, tick.vars)?;
                tick.stats.guard_evaluations += 1;
                visible_choices(cond.branch(result), tick, out)?;
            }
            CueExpr::Sentence(_) | CueExpr::Command(_) => {}
        }
    }
    Ok(())
}
