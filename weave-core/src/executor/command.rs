use weave_script::anim::AnimationSet;
use weave_script::ast::Command;

use crate::event::Directive;
use crate::executor::walk::{Jump, StepOutcome, StepResult, Tick};
use crate::runtime::{eval, RuntimeError, Sprite};

/// Runs a command to completion. Commands never consume the tick.
pub fn exec_command(cmd: &Command, tick: &mut Tick) -> StepResult {
    tick.stats.commands += 1;
    log::debug!("exec #{}", cmd.kind().keyword());

    match cmd {
        Command::SetBackground { pack, name } => {
            let set = tick
                .assets
                .backgrounds
                .get(pack)
                .ok_or_else(|| RuntimeError::UnknownBackgroundPack(pack.clone()))?;
            let sprite = sprite(pack, set, name)?;
            tick.ctx.stage.background = Some(sprite.clone());
            tick.ctx.push(Directive::SetBackground(sprite));
        }
        Command::ClearBackground => {
            tick.ctx.stage.background = None;
            tick.ctx.push(Directive::ClearBackground);
        }
        Command::SetCharacter { position, character, animation } => {
            let set = tick
                .assets
                .characters
                .get(character)
                .ok_or_else(|| RuntimeError::UnknownCharacter(character.clone()))?;
            let sprite = sprite(character, set, animation)?;
            tick.ctx.stage.characters.insert(*position, sprite.clone());
            tick.ctx.push(Directive::SetCharacter { position: *position, sprite });
        }
        Command::ClearCharacterPosition(position) => {
            tick.ctx.stage.characters.remove(position);
            tick.ctx.push(Directive::ClearCharacter(*position));
        }
        Command::ClearCharacterPositions => {
            tick.ctx.stage.characters.clear();
            tick.ctx.push(Directive::ClearCharacters);
        }
        Command::End => return Ok(StepOutcome::Jumped(Jump::End)),
        Command::Assign { name, value } => {
            let value = eval::eval(value, tick.vars)?;
            log::debug!("{} = {}", name, value);
            tick.vars.assign(name, value.clone());
            tick.ctx.push(Directive::VariableAssigned { name: name.clone(), value });
        }
        Command::GoTo(target) => return Ok(StepOutcome::Jumped(Jump::Knot(target.clone()))),
        Command::HideUi => {
            tick.ctx.stage.ui_hidden = true;
            tick.ctx.push(Directive::HideUi);
        }
        Command::ShowUi => {
            tick.ctx.stage.ui_hidden = false;
            tick.ctx.push(Directive::ShowUi);
        }
        Command::PlaySound(name) => tick.ctx.push(Directive::PlaySound(name.clone())),
        Command::PlayMusic(name) => {
            tick.ctx.stage.music = Some(name.clone());
            tick.ctx.push(Directive::PlayMusic(name.clone()));
        }
        Command::StopMusic => {
            tick.ctx.stage.music = None;
            tick.ctx.push(Directive::StopMusic);
        }
        Command::NextDialog(script) => {
            log::info!("queued next dialog '{}'", script);
            tick.ctx.next_dialogs.push_back(script.clone());
        }
    }
    Ok(StepOutcome::CompletedAdvance)
}

fn sprite(owner: &str, set: &AnimationSet, animation: &str) -> Result<Sprite, RuntimeError> {
    let frames = set.get(animation).ok_or_else(|| RuntimeError::UnknownAnimation {
        owner: owner.to_string(),
        name: animation.to_string(),
    })?;
    Ok(Sprite {
        owner: owner.to_string(),
        animation: animation.to_string(),
        sheet: set.sheet.clone(),
        frame_width: set.frame_width,
        frame_height: set.frame_height,
        frames: frames.clone(),
    })
}
