use std::io::{BufRead, StdinLock, Stdout, Write, stdin, stdout};

use crate::event::{Directive, InputEvent, TickInput};
use crate::renderer::Renderer;
use crate::runtime::Ctx;

/// Line-oriented renderer: lines are printed whole, Enter continues.
///
/// Prompt commands: Enter to continue or confirm, `u`/`k` and `d`/`j` to move
/// through choices, `:save N`, `:load N`, `exit`.
pub struct TerminalRenderer<I = StdinLock<'static>, O = Stdout> {
    input: I,
    out: O,
    /// The line being revealed continues on its own.
    auto: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::with_io(stdin().lock(), stdout())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

enum Prompt {
    Continue,
    Choice,
}

impl<I: BufRead, O: Write> TerminalRenderer<I, O> {
    pub fn with_io(input: I, out: O) -> Self {
        Self { input, out, auto: false }
    }

    pub fn into_output(self) -> O {
        self.out
    }

    fn say(&mut self, text: std::fmt::Arguments) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            log::warn!("terminal write failed: {}", e);
        }
    }

    fn print_line(&mut self, ctx: &Ctx, text: &str) {
        match &ctx.stage.speaker {
            Some(speaker) => self.say(format_args!("{}: {}", speaker.name, text)),
            None => self.say(format_args!("{}", text)),
        }
    }

    fn print_choices(&mut self, ctx: &Ctx) {
        let Some(choices) = &ctx.stage.choices else { return };
        let lines: Vec<String> = choices
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| format!("  {} {}", if i == choices.selected { '>' } else { ' ' }, o))
            .collect();
        for line in lines {
            self.say(format_args!("{}", line));
        }
    }

    fn prompt(&mut self, kind: Prompt) -> InputEvent {
        loop {
            let marker = match kind {
                Prompt::Continue => "> ",
                Prompt::Choice => "Select> ",
            };
            if write!(self.out, "{}", marker).and_then(|_| self.out.flush()).is_err() {
                return InputEvent::Exit;
            }

            let mut buf = String::new();
            match self.input.read_line(&mut buf) {
                Ok(0) | Err(_) => return InputEvent::Exit,
                Ok(_) => {}
            }
            let line = buf.trim();

            if line.is_empty() {
                return InputEvent::Tick(TickInput::advance());
            }
            if line.eq_ignore_ascii_case("exit") {
                return InputEvent::Exit;
            }
            if let Some(slot) = line.strip_prefix(":save").and_then(|s| s.trim().parse().ok()) {
                return InputEvent::SaveRequest { slot };
            }
            if let Some(slot) = line.strip_prefix(":load").and_then(|s| s.trim().parse().ok()) {
                return InputEvent::LoadRequest { slot };
            }
            if let Prompt::Choice = kind {
                match line {
                    "u" | "k" => return InputEvent::Tick(TickInput::up()),
                    "d" | "j" => return InputEvent::Tick(TickInput::down()),
                    _ => {}
                }
            }
            self.say(format_args!("invalid"));
        }
    }
}

impl<I: BufRead, O: Write> Renderer for TerminalRenderer<I, O> {
    fn render(&mut self, directives: &[Directive], ctx: &Ctx) -> InputEvent {
        let mut staged = false;
        let mut line_done = None;
        let mut menu_changed = false;

        for d in directives {
            match d {
                Directive::ShowSpeaker(_) | Directive::ClearSpeaker => {}
                Directive::StageText { auto, .. } => {
                    staged = true;
                    self.auto = *auto;
                }
                Directive::RevealText { shown, complete: true } => line_done = Some(shown.clone()),
                Directive::RevealText { .. } => {}
                Directive::ShowChoices { .. } | Directive::HighlightChoice { .. } => menu_changed = true,
                Directive::ChoiceMade { text, .. } => self.say(format_args!("-> {}", text)),
                Directive::SetBackground(s) => {
                    self.say(format_args!("[Background] {}::{}", s.owner, s.animation))
                }
                Directive::ClearBackground => self.say(format_args!("[Background] cleared")),
                Directive::SetCharacter { position, sprite } => {
                    self.say(format_args!("[{}] {}::{}", position, sprite.owner, sprite.animation))
                }
                Directive::ClearCharacter(position) => self.say(format_args!("[{}] cleared", position)),
                Directive::ClearCharacters => self.say(format_args!("[Characters] cleared")),
                Directive::HideUi | Directive::ShowUi => {}
                Directive::PlaySound(name) => self.say(format_args!("[Sound] {}", name)),
                Directive::PlayMusic(name) => self.say(format_args!("[Music] {}", name)),
                Directive::StopMusic => self.say(format_args!("[Music] stopped")),
                Directive::VariableAssigned { name, value } => log::debug!("{} = {}", name, value),
                Directive::End => self.say(format_args!("[End]")),
            }
        }

        // the line is printed whole once revealed
        if staged {
            return InputEvent::Tick(TickInput::skip());
        }
        if ctx.stage.choices.is_some() {
            if menu_changed || directives.is_empty() {
                self.print_choices(ctx);
            }
            return self.prompt(Prompt::Choice);
        }
        if let Some(text) = line_done {
            if !ctx.stage.ui_hidden {
                self.print_line(ctx, &text);
            }
            if self.auto {
                return InputEvent::Tick(TickInput::default());
            }
            return self.prompt(Prompt::Continue);
        }
        // nothing new: a restored or still waiting line
        if directives.is_empty() {
            if let Some(text) = ctx.stage.text.clone() {
                self.print_line(ctx, &text);
                return self.prompt(Prompt::Continue);
            }
        }
        InputEvent::Tick(TickInput::advance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ChoiceBox;

    fn renderer(input: &str) -> TerminalRenderer<&[u8], Vec<u8>> {
        TerminalRenderer::with_io(input.as_bytes(), Vec::new())
    }

    #[test]
    fn staged_text_is_revealed_at_once() {
        let mut r = renderer("");
        let ev = r.render(&[Directive::StageText { text: "Hi".into(), auto: false }], &Ctx::default());
        assert_eq!(ev, InputEvent::Tick(TickInput::skip()));
    }

    #[test]
    fn revealed_line_waits_for_enter() {
        let mut r = renderer("\n");
        let ev = r.render(
            &[Directive::RevealText { shown: "Hi".into(), complete: true }],
            &Ctx::default(),
        );
        assert_eq!(ev, InputEvent::Tick(TickInput::advance()));
        let out = String::from_utf8(r.into_output()).unwrap();
        assert!(out.starts_with("Hi\n"));
    }

    #[test]
    fn auto_lines_do_not_wait() {
        let mut r = renderer("");
        r.render(&[Directive::StageText { text: "Hi".into(), auto: true }], &Ctx::default());
        let ev = r.render(
            &[Directive::RevealText { shown: "Hi".into(), complete: true }],
            &Ctx::default(),
        );
        assert_eq!(ev, InputEvent::Tick(TickInput::default()));
    }

    #[test]
    fn menu_commands() {
        let mut ctx = Ctx::default();
        ctx.stage.choices = Some(ChoiceBox { options: vec!["a".into(), "b".into()], selected: 0 });
        let show = [Directive::ShowChoices { options: vec!["a".into(), "b".into()], selected: 0 }];

        let mut r = renderer("bogus\nd\n");
        assert_eq!(r.render(&show, &ctx), InputEvent::Tick(TickInput::down()));
        let out = String::from_utf8(r.into_output()).unwrap();
        assert!(out.contains("  > a\n    b\n"));
        assert!(out.contains("invalid"));

        let mut r = renderer(":save 3\n");
        assert_eq!(r.render(&show, &ctx), InputEvent::SaveRequest { slot: 3 });

        let mut r = renderer("");
        assert_eq!(r.render(&show, &ctx), InputEvent::Exit);
    }
}
