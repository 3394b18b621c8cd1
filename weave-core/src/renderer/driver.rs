use anyhow::Context;

use crate::event::{Directive, InputEvent, TickInput};
use crate::executor::StepStatus;
use crate::manager::ScriptManager;
use crate::renderer::Renderer;
use crate::{storager, Ctx, Executor};

/// Runs an executor against a renderer until the last queued dialog ends.
pub struct Driver<R: Renderer> {
    exe: Executor,
    manager: ScriptManager,
    renderer: R,
    trace: bool,
}

impl<R: Renderer> Driver<R> {
    pub fn new(exe: Executor, manager: ScriptManager, renderer: R) -> Self {
        Self { exe, manager, renderer, trace: false }
    }

    /// Logs every directive at debug level.
    pub fn trace_ticks(mut self, on: bool) -> Self {
        self.trace = on;
        self
    }

    pub fn executor(&self) -> &Executor {
        &self.exe
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_executor(self) -> Executor {
        self.exe
    }

    pub fn run(&mut self, ctx: &mut Ctx) -> anyhow::Result<()> {
        let mut input = TickInput::default();
        loop {
            let status = self
                .exe
                .step(ctx, &input)
                .with_context(|| format!("Runtime error in '{}'", self.exe.dialog().file))?;

            let mut directives = ctx.drain();
            if self.trace {
                for d in &directives {
                    log::debug!("{:?}", d);
                }
            }

            if status == StepStatus::Ended {
                let Some(next) = ctx.next_dialogs.pop_front() else {
                    self.renderer.render(&directives, ctx);
                    return Ok(());
                };
                let dialog = self.manager.compile(&next)?;
                ctx.clear_stage();
                self.exe.replace_dialog(dialog);
                directives.retain(|d| !matches!(d, Directive::End));
            }

            input = match self.renderer.render(&directives, ctx) {
                InputEvent::Tick(t) => t,
                InputEvent::Exit => {
                    log::info!("Exit requested");
                    return Ok(());
                }
                InputEvent::SaveRequest { slot } => {
                    log::info!("Save request slot: {}", slot);
                    storager::save(&storager::slot_file(slot), &self.exe, ctx)
                        .unwrap_or_else(|e| log::error!("Save failed: {:?}", e));
                    TickInput::default()
                }
                InputEvent::LoadRequest { slot } => {
                    log::info!("Load request slot: {}", slot);
                    match storager::load(&storager::slot_file(slot)) {
                        Ok((exe, loaded)) => {
                            self.exe = exe;
                            *ctx = loaded;
                            log::info!("Load finished");
                        }
                        Err(e) => log::error!("Load failed: {:?}", e),
                    }
                    TickInput::default()
                }
            };
        }
    }
}
