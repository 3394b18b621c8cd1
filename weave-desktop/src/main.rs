mod setup;
mod config_gen;

use std::env;
use std::path::PathBuf;
use weave_core::config::CoreConfig;
use weave_core::renderer::driver::Driver;
use weave_core::runtime::VariableStore;
use weave_core::{storager, Ctx, Executor, ScriptManager, TerminalRenderer};

/// `weave-desktop [--check] [script]`
fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let check = args.iter().any(|a| a == "--check");
    let script = args.iter().find(|a| !a.starts_with("--")).cloned();

    setup::init();
    log::info!(">>> Weave Desktop Launcher Started (check: {}) <<<", check);

    if let Err(e) = run(check, script) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(check: bool, script: Option<String>) -> anyhow::Result<()> {
    let core_cfg: CoreConfig = weave_shared::config::get("core");
    let mut manager = ScriptManager::from_config(&core_cfg);

    if check {
        let count = manager.compile_all()?;
        log::info!("{} scripts compiled cleanly", count);
        return Ok(());
    }

    let entry = script.unwrap_or_else(|| core_cfg.entry.clone());
    log::info!("Loading script: {}", entry);
    let dialog = manager.compile(&entry)?;
    if core_cfg.debug.show_ast {
        log::debug!("AST: {:#?}", dialog);
    }

    let vars_file = (!core_cfg.variables_file.is_empty()).then(|| PathBuf::from(&core_cfg.variables_file));
    let vars = match &vars_file {
        Some(path) => storager::load_global(path)?,
        None => VariableStore::new(),
    };

    let mut ctx = Ctx::default();
    let exe = Executor::with_vars(dialog, vars);
    let mut driver = Driver::new(exe, manager, TerminalRenderer::new())
        .trace_ticks(core_cfg.debug.trace_ticks);
    driver.run(&mut ctx)?;

    if let Some(path) = vars_file {
        storager::save_global(&path, driver.executor().vars())?;
        log::info!("Variables written to {:?}", path);
    }
    Ok(())
}
