use anyhow::{Context, Result};
use clap::Parser;
use exasm_debugger::buffers::{BufferManager, BufferStore, JsonFileStore, MemoryStore};
use exasm_debugger::config::{Args, Config};
use exasm_debugger::debugger::Controller;
use exasm_debugger::engine::ProcessEngine;
use exasm_debugger::{dap, executor, App};
use std::fs;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    log::info!("debugger started with {:?}", args);

    let config = Config::from_args(&args).context("invalid arguments")?;
    let engine = ProcessEngine::new(config.engine.clone(), config.engine_args.clone());
    let controller = Controller::new(engine, &config.controller);

    match config.store.clone() {
        Some(path) => {
            log::info!("buffers persist to {}", path.display());
            serve(&config, controller, JsonFileStore::new(path))
        }
        None => serve(&config, controller, MemoryStore::new()),
    }
}

fn serve<S: BufferStore>(
    config: &Config,
    controller: Controller<ProcessEngine>,
    store: S,
) -> Result<()> {
    let app = App::new(
        controller,
        BufferManager::new(store),
        config.export_dir.clone(),
    );
    if config.dap {
        dap::run_dap_mode(app).context("DAP session failed")?;
    } else {
        eprintln!("Starting in interactive mode...");
        executor::run_interactive_mode(app).context("interactive session failed")?;
    }
    log::info!("debugger exiting");
    Ok(())
}

/// DAP owns stdout, so diagnostics go to stderr or an append-mode log file.
fn init_logging(args: &Args) -> Result<()> {
    let default_level = if args.verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if let Some(path) = &args.log_file {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}
