use crate::debugger::{ControllerConfig, MemoryWindow, WindowError, DEFAULT_BURST_SIZE};
use crate::parser::parse_number;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use thiserror::Error;

/// Flag combinations clap accepts but the debugger cannot run with.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid window start: {0}")]
    WindowStart(String),

    #[error("invalid window end: {0}")]
    WindowEnd(String),

    #[error("--window takes a start and an end")]
    WindowArity,

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("--burst-size must be at least 1")]
    ZeroBurst,
}

/// What happens to toggled breakpoints when a new program is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BreakpointPolicy {
    /// Re-apply every breakpoint to the fresh engine.
    #[default]
    Carry,
    /// Start every load with no breakpoints.
    Reset,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Clock-by-clock debugger front end for exasm engines", long_about = None)]
pub struct Args {
    /// Speak the Debug Adapter Protocol on stdin/stdout instead of prompting.
    #[arg(long, alias = "debug-adapter")]
    pub dap: bool,

    /// Engine executable, spawned once per loaded program.
    #[arg(long, default_value = "exasm-engine")]
    pub engine: PathBuf,

    /// Extra argument for the engine executable (repeatable).
    #[arg(long = "engine-arg")]
    pub engine_args: Vec<String>,

    /// File the program and memory-image buffers are saved to.
    #[arg(long, default_value = ".exasm-buffers.json")]
    pub store: PathBuf,

    /// Keep buffers in memory only.
    #[arg(long)]
    pub no_persist: bool,

    /// Directory `mem.inc` is written to.
    #[arg(long, default_value = ".")]
    pub export_dir: PathBuf,

    /// Clock cycles per run burst.
    #[arg(long, default_value_t = DEFAULT_BURST_SIZE)]
    pub burst_size: usize,

    #[arg(long, value_enum, default_value_t = BreakpointPolicy::Carry)]
    pub breakpoints: BreakpointPolicy,

    /// Initial memory window bounds.
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub window: Option<Vec<String>>,

    /// Append diagnostics to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log debug output by default.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings the front ends run with.
#[derive(Debug, Clone)]
pub struct Config {
    pub dap: bool,
    pub engine: PathBuf,
    pub engine_args: Vec<String>,
    pub store: Option<PathBuf>,
    pub export_dir: PathBuf,
    pub controller: ControllerConfig,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let window = match args.window.as_deref() {
            Some([start, end]) => {
                let start = parse_number::<u32>(start)
                    .ok_or_else(|| ConfigError::WindowStart(start.clone()))?;
                let end =
                    parse_number::<u32>(end).ok_or_else(|| ConfigError::WindowEnd(end.clone()))?;
                MemoryWindow::new(start, end)?
            }
            Some(_) => return Err(ConfigError::WindowArity),
            None => MemoryWindow::default(),
        };
        if args.burst_size == 0 {
            return Err(ConfigError::ZeroBurst);
        }

        Ok(Self {
            dap: args.dap,
            engine: args.engine.clone(),
            engine_args: args.engine_args.clone(),
            store: (!args.no_persist).then(|| args.store.clone()),
            export_dir: args.export_dir.clone(),
            controller: ControllerConfig {
                burst_size: args.burst_size,
                breakpoint_policy: args.breakpoints,
                window,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["exasm-debugger"]);
        let config = Config::from_args(&args).unwrap();
        assert!(!config.dap);
        assert_eq!(config.controller.burst_size, DEFAULT_BURST_SIZE);
        assert_eq!(config.controller.breakpoint_policy, BreakpointPolicy::Carry);
        assert_eq!(config.controller.window, MemoryWindow::default());
        assert_eq!(config.store, Some(PathBuf::from(".exasm-buffers.json")));
    }

    #[test]
    fn window_and_policy_flags() {
        let args = Args::parse_from([
            "exasm-debugger",
            "--window",
            "5",
            "0x13",
            "--breakpoints",
            "reset",
            "--no-persist",
        ]);
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.controller.window, MemoryWindow::new(0, 24).unwrap());
        assert_eq!(config.controller.breakpoint_policy, BreakpointPolicy::Reset);
        assert!(config.store.is_none());
    }

    #[test]
    fn rejects_bad_window() {
        let args = Args::parse_from(["exasm-debugger", "--window", "x", "8"]);
        assert_eq!(
            Config::from_args(&args).unwrap_err(),
            ConfigError::WindowStart("x".to_string())
        );

        let args = Args::parse_from(["exasm-debugger", "--window", "16", "8"]);
        assert!(matches!(
            Config::from_args(&args),
            Err(ConfigError::Window(_))
        ));
    }

    #[test]
    fn rejects_zero_burst() {
        let args = Args::parse_from(["exasm-debugger", "--burst-size", "0"]);
        assert_eq!(Config::from_args(&args).unwrap_err(), ConfigError::ZeroBurst);
    }
}
