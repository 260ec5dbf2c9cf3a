mod host;
pub mod keymap;
mod runner;

pub use host::{Flow, Frontend, Host, Task};
pub use runner::{render_effect, run_interactive_mode, spawn_line_reader, Repl};
