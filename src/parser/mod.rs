mod commands;
mod numbers;

pub use commands::{parse_command, Command, HELP};
pub use numbers::parse_number;
