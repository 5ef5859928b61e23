pub mod config;
pub mod repl;

pub use config::Config;
pub use repl::Command;
