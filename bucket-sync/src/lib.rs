pub mod cli;
pub mod load_config;
pub mod output;
pub mod platform;
pub mod storage;

pub use cli::{run, Cli, Commands};
