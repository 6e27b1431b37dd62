pub mod browser;
pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod paths;
pub mod progress;
