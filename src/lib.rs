pub mod config;
pub mod error;
pub mod factory;
pub mod interfaces;
pub mod logging;
pub mod menu;
pub mod parsing;
pub mod prompts;
pub mod providers;
pub mod render;
pub mod runtime_paths;
pub mod secrets;
pub mod services;
pub mod session;

pub use error::{KreatError, Result};
