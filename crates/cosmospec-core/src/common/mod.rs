pub mod config;

pub use config::{EngineConfig, EngineConfigError, load_engine_config};
