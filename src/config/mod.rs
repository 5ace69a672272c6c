pub mod toml_config;
pub mod weights;

pub use toml_config::JudgeConfig;
pub use weights::WeightManager;
