pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{HttpLlmClient, LocalStorage};
pub use config::{JudgeConfig, WeightManager};
pub use crate::core::{engine::JudgeEngine, executor::ProgressCallback, judge::JudgeCore};
pub use domain::model::{AnalysisBundle, FinalReport};
pub use domain::ports::{InferenceService, JudgePipeline, Storage};
pub use utils::error::{JudgeError, Result};
