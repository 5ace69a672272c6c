pub mod chains;
pub mod classifier;
pub mod engine;
pub mod executor;
pub mod judge;
pub mod parser;
pub mod prompts;
pub mod retry;

pub use crate::domain::model::{
    AnalysisBundle, Category, ClassificationResult, EvaluationResult, ExecutionReport,
    FinalReport, ProjectType, WeightVector,
};
pub use crate::domain::ports::{InferenceService, JudgePipeline, Storage};
pub use crate::utils::error::Result;
