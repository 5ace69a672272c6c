use crate::domain::model::{
    AnalysisBundle, ClassificationResult, ExecutionReport, ProjectType, WeightVector,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// One prompt for the opaque inference endpoint.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub system: Option<String>,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn infer(&self, request: InferenceRequest) -> Result<String>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait JudgePipeline: Send + Sync {
    async fn classify(&self, bundle: &AnalysisBundle) -> Result<ClassificationResult>;
    fn weights_for(&self, project_type: ProjectType) -> Result<WeightVector>;
    async fn evaluate(
        &self,
        bundle: &AnalysisBundle,
        classification: &ClassificationResult,
        weights: &WeightVector,
    ) -> Result<ExecutionReport>;
}
