use crate::config::{JudgeConfig, WeightManager};
use crate::core::chains::EvaluatorSettings;
use crate::core::classifier::{ClassifierSettings, ProjectTypeClassifier};
use crate::core::executor::{ChainExecutor, ExecutorSettings, ProgressCallback};
use crate::domain::model::{
    AnalysisBundle, ClassificationResult, ExecutionReport, ProjectType, WeightVector,
};
use crate::domain::ports::{InferenceService, JudgePipeline};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// 將分類器、權重管理與執行器組裝成完整的評審管線。
pub struct JudgeCore {
    classifier: ProjectTypeClassifier,
    weights: WeightManager,
    executor: ChainExecutor,
}

impl JudgeCore {
    /// 權重表違反不變量時直接失敗，不允許帶病啟動。
    pub fn new(inference: Arc<dyn InferenceService>, config: &JudgeConfig) -> Result<Self> {
        let weights = WeightManager::from_config(config)?;
        let classifier = ProjectTypeClassifier::new(
            inference.clone(),
            ClassifierSettings::from_config(config),
        );
        let executor = ChainExecutor::new(
            inference,
            Arc::new(EvaluatorSettings::from_config(config)),
            ExecutorSettings::from_config(config),
        );

        Ok(Self {
            classifier,
            weights,
            executor,
        })
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.executor = self.executor.with_progress(progress);
        self
    }
}

#[async_trait]
impl JudgePipeline for JudgeCore {
    async fn classify(&self, bundle: &AnalysisBundle) -> Result<ClassificationResult> {
        self.classifier.classify(bundle).await
    }

    fn weights_for(&self, project_type: ProjectType) -> Result<WeightVector> {
        debug!(
            "📋 {} weight table:\n{}",
            project_type,
            self.weights.summary(project_type)
        );
        Ok(self.weights.weights_for(project_type))
    }

    async fn evaluate(
        &self,
        bundle: &AnalysisBundle,
        classification: &ClassificationResult,
        weights: &WeightVector,
    ) -> Result<ExecutionReport> {
        let project_info = bundle.to_prompt_text();
        self.executor
            .execute_all(&project_info, classification, weights)
            .await
    }
}
