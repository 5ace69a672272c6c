use crate::domain::model::{AnalysisBundle, FinalReport};
use crate::domain::ports::JudgePipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use tracing::{info, warn};

/// 評審引擎：依序驅動分類、權重選擇與並行評估，組出最終報告。
/// 泛型在管線介面上，方便測試時替換假管線。
pub struct JudgeEngine<P: JudgePipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: JudgePipeline> JudgeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitoring: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitoring),
        }
    }

    pub async fn run(&self, bundle: &AnalysisBundle) -> Result<FinalReport> {
        info!("🚀 Judging submission");
        self.monitor.log_stats("start");

        let limitations = bundle.limitations();
        for limitation in &limitations {
            warn!("⚠️ Evidence limitation: {}", limitation);
        }

        let classification = self.pipeline.classify(bundle).await?;
        info!(
            "📋 Project type: {} (confidence {:.2})",
            classification.project_type, classification.confidence
        );
        if let Some(warning) = &classification.warning {
            warn!("⚠️ {}", warning);
        }
        self.monitor.log_stats("classification");

        let weights = self.pipeline.weights_for(classification.project_type)?;

        let execution = self
            .pipeline
            .evaluate(bundle, &classification, &weights)
            .await?;
        self.monitor.log_stats("evaluation");

        if !execution.complete {
            warn!("⚠️ Report is partial: the run budget expired before every chain finished");
        }

        let report = FinalReport::new(classification, weights, execution, limitations);
        info!("✅ Final score {:.2}", report.final_score());
        self.monitor.log_final_stats();

        Ok(report)
    }
}
