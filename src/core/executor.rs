use crate::config::JudgeConfig;
use crate::core::chains::{build_chains, EvaluationChain, EvaluatorSettings};
use crate::domain::model::{
    scored_categories, Category, ClassificationResult, EvaluationResult, ExecutionReport,
    WeightVector,
};
use crate::domain::ports::InferenceService;
use crate::utils::error::{JudgeError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};

/// Best-effort notification on each chain completion: `(category, completed, total)`.
pub type ProgressCallback = Arc<dyn Fn(Category, usize, usize) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub max_workers: usize,
    pub run_timeout: Duration,
    pub weight_tolerance: f64,
}

impl ExecutorSettings {
    pub fn from_config(config: &JudgeConfig) -> Self {
        Self {
            max_workers: config.max_workers(),
            run_timeout: config.run_timeout(),
            weight_tolerance: config.weight_tolerance(),
        }
    }
}

/// 以固定上限的工作池並行執行九個評估鏈，彙整成加權總分。
/// 個別鏈的失敗只會排除該面向；全部失敗才是聚合錯誤。
pub struct ChainExecutor {
    chains: Vec<EvaluationChain>,
    settings: ExecutorSettings,
    progress: Option<ProgressCallback>,
}

impl ChainExecutor {
    pub fn new(
        inference: Arc<dyn InferenceService>,
        evaluator: Arc<EvaluatorSettings>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            chains: build_chains(inference, evaluator),
            settings,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn execute_all(
        &self,
        project_info: &str,
        classification: &ClassificationResult,
        weights: &WeightVector,
    ) -> Result<ExecutionReport> {
        // 防禦性重驗：權重表在載入時已驗證過，執行前再確認一次不變量。
        weights.validate(
            classification.project_type.as_str(),
            self.settings.weight_tolerance,
        )?;

        let started = Instant::now();
        let total = self.chains.len();
        info!(
            "🚀 Running {} evaluation chains with {} workers",
            total, self.settings.max_workers
        );

        let semaphore = Arc::new(Semaphore::new(self.settings.max_workers));
        let results: Arc<Mutex<HashMap<Category, EvaluationResult>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(total);

        for chain in &self.chains {
            let chain = chain.clone();
            let semaphore = semaphore.clone();
            let results = results.clone();
            let progress = self.progress.clone();
            let project_info = project_info.to_string();
            let project_type = classification.project_type;

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };

                let category = chain.category();
                let result = chain.evaluate(&project_info, project_type).await;

                let completed = {
                    let mut guard = results.lock().await;
                    guard.insert(category, result);
                    guard.len()
                };
                // Callback runs outside the lock; it is observer code.
                if let Some(callback) = progress {
                    callback(category, completed, total);
                }
            }));
        }

        let joined = timeout(self.settings.run_timeout, async {
            for handle in &mut handles {
                let _ = handle.await;
            }
        })
        .await;

        let complete = match joined {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    "⚠️ Run budget of {:?} exhausted; aborting unfinished evaluations",
                    self.settings.run_timeout
                );
                for handle in &handles {
                    handle.abort();
                }
                false
            }
        };

        let mut results = results.lock().await.clone();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let abort_reason = if complete {
            "evaluation task ended without a result"
        } else {
            "evaluation aborted: run budget exhausted"
        };
        for category in Category::ALL {
            if !results.contains_key(&category) {
                results.insert(
                    category,
                    EvaluationResult::failed(category, abort_reason.to_string(), elapsed_ms),
                );
            }
        }

        let error_count = results.values().filter(|r| r.is_error()).count();
        if error_count > 0 {
            warn!(
                "⚠️ {} of {} evaluations failed; aggregate uses renormalized weights over the rest",
                error_count, total
            );
        }

        let scores = scored_categories(&results);
        if scores.is_empty() {
            return Err(JudgeError::AggregationError {
                message: format!("all {} evaluation chains failed; no scores to aggregate", total),
            });
        }

        let surviving: Vec<Category> = scores.keys().copied().collect();
        let renormalized = weights.renormalized_over(&surviving)?;
        let final_score: f64 = scores
            .iter()
            .map(|(category, score)| score * renormalized.get(*category))
            .sum();

        info!(
            "📊 Final score {:.2} across {} scored categories in {}ms",
            final_score,
            scores.len(),
            elapsed_ms
        );

        Ok(ExecutionReport {
            results,
            error_count,
            elapsed_ms,
            final_score,
            complete,
        })
    }

    /// Scores of the categories that produced one; errored categories are
    /// excluded from the map entirely.
    pub fn get_scores(&self, report: &ExecutionReport) -> HashMap<Category, f64> {
        report.scores()
    }
}
