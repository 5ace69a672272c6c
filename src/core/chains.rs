use crate::config::JudgeConfig;
use crate::core::parser::{self, EvaluationFields};
use crate::core::prompts;
use crate::core::retry::{RetryPolicy, RetrySettings};
use crate::domain::model::{Category, EvaluationMethod, EvaluationResult, ProjectType};
use crate::domain::ports::{InferenceRequest, InferenceService};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EvaluatorSettings {
    pub min_score: f64,
    pub max_score: f64,
    pub retry: RetrySettings,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl EvaluatorSettings {
    pub fn from_config(config: &JudgeConfig) -> Self {
        Self {
            min_score: config.min_score(),
            max_score: config.max_score(),
            retry: config.evaluation_retry(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
        }
    }
}

/// 單一評估面向的推論流程。九個面向共用同一形狀，只差在類別與提示詞。
#[derive(Clone)]
pub struct EvaluationChain {
    category: Category,
    inference: Arc<dyn InferenceService>,
    settings: Arc<EvaluatorSettings>,
    retry: RetryPolicy,
}

impl EvaluationChain {
    pub fn new(
        category: Category,
        inference: Arc<dyn InferenceService>,
        settings: Arc<EvaluatorSettings>,
    ) -> Self {
        let retry = RetryPolicy::new(settings.retry.clone());
        Self {
            category,
            inference,
            settings,
            retry,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Runs the evaluation call end to end. Failures never escape: they are
    /// folded into the result's `error` field so the executor can keep going.
    pub async fn evaluate(
        &self,
        project_info: &str,
        project_type: ProjectType,
    ) -> EvaluationResult {
        let started = Instant::now();
        debug!("🔍 {} evaluation started", self.category.label());

        match self.evaluate_inner(project_info, project_type).await {
            Ok((fields, method, source)) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                info!(
                    "✅ {} scored {:.1} in {}ms",
                    self.category.label(),
                    fields.score,
                    elapsed_ms
                );

                let rationale = fields
                    .reasoning
                    .clone()
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| parser::excerpt(&source, 500));

                EvaluationResult {
                    category: self.category,
                    score: Some(fields.score),
                    sub_scores: fields.sub_scores,
                    rationale,
                    suggestions: fields.suggestions,
                    method,
                    elapsed_ms,
                    error: None,
                }
            }
            Err(error) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(
                    "❌ {} evaluation failed after {}ms: {}",
                    self.category.label(),
                    elapsed_ms,
                    error
                );
                EvaluationResult::failed(self.category, error.to_string(), elapsed_ms)
            }
        }
    }

    async fn evaluate_inner(
        &self,
        project_info: &str,
        project_type: ProjectType,
    ) -> Result<(EvaluationFields, EvaluationMethod, String)> {
        let raw = self.request_evaluation(project_info, project_type).await?;

        let (parsed, source) =
            match parser::parse_evaluation(&raw, self.settings.min_score, self.settings.max_score)
            {
                Ok(parsed) => (parsed, raw),
                Err(first_error) => {
                    warn!(
                        "⚠️ {} response unparseable ({}); retrying with simplified prompt",
                        self.category.label(),
                        first_error
                    );
                    let retry_raw = self.request_simplified(project_info).await?;
                    let parsed = parser::parse_evaluation(
                        &retry_raw,
                        self.settings.min_score,
                        self.settings.max_score,
                    )?;
                    (parsed, retry_raw)
                }
            };

        let method = if parsed.is_recovered() {
            EvaluationMethod::Fallback
        } else {
            EvaluationMethod::Primary
        };
        Ok((parsed.into_inner(), method, source))
    }

    async fn request_evaluation(
        &self,
        project_info: &str,
        project_type: ProjectType,
    ) -> Result<String> {
        let system = prompts::evaluation_system_prompt(self.category, project_type);
        let user = prompts::evaluation_user_prompt(self.category, project_info, project_type);

        self.retry
            .invoke(self.category.as_str(), || {
                self.inference.infer(InferenceRequest {
                    system: Some(system.clone()),
                    user: user.clone(),
                    temperature: self.settings.temperature,
                    max_tokens: self.settings.max_tokens,
                })
            })
            .await
    }

    async fn request_simplified(&self, project_info: &str) -> Result<String> {
        let policy = RetryPolicy::single_attempt(self.settings.retry.timeout);
        let operation = format!("{}_simplified", self.category.as_str());
        let user = prompts::simplified_evaluation_prompt(self.category, project_info);

        policy
            .invoke(&operation, || {
                self.inference.infer(InferenceRequest {
                    system: Some(prompts::simplified_system_prompt().to_string()),
                    user: user.clone(),
                    temperature: self.settings.temperature,
                    max_tokens: self.settings.max_tokens,
                })
            })
            .await
    }
}

/// One chain per category, all sharing the inference handle and settings.
pub fn build_chains(
    inference: Arc<dyn InferenceService>,
    settings: Arc<EvaluatorSettings>,
) -> Vec<EvaluationChain> {
    Category::ALL
        .iter()
        .map(|category| EvaluationChain::new(*category, inference.clone(), settings.clone()))
        .collect()
}
