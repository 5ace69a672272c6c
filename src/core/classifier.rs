use crate::config::JudgeConfig;
use crate::core::parser;
use crate::core::prompts;
use crate::core::retry::{RetryPolicy, RetrySettings};
use crate::domain::model::{AnalysisBundle, ClassificationResult, ProjectType};
use crate::domain::ports::{InferenceRequest, InferenceService};
use crate::utils::error::{JudgeError, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// 兩個原型分數差距小於此值時視為平手，歸類為 balanced。
const TIE_EPSILON: f64 = 1e-6;

/// Token budget for the reduced-complexity retry prompt.
const SIMPLIFIED_MAX_TOKENS: u32 = 500;

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub confidence_threshold: f64,
    pub raise_on_failure: bool,
    pub retry: RetrySettings,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ClassifierSettings {
    pub fn from_config(config: &JudgeConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold(),
            raise_on_failure: config.raise_on_failure(),
            retry: config.classification_retry(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
        }
    }
}

/// 以單次推論呼叫將專案分類為 PainKiller / Vitamin / Balanced。
/// 解析失敗時用簡化提示詞重試一次；信心不足則退回 balanced 並附帶警告。
pub struct ProjectTypeClassifier {
    inference: Arc<dyn InferenceService>,
    settings: ClassifierSettings,
    retry: RetryPolicy,
}

impl ProjectTypeClassifier {
    pub fn new(inference: Arc<dyn InferenceService>, settings: ClassifierSettings) -> Self {
        let retry = RetryPolicy::new(settings.retry.clone());
        Self {
            inference,
            settings,
            retry,
        }
    }

    pub async fn classify(&self, bundle: &AnalysisBundle) -> Result<ClassificationResult> {
        match self.classify_inner(bundle).await {
            Ok(result) => Ok(result),
            Err(error) => self.handle_failure(error),
        }
    }

    async fn classify_inner(&self, bundle: &AnalysisBundle) -> Result<ClassificationResult> {
        info!("🔍 Classifying project type");
        let bundle_text = bundle.to_prompt_text();

        let raw = self.request_classification(&bundle_text).await?;

        let (parsed, source) = match parser::parse_classification(&raw) {
            Ok(parsed) => (parsed, raw),
            Err(first_error) => {
                warn!(
                    "⚠️ Classification response unparseable ({}); retrying with simplified prompt",
                    first_error
                );
                let retry_raw = self.request_simplified(&bundle_text).await?;
                let parsed = parser::parse_classification(&retry_raw)?;
                (parsed, retry_raw)
            }
        };

        let fields = parsed.into_inner();
        Ok(self.interpret(fields, &source))
    }

    async fn request_classification(&self, bundle_text: &str) -> Result<String> {
        let system = prompts::classification_system_prompt();
        let user = prompts::classification_user_prompt(bundle_text);

        self.retry
            .invoke("classification", || {
                self.inference.infer(InferenceRequest {
                    system: Some(system.clone()),
                    user: user.clone(),
                    temperature: self.settings.temperature,
                    max_tokens: self.settings.max_tokens,
                })
            })
            .await
    }

    async fn request_simplified(&self, bundle_text: &str) -> Result<String> {
        let policy = RetryPolicy::single_attempt(self.settings.retry.timeout);
        let user = prompts::simplified_classification_prompt(bundle_text);

        policy
            .invoke("classification_simplified", || {
                self.inference.infer(InferenceRequest {
                    system: Some(prompts::simplified_system_prompt().to_string()),
                    user: user.clone(),
                    temperature: self.settings.temperature,
                    max_tokens: SIMPLIFIED_MAX_TOKENS,
                })
            })
            .await
    }

    /// 將解析出的欄位整理成分類結果：夾住信心值、正規化原型分數、
    /// 套用平手與門檻規則。
    fn interpret(&self, fields: parser::ClassificationFields, source: &str) -> ClassificationResult {
        let confidence = fields.confidence.clamp(0.0, 1.0);

        let raw_painkiller = fields.painkiller_score.max(0.0);
        let raw_vitamin = fields.vitamin_score.max(0.0);
        let total = raw_painkiller + raw_vitamin;
        let (painkiller_score, vitamin_score) = if total > 0.0 {
            (raw_painkiller / total, raw_vitamin / total)
        } else {
            (0.5, 0.5)
        };

        let mut project_type = fields.project_type;
        let mut warning = None;

        if (painkiller_score - vitamin_score).abs() < TIE_EPSILON
            && project_type != ProjectType::Balanced
        {
            info!("Archetype scores are tied; treating the project as balanced");
            project_type = ProjectType::Balanced;
        }

        if confidence < self.settings.confidence_threshold {
            warn!(
                "⚠️ Classification confidence {:.2} below threshold {:.2}; forcing balanced weighting",
                confidence, self.settings.confidence_threshold
            );
            warning = Some(format!(
                "confidence {:.2} below threshold {:.2}; balanced weighting applied",
                confidence, self.settings.confidence_threshold
            ));
            project_type = ProjectType::Balanced;
        }

        let reasoning = fields
            .reasoning
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| parser::excerpt(source, 500));

        info!(
            "✅ Project classified as {} (confidence {:.2})",
            project_type, confidence
        );

        ClassificationResult {
            project_type,
            confidence,
            painkiller_score,
            vitamin_score,
            reasoning,
            warning,
        }
    }

    fn handle_failure(&self, error: JudgeError) -> Result<ClassificationResult> {
        if self.settings.raise_on_failure {
            Err(JudgeError::ClassificationError {
                message: error.to_string(),
            })
        } else {
            warn!(
                "⚠️ Classification failed ({}); continuing with the balanced default",
                error
            );
            Ok(ClassificationResult::fallback_default(&error.to_string()))
        }
    }
}
