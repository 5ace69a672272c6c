use crate::core::retry::{Backoff, RetrySettings};
use crate::utils::error::{JudgeError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    pub judge: JudgeInfo,
    pub inference: InferenceConfig,
    pub classification: Option<ClassificationConfig>,
    pub evaluation: Option<EvaluationConfig>,
    pub weights: Option<WeightsConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeInfo {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    pub confidence_threshold: Option<f64>,
    pub raise_on_failure: Option<bool>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<usize>,
    pub retry_delay_ms: Option<u64>,
    pub retry_max_delay_ms: Option<u64>,
    pub backoff: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<usize>,
    pub retry_delay_ms: Option<u64>,
    pub retry_max_delay_ms: Option<u64>,
    pub backoff: Option<String>,
    pub max_workers: Option<usize>,
    pub run_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    pub tolerance: Option<f64>,
    pub painkiller: Option<HashMap<String, f64>>,
    pub vitamin: Option<HashMap<String, f64>>,
    pub balanced: Option<HashMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub system_stats: Option<bool>,
}

impl JudgeConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(JudgeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| JudgeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        // 驗證推論端點
        validation::validate_url("inference.endpoint", &self.inference.endpoint)?;
        validation::validate_non_empty_string("inference.model", &self.inference.model)?;

        validation::validate_range(
            "classification.confidence_threshold",
            self.confidence_threshold(),
            0.0,
            1.0,
        )?;

        // 驗證並發數與逾時
        validation::validate_positive_number("evaluation.max_workers", self.max_workers(), 1)?;
        validation::validate_positive_number(
            "evaluation.run_timeout_seconds",
            self.run_timeout().as_secs() as usize,
            1,
        )?;

        if self.min_score() >= self.max_score() {
            return Err(JudgeError::InvalidConfigValueError {
                field: "evaluation.min_score".to_string(),
                value: self.min_score().to_string(),
                reason: format!("min_score must be below max_score ({})", self.max_score()),
            });
        }

        // 驗證退避策略字串
        let valid_backoff = ["fixed", "exponential"];
        for (field, value) in [
            (
                "classification.backoff",
                self.classification
                    .as_ref()
                    .and_then(|c| c.backoff.as_deref()),
            ),
            (
                "evaluation.backoff",
                self.evaluation.as_ref().and_then(|e| e.backoff.as_deref()),
            ),
        ] {
            if let Some(value) = value {
                if !valid_backoff.contains(&value) {
                    return Err(JudgeError::InvalidConfigValueError {
                        field: field.to_string(),
                        value: value.to_string(),
                        reason: format!("Supported backoff modes: {}", valid_backoff.join(", ")),
                    });
                }
            }
        }

        Ok(())
    }

    /// 取得推論端點
    pub fn inference_endpoint(&self) -> &str {
        &self.inference.endpoint
    }

    pub fn model(&self) -> &str {
        &self.inference.model
    }

    pub fn temperature(&self) -> f32 {
        self.inference.temperature.unwrap_or(0.3)
    }

    pub fn max_tokens(&self) -> u32 {
        self.inference.max_tokens.unwrap_or(2000)
    }

    /// 單一的信心門檻 (預設 0.6)
    pub fn confidence_threshold(&self) -> f64 {
        self.classification
            .as_ref()
            .and_then(|c| c.confidence_threshold)
            .unwrap_or(0.6)
    }

    /// 分類失敗時是否中止整次評審
    pub fn raise_on_failure(&self) -> bool {
        self.classification
            .as_ref()
            .and_then(|c| c.raise_on_failure)
            .unwrap_or(true)
    }

    /// 分類呼叫: 短逾時、多重試
    pub fn classification_retry(&self) -> RetrySettings {
        let c = self.classification.as_ref();
        RetrySettings {
            max_retries: c.and_then(|c| c.max_retries).unwrap_or(3),
            base_delay: Duration::from_millis(c.and_then(|c| c.retry_delay_ms).unwrap_or(500)),
            max_delay: Duration::from_millis(
                c.and_then(|c| c.retry_max_delay_ms).unwrap_or(10_000),
            ),
            timeout: Duration::from_secs(c.and_then(|c| c.timeout_seconds).unwrap_or(30)),
            backoff: c
                .and_then(|c| c.backoff.as_deref())
                .map(Backoff::parse_or_default)
                .unwrap_or(Backoff::Fixed),
        }
    }

    /// 評審鏈呼叫: 長逾時、少重試
    pub fn evaluation_retry(&self) -> RetrySettings {
        let e = self.evaluation.as_ref();
        RetrySettings {
            max_retries: e.and_then(|e| e.max_retries).unwrap_or(2),
            base_delay: Duration::from_millis(e.and_then(|e| e.retry_delay_ms).unwrap_or(1000)),
            max_delay: Duration::from_millis(
                e.and_then(|e| e.retry_max_delay_ms).unwrap_or(15_000),
            ),
            timeout: Duration::from_secs(e.and_then(|e| e.timeout_seconds).unwrap_or(60)),
            backoff: e
                .and_then(|e| e.backoff.as_deref())
                .map(Backoff::parse_or_default)
                .unwrap_or(Backoff::Exponential),
        }
    }

    pub fn min_score(&self) -> f64 {
        self.evaluation
            .as_ref()
            .and_then(|e| e.min_score)
            .unwrap_or(0.5)
    }

    pub fn max_score(&self) -> f64 {
        self.evaluation
            .as_ref()
            .and_then(|e| e.max_score)
            .unwrap_or(10.0)
    }

    /// 工作池寬度 (預設 4)
    pub fn max_workers(&self) -> usize {
        self.evaluation
            .as_ref()
            .and_then(|e| e.max_workers)
            .unwrap_or(4)
    }

    /// 整份提交的評審時間預算
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(
            self.evaluation
                .as_ref()
                .and_then(|e| e.run_timeout_seconds)
                .unwrap_or(300),
        )
    }

    pub fn weight_tolerance(&self) -> f64 {
        self.weights
            .as_ref()
            .and_then(|w| w.tolerance)
            .unwrap_or(0.01)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for JudgeConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[judge]
name = "hackathon-judge"
description = "Submission scoring"
version = "1.0.0"

[inference]
endpoint = "http://localhost:8808/api/generate"
model = "nova-lite"
"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = JudgeConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.judge.name, "hackathon-judge");
        assert_eq!(config.confidence_threshold(), 0.6);
        assert!(config.raise_on_failure());
        assert_eq!(config.max_workers(), 4);
        assert_eq!(config.min_score(), 0.5);
        assert_eq!(config.max_score(), 10.0);
        assert_eq!(config.weight_tolerance(), 0.01);
        assert_eq!(config.run_timeout(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[judge]
name = "judge"
description = "test"
version = "0.1"

[inference]
endpoint = "https://inference.example.com/generate"
model = "nova-pro"
temperature = 0.1
max_tokens = 1500

[classification]
confidence_threshold = 0.7
raise_on_failure = false
timeout_seconds = 20
max_retries = 4
retry_delay_ms = 250
backoff = "fixed"

[evaluation]
min_score = 1.0
max_score = 10.0
timeout_seconds = 90
max_retries = 1
backoff = "exponential"
max_workers = 2
run_timeout_seconds = 120

[weights]
tolerance = 0.02

[monitoring]
enabled = true
"#;

        let config = JudgeConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.confidence_threshold(), 0.7);
        assert!(!config.raise_on_failure());
        assert_eq!(config.max_workers(), 2);
        assert_eq!(config.min_score(), 1.0);
        assert!(config.monitoring_enabled());

        let retry = config.classification_retry();
        assert_eq!(retry.max_retries, 4);
        assert_eq!(retry.base_delay, Duration::from_millis(250));
        assert_eq!(retry.timeout, Duration::from_secs(20));
        assert_eq!(retry.backoff, Backoff::Fixed);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_INFERENCE_ENDPOINT", "https://inference.test");

        let toml_content = r#"
[judge]
name = "judge"
description = "test"
version = "0.1"

[inference]
endpoint = "${TEST_INFERENCE_ENDPOINT}"
model = "nova-lite"
"#;

        let config = JudgeConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.inference_endpoint(), "https://inference.test");

        std::env::remove_var("TEST_INFERENCE_ENDPOINT");
    }

    #[test]
    fn test_invalid_endpoint_fails_validation() {
        let toml_content = r#"
[judge]
name = "judge"
description = "test"
version = "0.1"

[inference]
endpoint = "not-a-url"
model = "nova-lite"
"#;

        let config = JudgeConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_backoff_mode_fails_validation() {
        let toml_content = r#"
[judge]
name = "judge"
description = "test"
version = "0.1"

[inference]
endpoint = "http://localhost:8808"
model = "nova-lite"

[evaluation]
backoff = "jittered"
"#;

        let config = JudgeConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_score_bounds_fail_validation() {
        let toml_content = r#"
[judge]
name = "judge"
description = "test"
version = "0.1"

[inference]
endpoint = "http://localhost:8808"
model = "nova-lite"

[evaluation]
min_score = 9.0
max_score = 3.0
"#;

        let config = JudgeConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = JudgeConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.judge.name, "hackathon-judge");
    }
}
