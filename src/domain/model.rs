use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::{JudgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BusinessValue,
    TechnicalFeasibility,
    Innovation,
    Accessibility,
    CostAnalysis,
    NetworkEffect,
    SocialImpact,
    Sustainability,
    UserEngagement,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::BusinessValue,
        Category::TechnicalFeasibility,
        Category::Innovation,
        Category::Accessibility,
        Category::CostAnalysis,
        Category::NetworkEffect,
        Category::SocialImpact,
        Category::Sustainability,
        Category::UserEngagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BusinessValue => "business_value",
            Category::TechnicalFeasibility => "technical_feasibility",
            Category::Innovation => "innovation",
            Category::Accessibility => "accessibility",
            Category::CostAnalysis => "cost_analysis",
            Category::NetworkEffect => "network_effect",
            Category::SocialImpact => "social_impact",
            Category::Sustainability => "sustainability",
            Category::UserEngagement => "user_engagement",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::BusinessValue => "Business Value",
            Category::TechnicalFeasibility => "Technical Feasibility",
            Category::Innovation => "Innovation",
            Category::Accessibility => "Accessibility",
            Category::CostAnalysis => "Cost Analysis",
            Category::NetworkEffect => "Network Effect",
            Category::SocialImpact => "Social Impact",
            Category::Sustainability => "Sustainability",
            Category::UserEngagement => "User Engagement",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| JudgeError::ConfigError {
                message: format!("Unknown evaluation category: {}", s),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    PainKiller,
    Vitamin,
    Balanced,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::PainKiller => "painkiller",
            ProjectType::Vitamin => "vitamin",
            ProjectType::Balanced => "balanced",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "painkiller" => Ok(ProjectType::PainKiller),
            "vitamin" => Ok(ProjectType::Vitamin),
            "balanced" => Ok(ProjectType::Balanced),
            other => Err(JudgeError::ParseError {
                message: format!("Unknown project type: {}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionAnalysis {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SectionAnalysis {
    fn render(&self, label: &str) -> String {
        let mut out = format!("=== {} ===\n{}", label, self.summary.trim());
        if !self.keywords.is_empty() {
            out.push_str(&format!("\nKeywords: {}", self.keywords.join(", ")));
        }
        for (key, value) in &self.fields {
            out.push_str(&format!("\n{}: {}", key, value));
        }
        out
    }
}

/// Immutable per-submission input produced by the external media analyzers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<SectionAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<SectionAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation: Option<SectionAnalysis>,
}

impl AnalysisBundle {
    fn sections(&self) -> [(&'static str, &Option<SectionAnalysis>); 3] {
        [
            ("Video analysis", &self.video),
            ("Document analysis", &self.document),
            ("Presentation analysis", &self.presentation),
        ]
    }

    pub fn to_prompt_text(&self) -> String {
        let mut rendered = Vec::new();
        for (label, section) in self.sections() {
            match section {
                Some(s) if s.error.is_none() => rendered.push(s.render(label)),
                Some(_) => rendered.push(format!(
                    "=== {} ===\n(analysis failed; no usable content)",
                    label
                )),
                None => {}
            }
        }
        if rendered.is_empty() {
            "No analysis content is available for this submission.".to_string()
        } else {
            rendered.join("\n\n")
        }
    }

    /// Missing or failed sections, for the report and the logs.
    pub fn limitations(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (label, section) in self.sections() {
            match section {
                None => out.push(format!("{} not provided", label)),
                Some(s) => {
                    if let Some(err) = &s.error {
                        out.push(format!("{} failed: {}", label, err));
                    }
                }
            }
        }
        out
    }

    pub fn has_content(&self) -> bool {
        self.sections()
            .iter()
            .any(|(_, s)| matches!(s, Some(inner) if inner.error.is_none()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub project_type: ProjectType,
    pub confidence: f64,
    pub painkiller_score: f64,
    pub vitamin_score: f64,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ClassificationResult {
    /// Legacy default used when classification fails and the run is configured
    /// to continue instead of aborting.
    pub fn fallback_default(reason: &str) -> Self {
        Self {
            project_type: ProjectType::Balanced,
            confidence: 0.0,
            painkiller_score: 0.5,
            vitamin_score: 0.5,
            reasoning: String::new(),
            warning: Some(format!("classification failed, defaulting to balanced: {}", reason)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMethod {
    Primary,
    Fallback,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_scores: Option<HashMap<String, f64>>,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    pub method: EvaluationMethod,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    pub fn failed(category: Category, error: String, elapsed_ms: u64) -> Self {
        Self {
            category,
            score: None,
            sub_scores: None,
            rationale: String::new(),
            suggestions: Vec::new(),
            method: EvaluationMethod::Failed,
            elapsed_ms,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Scores of the categories that produced one; errored categories are excluded,
/// never defaulted.
pub fn scored_categories(results: &HashMap<Category, EvaluationResult>) -> HashMap<Category, f64> {
    results
        .iter()
        .filter(|(_, r)| !r.is_error())
        .filter_map(|(c, r)| r.score.map(|s| (*c, s)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector {
    weights: HashMap<Category, f64>,
}

impl WeightVector {
    pub fn new(weights: HashMap<Category, f64>) -> Self {
        Self { weights }
    }

    /// Uniform 1/9 vector used for the balanced project type.
    pub fn uniform() -> Self {
        let share = 1.0 / Category::ALL.len() as f64;
        Self {
            weights: Category::ALL.iter().map(|c| (*c, share)).collect(),
        }
    }

    pub fn get(&self, category: Category) -> f64 {
        self.weights.get(&category).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &f64)> {
        self.weights.iter()
    }

    pub fn validate(&self, name: &str, tolerance: f64) -> Result<()> {
        for (category, weight) in &self.weights {
            if *weight < 0.0 {
                return Err(JudgeError::InvalidConfigValueError {
                    field: format!("weights.{}.{}", name, category),
                    value: weight.to_string(),
                    reason: "Weights cannot be negative".to_string(),
                });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(JudgeError::WeightInvariantError {
                project_type: name.to_string(),
                sum,
                tolerance,
            });
        }
        Ok(())
    }

    /// Redistributes weight mass over the categories that survived, so the
    /// aggregate stays a true weighted mean under partial failure.
    pub fn renormalized_over(&self, surviving: &[Category]) -> Result<WeightVector> {
        let surviving_sum: f64 = surviving.iter().map(|c| self.get(*c)).sum();
        if surviving_sum <= f64::EPSILON {
            return Err(JudgeError::AggregationError {
                message: "no weight mass left after excluding failed categories".to_string(),
            });
        }
        Ok(WeightVector::new(
            surviving
                .iter()
                .map(|c| (*c, self.get(*c) / surviving_sum))
                .collect(),
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub results: HashMap<Category, EvaluationResult>,
    pub error_count: usize,
    pub elapsed_ms: u64,
    pub final_score: f64,
    pub complete: bool,
}

impl ExecutionReport {
    pub fn scores(&self) -> HashMap<Category, f64> {
        scored_categories(&self.results)
    }
}

/// The artifact handed to the report layer: classification, weighting, raw
/// per-category scores and the execution report, stamped at assembly time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub timestamp: String,
    pub classification: ClassificationResult,
    pub weights: WeightVector,
    pub scores: HashMap<Category, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub limitations: Vec<String>,
    pub execution: ExecutionReport,
}

impl FinalReport {
    pub fn new(
        classification: ClassificationResult,
        weights: WeightVector,
        execution: ExecutionReport,
        limitations: Vec<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            scores: execution.scores(),
            classification,
            weights,
            limitations,
            execution,
        }
    }

    pub fn final_score(&self) -> f64 {
        self.execution.final_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("branding".parse::<Category>().is_err());
    }

    #[test]
    fn test_project_type_parsing_is_case_insensitive() {
        assert_eq!(
            "PainKiller".parse::<ProjectType>().unwrap(),
            ProjectType::PainKiller
        );
        assert!("supplement".parse::<ProjectType>().is_err());
    }

    #[test]
    fn test_uniform_vector_satisfies_invariant() {
        let weights = WeightVector::uniform();
        assert_eq!(weights.len(), 9);
        assert!(weights.validate("balanced", 0.01).is_ok());
        assert!((weights.get(Category::Innovation) - 1.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_renormalization_over_survivors() {
        let weights = WeightVector::uniform();
        let surviving: Vec<Category> = Category::ALL
            .iter()
            .copied()
            .filter(|c| *c != Category::CostAnalysis)
            .collect();
        let renormalized = weights.renormalized_over(&surviving).unwrap();
        assert!((renormalized.sum() - 1.0).abs() < 0.01);
        // 0.111 / (1 - 0.111) ≈ 0.125
        assert!((renormalized.get(Category::Innovation) - 0.125).abs() < 0.001);
        assert_eq!(renormalized.get(Category::CostAnalysis), 0.0);
    }

    #[test]
    fn test_renormalization_fails_with_no_survivors() {
        let weights = WeightVector::uniform();
        assert!(weights.renormalized_over(&[]).is_err());
    }

    #[test]
    fn test_bundle_prompt_text_marks_failed_sections() {
        let bundle = AnalysisBundle {
            video: Some(SectionAnalysis {
                summary: "A triage assistant for night-shift nurses".to_string(),
                keywords: vec!["health".to_string(), "triage".to_string()],
                ..Default::default()
            }),
            document: Some(SectionAnalysis {
                error: Some("unreadable file".to_string()),
                ..Default::default()
            }),
            presentation: None,
        };

        let text = bundle.to_prompt_text();
        assert!(text.contains("triage assistant"));
        assert!(text.contains("no usable content"));

        let limitations = bundle.limitations();
        assert_eq!(limitations.len(), 2);
        assert!(limitations.iter().any(|l| l.contains("unreadable file")));
        assert!(bundle.has_content());
    }

    #[test]
    fn test_scored_categories_excludes_errors() {
        let mut results = HashMap::new();
        results.insert(
            Category::Innovation,
            EvaluationResult {
                category: Category::Innovation,
                score: Some(8.0),
                sub_scores: None,
                rationale: "novel".to_string(),
                suggestions: Vec::new(),
                method: EvaluationMethod::Primary,
                elapsed_ms: 10,
                error: None,
            },
        );
        results.insert(
            Category::CostAnalysis,
            EvaluationResult::failed(Category::CostAnalysis, "timeout".to_string(), 10),
        );

        let scores = scored_categories(&results);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[&Category::Innovation], 8.0);
    }
}
