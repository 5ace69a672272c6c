use crate::domain::model::ProjectType;
use crate::utils::error::{JudgeError, Result};
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

/// How a record was obtained from the raw response.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// The response carried a well-formed JSON document.
    Primary(T),
    /// Pattern extraction recovered the mandatory fields from loose text.
    Recovered(T),
}

impl<T> Parsed<T> {
    pub fn is_recovered(&self) -> bool {
        matches!(self, Parsed::Recovered(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Parsed::Primary(inner) | Parsed::Recovered(inner) => inner,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationFields {
    pub project_type: ProjectType,
    pub confidence: f64,
    pub painkiller_score: f64,
    pub vitamin_score: f64,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationFields {
    pub score: f64,
    pub sub_scores: Option<HashMap<String, f64>>,
    pub reasoning: Option<String>,
    pub suggestions: Vec<String>,
}

/// Classification record from a raw model response. Primary path first, then
/// pattern extraction; the four typed fields are mandatory in both.
pub fn parse_classification(raw: &str) -> Result<Parsed<ClassificationFields>> {
    if let Some(value) = extract_json_object(raw) {
        if let Some(fields) = classification_from_json(&value) {
            return Ok(Parsed::Primary(fields));
        }
    }
    classification_from_patterns(raw).map(Parsed::Recovered)
}

/// Evaluation record from a raw model response. `score` is the only mandatory
/// field; out-of-range scores are clamped into the configured bounds.
pub fn parse_evaluation(
    raw: &str,
    min_score: f64,
    max_score: f64,
) -> Result<Parsed<EvaluationFields>> {
    if let Some(value) = extract_json_object(raw) {
        if let Some(mut fields) = evaluation_from_json(&value) {
            fields.score = clamp_score(fields.score, min_score, max_score);
            return Ok(Parsed::Primary(fields));
        }
    }

    match extract_score(raw) {
        Some(score) => Ok(Parsed::Recovered(EvaluationFields {
            score: clamp_score(score, min_score, max_score),
            sub_scores: None,
            reasoning: None,
            suggestions: Vec::new(),
        })),
        None => Err(JudgeError::ParseError {
            message: "mandatory field not recoverable: score".to_string(),
        }),
    }
}

/// Bounded excerpt of a raw response, used as audit-trail rationale when the
/// response carried no explicit reasoning field.
pub fn excerpt(raw: &str, max_chars: usize) -> String {
    raw.chars().take(max_chars).collect::<String>().trim().to_string()
}

fn clamp_score(score: f64, min_score: f64, max_score: f64) -> f64 {
    if score < min_score || score > max_score {
        let clamped = score.clamp(min_score, max_score);
        warn!(
            "⚠️ Score {} outside [{}, {}]; clamped to {}",
            score, min_score, max_score, clamped
        );
        clamped
    } else {
        score
    }
}

/// Locates a JSON object inside the response: a fenced ```json block first,
/// then the outermost brace pair.
fn extract_json_object(raw: &str) -> Option<serde_json::Value> {
    let fenced = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap();
    if let Some(captures) = fenced.captures(raw) {
        if let Ok(value) = serde_json::from_str(&captures[1]) {
            return Some(value);
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn classification_from_json(value: &serde_json::Value) -> Option<ClassificationFields> {
    let project_type: ProjectType = value.get("project_type")?.as_str()?.parse().ok()?;
    Some(ClassificationFields {
        project_type,
        confidence: json_number(value.get("confidence")?)?,
        painkiller_score: json_number(value.get("painkiller_score")?)?,
        vitamin_score: json_number(value.get("vitamin_score")?)?,
        reasoning: value
            .get("reasoning")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}

fn evaluation_from_json(value: &serde_json::Value) -> Option<EvaluationFields> {
    let score = json_number(value.get("score")?)?;

    let sub_scores = value.get("sub_scores").and_then(|v| v.as_object()).map(|o| {
        o.iter()
            .filter_map(|(k, v)| json_number(v).map(|n| (k.clone(), n)))
            .collect::<HashMap<String, f64>>()
    });

    let suggestions = value
        .get("suggestions")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Some(EvaluationFields {
        score,
        sub_scores: sub_scores.filter(|m| !m.is_empty()),
        reasoning: value
            .get("reasoning")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        suggestions,
    })
}

/// Numbers occasionally come back quoted; accept both shapes.
fn json_number(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn classification_from_patterns(raw: &str) -> Result<ClassificationFields> {
    let project_type = extract_project_type(raw);
    let confidence = extract_field_number(raw, "confidence");
    let painkiller_score = extract_field_number(raw, "painkiller_score");
    let vitamin_score = extract_field_number(raw, "vitamin_score");

    let mut missing = Vec::new();
    if project_type.is_none() {
        missing.push("project_type");
    }
    if confidence.is_none() {
        missing.push("confidence");
    }
    if painkiller_score.is_none() {
        missing.push("painkiller_score");
    }
    if vitamin_score.is_none() {
        missing.push("vitamin_score");
    }

    match (project_type, confidence, painkiller_score, vitamin_score) {
        (Some(project_type), Some(confidence), Some(painkiller_score), Some(vitamin_score)) => {
            Ok(ClassificationFields {
                project_type,
                confidence,
                painkiller_score,
                vitamin_score,
                reasoning: extract_reasoning(raw),
            })
        }
        _ => Err(JudgeError::ParseError {
            message: format!("mandatory fields not recoverable: {}", missing.join(", ")),
        }),
    }
}

fn extract_project_type(raw: &str) -> Option<ProjectType> {
    let re = Regex::new(r#"(?i)"?project_type"?\s*[:=]\s*"?(painkiller|vitamin|balanced)"#).unwrap();
    re.captures(raw)?.get(1)?.as_str().parse().ok()
}

fn extract_field_number(raw: &str, field: &str) -> Option<f64> {
    let re = Regex::new(&format!(
        r#"(?i)"?{}"?\s*[:=]\s*"?([0-9]+(?:\.[0-9]+)?)"#,
        field
    ))
    .unwrap();
    re.captures(raw)?.get(1)?.as_str().parse().ok()
}

fn extract_reasoning(raw: &str) -> Option<String> {
    let re = Regex::new(r#""reasoning"\s*:\s*"([^"]+)""#).unwrap();
    re.captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_score(raw: &str) -> Option<f64> {
    let patterns = [
        r#"(?i)\bscore\b\s*(?:is|of)?\s*[:=]?\s*"?([0-9]+(?:\.[0-9]+)?)"#,
        r"([0-9]+(?:\.[0-9]+)?)\s*/\s*10\b",
        r"(?i)\brat(?:ed|ing)\b[^0-9]{0,20}([0-9]+(?:\.[0-9]+)?)",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        if let Some(score) = re
            .captures(raw)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
        {
            return Some(score);
        }
    }
    None
}
