use anyhow::Result;
use hackathon_judge::core::Category;
use hackathon_judge::domain::model::{EvaluationMethod, ProjectType};
use hackathon_judge::utils::error::JudgeError;
use hackathon_judge::{
    AnalysisBundle, FinalReport, HttpLlmClient, InferenceService, JudgeConfig, JudgeCore,
    JudgeEngine, LocalStorage, Storage,
};
use httpmock::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

fn judge_config(endpoint: &str, classification_extra: &str) -> JudgeConfig {
    let toml_content = format!(
        r#"
[judge]
name = "judge-integration"
description = "End-to-end judging against a mock inference server"
version = "0.0.1"

[inference]
endpoint = "{}"
model = "nova-lite"

[classification]
timeout_seconds = 5
max_retries = 0
retry_delay_ms = 10
{}

[evaluation]
timeout_seconds = 5
max_retries = 0
retry_delay_ms = 10
max_workers = 4
run_timeout_seconds = 30
"#,
        endpoint, classification_extra
    );
    JudgeConfig::from_toml_str(&toml_content).unwrap()
}

fn sample_bundle() -> AnalysisBundle {
    serde_json::from_value(serde_json::json!({
        "video": {
            "summary": "Demo of an on-call triage assistant that cuts incident response time",
            "keywords": ["incident", "triage", "automation"]
        },
        "document": {
            "summary": "Architecture writeup: event ingestion, severity classifier, paging integration"
        }
    }))
    .unwrap()
}

fn classification_response(
    project_type: &str,
    confidence: f64,
    painkiller: f64,
    vitamin: f64,
) -> serde_json::Value {
    let inner = serde_json::json!({
        "project_type": project_type,
        "confidence": confidence,
        "painkiller_score": painkiller,
        "vitamin_score": vitamin,
        "reasoning": "clear operational pain with measurable cost savings"
    });
    serde_json::json!({ "response": inner.to_string() })
}

fn evaluation_response(score: f64) -> serde_json::Value {
    let inner = serde_json::json!({
        "score": score,
        "reasoning": "well supported by the demo",
        "suggestions": ["add adoption metrics"]
    });
    serde_json::json!({ "response": inner.to_string() })
}

fn build_engine(config: &JudgeConfig) -> Result<JudgeEngine<JudgeCore>> {
    let inference: Arc<dyn InferenceService> = Arc::new(HttpLlmClient::from_config(config));
    let core = JudgeCore::new(inference, config)?;
    Ok(JudgeEngine::new_with_monitoring(core, false))
}

const CATEGORY_SCORES: [f64; 9] = [8.0, 7.0, 6.0, 9.0, 5.0, 7.0, 8.0, 6.0, 7.0];

#[tokio::test]
async fn test_end_to_end_judging_with_real_http() -> Result<()> {
    let server = MockServer::start();

    let classification_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("archetype");
        then.status(200)
            .json_body(classification_response("balanced", 0.9, 0.5, 0.5));
    });

    // One mock per category; the user prompt names the category it scores.
    let mut evaluation_mocks = Vec::new();
    for (category, score) in Category::ALL.iter().zip(CATEGORY_SCORES) {
        let marker = format!("Score the project on {}", category.label());
        evaluation_mocks.push(server.mock(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains(marker.as_str());
            then.status(200).json_body(evaluation_response(score));
        }));
    }

    let config = judge_config(&server.url("/api/generate"), "");
    let engine = build_engine(&config)?;

    let report = engine.run(&sample_bundle()).await?;

    assert_eq!(report.classification.project_type, ProjectType::Balanced);
    assert!(report.execution.complete);
    assert_eq!(report.execution.error_count, 0);
    assert_eq!(report.scores.len(), 9);

    // Uniform weights over nine categories make the aggregate the plain mean.
    assert!((report.final_score() - 7.0).abs() < 0.01);
    assert!((report.weights.get(Category::Innovation) - 1.0 / 9.0).abs() < 1e-9);

    classification_mock.assert();
    for mock in &evaluation_mocks {
        mock.assert();
    }

    // Round-trip the report through the storage adapter.
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let storage = LocalStorage::new(output_path);
    storage
        .write_file("judge_report.json", &serde_json::to_vec_pretty(&report)?)
        .await?;

    let raw = storage.read_file("judge_report.json").await?;
    let restored: FinalReport = serde_json::from_slice(&raw)?;
    assert!((restored.final_score() - 7.0).abs() < 0.01);
    assert_eq!(restored.scores.len(), 9);

    Ok(())
}

#[tokio::test]
async fn test_failed_category_is_excluded_and_weights_renormalized() -> Result<()> {
    let server = MockServer::start();

    let _classification_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("archetype");
        then.status(200)
            .json_body(classification_response("balanced", 0.9, 0.5, 0.5));
    });

    // Cost Analysis always answers 503; the other eight score normally.
    let failing_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("Score the project on Cost Analysis");
        then.status(503);
    });

    for (category, score) in Category::ALL.iter().zip(CATEGORY_SCORES) {
        if *category == Category::CostAnalysis {
            continue;
        }
        let marker = format!("Score the project on {}", category.label());
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains(marker.as_str());
            then.status(200).json_body(evaluation_response(score));
        });
    }

    let config = judge_config(&server.url("/api/generate"), "");
    let engine = build_engine(&config)?;

    let report = engine.run(&sample_bundle()).await?;

    assert!(report.execution.complete);
    assert_eq!(report.execution.error_count, 1);
    assert_eq!(report.scores.len(), 8);
    assert!(!report.scores.contains_key(&Category::CostAnalysis));

    let failed = &report.execution.results[&Category::CostAnalysis];
    assert!(failed.is_error());
    assert!(failed.score.is_none());

    // (8 + 7 + 6 + 9 + 7 + 8 + 6 + 7) / 8 over the renormalized uniform weights
    assert!((report.final_score() - 7.25).abs() < 0.01);

    failing_mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_low_confidence_classification_downgrades_to_balanced() -> Result<()> {
    let server = MockServer::start();

    let _classification_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("archetype");
        then.status(200)
            .json_body(classification_response("painkiller", 0.3, 0.9, 0.1));
    });

    let evaluation_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("Score the project");
        then.status(200).json_body(evaluation_response(8.0));
    });

    let config = judge_config(&server.url("/api/generate"), "");
    let engine = build_engine(&config)?;

    let report = engine.run(&sample_bundle()).await?;

    // Label downgraded, raw classifier signal preserved for audit.
    assert_eq!(report.classification.project_type, ProjectType::Balanced);
    assert!(report.classification.warning.is_some());
    assert!((report.classification.confidence - 0.3).abs() < 1e-9);
    assert!((report.classification.painkiller_score - 0.9).abs() < 1e-9);

    // Downstream weighting is the uniform table, not the painkiller one.
    assert!((report.weights.get(Category::BusinessValue) - 1.0 / 9.0).abs() < 1e-9);
    assert!((report.final_score() - 8.0).abs() < 0.01);

    evaluation_mock.assert_hits(9);
    Ok(())
}

#[tokio::test]
async fn test_plain_text_responses_are_recovered_by_fallback_parsing() -> Result<()> {
    let server = MockServer::start();

    // The model ignores the JSON instruction on every call; pattern extraction
    // must recover both the classification and each category score.
    let _classification_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("archetype");
        then.status(200).json_body(serde_json::json!({
            "response": "Based on my analysis: \"project_type\": \"painkiller\", \
                         \"confidence\": 0.8, \"painkiller_score\": 0.9, \"vitamin_score\": 0.1"
        }));
    });

    let evaluation_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("Score the project");
        then.status(200).json_body(serde_json::json!({
            "response": "Score: 8.5. Strong pain point with a credible delivery plan."
        }));
    });

    let config = judge_config(&server.url("/api/generate"), "");
    let engine = build_engine(&config)?;

    let report = engine.run(&sample_bundle()).await?;

    assert_eq!(report.classification.project_type, ProjectType::PainKiller);
    assert!((report.classification.confidence - 0.8).abs() < 1e-9);

    for category in Category::ALL {
        let result = &report.execution.results[&category];
        assert_eq!(result.method, EvaluationMethod::Fallback);
        assert_eq!(result.score, Some(8.5));
    }
    assert!((report.final_score() - 8.5).abs() < 0.01);

    evaluation_mock.assert_hits(9);
    Ok(())
}

#[tokio::test]
async fn test_classification_failure_aborts_when_configured_to_raise() -> Result<()> {
    let server = MockServer::start();

    let classification_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("archetype");
        then.status(500);
    });

    let config = judge_config(&server.url("/api/generate"), "raise_on_failure = true");
    let engine = build_engine(&config)?;

    let result = engine.run(&sample_bundle()).await;
    assert!(matches!(result, Err(JudgeError::ClassificationError { .. })));

    classification_mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_classification_failure_defaults_to_balanced_when_not_raising() -> Result<()> {
    let server = MockServer::start();

    let _classification_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("archetype");
        then.status(500);
    });

    let evaluation_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("Score the project");
        then.status(200).json_body(evaluation_response(8.0));
    });

    let config = judge_config(&server.url("/api/generate"), "raise_on_failure = false");
    let engine = build_engine(&config)?;

    let report = engine.run(&sample_bundle()).await?;

    assert_eq!(report.classification.project_type, ProjectType::Balanced);
    assert_eq!(report.classification.confidence, 0.0);
    assert!(report
        .classification
        .warning
        .as_deref()
        .is_some_and(|w| w.contains("classification failed")));
    assert!((report.final_score() - 8.0).abs() < 0.01);

    evaluation_mock.assert_hits(9);
    Ok(())
}
