use clap::Parser;
use hackathon_judge::core::Category;
use hackathon_judge::domain::model::EvaluationMethod;
use hackathon_judge::utils::logger;
use hackathon_judge::utils::validation::{self, Validate};
use hackathon_judge::{
    AnalysisBundle, FinalReport, HttpLlmClient, InferenceService, JudgeConfig, JudgeCore,
    JudgeEngine, LocalStorage, Storage,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "hackathon-judge")]
#[command(about = "Scores hackathon submissions with weighted LLM evaluation chains")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "judge.toml")]
    config: String,

    /// Path to the analysis bundle JSON produced by the media analyzers
    #[arg(short, long)]
    bundle: String,

    /// Output directory for the final report
    #[arg(short, long, default_value = "./output")]
    output: String,

    /// Override worker pool width from config
    #[arg(long)]
    workers: Option<usize>,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Emit JSON logs instead of human-readable ones
    #[arg(long)]
    log_json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting hackathon judge");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match JudgeConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(workers) = args.workers {
        config
            .evaluation
            .get_or_insert_with(Default::default)
            .max_workers = Some(workers);
        tracing::info!("🔧 Worker pool width overridden to: {}", workers);
    }

    // 驗證配置與輸出路徑
    if let Err(e) = config
        .validate()
        .and_then(|_| validation::validate_path("output", &args.output))
    {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 載入分析包
    let bundle = match load_bundle(&args.bundle).await {
        Ok(bundle) => bundle,
        Err(e) => {
            eprintln!("❌ Failed to load analysis bundle '{}': {}", args.bundle, e);
            eprintln!("💡 The bundle must be a JSON file produced by the media analyzers");
            std::process::exit(1);
        }
    };

    if !bundle.has_content() {
        tracing::warn!(
            "⚠️ Analysis bundle has no usable sections; scores will reflect missing evidence"
        );
    }

    // 建立推論客戶端與評審管線
    let inference: Arc<dyn InferenceService> = Arc::new(HttpLlmClient::from_config(&config));
    let pipeline = match JudgeCore::new(inference, &config) {
        Ok(core) => core.with_progress(Arc::new(|category, completed, total| {
            tracing::info!("📊 [{}/{}] {} evaluated", completed, total, category.label());
        })),
        Err(e) => {
            tracing::error!("❌ Failed to build judge pipeline: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    // 建立評審引擎並運行
    let engine = JudgeEngine::new_with_monitoring(pipeline, monitor_enabled);

    match run_and_save(&engine, &bundle, &args.output).await {
        Ok(report) => {
            tracing::info!("✅ Judging completed successfully!");
            tracing::info!("🏆 Final score: {:.2}", report.final_score());
            print_report_summary(&report, &args.output);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Judging failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                hackathon_judge::utils::error::ErrorSeverity::Low => 0, // 警告，但成功
                hackathon_judge::utils::error::ErrorSeverity::Medium => 2, // 可重試的錯誤
                hackathon_judge::utils::error::ErrorSeverity::High => 1, // 評審錯誤
                hackathon_judge::utils::error::ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn load_bundle(path: &str) -> hackathon_judge::Result<AnalysisBundle> {
    let storage = LocalStorage::new(".".to_string());
    let raw = storage.read_file(path).await?;
    Ok(serde_json::from_slice(&raw)?)
}

async fn run_and_save(
    engine: &JudgeEngine<JudgeCore>,
    bundle: &AnalysisBundle,
    output_dir: &str,
) -> hackathon_judge::Result<FinalReport> {
    let report = engine.run(bundle).await?;

    let storage = LocalStorage::new(output_dir.to_string());
    let payload = serde_json::to_vec_pretty(&report)?;
    storage.write_file("judge_report.json", &payload).await?;
    tracing::info!("📁 Report saved to: {}/judge_report.json", output_dir);

    Ok(report)
}

fn display_config_summary(config: &JudgeConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Judge: {} v{}", config.judge.name, config.judge.version);
    println!("  Endpoint: {}", config.inference_endpoint());
    println!("  Model: {}", config.model());
    println!("  Workers: {}", config.max_workers());
    println!(
        "  Score range: {:.1} - {:.1}",
        config.min_score(),
        config.max_score()
    );
    println!(
        "  Confidence threshold: {:.2}",
        config.confidence_threshold()
    );
    println!("  Run budget: {}s", config.run_timeout().as_secs());
    println!("  Output: {}", args.output);
    println!();
}

fn print_report_summary(report: &FinalReport, output_dir: &str) {
    println!();
    println!("✅ Judging completed!");
    println!(
        "📋 Project type: {} (confidence {:.2})",
        report.classification.project_type, report.classification.confidence
    );
    if let Some(warning) = &report.classification.warning {
        println!("⚠️ {}", warning);
    }

    println!();
    println!("📊 Category scores:");
    for category in Category::ALL {
        match report.execution.results.get(&category) {
            Some(result) if result.is_error() => {
                println!(
                    "  {:<22} failed: {}",
                    category.label(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            Some(result) => {
                let marker = if result.method == EvaluationMethod::Fallback {
                    " (fallback parse)"
                } else {
                    ""
                };
                println!(
                    "  {:<22} {:>5.1}{}",
                    category.label(),
                    result.score.unwrap_or(0.0),
                    marker
                );
            }
            None => println!("  {:<22} missing", category.label()),
        }
    }

    if report.execution.error_count > 0 {
        println!(
            "⚠️ {} categories failed and were excluded from the weighted aggregate",
            report.execution.error_count
        );
    }
    if !report.execution.complete {
        println!("⚠️ Partial report: the run budget expired before every chain finished");
    }
    for limitation in &report.limitations {
        println!("⚠️ Evidence limitation: {}", limitation);
    }

    println!();
    println!("🏆 Final score: {:.2}", report.final_score());
    println!("📁 Report saved to: {}/judge_report.json", output_dir);
}
