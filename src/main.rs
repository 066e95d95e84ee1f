use anyhow::Context;
use clap::Parser;
use robot_taxonomy::taxonomy::metrics;
use robot_taxonomy::utils::error::{ErrorSeverity, TaxonomyError};
use robot_taxonomy::utils::{logger, validation::Validate};
use robot_taxonomy::{
    AnalysisEngine, AnalysisReport, CliConfig, JsonFileSource,
    TaxonomyPipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting robot-taxonomy CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        fail(e);
    }

    let source = JsonFileSource::new(&config.input);
    let similar_to = config.similar_to.clone();
    let top_n = config.top_n;

    let pipeline = match TaxonomyPipeline::from_config(source, config) {
        Ok(pipeline) => pipeline,
        Err(e) => fail(e),
    };
    let engine = AnalysisEngine::new(pipeline);

    let report = match engine.run().await {
        Ok(report) => report,
        Err(e) => fail(e),
    };

    let json = serde_json::to_string_pretty(&report).context("serializing analysis report")?;
    println!("{}", json);
    print_summary(&report);

    if let Some(id) = similar_to {
        if let Err(e) = print_relatives(&report, &id, top_n) {
            fail(e);
        }
    }

    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    eprintln!(
        "✅ Classified {} of {} robots",
        report.batch.classified, report.batch.attempted
    );
    for failure in &report.batch.failures {
        eprintln!("⚠️  {}: {}", failure.id, failure.message);
    }
    for level in &report.diversity {
        eprintln!(
            "📊 {:<13} richness {:>3}  H = {:.3}",
            level.level.as_str(),
            level.richness,
            level.shannon
        );
    }
}

fn print_relatives(report: &AnalysisReport, id: &str, top_n: usize) -> robot_taxonomy::Result<()> {
    let relatives = metrics::nearest_relatives(&report.store, id, top_n)?;
    eprintln!("🔗 Nearest relatives of {}:", id);
    for relative in relatives {
        eprintln!("   {} ({}) distance {}", relative.name, relative.id, relative.distance);
    }
    Ok(())
}

fn fail(e: TaxonomyError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
