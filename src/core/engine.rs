use crate::domain::model::Level;
use crate::domain::ports::Pipeline;
use crate::taxonomy::report::AnalysisReport;
use crate::utils::error::Result;
use std::time::Instant;

pub struct AnalysisEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> AnalysisEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<AnalysisReport> {
        let started = Instant::now();
        tracing::info!("🚀 Starting taxonomy analysis");

        // Extract
        tracing::info!("📥 Extracting records...");
        let records = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} records", records.len());

        // Classify
        tracing::info!("🔄 Classifying records...");
        let outcome = self.pipeline.classify(records).await?;
        tracing::info!(
            "🔄 Classified {}/{} records ({} rejected)",
            outcome.report.classified,
            outcome.report.attempted,
            outcome.report.failures.len()
        );

        // Analyze
        tracing::info!("📊 Computing diversity metrics...");
        let report = self.pipeline.analyze(outcome).await?;
        if let Some(class) = report.diversity_at(Level::Class) {
            tracing::info!(
                "📊 Class diversity H = {:.3} over {} labels",
                class.shannon,
                class.richness
            );
        }

        tracing::info!("✅ Analysis finished in {:?}", started.elapsed());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RawRecord;
    use crate::taxonomy::registry::TaxonomyRegistry;
    use crate::taxonomy::store::{classify_batch, BatchOutcome};
    use crate::utils::error::TaxonomyError;

    struct FixedPipeline {
        records: Vec<RawRecord>,
        registry: TaxonomyRegistry,
    }

    #[async_trait::async_trait]
    impl Pipeline for FixedPipeline {
        async fn extract(&self) -> Result<Vec<RawRecord>> {
            Ok(self.records.clone())
        }

        async fn classify(&self, records: Vec<RawRecord>) -> Result<BatchOutcome> {
            classify_batch(&records, &self.registry)
        }

        async fn analyze(&self, outcome: BatchOutcome) -> Result<AnalysisReport> {
            AnalysisReport::build(&self.registry, outcome)
        }
    }

    struct FailingPipeline;

    #[async_trait::async_trait]
    impl Pipeline for FailingPipeline {
        async fn extract(&self) -> Result<Vec<RawRecord>> {
            Err(TaxonomyError::ConfigError {
                message: "no source".to_string(),
            })
        }

        async fn classify(&self, _records: Vec<RawRecord>) -> Result<BatchOutcome> {
            unreachable!("classify must not run after a failed extract")
        }

        async fn analyze(&self, _outcome: BatchOutcome) -> Result<AnalysisReport> {
            unreachable!("analyze must not run after a failed extract")
        }
    }

    #[tokio::test]
    async fn test_engine_runs_all_phases() {
        let pipeline = FixedPipeline {
            records: vec![
                RawRecord::new("1", "Spot").with_description("quadruped robot"),
                RawRecord::new("2", "Skydio").with_description("autonomous drone"),
            ],
            registry: TaxonomyRegistry::builtin().unwrap(),
        };

        let report = AnalysisEngine::new(pipeline).run().await.unwrap();

        assert_eq!(report.records().len(), 2);
        let class = report.diversity_at(Level::Class).unwrap();
        assert_eq!(class.richness, 2);
        assert!((class.shannon - 2f64.ln()).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_engine_stops_on_extract_failure() {
        let result = AnalysisEngine::new(FailingPipeline).run().await;
        assert!(matches!(result, Err(TaxonomyError::ConfigError { .. })));
    }
}
