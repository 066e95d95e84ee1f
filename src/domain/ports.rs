use crate::domain::model::RawRecord;
use crate::taxonomy::report::AnalysisReport;
use crate::taxonomy::store::BatchOutcome;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Supplies already-fetched robot candidates. Scraping lives outside this crate.
pub trait RecordSource: Send + Sync {
    fn fetch_records(&self) -> impl std::future::Future<Output = Result<Vec<RawRecord>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn registry_path(&self) -> Option<&str>;
    fn workers(&self) -> usize;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawRecord>>;
    async fn classify(&self, records: Vec<RawRecord>) -> Result<BatchOutcome>;
    async fn analyze(&self, outcome: BatchOutcome) -> Result<AnalysisReport>;
}
