use crate::domain::model::RawRecord;
use crate::taxonomy::classifier::classify;
use crate::taxonomy::registry::TaxonomyRegistry;
use crate::taxonomy::store::{BatchCollector, BatchOutcome};
use crate::utils::error::{Result, TaxonomyError};
use std::sync::Arc;

/// Classifies `records` on up to `workers` blocking tasks.
///
/// Each worker only reads the shared registry. Results are handed back per chunk and fed
/// through a single [`BatchCollector`] in input order, so the outcome (store order,
/// duplicate detection, failure list) is the same as a sequential
/// [`classify_batch`](crate::taxonomy::store::classify_batch).
pub async fn classify_concurrently(
    records: Vec<RawRecord>,
    registry: Arc<TaxonomyRegistry>,
    workers: usize,
) -> Result<BatchOutcome> {
    if records.is_empty() {
        return Ok(BatchOutcome::default());
    }

    let records = Arc::new(records);
    let chunk_size = records.len().div_ceil(workers.max(1));

    tracing::debug!(
        "Classifying {} records in chunks of {} on {} workers",
        records.len(),
        chunk_size,
        workers
    );

    let handles: Vec<_> = (0..records.len())
        .step_by(chunk_size)
        .map(|start| {
            let end = (start + chunk_size).min(records.len());
            let records = Arc::clone(&records);
            let registry = Arc::clone(&registry);
            tokio::task::spawn_blocking(move || {
                records[start..end]
                    .iter()
                    .map(|record| classify(record, &registry))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut collector = BatchCollector::new();
    let mut raw_records = records.iter();
    for handle in handles {
        let results = handle.await.map_err(|e| TaxonomyError::WorkerError {
            message: e.to_string(),
        })?;

        for (raw, result) in raw_records.by_ref().zip(results) {
            collector.accept(raw, result)?;
        }
    }

    Ok(collector.finish())
}
