//! Multi-model comparison

use crate::report::{AgreementReport, Distribution};
use cropsense_core::{Error, FeatureVector, InputRecord, Result};
use cropsense_models::{ModelId, SharedRegistry};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelComparator;

impl ModelComparator {
    pub fn new() -> Self {
        Self
    }

    /// Build the vector once and classify it with every registered model
    pub async fn evaluate(
        &self,
        registry: &SharedRegistry,
        record: &InputRecord,
    ) -> Result<AgreementReport> {
        let vector = Arc::new(registry.feature_builder().build(record)?);
        self.evaluate_vector(registry, vector).await
    }

    /// Classify a prepared vector with every registered model concurrently
    pub async fn evaluate_vector(
        &self,
        registry: &SharedRegistry,
        vector: Arc<FeatureVector>,
    ) -> Result<AgreementReport> {
        let tasks: Vec<_> = registry
            .all()
            .iter()
            .map(|handle| {
                let handle = handle.clone();
                let vector = Arc::clone(&vector);
                tokio::task::spawn_blocking(move || {
                    let prediction = handle.predict(&vector)?;
                    Ok::<_, Error>((handle.id(), prediction.label))
                })
            })
            .collect();

        let mut predictions = Vec::with_capacity(tasks.len());
        for joined in join_all(tasks).await {
            predictions.push(
                joined.map_err(|e| Error::internal(format!("model worker panicked: {}", e)))??,
            );
        }

        let report = summarize(predictions)?;
        info!(
            agreement_ratio = report.agreement_ratio,
            "Model agreement complete: {} of {} models predict {}",
            report.agreement_count,
            report.total_models,
            report.predicted_crop
        );
        Ok(report)
    }
}

/// Reduce per-model labels to an agreement report.
///
/// The winning label has the highest count; ties go to the label of the
/// highest-priority model among the tied ones (`rf`, `xgb`, `svm`, `mlp`).
pub fn summarize(predictions: Vec<(ModelId, String)>) -> Result<AgreementReport> {
    if predictions.is_empty() {
        return Err(Error::model_unavailable("no models available for comparison"));
    }

    let predictions: BTreeMap<ModelId, String> = predictions.into_iter().collect();
    let total_models = predictions.len();

    let mut distribution = Distribution::new();
    for label in predictions.values() {
        *distribution.entry(label.clone()).or_insert(0) += 1;
    }

    let agreement_count = distribution.values().copied().max().unwrap_or(0);

    // BTreeMap iterates in priority order
    let predicted_crop = predictions
        .values()
        .find(|label| distribution.get(*label) == Some(&agreement_count))
        .cloned()
        .ok_or_else(|| Error::internal("no label reached the maximum count"))?;

    let agreement_ratio = agreement_count as f64 / total_models as f64;

    Ok(AgreementReport {
        predicted_crop,
        total_models,
        agreement_count,
        agreement_ratio,
        all_agree: agreement_count == total_models,
        predictions,
        prediction_distribution: distribution,
    })
}
