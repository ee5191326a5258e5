use crate::core::Pipeline;
use crate::domain::model::RunSummary;
use crate::utils::error::Result;
use std::time::Instant;

pub struct MapEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> MapEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Runs extract, transform and load in order. A schema problem in the
    /// input stops the run before anything is written.
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!("Starting zipliner run");

        let rows = self.pipeline.extract().await?;
        let outcome = self.pipeline.transform(rows).await?;
        let summary = self.pipeline.load(outcome).await?;

        if summary.is_complete_success() {
            tracing::info!(
                "🎉 All {} rows mapped in {:?}",
                summary.succeeded,
                started.elapsed()
            );
        } else {
            tracing::warn!(
                "⚠️ {} of {} rows failed ({:?})",
                summary.failed,
                summary.total(),
                started.elapsed()
            );
        }

        Ok(summary)
    }
}
