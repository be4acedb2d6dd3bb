use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sightline_model_provider::ModelLoader;
use sightline_types::{DeviceMode, RankedScore, ScoreDistribution};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::SightlineConfig;
use crate::error::{SightlineError, SightlineResult};
use crate::executor::ClassificationExecutor;
use crate::lifecycle::{ModelHandle, ModelLifecycleManager};
use crate::metrics::{MetricsEngine, MetricsSummary};
use crate::notice::{NoticeKind, NoticeSender};

/// Everything a caller needs to render one classification
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub request_id: Uuid,
    pub device: DeviceMode,
    pub model_id: String,
    pub distribution: ScoreDistribution,
    /// Display rows for the distribution, same order
    pub ranked: Vec<RankedScore>,
    pub latency_ms: u64,
    pub summary: MetricsSummary,
}

/// Drives one upload through `ensure_ready → classify → summarize`.
pub struct Orchestrator {
    lifecycle: Arc<ModelLifecycleManager>,
    executor: ClassificationExecutor,
    metrics: MetricsEngine,
    notices: NoticeSender,
}

impl Orchestrator {
    pub fn new(
        lifecycle: Arc<ModelLifecycleManager>,
        executor: ClassificationExecutor,
        notices: NoticeSender,
    ) -> Self {
        Self {
            lifecycle,
            executor,
            metrics: MetricsEngine::new(),
            notices,
        }
    }

    pub fn from_config(
        config: &SightlineConfig,
        loader: Arc<dyn ModelLoader>,
        notices: NoticeSender,
    ) -> Self {
        let lifecycle = Arc::new(ModelLifecycleManager::new(loader, notices.clone()));
        Self::new(lifecycle, ClassificationExecutor::from_config(config), notices)
    }

    /// Orchestrator backed by the ONNX Runtime loader.
    #[cfg(feature = "local-ml")]
    pub fn onnx(config: &SightlineConfig, notices: NoticeSender) -> Self {
        let loader = sightline_model_provider::ml::onnx::OnnxModelLoader::new(
            config.classifier_options(),
        );
        Self::from_config(config, Arc::new(loader), notices)
    }

    pub fn lifecycle(&self) -> &Arc<ModelLifecycleManager> {
        &self.lifecycle
    }

    /// Classify one uploaded image.
    ///
    /// Every failure is returned to the caller. Lifecycle failures are
    /// announced by the lifecycle manager itself; everything after a model is
    /// in hand is announced here as `ClassificationFailed`.
    pub async fn upload_image(&self, image: &[u8]) -> SightlineResult<ClassificationReport> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("upload_image", %request_id, bytes = image.len());

        async move {
            let handle = self.lifecycle.ensure_ready().await?;

            match self.classify_with(&handle, image, request_id).await {
                Ok(report) => {
                    self.notices.emit(NoticeKind::ClassificationComplete {
                        request_id,
                        top_label: report
                            .distribution
                            .top()
                            .map(|r| r.label.clone())
                            .unwrap_or_default(),
                        top_percentage: report.summary.top1(),
                        latency_ms: report.latency_ms,
                    });
                    Ok(report)
                }
                Err(e) => {
                    self.notices.emit(NoticeKind::ClassificationFailed {
                        request_id,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn classify_with(
        &self,
        handle: &ModelHandle,
        image: &[u8],
        request_id: Uuid,
    ) -> SightlineResult<ClassificationReport> {
        let classification = self.executor.classify(handle, image).await?;

        // summarize() rejects empty input; a model answering with nothing is
        // an inference failure, not a contract violation.
        if classification.distribution.is_empty() {
            return Err(SightlineError::classification_failed(
                "Model returned no predictions",
            ));
        }

        let summary = self
            .metrics
            .summarize(&classification.distribution, Some(classification.latency_ms))?;

        tracing::info!(
            latency_ms = classification.latency_ms,
            top1 = summary.top1(),
            certainty = summary.certainty,
            "Classification complete"
        );

        Ok(ClassificationReport {
            request_id,
            device: handle.device(),
            model_id: handle.model_id().to_string(),
            ranked: classification
                .distribution
                .ranked(classification.distribution.len()),
            distribution: classification.distribution,
            latency_ms: classification.latency_ms,
            summary,
        })
    }
}
